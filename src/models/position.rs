use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;

/// A user-held position: what was bought, how much, and at what price.
///
/// `symbol` is stored uppercase. `name` and `asset_type` are resolved from
/// the asset feed at create/update time; `asset_type` stays `None` when the
/// symbol is unknown to the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Id,
    pub user_id: Id,
    pub symbol: String,
    pub name: String,
    pub purchase_price: f64,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
