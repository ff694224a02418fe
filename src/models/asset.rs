use serde::{Deserialize, Serialize};

/// A tradable asset as reported by the external price feed.
///
/// The whole set is rebuilt on every successful feed refresh; assets are
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub asset_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl Asset {
    /// Canonical cache key: symbols compare case-insensitively.
    pub fn key(&self) -> String {
        self.symbol.to_uppercase()
    }
}
