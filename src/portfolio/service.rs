// src/portfolio/service.rs
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use crate::assets::AssetPriceCache;
use crate::clock::{Clock, SystemClock};
use crate::models::{Id, Position};
use crate::storage::PositionStore;

use super::{NewPosition, PortfolioSummary, PositionPatch, ValuedPosition};

/// Hard failures a portfolio operation can surface to its caller. Feed
/// problems never show up here; they degrade to zero or stale prices.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    #[error("position {0} not found")]
    NotFound(Id),

    #[error("position {0} belongs to another user")]
    Forbidden(Id),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type PortfolioResult<T> = Result<T, PortfolioError>;

/// Turns stored positions into financial metrics using cached asset prices.
///
/// The caller supplies an already-authenticated `user_id`; ownership of a
/// position is re-checked on every id-addressed operation.
pub struct PortfolioService {
    store: Arc<dyn PositionStore>,
    assets: Arc<AssetPriceCache>,
    clock: Arc<dyn Clock>,
}

impl PortfolioService {
    pub fn new(store: Arc<dyn PositionStore>, assets: Arc<AssetPriceCache>) -> Self {
        Self {
            store,
            assets,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create a position, resolving display name and type from the asset
    /// cache. Unknown symbols fall back to the symbol itself as the name
    /// and leave the type unset.
    pub async fn create_position(
        &self,
        user_id: &Id,
        new: NewPosition,
    ) -> PortfolioResult<Position> {
        let asset = self.assets.get_by_symbol(&new.symbol).await;
        let now = self.clock.now();

        let position = Position {
            id: Id::new(),
            user_id: user_id.clone(),
            symbol: new.symbol.to_uppercase(),
            name: asset
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_else(|| new.symbol.clone()),
            purchase_price: new.purchase_price,
            quantity: new.quantity,
            asset_type: asset.map(|a| a.asset_type),
            created_at: now,
            updated_at: now,
        };

        self.store.save(&position).await?;
        info!(position = %position.id, symbol = %position.symbol, "position created");
        Ok(position)
    }

    /// All of a user's positions, most recently created first, each valued
    /// at the current price (0 when the asset is unknown to the feed).
    pub async fn list_positions(&self, user_id: &Id) -> PortfolioResult<Vec<ValuedPosition>> {
        let rows = self.store.list_for_user(user_id).await?;
        let valued = join_all(rows.into_iter().map(|position| async move {
            let price = self.assets.current_price(&position.symbol).await;
            ValuedPosition::compute(position, price)
        }))
        .await;
        Ok(valued)
    }

    pub async fn get_position(&self, id: &Id, user_id: &Id) -> PortfolioResult<ValuedPosition> {
        let position = self.owned_position(id, user_id).await?;
        let price = self.assets.current_price(&position.symbol).await;
        Ok(ValuedPosition::compute(position, price))
    }

    /// Apply a partial update. A changed symbol re-resolves name and type,
    /// but overwrites them only when the new symbol is known to the feed;
    /// an unresolved symbol keeps the previous name and type.
    pub async fn update_position(
        &self,
        id: &Id,
        user_id: &Id,
        patch: PositionPatch,
    ) -> PortfolioResult<Position> {
        let mut position = self.owned_position(id, user_id).await?;

        if let Some(symbol) = patch.symbol {
            if symbol != position.symbol {
                if let Some(asset) = self.assets.get_by_symbol(&symbol).await {
                    position.name = asset.name;
                    position.asset_type = Some(asset.asset_type);
                }
            }
            position.symbol = symbol.to_uppercase();
        }
        if let Some(purchase_price) = patch.purchase_price {
            position.purchase_price = purchase_price;
        }
        if let Some(quantity) = patch.quantity {
            position.quantity = quantity;
        }
        position.updated_at = self.clock.now();

        self.store.save(&position).await?;
        debug!(position = %position.id, "position updated");
        Ok(position)
    }

    pub async fn remove_position(&self, id: &Id, user_id: &Id) -> PortfolioResult<()> {
        let position = self.owned_position(id, user_id).await?;
        self.store.delete(&position.id).await?;
        info!(position = %position.id, "position removed");
        Ok(())
    }

    /// Aggregate the user's valued positions into portfolio totals and an
    /// allocation breakdown.
    pub async fn summary(&self, user_id: &Id) -> PortfolioResult<PortfolioSummary> {
        let items = self.list_positions(user_id).await?;
        Ok(PortfolioSummary::from_items(items))
    }

    async fn owned_position(&self, id: &Id, user_id: &Id) -> PortfolioResult<Position> {
        let position = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| PortfolioError::NotFound(id.clone()))?;
        if &position.user_id != user_id {
            return Err(PortfolioError::Forbidden(id.clone()));
        }
        Ok(position)
    }
}
