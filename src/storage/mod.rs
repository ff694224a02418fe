mod memory;

pub use memory::MemoryPositionStore;

use anyhow::Result;

use crate::models::{Id, Position};

/// Storage trait for persisting portfolio positions.
///
/// `save` upserts; partial updates are read-modify-write through it.
#[async_trait::async_trait]
pub trait PositionStore: Send + Sync {
    /// All positions belonging to a user, most recently created first.
    async fn list_for_user(&self, user_id: &Id) -> Result<Vec<Position>>;

    async fn get(&self, id: &Id) -> Result<Option<Position>>;

    async fn save(&self, position: &Position) -> Result<()>;

    /// Returns whether a position was actually removed.
    async fn delete(&self, id: &Id) -> Result<bool>;
}
