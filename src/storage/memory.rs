// src/storage/memory.rs
//! In-memory position store for testing.

use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::models::{Id, Position};

use super::PositionStore;

/// In-memory store. Positions are kept per user in insertion order, so
/// newest-first listing stays stable even when creation timestamps collide.
#[derive(Default)]
pub struct MemoryPositionStore {
    positions: Mutex<HashMap<Id, Vec<Position>>>,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PositionStore for MemoryPositionStore {
    async fn list_for_user(&self, user_id: &Id) -> Result<Vec<Position>> {
        let positions = self.positions.lock().await;
        let mut rows = positions.get(user_id).cloned().unwrap_or_default();
        rows.reverse();
        Ok(rows)
    }

    async fn get(&self, id: &Id) -> Result<Option<Position>> {
        let positions = self.positions.lock().await;
        Ok(positions
            .values()
            .flat_map(|rows| rows.iter())
            .find(|position| &position.id == id)
            .cloned())
    }

    async fn save(&self, position: &Position) -> Result<()> {
        let mut positions = self.positions.lock().await;
        let rows = positions.entry(position.user_id.clone()).or_default();
        match rows.iter_mut().find(|existing| existing.id == position.id) {
            Some(existing) => *existing = position.clone(),
            None => rows.push(position.clone()),
        }
        Ok(())
    }

    async fn delete(&self, id: &Id) -> Result<bool> {
        let mut positions = self.positions.lock().await;
        for rows in positions.values_mut() {
            if let Some(idx) = rows.iter().position(|position| &position.id == id) {
                rows.remove(idx);
                return Ok(true);
            }
        }
        Ok(false)
    }
}
