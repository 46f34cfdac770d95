//! In-process snapshot store with one async lock per user.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::{SnapshotStore, Update};
use crate::error::{GameResult, StoreResult};
use crate::game::state::PlayerState;

type Slot = Arc<Mutex<Option<PlayerState>>>;

/// Snapshots live for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStore {
    players: RwLock<HashMap<String, Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for a user, created empty on first access.
    async fn slot(&self, user_id: &str) -> Slot {
        if let Some(slot) = self.players.read().await.get(user_id) {
            return slot.clone();
        }
        self.players
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn get(&self, user_id: &str) -> StoreResult<Option<PlayerState>> {
        let slot = self.players.read().await.get(user_id).cloned();
        match slot {
            Some(slot) => Ok(slot.lock().await.clone()),
            None => Ok(None),
        }
    }

    async fn put(&self, state: &PlayerState) -> StoreResult<()> {
        let slot = self.slot(&state.user_id).await;
        *slot.lock().await = Some(state.clone());
        Ok(())
    }

    async fn get_and_update(&self, user_id: &str, update: &mut Update<'_>) -> GameResult<PlayerState> {
        let slot = self.slot(user_id).await;
        let mut current = slot.lock().await;
        let next = update(current.clone())?;
        *current = Some(next.clone());
        Ok(next)
    }

    async fn list(&self) -> StoreResult<Vec<PlayerState>> {
        let slots: Vec<Slot> = self.players.read().await.values().cloned().collect();
        let mut players = Vec::with_capacity(slots.len());
        for slot in slots {
            if let Some(state) = slot.lock().await.clone() {
                players.push(state);
            }
        }
        Ok(players)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
