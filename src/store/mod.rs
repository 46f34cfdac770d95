//! Snapshot stores: durable load/save of `PlayerState` keyed by user id.

pub mod memory;
pub mod redis_store;

use async_trait::async_trait;

use crate::error::{GameResult, StoreResult};
use crate::game::state::PlayerState;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

/// Read-modify-write step run under a store's per-user atomicity.
///
/// Receives the current snapshot (None for a new user) and returns the
/// snapshot to persist. Returning an error aborts the update and nothing
/// is written. Backends using optimistic concurrency may call it more than
/// once; only the last successful call is persisted.
pub type Update<'a> = dyn FnMut(Option<PlayerState>) -> GameResult<PlayerState> + Send + 'a;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load a snapshot. `Ok(None)` when the user has never been stored.
    async fn get(&self, user_id: &str) -> StoreResult<Option<PlayerState>>;

    /// Overwrite a snapshot unconditionally.
    async fn put(&self, state: &PlayerState) -> StoreResult<()>;

    /// Atomically apply `update` to one user's snapshot. Concurrent calls
    /// for the same user never observe the same pre-update state.
    async fn get_and_update(&self, user_id: &str, update: &mut Update<'_>) -> GameResult<PlayerState>;

    /// Every stored snapshot, in no particular order.
    async fn list(&self) -> StoreResult<Vec<PlayerState>>;

    async fn health_check(&self) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}
