//! # Redis
//!
//! Durable snapshot store.
//!
//! ## Layout
//!
//! - One hash per player at `cookie:player:{user_id}` with two fields:
//!   `version` (monotonic integer) and `data` (JSON snapshot, see `game::save`)
//! - One set `cookie:players` holding every stored user id, used for
//!   leaderboard/stats scans and the periodic ticker
//!
//! ## Atomicity
//!
//! `get_and_update` is an optimistic compare-and-swap: read `version` and
//! `data`, run the update locally, then write through a Lua script that only
//! succeeds if `version` is still the one that was read. A lost race re-reads
//! and retries up to `max_attempts` times, then fails with
//! `StoreError::Contention`.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, Script};
use tracing::{info, warn};

use super::{SnapshotStore, Update};
use crate::error::{GameResult, StoreError, StoreResult};
use crate::game::save::{decode_snapshot, encode_snapshot};
use crate::game::state::PlayerState;

const PLAYERS_KEY: &str = "cookie:players";

// KEYS[1] player hash, KEYS[2] player set
// ARGV[1] expected version, ARGV[2] new version, ARGV[3] snapshot, ARGV[4] user id
const COMPARE_AND_SWAP: &str = r#"
local current = redis.call('HGET', KEYS[1], 'version')
if current == false then current = '0' end
if current ~= ARGV[1] then return 0 end
redis.call('HSET', KEYS[1], 'version', ARGV[2], 'data', ARGV[3])
redis.call('SADD', KEYS[2], ARGV[4])
return 1
"#;

fn player_key(user_id: &str) -> String {
    format!("cookie:player:{user_id}")
}

pub struct RedisStore {
    connection: ConnectionManager,
    compare_and_swap: Script,
    max_attempts: u32,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, max_attempts: u32) -> StoreResult<Self> {
        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager().await?;
        info!("Connected to Redis at {redis_url}");

        Ok(Self {
            connection,
            compare_and_swap: Script::new(COMPARE_AND_SWAP),
            max_attempts: max_attempts.max(1),
        })
    }

    /// Current version (0 when absent) and snapshot of one player.
    async fn read(&self, user_id: &str) -> StoreResult<(u64, Option<PlayerState>)> {
        let mut connection = self.connection.clone();
        let (version, data): (Option<String>, Option<String>) = redis::cmd("HMGET")
            .arg(player_key(user_id))
            .arg("version")
            .arg("data")
            .query_async(&mut connection)
            .await?;

        let version = match version {
            Some(v) => v
                .parse()
                .map_err(|_| StoreError::Corrupt(format!("version {v:?} for {user_id}")))?,
            None => 0,
        };
        let state = data.as_deref().map(decode_snapshot).transpose()?;
        Ok((version, state))
    }

    /// Write `state` only if the stored version still equals `expected`.
    async fn swap(&self, state: &PlayerState, expected: u64) -> StoreResult<bool> {
        let snapshot = encode_snapshot(state)?;
        let mut connection = self.connection.clone();
        let swapped: i64 = self
            .compare_and_swap
            .key(player_key(&state.user_id))
            .key(PLAYERS_KEY)
            .arg(expected)
            .arg(expected + 1)
            .arg(snapshot)
            .arg(&state.user_id)
            .invoke_async(&mut connection)
            .await?;
        Ok(swapped == 1)
    }
}

#[async_trait]
impl SnapshotStore for RedisStore {
    async fn get(&self, user_id: &str) -> StoreResult<Option<PlayerState>> {
        Ok(self.read(user_id).await?.1)
    }

    async fn put(&self, state: &PlayerState) -> StoreResult<()> {
        let snapshot = encode_snapshot(state)?;
        let key = player_key(&state.user_id);
        let mut connection = self.connection.clone();
        redis::pipe()
            .atomic()
            .hincr(&key, "version", 1)
            .ignore()
            .hset(&key, "data", snapshot)
            .ignore()
            .sadd(PLAYERS_KEY, &state.user_id)
            .ignore()
            .query_async::<_, ()>(&mut connection)
            .await?;
        Ok(())
    }

    async fn get_and_update(&self, user_id: &str, update: &mut Update<'_>) -> GameResult<PlayerState> {
        for attempt in 1..=self.max_attempts {
            let (version, current) = self.read(user_id).await?;
            let next = update(current)?;
            if self.swap(&next, version).await? {
                return Ok(next);
            }
            warn!(user_id = %user_id, attempt, "Lost compare-and-swap race, retrying");
        }

        Err(StoreError::Contention {
            user_id: user_id.to_string(),
            attempts: self.max_attempts,
        }
        .into())
    }

    async fn list(&self) -> StoreResult<Vec<PlayerState>> {
        let mut connection = self.connection.clone();
        let user_ids: Vec<String> = connection.smembers(PLAYERS_KEY).await?;

        let mut players = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            match self.read(&user_id).await {
                Ok((_, Some(state))) => players.push(state),
                Ok((_, None)) => {}
                // One bad snapshot must not hide every other player.
                Err(StoreError::Corrupt(reason)) => {
                    warn!(user_id = %user_id, "Skipping corrupt snapshot: {reason}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(players)
    }

    async fn health_check(&self) -> StoreResult<()> {
        let mut connection = self.connection.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut connection)
            .await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_keys_are_namespaced() {
        assert_eq!(player_key("alice"), "cookie:player:alice");
    }

    #[test]
    fn script_touches_only_declared_keys() {
        assert!(COMPARE_AND_SWAP.contains("KEYS[1]"));
        assert!(COMPARE_AND_SWAP.contains("KEYS[2]"));
        assert!(!COMPARE_AND_SWAP.contains("KEYS[3]"));
    }
}
