//! Transaction engine: the only path that mutates a stored `PlayerState`.
//!
//! Every operation is a single atomic read-modify-write through
//! `SnapshotStore::get_and_update`, bounded by the store timeout. Operations
//! other than an explicit tick first settle passive production due since
//! `last_tick_ms`. A rejected operation persists nothing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::catalog::Catalog;
use super::economy::passive_rate;
use super::logic::{self, ClickOutcome, ClickUpgradePurchase, ProducerPurchase, TickOutcome};
use super::state::{PlayerState, DEFAULT_CLICK_POWER};
use super::view::PlayerView;
use crate::clock::Clock;
use crate::error::{GameError, GameResult, StoreError};
use crate::store::SnapshotStore;

#[derive(Clone, Debug)]
pub struct EngineSettings {
    /// Upper bound on any single store call.
    pub store_timeout: Duration,
    /// Base click power given to new players.
    pub base_click_power: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(500),
            base_click_power: DEFAULT_CLICK_POWER,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub balance: u64,
    pub cookies_per_second: u64,
    pub total_clicks: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub total_players: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_users: usize,
    pub total_cookies: u64,
    pub total_clicks: u64,
}

pub struct Engine {
    store: Arc<dyn SnapshotStore>,
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        catalog: Arc<Catalog>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            catalog,
            clock,
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Manual click. Always succeeds unless the store is unavailable.
    pub async fn apply_click(&self, user_id: &str) -> GameResult<ClickOutcome> {
        let (_, outcome) = self
            .update(user_id, true, |state, catalog, _| Ok(logic::click(state, catalog)))
            .await?;
        debug!(user_id, earned = outcome.earned, balance = outcome.new_balance, "click");
        Ok(outcome)
    }

    /// Apply an explicit production interval. Does not settle first, so the
    /// caller owns the interval accounting.
    pub async fn apply_tick(&self, user_id: &str, elapsed_seconds: f64) -> GameResult<TickOutcome> {
        if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
            return Err(GameError::InvalidInterval(elapsed_seconds));
        }
        let (_, outcome) = self
            .update(user_id, false, |state, catalog, _| {
                logic::tick(state, catalog, elapsed_seconds)
            })
            .await?;
        debug!(user_id, produced = outcome.produced, "tick");
        Ok(outcome)
    }

    /// Settle whatever passive production is due right now.
    pub async fn sync(&self, user_id: &str) -> GameResult<TickOutcome> {
        let (_, outcome) = self
            .update(user_id, false, |state, catalog, now_ms| {
                let produced = logic::settle(state, catalog, now_ms);
                Ok(TickOutcome {
                    produced,
                    new_balance: state.balance,
                    rate: passive_rate(state, catalog),
                })
            })
            .await?;
        Ok(outcome)
    }

    pub async fn purchase_producer(&self, user_id: &str, producer_id: &str) -> GameResult<ProducerPurchase> {
        let (_, purchase) = self
            .update(user_id, true, |state, catalog, _| {
                logic::buy_producer(state, catalog, producer_id)
            })
            .await?;
        info!(
            user_id,
            producer = %purchase.producer_id,
            cost = purchase.cost,
            owned = purchase.owned,
            remaining = purchase.new_balance,
            "Producer purchased"
        );
        Ok(purchase)
    }

    pub async fn purchase_click_upgrade(&self, user_id: &str, upgrade_id: &str) -> GameResult<ClickUpgradePurchase> {
        let (_, purchase) = self
            .update(user_id, true, |state, catalog, _| {
                logic::buy_click_upgrade(state, catalog, upgrade_id)
            })
            .await?;
        info!(
            user_id,
            upgrade = %purchase.upgrade_id,
            cost = purchase.cost,
            owned = purchase.owned,
            remaining = purchase.new_balance,
            "Click upgrade purchased"
        );
        Ok(purchase)
    }

    /// Authoritative snapshot with due production applied.
    pub async fn state(&self, user_id: &str) -> GameResult<PlayerState> {
        let (state, ()) = self.update(user_id, true, |_, _, _| Ok(())).await?;
        Ok(state)
    }

    pub async fn view(&self, user_id: &str) -> GameResult<PlayerView> {
        let state = self.state(user_id).await?;
        Ok(PlayerView::new(&state, &self.catalog))
    }

    /// Every stored player with due production settled in memory. Nothing
    /// is written back.
    async fn settled_players(&self) -> GameResult<Vec<PlayerState>> {
        let now_ms = self.clock.now_ms();
        let mut players = self.guarded(self.store.list()).await?;
        for player in &mut players {
            logic::settle(player, &self.catalog, now_ms);
        }
        Ok(players)
    }

    /// Top players by settled balance, ties broken by user id.
    pub async fn leaderboard(&self, limit: usize) -> GameResult<Leaderboard> {
        let mut players = self.settled_players().await?;
        players.sort_by(|a, b| b.balance.cmp(&a.balance).then_with(|| a.user_id.cmp(&b.user_id)));

        let leaderboard = players
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, p)| LeaderboardEntry {
                rank: i + 1,
                user_id: p.user_id.clone(),
                balance: p.balance,
                cookies_per_second: passive_rate(p, &self.catalog),
                total_clicks: p.total_clicks,
            })
            .collect();

        Ok(Leaderboard {
            leaderboard,
            total_players: players.len(),
        })
    }

    pub async fn stats(&self) -> GameResult<GlobalStats> {
        let players = self.settled_players().await?;
        Ok(GlobalStats {
            total_users: players.len(),
            total_cookies: players.iter().map(|p| p.balance).fold(0, u64::saturating_add),
            total_clicks: players.iter().map(|p| p.total_clicks).fold(0, u64::saturating_add),
        })
    }

    /// Settle every stored player. Per-player failures are logged and
    /// skipped. Returns how many players were settled.
    pub async fn settle_all(&self) -> GameResult<usize> {
        let players = self.guarded(self.store.list()).await?;
        let mut settled = 0;
        for player in players {
            match self.sync(&player.user_id).await {
                Ok(_) => settled += 1,
                Err(e) => warn!(user_id = %player.user_id, "Periodic settle failed: {e}"),
            }
        }
        Ok(settled)
    }

    pub async fn health(&self) -> GameResult<()> {
        self.guarded(self.store.health_check()).await
    }

    /// Run `op` on the user's snapshot atomically, creating a default
    /// snapshot for unknown users.
    async fn update<T, F>(&self, user_id: &str, settle_first: bool, mut op: F) -> GameResult<(PlayerState, T)>
    where
        T: Send,
        F: FnMut(&mut PlayerState, &Catalog, u64) -> GameResult<T> + Send,
    {
        let catalog: &Catalog = &self.catalog;
        let now_ms = self.clock.now_ms();
        let base_click_power = self.settings.base_click_power;
        let mut outcome = None;

        let mut apply = |current: Option<PlayerState>| -> GameResult<PlayerState> {
            let mut state = match current {
                Some(state) => state,
                None => {
                    info!(user_id, "Creating new player");
                    PlayerState::new(user_id, catalog, base_click_power, now_ms)
                }
            };
            if settle_first {
                logic::settle(&mut state, catalog, now_ms);
            }
            outcome = Some(op(&mut state, catalog, now_ms)?);
            state.updated_at_ms = now_ms;
            Ok(state)
        };

        let state = self
            .guarded(self.store.get_and_update(user_id, &mut apply))
            .await?;

        match outcome {
            Some(outcome) => Ok((state, outcome)),
            None => Err(StoreError::Backend(format!("update for {user_id} was never applied")).into()),
        }
    }

    /// Bound a store call by the configured timeout.
    async fn guarded<T, E>(&self, call: impl Future<Output = Result<T, E>>) -> GameResult<T>
    where
        GameError: From<E>,
    {
        match timeout(self.settings.store_timeout, call).await {
            Ok(result) => result.map_err(GameError::from),
            Err(_) => {
                warn!(timeout = ?self.settings.store_timeout, "Store call timed out");
                Err(StoreError::Timeout(self.settings.store_timeout).into())
            }
        }
    }
}
