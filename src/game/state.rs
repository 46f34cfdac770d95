//! Cookie economy state definitions.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::catalog::Catalog;

/// Base cookies per manual click for a fresh player.
pub const DEFAULT_CLICK_POWER: u64 = 1;

/// A purchasable producer (auto-clicker).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Cost of the first unit.
    pub base_cost: u64,
    /// Cost multiplier applied per owned unit (must be > 1.0).
    pub cost_growth_rate: f64,
    /// Cookies per second added per owned unit.
    pub cps_yield: u64,
    /// Click power added per owned unit.
    #[serde(default)]
    pub click_yield: u64,
}

/// A purchasable click upgrade. Repeatable, priced like a producer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickUpgradeDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_cost: u64,
    pub cost_growth_rate: f64,
    /// Click power added per owned unit.
    pub click_yield: u64,
}

/// Anything priced on the geometric cost curve.
pub trait Priced {
    fn base_cost(&self) -> u64;
    fn cost_growth_rate(&self) -> f64;
}

impl Priced for ProducerDefinition {
    fn base_cost(&self) -> u64 {
        self.base_cost
    }

    fn cost_growth_rate(&self) -> f64 {
        self.cost_growth_rate
    }
}

impl Priced for ClickUpgradeDefinition {
    fn base_cost(&self) -> u64 {
        self.base_cost
    }

    fn cost_growth_rate(&self) -> f64 {
        self.cost_growth_rate
    }
}

/// Full persisted state of one player.
///
/// Only ownership counts are stored. Costs, rates and effective click power
/// are always derived from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub user_id: String,
    /// Cookies currently held.
    pub balance: u64,
    /// Cookies earned all-time (purchases do not reduce it).
    #[serde(default)]
    pub cookies_all_time: u64,
    /// Manual clicks count.
    pub total_clicks: u64,
    /// Base cookies per click, before upgrades. Always >= 1.
    pub click_power: u64,
    /// Owned producer counts keyed by producer id.
    pub producers: BTreeMap<String, u64>,
    /// Owned click upgrade counts keyed by upgrade id.
    #[serde(default)]
    pub click_upgrades: BTreeMap<String, u64>,
    /// Unix millis up to which passive production has been applied.
    pub last_tick_ms: u64,
    #[serde(default)]
    pub created_at_ms: u64,
    #[serde(default)]
    pub updated_at_ms: u64,
}

impl PlayerState {
    /// Default zero-state for a first-time player.
    pub fn new(user_id: &str, catalog: &Catalog, click_power: u64, now_ms: u64) -> Self {
        Self {
            user_id: user_id.to_string(),
            balance: 0,
            cookies_all_time: 0,
            total_clicks: 0,
            click_power: click_power.max(1),
            producers: catalog
                .producers()
                .iter()
                .map(|p| (p.id.clone(), 0))
                .collect(),
            click_upgrades: catalog
                .click_upgrades()
                .iter()
                .map(|u| (u.id.clone(), 0))
                .collect(),
            last_tick_ms: now_ms,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// Owned count of a producer (0 when absent from the map).
    pub fn producer_count(&self, id: &str) -> u64 {
        self.producers.get(id).copied().unwrap_or(0)
    }

    /// Owned count of a click upgrade (0 when absent from the map).
    pub fn click_upgrade_count(&self, id: &str) -> u64 {
        self.click_upgrades.get(id).copied().unwrap_or(0)
    }

    /// Add earned cookies to both balance and the all-time counter.
    pub fn earn(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
        self.cookies_all_time = self.cookies_all_time.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_has_zero_counts_for_every_catalog_entry() {
        let catalog = Catalog::default();
        let state = PlayerState::new("alice", &catalog, DEFAULT_CLICK_POWER, 1_000);
        assert_eq!(state.balance, 0);
        assert_eq!(state.total_clicks, 0);
        assert_eq!(state.click_power, 1);
        assert_eq!(state.producers.len(), catalog.producers().len());
        assert!(state.producers.values().all(|&c| c == 0));
        assert_eq!(state.click_upgrades.len(), catalog.click_upgrades().len());
        assert_eq!(state.last_tick_ms, 1_000);
    }

    #[test]
    fn new_player_click_power_is_at_least_one() {
        let state = PlayerState::new("bob", &Catalog::default(), 0, 0);
        assert_eq!(state.click_power, 1);
    }

    #[test]
    fn missing_counts_read_as_zero() {
        let mut state = PlayerState::new("carol", &Catalog::default(), 1, 0);
        state.producers.clear();
        assert_eq!(state.producer_count("cursor"), 0);
        assert_eq!(state.click_upgrade_count("nope"), 0);
    }

    #[test]
    fn earn_tracks_all_time() {
        let mut state = PlayerState::new("dave", &Catalog::default(), 1, 0);
        state.earn(10);
        state.balance -= 4;
        state.earn(3);
        assert_eq!(state.balance, 9);
        assert_eq!(state.cookies_all_time, 13);
    }

    #[test]
    fn earn_saturates() {
        let mut state = PlayerState::new("erin", &Catalog::default(), 1, 0);
        state.balance = u64::MAX - 1;
        state.earn(10);
        assert_eq!(state.balance, u64::MAX);
    }
}
