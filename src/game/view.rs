//! Client-facing view of a player: stored state plus derived prices and rates.
use serde::Serialize;

use super::catalog::Catalog;
use super::economy::{current_cost, effective_click_power, passive_rate, payback_seconds};
use super::state::PlayerState;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owned: u64,
    /// Price of the next unit.
    pub cost: u64,
    pub cps_yield: u64,
    pub click_yield: u64,
    pub payback_seconds: Option<f64>,
    pub affordable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickUpgradeView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owned: u64,
    pub cost: u64,
    pub click_yield: u64,
    pub affordable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub user_id: String,
    pub balance: u64,
    pub cookies_all_time: u64,
    pub total_clicks: u64,
    pub base_click_power: u64,
    /// Cookies per click including upgrades.
    pub click_power: u64,
    pub cookies_per_second: u64,
    pub last_tick_ms: u64,
    pub producers: Vec<ProducerView>,
    pub click_upgrades: Vec<ClickUpgradeView>,
}

impl PlayerView {
    pub fn new(state: &PlayerState, catalog: &Catalog) -> Self {
        let producers = catalog
            .producers()
            .iter()
            .map(|def| {
                let owned = state.producer_count(&def.id);
                let cost = current_cost(def, owned);
                ProducerView {
                    id: def.id.clone(),
                    name: def.name.clone(),
                    description: def.description.clone(),
                    owned,
                    cost,
                    cps_yield: def.cps_yield,
                    click_yield: def.click_yield,
                    payback_seconds: payback_seconds(def, owned),
                    affordable: state.balance >= cost,
                }
            })
            .collect();

        let click_upgrades = catalog
            .click_upgrades()
            .iter()
            .map(|def| {
                let owned = state.click_upgrade_count(&def.id);
                let cost = current_cost(def, owned);
                ClickUpgradeView {
                    id: def.id.clone(),
                    name: def.name.clone(),
                    description: def.description.clone(),
                    owned,
                    cost,
                    click_yield: def.click_yield,
                    affordable: state.balance >= cost,
                }
            })
            .collect();

        Self {
            user_id: state.user_id.clone(),
            balance: state.balance,
            cookies_all_time: state.cookies_all_time,
            total_clicks: state.total_clicks,
            base_click_power: state.click_power,
            click_power: effective_click_power(state, catalog),
            cookies_per_second: passive_rate(state, catalog),
            last_tick_ms: state.last_tick_ms,
            producers,
            click_upgrades,
        }
    }
}
