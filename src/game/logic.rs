//! Cookie economy state transitions. Pure functions, fully testable.
//!
//! Every function here mutates a `PlayerState` in place and never touches
//! the store. On error the state is left exactly as it was.

use serde::Serialize;

use super::catalog::Catalog;
use super::economy::{current_cost, effective_click_power, passive_rate, production};
use super::state::PlayerState;
use crate::clock::{due_seconds, seconds_to_ms};
use crate::error::{GameError, GameResult};

/// Result of a manual click.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickOutcome {
    pub earned: u64,
    pub new_balance: u64,
    pub total_clicks: u64,
}

/// Result of applying passive production.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickOutcome {
    pub produced: u64,
    pub new_balance: u64,
    pub rate: u64,
}

/// Result of a producer purchase.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerPurchase {
    pub producer_id: String,
    /// Cookies charged.
    pub cost: u64,
    /// Units owned after the purchase.
    pub owned: u64,
    pub new_balance: u64,
    /// Price of the next unit.
    pub new_cost: u64,
    /// Passive rate after the purchase.
    pub new_rate: u64,
}

/// Result of a click upgrade purchase.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickUpgradePurchase {
    pub upgrade_id: String,
    pub cost: u64,
    pub owned: u64,
    pub new_balance: u64,
    pub new_cost: u64,
    pub new_click_power: u64,
}

/// Manual click: add the effective click power to the balance.
pub fn click(state: &mut PlayerState, catalog: &Catalog) -> ClickOutcome {
    let earned = effective_click_power(state, catalog);
    state.earn(earned);
    state.total_clicks = state.total_clicks.saturating_add(1);
    ClickOutcome {
        earned,
        new_balance: state.balance,
        total_clicks: state.total_clicks,
    }
}

/// Apply `elapsed_seconds` of passive production and advance `last_tick_ms`
/// by the same interval, taken in whole milliseconds. The caller must not
/// apply one interval twice.
pub fn tick(state: &mut PlayerState, catalog: &Catalog, elapsed_seconds: f64) -> GameResult<TickOutcome> {
    if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
        return Err(GameError::InvalidInterval(elapsed_seconds));
    }
    // Pay for exactly the whole milliseconds that `last_tick_ms` advances by.
    let interval_ms = seconds_to_ms(elapsed_seconds);
    let rate = passive_rate(state, catalog);
    let produced = production(rate, interval_ms);
    state.earn(produced);
    state.last_tick_ms = state.last_tick_ms.saturating_add(interval_ms);
    Ok(TickOutcome {
        produced,
        new_balance: state.balance,
        rate,
    })
}

/// Settle production due between `last_tick_ms` and `now_ms` in whole
/// seconds. Returns the cookies produced.
pub fn settle(state: &mut PlayerState, catalog: &Catalog, now_ms: u64) -> u64 {
    let (seconds, last_tick_ms) = due_seconds(state.last_tick_ms, now_ms);
    if seconds == 0 {
        return 0;
    }
    let produced = passive_rate(state, catalog).saturating_mul(seconds);
    state.earn(produced);
    state.last_tick_ms = last_tick_ms;
    produced
}

/// Try to buy one unit of a producer. Rejected in full when unaffordable.
pub fn buy_producer(state: &mut PlayerState, catalog: &Catalog, producer_id: &str) -> GameResult<ProducerPurchase> {
    let def = catalog
        .producer(producer_id)
        .ok_or_else(|| GameError::UnknownProducer(producer_id.to_string()))?;

    let owned = state.producer_count(&def.id);
    let cost = current_cost(def, owned);
    if state.balance < cost {
        return Err(GameError::InsufficientFunds {
            cost,
            balance: state.balance,
        });
    }

    state.balance -= cost;
    let owned = owned + 1;
    state.producers.insert(def.id.clone(), owned);

    Ok(ProducerPurchase {
        producer_id: def.id.clone(),
        cost,
        owned,
        new_balance: state.balance,
        new_cost: current_cost(def, owned),
        new_rate: passive_rate(state, catalog),
    })
}

/// Try to buy one level of a click upgrade. Rejected in full when unaffordable.
pub fn buy_click_upgrade(
    state: &mut PlayerState,
    catalog: &Catalog,
    upgrade_id: &str,
) -> GameResult<ClickUpgradePurchase> {
    let def = catalog
        .click_upgrade(upgrade_id)
        .ok_or_else(|| GameError::UnknownUpgrade(upgrade_id.to_string()))?;

    let owned = state.click_upgrade_count(&def.id);
    let cost = current_cost(def, owned);
    if state.balance < cost {
        return Err(GameError::InsufficientFunds {
            cost,
            balance: state.balance,
        });
    }

    state.balance -= cost;
    let owned = owned + 1;
    state.click_upgrades.insert(def.id.clone(), owned);

    Ok(ClickUpgradePurchase {
        upgrade_id: def.id.clone(),
        cost,
        owned,
        new_balance: state.balance,
        new_cost: current_cost(def, owned),
        new_click_power: effective_click_power(state, catalog),
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::game::state::DEFAULT_CLICK_POWER;
    use proptest::prelude::*;

    fn arb_producer_id() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("cursor".to_string()),
            Just("grandma".to_string()),
            Just("farm".to_string()),
            Just("mine".to_string()),
            Just("factory".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn prop_buy_producer_deducts_exact_cost(id in arb_producer_id(), extra in 0u64..10_000) {
            let catalog = Catalog::default();
            let mut state = PlayerState::new("p", &catalog, DEFAULT_CLICK_POWER, 0);
            let cost = current_cost(catalog.producer(&id).unwrap(), 0);
            state.balance = cost + extra;
            let purchase = buy_producer(&mut state, &catalog, &id).unwrap();
            prop_assert_eq!(purchase.new_balance, extra);
            prop_assert_eq!(state.producer_count(&id), 1);
        }

        #[test]
        fn prop_buy_producer_fails_below_cost(id in arb_producer_id(), owned in 0u64..40, short in 1u64..15) {
            let catalog = Catalog::default();
            let mut state = PlayerState::new("p", &catalog, DEFAULT_CLICK_POWER, 0);
            state.producers.insert(id.clone(), owned);
            let cost = current_cost(catalog.producer(&id).unwrap(), owned);
            state.balance = cost - short;
            let before = state.clone();
            let is_insufficient = matches!(
                buy_producer(&mut state, &catalog, &id),
                Err(GameError::InsufficientFunds { .. })
            );
            prop_assert!(is_insufficient);
            prop_assert_eq!(state, before);
        }

        #[test]
        fn prop_purchase_preserves_all_time(id in arb_producer_id()) {
            let catalog = Catalog::default();
            let mut state = PlayerState::new("p", &catalog, DEFAULT_CLICK_POWER, 0);
            state.earn(1_000_000_000);
            buy_producer(&mut state, &catalog, &id).unwrap();
            prop_assert_eq!(state.cookies_all_time, 1_000_000_000);
        }

        #[test]
        fn prop_tick_never_reduces_balance(secs in 0.0f64..10_000.0, cursors in 0u64..100) {
            let catalog = Catalog::default();
            let mut state = PlayerState::new("p", &catalog, DEFAULT_CLICK_POWER, 0);
            state.producers.insert("cursor".into(), cursors);
            state.balance = 100;
            tick(&mut state, &catalog, secs).unwrap();
            prop_assert!(state.balance >= 100);
        }

        #[test]
        fn prop_split_settles_match_single_settle(split in 0u64..60_000, total in 60_000u64..120_000) {
            let catalog = Catalog::default();
            let mut one = PlayerState::new("p", &catalog, DEFAULT_CLICK_POWER, 0);
            one.producers.insert("farm".into(), 3);
            let mut two = one.clone();

            settle(&mut one, &catalog, total);
            settle(&mut two, &catalog, split);
            settle(&mut two, &catalog, total);

            prop_assert_eq!(one.balance, two.balance);
            prop_assert_eq!(one.last_tick_ms, two.last_tick_ms);
        }
    }
}
