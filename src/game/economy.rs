//! Derived economy quantities. Pure functions, fully deterministic.

use super::catalog::Catalog;
use super::state::{PlayerState, Priced, ProducerDefinition};

/// Price of the next unit given how many are already owned:
/// `ceil(base_cost * growth^owned)`, saturating at `u64::MAX`.
pub fn current_cost(def: &impl Priced, owned: u64) -> u64 {
    let exponent = i32::try_from(owned).unwrap_or(i32::MAX);
    let cost = def.base_cost() as f64 * def.cost_growth_rate().powi(exponent);
    // Rounding error can land just above an exact integer price.
    let nearest = cost.round();
    // `as` saturates on overflow and infinity.
    if (cost - nearest).abs() <= nearest * 1e-12 {
        nearest as u64
    } else {
        cost.ceil() as u64
    }
}

/// Cookies per second from all owned producers.
pub fn passive_rate(state: &PlayerState, catalog: &Catalog) -> u64 {
    catalog
        .producers()
        .iter()
        .map(|p| state.producer_count(&p.id).saturating_mul(p.cps_yield))
        .fold(0, u64::saturating_add)
}

/// Cookies earned by one manual click: base power plus every click yield
/// from owned click upgrades and producers.
pub fn effective_click_power(state: &PlayerState, catalog: &Catalog) -> u64 {
    let from_upgrades = catalog
        .click_upgrades()
        .iter()
        .map(|u| state.click_upgrade_count(&u.id).saturating_mul(u.click_yield));
    let from_producers = catalog
        .producers()
        .iter()
        .map(|p| state.producer_count(&p.id).saturating_mul(p.click_yield));

    from_upgrades
        .chain(from_producers)
        .fold(state.click_power.max(1), u64::saturating_add)
}

/// Cookies produced by `rate` over `elapsed_ms`, floored.
pub fn production(rate: u64, elapsed_ms: u64) -> u64 {
    let produced = rate as u128 * elapsed_ms as u128 / 1_000;
    u64::try_from(produced).unwrap_or(u64::MAX)
}

/// Seconds until the next unit of a producer pays for itself.
/// Returns None for producers without passive yield.
pub fn payback_seconds(def: &ProducerDefinition, owned: u64) -> Option<f64> {
    if def.cps_yield == 0 {
        return None;
    }
    Some(current_cost(def, owned) as f64 / def.cps_yield as f64)
}
