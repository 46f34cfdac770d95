use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{error::AppError, AppState};
use crate::game::{
    logic::{ClickOutcome, ClickUpgradePurchase, ProducerPurchase, TickOutcome},
    view::PlayerView,
    Catalog, GlobalStats, Leaderboard,
};

pub const MAX_USER_ID_LEN: usize = 64;
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

type Shared = State<Arc<AppState>>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerRequest {
    producer_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickUpgradeRequest {
    upgrade_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickRequest {
    elapsed_seconds: f64,
}

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    limit: Option<usize>,
}

/// User ids are 1..=64 characters of `[A-Za-z0-9_.-]`.
fn validate_user_id(user_id: String) -> Result<String, AppError> {
    let valid = !user_id.is_empty()
        && user_id.len() <= MAX_USER_ID_LEN
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(user_id)
    } else {
        Err(AppError::InvalidUserId(user_id))
    }
}

pub async fn root_handler(State(state): Shared) -> Json<Value> {
    Json(json!({
        "message": "Cookie economy API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "store": state.engine.store_backend(),
        "timestamp": state.engine.now_ms(),
    }))
}

pub async fn health_handler(State(state): Shared) -> Result<Json<Value>, AppError> {
    state.engine.health().await?;
    Ok(Json(json!({
        "status": "healthy",
        "store": state.engine.store_backend(),
        "timestamp": state.engine.now_ms(),
    })))
}

pub async fn catalog_handler(State(state): Shared) -> Json<Catalog> {
    Json(state.engine.catalog().clone())
}

pub async fn game_handler(State(state): Shared, Path(user_id): Path<String>) -> Result<Json<PlayerView>, AppError> {
    let user_id = validate_user_id(user_id)?;
    Ok(Json(state.engine.view(&user_id).await?))
}

pub async fn click_handler(
    State(state): Shared,
    Path(user_id): Path<String>,
) -> Result<Json<ClickOutcome>, AppError> {
    let user_id = validate_user_id(user_id)?;
    Ok(Json(state.engine.apply_click(&user_id).await?))
}

pub async fn producer_handler(
    State(state): Shared,
    Path(user_id): Path<String>,
    payload: Result<Json<ProducerRequest>, JsonRejection>,
) -> Result<Json<ProducerPurchase>, AppError> {
    let user_id = validate_user_id(user_id)?;
    let Json(payload) = payload?;
    Ok(Json(
        state
            .engine
            .purchase_producer(&user_id, &payload.producer_id)
            .await?,
    ))
}

pub async fn click_upgrade_handler(
    State(state): Shared,
    Path(user_id): Path<String>,
    payload: Result<Json<ClickUpgradeRequest>, JsonRejection>,
) -> Result<Json<ClickUpgradePurchase>, AppError> {
    let user_id = validate_user_id(user_id)?;
    let Json(payload) = payload?;
    Ok(Json(
        state
            .engine
            .purchase_click_upgrade(&user_id, &payload.upgrade_id)
            .await?,
    ))
}

pub async fn tick_handler(
    State(state): Shared,
    Path(user_id): Path<String>,
    payload: Result<Json<TickRequest>, JsonRejection>,
) -> Result<Json<TickOutcome>, AppError> {
    let user_id = validate_user_id(user_id)?;
    let Json(payload) = payload?;
    Ok(Json(
        state
            .engine
            .apply_tick(&user_id, payload.elapsed_seconds)
            .await?,
    ))
}

pub async fn sync_handler(State(state): Shared, Path(user_id): Path<String>) -> Result<Json<TickOutcome>, AppError> {
    let user_id = validate_user_id(user_id)?;
    Ok(Json(state.engine.sync(&user_id).await?))
}

pub async fn leaderboard_handler(
    State(state): Shared,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<Leaderboard>, AppError> {
    let Query(query) = query?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT);
    Ok(Json(state.engine.leaderboard(limit).await?))
}

pub async fn stats_handler(State(state): Shared) -> Result<Json<GlobalStats>, AppError> {
    Ok(Json(state.engine.stats().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_charset_and_length() {
        assert!(validate_user_id("player_1".into()).is_ok());
        assert!(validate_user_id("a.b-c".into()).is_ok());
        assert!(validate_user_id("x".repeat(MAX_USER_ID_LEN)).is_ok());

        assert!(validate_user_id(String::new()).is_err());
        assert!(validate_user_id("x".repeat(MAX_USER_ID_LEN + 1)).is_err());
        assert!(validate_user_id("has space".into()).is_err());
        assert!(validate_user_id("クッキー".into()).is_err());
    }
}
