//! End-to-end checks of the HTTP API against the in-memory store.
//!
//! Each test builds a fresh router over a `MemoryStore` and a `ManualClock`
//! so passive production only happens when the test advances time.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use cookie_economy::{
    clock::ManualClock,
    config::Config,
    game::{Catalog, Engine, EngineSettings},
    server::{router, AppState},
    store::{MemoryStore, SnapshotStore},
};

const T0: u64 = 1_700_000_000_000;

struct Harness {
    app: Router,
    clock: Arc<ManualClock>,
    store: Arc<MemoryStore>,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(T0));
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(
        store.clone(),
        Arc::new(Catalog::default()),
        clock.clone(),
        EngineSettings::default(),
    );
    let app = router(AppState::with_engine(engine, Config::default()));
    Harness { app, clock, store }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn give_cookies(h: &Harness, user_id: &str, balance: u64) {
    let mut state = h.store.get(user_id).await.unwrap().unwrap_or_else(|| {
        cookie_economy::game::PlayerState::new(user_id, &Catalog::default(), 1, T0)
    });
    state.balance = balance;
    h.store.put(&state).await.unwrap();
}

#[tokio::test]
async fn root_and_health_report_running() {
    let h = harness();
    let (status, body) = send(&h.app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["store"], "memory");

    let (status, body) = send(&h.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn catalog_lists_default_entries() {
    let h = harness();
    let (status, body) = send(&h.app, "GET", "/api/v1/catalog", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["producers"][0]["id"], "cursor");
    assert_eq!(body["producers"][0]["baseCost"], 15);
    assert_eq!(body["clickUpgrades"][0]["id"], "click_power");
}

#[tokio::test]
async fn new_user_gets_default_state() {
    let h = harness();
    let (status, body) = send(&h.app, "GET", "/api/v1/game/fresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], "fresh");
    assert_eq!(body["balance"], 0);
    assert_eq!(body["clickPower"], 1);
    assert_eq!(body["cookiesPerSecond"], 0);
    assert_eq!(body["producers"][0]["cost"], 15);
}

#[tokio::test]
async fn clicks_accumulate() {
    let h = harness();
    for n in 1..=3 {
        let (status, body) = send(&h.app, "POST", "/api/v1/game/clicker/click", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["earned"], 1);
        assert_eq!(body["newBalance"], n);
        assert_eq!(body["totalClicks"], n);
    }
}

#[tokio::test]
async fn producer_purchase_updates_cost_and_rate() {
    let h = harness();
    give_cookies(&h, "buyer", 15).await;

    let (status, body) = send(
        &h.app,
        "POST",
        "/api/v1/game/buyer/producers",
        Some(json!({"producerId": "cursor"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newBalance"], 0);
    assert_eq!(body["newCost"], 18);
    assert_eq!(body["newRate"], 1);
    assert_eq!(body["owned"], 1);
}

#[tokio::test]
async fn insufficient_funds_is_conflict() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        "POST",
        "/api/v1/game/poor/producers",
        Some(json!({"producerId": "factory"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_funds");
    assert!(body["message"].as_str().unwrap().contains("130000"));
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        "POST",
        "/api/v1/game/u/producers",
        Some(json!({"producerId": "time_machine"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_producer");

    let (status, body) = send(
        &h.app,
        "POST",
        "/api/v1/game/u/click-upgrades",
        Some(json!({"upgradeId": "mega"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_upgrade");
}

#[tokio::test]
async fn click_upgrade_purchase_raises_click_power() {
    let h = harness();
    give_cookies(&h, "upg", 50).await;
    let (status, body) = send(
        &h.app,
        "POST",
        "/api/v1/game/upg/click-upgrades",
        Some(json!({"upgradeId": "click_power"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newBalance"], 0);
    assert_eq!(body["newClickPower"], 2);

    let (_, body) = send(&h.app, "POST", "/api/v1/game/upg/click", None).await;
    assert_eq!(body["earned"], 2);
}

#[tokio::test]
async fn tick_applies_interval_and_rejects_negative() {
    let h = harness();
    give_cookies(&h, "idle", 100).await;
    send(
        &h.app,
        "POST",
        "/api/v1/game/idle/producers",
        Some(json!({"producerId": "grandma"})),
    )
    .await;

    let (status, body) = send(
        &h.app,
        "POST",
        "/api/v1/game/idle/tick",
        Some(json!({"elapsedSeconds": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["produced"], 50);
    assert_eq!(body["newBalance"], 50);

    let (status, body) = send(
        &h.app,
        "POST",
        "/api/v1/game/idle/tick",
        Some(json!({"elapsedSeconds": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_interval");
}

#[tokio::test]
async fn state_and_sync_settle_elapsed_time() {
    let h = harness();
    give_cookies(&h, "afk", 15).await;
    send(
        &h.app,
        "POST",
        "/api/v1/game/afk/producers",
        Some(json!({"producerId": "cursor"})),
    )
    .await;

    h.clock.advance_secs(30);
    let (_, body) = send(&h.app, "GET", "/api/v1/game/afk", None).await;
    assert_eq!(body["balance"], 30);

    h.clock.advance_secs(5);
    let (status, body) = send(&h.app, "POST", "/api/v1/game/afk/sync", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["produced"], 5);
    assert_eq!(body["newBalance"], 35);
    assert_eq!(body["rate"], 1);
}

#[tokio::test]
async fn malformed_user_id_is_bad_request() {
    let h = harness();
    let (status, body) = send(&h.app, "POST", "/api/v1/game/bad%20id/click", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_user_id");
    assert!(h.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn leaderboard_and_stats() {
    let h = harness();
    give_cookies(&h, "alice", 300).await;
    give_cookies(&h, "bob", 900).await;
    give_cookies(&h, "carol", 10).await;
    send(&h.app, "POST", "/api/v1/game/carol/click", None).await;

    let (status, body) = send(&h.app, "GET", "/api/v1/leaderboard?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalPlayers"], 3);
    let board = body["leaderboard"].as_array().unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0]["userId"], "bob");
    assert_eq!(board[0]["rank"], 1);
    assert_eq!(board[1]["userId"], "alice");

    let (status, body) = send(&h.app, "GET", "/api/v1/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalUsers"], 3);
    assert_eq!(body["totalCookies"], 1211);
    assert_eq!(body["totalClicks"], 1);
}

#[tokio::test]
async fn leaderboard_limit_is_clamped() {
    let h = harness();
    for i in 0..3 {
        give_cookies(&h, &format!("p{i}"), i).await;
    }
    let (_, body) = send(&h.app, "GET", "/api/v1/leaderboard?limit=0", None).await;
    assert_eq!(body["leaderboard"].as_array().unwrap().len(), 1);
    let (_, body) = send(&h.app, "GET", "/api/v1/leaderboard?limit=5000", None).await;
    assert_eq!(body["leaderboard"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let h = harness();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/game/u/producers")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid_body");
    assert!(body["message"].is_string());

    let (status, body) = send(
        &h.app,
        "POST",
        "/api/v1/game/u/tick",
        Some(json!({"seconds": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_body");
    assert!(h.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn bad_leaderboard_query_gets_json_error() {
    let h = harness();
    let (status, body) = send(&h.app, "GET", "/api/v1/leaderboard?limit=lots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_query");
}
