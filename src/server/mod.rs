//! HTTP surface of the cookie economy.

pub mod error;
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use signal::ctrl_c;
#[cfg(unix)]
use signal::unix::{signal, SignalKind};
use tokio::{net::TcpListener, signal, task::JoinHandle, time::MissedTickBehavior};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::clock::SystemClock;
use crate::config::{Config, StoreBackend};
use crate::error::StartupError;
use crate::game::{Catalog, Engine, EngineSettings};
use crate::store::{MemoryStore, RedisStore, SnapshotStore};
use routes::*;

pub struct AppState {
    pub engine: Engine,
    pub config: Config,
}

impl AppState {
    /// Load the catalog and connect the configured store.
    pub async fn new(config: Config) -> Result<Arc<Self>, StartupError> {
        let catalog = match &config.catalog_path {
            Some(path) => {
                info!("Loading catalog from {}", path.display());
                Catalog::from_file(path)?
            }
            None => Catalog::default(),
        };
        info!(
            producers = catalog.producers().len(),
            click_upgrades = catalog.click_upgrades().len(),
            "Catalog loaded"
        );

        let store: Arc<dyn SnapshotStore> = match config.store_backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Redis => {
                info!("Connecting to Redis at {}", config.redis_url);
                Arc::new(RedisStore::connect(&config.redis_url, config.cas_retries).await?)
            }
        };

        let engine = Engine::new(
            store,
            Arc::new(catalog),
            Arc::new(SystemClock),
            EngineSettings {
                store_timeout: config.store_timeout,
                base_click_power: config.base_click_power,
            },
        );
        Ok(Self::with_engine(engine, config))
    }

    pub fn with_engine(engine: Engine, config: Config) -> Arc<Self> {
        Arc::new(Self { engine, config })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any)
        .max_age(Duration::from_secs(60 * 60));

    let game = Router::new()
        .route("/catalog", get(catalog_handler))
        .route("/game/:user_id", get(game_handler))
        .route("/game/:user_id/click", post(click_handler))
        .route("/game/:user_id/producers", post(producer_handler))
        .route("/game/:user_id/click-upgrades", post(click_upgrade_handler))
        .route("/game/:user_id/tick", post(tick_handler))
        .route("/game/:user_id/sync", post(sync_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .route("/stats", get(stats_handler));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .nest("/api/v1", game)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Settle every player on a fixed interval until the task is aborted.
pub fn spawn_ticker(state: Arc<AppState>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            interval.tick().await;
            match state.engine.settle_all().await {
                Ok(settled) => info!(settled, "Periodic settle complete"),
                Err(e) => warn!("Periodic settle skipped: {e}"),
            }
        }
    })
}

pub async fn start_server(config: Config) -> Result<(), StartupError> {
    info!("Initializing state...");
    let state = AppState::new(config).await?;

    let ticker = state
        .config
        .tick_interval
        .map(|period| {
            info!("Periodic ticker every {period:?}");
            spawn_ticker(state.clone(), period)
        });

    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!(store = state.engine.store_backend(), "Server running on {address}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(ticker) = ticker {
        ticker.abort();
    }
    if let Err(e) = &served {
        error!("Server error: {e}");
    }
    info!("Server shutting down...");
    served.map_err(StartupError::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
