//! Error types shared by the engine and the snapshot stores.

use std::time::Duration;

use thiserror::Error;

/// Failures of a snapshot store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Update for {user_id} lost {attempts} compare-and-swap races")]
    Contention { user_id: String, attempts: u32 },

    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Outcome taxonomy of the transaction engine.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("Unknown producer: {0}")]
    UnknownProducer(String),

    #[error("Unknown upgrade: {0}")]
    UnknownUpgrade(String),

    #[error("Not enough cookies. Need {cost}, have {balance}")]
    InsufficientFunds { cost: u64, balance: u64 },

    #[error("Invalid interval: {0} seconds")]
    InvalidInterval(f64),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl GameError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::UnknownProducer(_) => "unknown_producer",
            GameError::UnknownUpgrade(_) => "unknown_upgrade",
            GameError::InsufficientFunds { .. } => "insufficient_funds",
            GameError::InvalidInterval(_) => "invalid_interval",
            GameError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

/// Failures that abort process startup.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Catalog(#[from] crate::game::catalog::CatalogError),

    #[error("Failed to connect snapshot store: {0}")]
    Store(#[from] StoreError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GameResult<T> = Result<T, GameError>;
pub type StoreResult<T> = Result<T, StoreError>;
