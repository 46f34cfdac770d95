//! Cookie economy: catalog, player state, pure rules and the transaction engine.

pub mod catalog;
pub mod economy;
pub mod engine;
pub mod logic;
pub mod save;
pub mod simulator;
pub mod state;
pub mod view;

pub use catalog::Catalog;
pub use engine::{Engine, EngineSettings, GlobalStats, Leaderboard, LeaderboardEntry};
pub use state::PlayerState;
