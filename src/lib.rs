//! Cookie economy service: an authoritative incremental-game backend.
//!
//! Players click for cookies, buy producers that yield cookies per second and
//! buy click upgrades. Every mutation goes through [`game::Engine`], which runs
//! it as one atomic read-modify-write against a [`store::SnapshotStore`].

pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod server;
pub mod store;
