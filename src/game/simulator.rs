//! Balance simulator for the default catalog.
//! Run with: cargo test -p cookie-economy simulate_greedy -- --nocapture
