//! Delve loot simulator core.
//!
//! Rolls simulated delve runs against a static drop table, aggregates the
//! results, and answers closed-form questions about the odds.

pub mod assets;
pub mod clock;
pub mod common_loot;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod event;
pub mod rng;
pub mod roll;
pub mod settings;
pub mod snapshot;
pub mod store;
pub mod types;
