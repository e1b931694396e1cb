//! Snapshot quality checks and derived statistics.
//!
//! Every entry point is a pure function of its inputs: each call builds its
//! own accumulator, so nothing leaks between snapshots and the functions are
//! safe to call concurrently.

mod checks;
mod config;
mod stats;
mod types;

pub use checks::{validate, validate_at};
pub use config::{FreshnessPolicy, Geofence, ValidatorConfig};
pub use stats::{coverage, statistics, statistics_at};
pub use types::{Coverage, Statistics, ValidationResult};
