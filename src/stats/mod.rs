//! Match statistics, kept across runs.

pub mod log;

pub use log::{Counter, MatchStats, StatsError, StatsSnapshot};
