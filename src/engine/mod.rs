//! Retrieval engine: provider → cohort with bets → report.

pub mod collector;

pub use collector::{Collected, Collector};
