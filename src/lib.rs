//! Market accuracy: how well does a prediction market forecast a topic?
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod platforms;
pub mod types;
