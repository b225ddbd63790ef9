//! Integration tests: in-memory provider → collector → pipeline → report.

mod mock_provider;
mod pipeline;
