//! CLI integration tests that run the full pipeline.

mod common;
mod run_tests;
