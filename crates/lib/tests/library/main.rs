//! End-to-end tests for pomalign-lib.

mod common;
mod pipeline_tests;
mod toolchain_tests;
