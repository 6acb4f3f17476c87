//! Integration tests for recdeck
//!
//! Tests are organized by component:
//! - api_test: both server clients against a mock server
//! - related_test: related rows, continuation splicing, retries
//! - app_test: screen navigation, notices, rendering, artwork fallbacks
//! - cli_test: argument parsing and command handlers

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
