//! Reusable test utilities:
//! - A mock Redfish controller built on wiremock
//! - Fast connection settings and config builders for integration tests

// Allow unused code in test fixtures - they are utilities shared across
// several integration test binaries.
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_controller;
pub mod test_config;

pub use mock_controller::MockController;
pub use test_config::*;
