//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod editor_helpers;

use std::time::Duration;

/// How long a test waits for a background import
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}
