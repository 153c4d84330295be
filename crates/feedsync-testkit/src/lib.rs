//! feedsync Testing Infrastructure
//!
//! Builders for every entity model, scripted fetchers and a recording bus
//! listener, shared by the unit and integration tests of the other crates.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! feedsync-testkit = { workspace = true }
//! ```
//!
//! ```rust
//! use feedsync_testkit::*;
//!
//! let activity = ActivityBuilder::new("a1").user("alice").fid("user:alice").build();
//! assert_eq!(activity.user.id, "alice");
//! ```

pub mod builders;
pub mod mocks;

pub use builders::*;
pub use mocks::*;

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Once;

/// Deterministic timestamp `offset_secs` after a fixed epoch.
pub fn test_time(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + offset_secs, 0).unwrap()
}

/// Install a test-writer tracing subscriber once per process.
///
/// Honors `RUST_LOG`; silent by default.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
            )
            .with_test_writer()
            .try_init();
    });
}
