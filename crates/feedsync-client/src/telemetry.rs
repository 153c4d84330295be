//! Logging setup
//!
//! feedsync only emits `tracing` events. Applications that do not install a
//! subscriber of their own can call [`init_tracing`].

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "FEEDSYNC_LOG";

/// Default filter when [`LOG_ENV`] is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Install a formatting subscriber filtered by `FEEDSYNC_LOG`.
///
/// Safe to call repeatedly; only the first call has an effect. Returns
/// whether this process uses the feedsync subscriber, which is `false` when
/// another global subscriber was installed first.
pub fn init_tracing() -> bool {
    *INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
    })
}
