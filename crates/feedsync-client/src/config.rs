//! Runtime configuration
//!
//! [`FeedsConfig`] is plain serde data with defaults for every field. It can
//! be built in code with the `with_*` methods, read from TOML, and overridden
//! from `FEEDSYNC_*` environment variables. Durations are written as integer
//! milliseconds.

use feedsync_core::{Backoff, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Offending path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The TOML did not parse
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override did not parse
    #[error("invalid value {value:?} for {key}")]
    InvalidEnv {
        /// Variable name
        key: String,
        /// Raw value
        value: String,
    },

    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "FEEDSYNC_";

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Batching windows of a request coalescer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoalescerConfig {
    /// Quiet period after the latest key before a batch fires
    #[serde(with = "duration_ms", rename = "initial_delay_ms")]
    pub initial_delay: Duration,
    /// Longest a batch waits after its first key
    #[serde(with = "duration_ms", rename = "max_delay_ms")]
    pub max_delay: Duration,
    /// Pending-set size that fires a batch at once
    pub max_batch_size: usize,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(200),
            max_batch_size: 100,
        }
    }
}

impl CoalescerConfig {
    /// Set the quiet period
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the batch age cap
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the size threshold
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::invalid("coalescer.max_batch_size must be at least 1"));
        }
        if self.max_delay < self.initial_delay {
            return Err(ConfigError::invalid(
                "coalescer.max_delay_ms must not be shorter than initial_delay_ms",
            ));
        }
        Ok(())
    }
}

/// Retry schedule for background batch fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, the first included
    pub max_attempts: u32,
    /// Delay before the first retry
    #[serde(with = "duration_ms", rename = "base_delay_ms")]
    pub base_delay: Duration,
    /// Delay cap
    #[serde(with = "duration_ms", rename = "max_delay_ms")]
    pub max_delay: Duration,
    /// Randomize delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// The policy these settings describe.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::exponential()
            .with_max_attempts(self.max_attempts)
            .with_backoff(Backoff::Exponential {
                base: self.base_delay,
                max: self.max_delay,
            })
            .with_jitter(self.jitter)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid("retry.max_attempts must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Root
// ============================================================================

/// Configuration of a [`FeedsSession`](crate::FeedsSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    /// Signed-in user; drives own-reaction bookkeeping and insertion
    pub user_id: String,
    /// Default page size for list queries without a limit
    pub page_limit: u32,
    /// Batching of capability and own-value lookups
    pub coalescer: CoalescerConfig,
    /// Retries of those lookups
    pub retry: RetryConfig,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            page_limit: 25,
            coalescer: CoalescerConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl FeedsConfig {
    /// Defaults for `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Set the default page size
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    /// Replace the coalescer settings
    pub fn with_coalescer(mut self, coalescer: CoalescerConfig) -> Self {
        self.coalescer = coalescer;
        self
    }

    /// Replace the retry settings
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Parse TOML. Missing fields take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `FEEDSYNC_*` overrides from the process environment.
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `FEEDSYNC_*` overrides from `vars`. Unknown keys are ignored.
    pub fn merge_with_vars(
        &mut self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "USER_ID" => self.user_id = value,
                "PAGE_LIMIT" => self.page_limit = parse(&key, &value)?,
                "COALESCER_INITIAL_DELAY_MS" => {
                    self.coalescer.initial_delay = Duration::from_millis(parse(&key, &value)?);
                }
                "COALESCER_MAX_DELAY_MS" => {
                    self.coalescer.max_delay = Duration::from_millis(parse(&key, &value)?);
                }
                "COALESCER_MAX_BATCH_SIZE" => self.coalescer.max_batch_size = parse(&key, &value)?,
                "RETRY_MAX_ATTEMPTS" => self.retry.max_attempts = parse(&key, &value)?,
                "RETRY_BASE_DELAY_MS" => self.retry.base_delay = Duration::from_millis(parse(&key, &value)?),
                "RETRY_MAX_DELAY_MS" => self.retry.max_delay = Duration::from_millis(parse(&key, &value)?),
                "RETRY_JITTER" => self.retry.jitter = parse(&key, &value)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_limit == 0 {
            return Err(ConfigError::invalid("page_limit must be at least 1"));
        }
        self.coalescer.validate()?;
        self.retry.validate()
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = FeedsConfig::from_toml_str(
            r#"
            user_id = "alice"

            [coalescer]
            initial_delay_ms = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.user_id, "alice");
        assert_eq!(config.page_limit, 25);
        assert_eq!(config.coalescer.initial_delay, Duration::from_millis(10));
        assert_eq!(config.coalescer.max_delay, Duration::from_millis(200));
        assert_eq!(config.retry, RetryConfig::default());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = FeedsConfig::new("alice");
        config
            .merge_with_vars([
                ("FEEDSYNC_PAGE_LIMIT".to_string(), "50".to_string()),
                ("FEEDSYNC_RETRY_JITTER".to_string(), "true".to_string()),
                ("OTHER_PAGE_LIMIT".to_string(), "1".to_string()),
            ])
            .unwrap();
        assert_eq!(config.page_limit, 50);
        assert!(config.retry.jitter);
    }

    #[test]
    fn bad_env_value_is_reported() {
        let mut config = FeedsConfig::default();
        let err = config
            .merge_with_vars([("FEEDSYNC_PAGE_LIMIT".to_string(), "many".to_string())])
            .unwrap_err();
        assert_matches!(err, ConfigError::InvalidEnv { key, .. } if key == "FEEDSYNC_PAGE_LIMIT");
    }

    #[test]
    fn validation_rejects_inverted_delays() {
        let config = FeedsConfig::default().with_coalescer(
            CoalescerConfig::default()
                .with_initial_delay(Duration::from_millis(300))
                .with_max_delay(Duration::from_millis(100)),
        );
        assert_matches!(config.validate(), Err(ConfigError::Invalid(_)));
        assert!(FeedsConfig::default().validate().is_ok());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_limit = 10\n[retry]\nmax_attempts = 5").unwrap();
        let config = FeedsConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.page_limit, 10);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn retry_policy_reflects_settings() {
        let policy = RetryConfig::default().policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(
            policy.backoff,
            Backoff::Exponential {
                base: Duration::from_millis(100),
                max: Duration::from_secs(2),
            }
        );
    }
}
