//! Configuration validation rules.
//!
//! This module provides validation logic for `LoaderConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::LoaderConfig;
use thiserror::Error;

const MAX_CACHE_TIMEOUT_MINUTES: u64 = 7 * 24 * 60;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl LoaderConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `fetch_timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `cache_timeout_minutes` exceeds one week
    /// - `transition_timeout_ms` exceeds 1 minute
    /// - `user_agent` is empty
    /// - any attribute name is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "fetch_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.fetch_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "fetch_timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.cache_timeout_minutes > MAX_CACHE_TIMEOUT_MINUTES {
            return Err(ConfigError::Invalid {
                field: "cache_timeout_minutes".into(),
                reason: format!("must not exceed one week ({MAX_CACHE_TIMEOUT_MINUTES} minutes)"),
            });
        }

        if self.transition_timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "transition_timeout_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        for (field, value) in self.attributes.named() {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not be empty".into() });
            }
        }

        if self.cache_timeout_minutes == 0 && self.use_cache {
            tracing::warn!(
                cache_timeout_minutes = self.cache_timeout_minutes,
                "cache is enabled with a zero timeout; every cached visit is stale on lookup"
            );
        }

        Ok(())
    }
}
