//! Loader configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PAGE_LOADER_*)
//! 2. TOML config file (if PAGE_LOADER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Names of the DOM attributes the loader reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementAttrs {
    /// Marks the swappable content root.
    pub container: String,
    /// Staging marker on incoming content while both roots coexist.
    pub new_container: String,
    /// Incoming transition marker.
    pub transition_in: String,
    /// Outgoing transition marker.
    pub transition_out: String,
    /// Marks script/style elements whose URLs must match across visits.
    pub track: String,
    /// Set on the content root to keep the page out of the cache.
    pub no_cache: String,
    /// Set on a link to fall through to native navigation.
    pub forbid_load: String,
    /// Set on a link to skip prefetching.
    pub forbid_prefetch: String,
}

impl Default for ElementAttrs {
    fn default() -> Self {
        Self {
            container: "data-page-container".into(),
            new_container: "data-page-new".into(),
            transition_in: "data-page-in".into(),
            transition_out: "data-page-out".into(),
            track: "data-page-track".into(),
            no_cache: "data-page-no-cache".into(),
            forbid_load: "data-page-no-load".into(),
            forbid_prefetch: "data-page-no-prefetch".into(),
        }
    }
}

impl ElementAttrs {
    pub(crate) fn named(&self) -> [(&'static str, &str); 8] {
        [
            ("attributes.container", &self.container),
            ("attributes.new_container", &self.new_container),
            ("attributes.transition_in", &self.transition_in),
            ("attributes.transition_out", &self.transition_out),
            ("attributes.track", &self.track),
            ("attributes.no_cache", &self.no_cache),
            ("attributes.forbid_load", &self.forbid_load),
            ("attributes.forbid_prefetch", &self.forbid_prefetch),
        ]
    }
}

/// Loader configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PAGE_LOADER_*)
/// 2. TOML config file (if PAGE_LOADER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Minutes a cached visit stays fresh.
    ///
    /// Set via PAGE_LOADER_CACHE_TIMEOUT_MINUTES environment variable.
    #[serde(default = "default_cache_timeout_minutes")]
    pub cache_timeout_minutes: u64,

    /// Whether hover/touch interactions prefetch links.
    ///
    /// Set via PAGE_LOADER_USE_PREFETCH environment variable.
    #[serde(default = "default_true")]
    pub use_prefetch: bool,

    /// Whether visits are cached at all.
    ///
    /// Set via PAGE_LOADER_USE_CACHE environment variable.
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Document fetch timeout in milliseconds.
    ///
    /// Set via PAGE_LOADER_FETCH_TIMEOUT_MS environment variable.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Fallback for each transition wait in milliseconds.
    ///
    /// Set via PAGE_LOADER_TRANSITION_TIMEOUT_MS environment variable.
    #[serde(default = "default_transition_timeout_ms")]
    pub transition_timeout_ms: u64,

    /// User-Agent string for document requests.
    ///
    /// Set via PAGE_LOADER_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// DOM marker names.
    ///
    /// Set via PAGE_LOADER_ATTRIBUTES__<NAME> environment variables.
    #[serde(default)]
    pub attributes: ElementAttrs,
}

fn default_cache_timeout_minutes() -> u64 {
    10
}

fn default_fetch_timeout_ms() -> u64 {
    8_000
}

fn default_transition_timeout_ms() -> u64 {
    3_000
}

fn default_user_agent() -> String {
    "page-loader/0.1".into()
}

fn default_true() -> bool {
    true
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_timeout_minutes: default_cache_timeout_minutes(),
            use_prefetch: true,
            use_cache: true,
            fetch_timeout_ms: default_fetch_timeout_ms(),
            transition_timeout_ms: default_transition_timeout_ms(),
            user_agent: default_user_agent(),
            attributes: ElementAttrs::default(),
        }
    }
}

impl LoaderConfig {
    /// Cache freshness window.
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_timeout_minutes.saturating_mul(60))
    }

    /// Fetch timeout as Duration for use with reqwest/tokio.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Fallback timeout for a single transition wait.
    pub fn transition_timeout(&self) -> Duration {
        Duration::from_millis(self.transition_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PAGE_LOADER_`
    /// 2. TOML file from `PAGE_LOADER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PAGE_LOADER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PAGE_LOADER_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
