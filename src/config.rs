//! Runtime configuration: optional TOML file, then environment overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Environment variable holding the Geoapify API key
pub const API_KEY_ENV: &str = "GEOAPIFY_KEY";
/// Key name used by the browser build of the map page
pub const LEGACY_API_KEY_ENV: &str = "VITE_GEOAPIFY_KEY";
pub const LISTEN_ENV: &str = "SIMA_LISTEN";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    /// Geoapify API root, e.g. `https://api.geoapify.com`
    pub base_url: String,
    pub api_key: Option<String>,
    /// ISO 3166-1 alpha-2 code used in the geocode filter
    pub country_code: String,
    /// Appended to the free-text query
    pub country_name: String,
    /// Boundary simplification tier
    pub geometry: String,
    pub timeout_secs: u64,
    /// Attempts per request on transport failure; 1 disables retries
    pub max_attempts: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.geoapify.com".to_string(),
            api_key: None,
            country_code: "in".to_string(),
            country_name: "India".to_string(),
            geometry: "geometry_10000".to_string(),
            timeout_secs: 30,
            max_attempts: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    /// Map sessions unused for this long are dropped
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
            session_idle_secs: 1800,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load the file if given, then apply process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Warn when no API key is configured. Call once every override
    /// (file, environment, command line) has been applied.
    ///
    /// Requests still go out without a key and fail at the provider.
    pub fn warn_if_keyless(&self) -> bool {
        let keyless = self.provider.api_key.is_none();
        if keyless {
            warn!(
                "{} is not set; provider requests will be sent without a key",
                API_KEY_ENV
            );
        }
        keyless
    }

    /// Apply overrides from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(API_KEY_ENV).or_else(|| non_empty(LEGACY_API_KEY_ENV)) {
            debug!("Using API key from environment");
            self.provider.api_key = Some(key);
        }

        if let Some(listen) = non_empty(LISTEN_ENV) {
            self.server.listen = listen;
        }
    }
}
