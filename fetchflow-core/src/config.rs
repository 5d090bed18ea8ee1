//! Flow configuration

use crate::flow::connection::ReachabilityMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the cache file; unset or empty disables persistence.
pub const ENV_PERSISTENCE_PATH: &str = "FETCHFLOW_PERSISTENCE_PATH";
/// Environment variable toggling the live reachability check.
pub const ENV_CHECK_REACHABILITY: &str = "FETCHFLOW_CHECK_REACHABILITY";
/// Environment variable toggling pruning for collection flows.
pub const ENV_PRUNE: &str = "FETCHFLOW_PRUNE";

/// Errors raised while reading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to something that is not a boolean
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Where, if anywhere, a flow caches its result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "path", rename_all = "snake_case")]
pub enum PersistenceConfiguration {
    #[default]
    Disabled,
    Enabled(PathBuf),
}

impl PersistenceConfiguration {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Disabled => None,
            Self::Enabled(path) => Some(path),
        }
    }
}

/// Controls how a factory wires a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfiguration {
    /// Cache location, or none
    pub persistence: PersistenceConfiguration,
    /// Probe the network before each request of an endpoint-derived connection
    pub check_reachability: bool,
    /// Drop malformed elements instead of failing (collection flows only)
    pub prune: bool,
}

impl Default for FlowConfiguration {
    fn default() -> Self {
        Self {
            persistence: PersistenceConfiguration::Disabled,
            check_reachability: true,
            prune: false,
        }
    }
}

impl FlowConfiguration {
    #[must_use]
    pub fn with_persistence(mut self, path: impl Into<PathBuf>) -> Self {
        self.persistence = PersistenceConfiguration::Enabled(path.into());
        self
    }

    #[must_use]
    pub const fn without_reachability_check(mut self) -> Self {
        self.check_reachability = false;
        self
    }

    #[must_use]
    pub const fn with_pruning(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    #[must_use]
    pub const fn reachability(&self) -> ReachabilityMode {
        ReachabilityMode::from_check(self.check_reachability)
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a boolean variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup, starting from the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a boolean variable cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_PERSISTENCE_PATH).filter(|p| !p.trim().is_empty()) {
            config.persistence = PersistenceConfiguration::Enabled(PathBuf::from(path.trim()));
        }
        if let Some(value) = lookup(ENV_CHECK_REACHABILITY) {
            config.check_reachability = parse_flag(ENV_CHECK_REACHABILITY, &value)?;
        }
        if let Some(value) = lookup(ENV_PRUNE) {
            config.prune = parse_flag(ENV_PRUNE, &value)?;
        }

        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
