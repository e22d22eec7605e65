//! Configuration management for the todo application.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Invalid values are reported with a warning and replaced by the default.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::seed::DEFAULT_SEED_URL;
use crate::types::SeedPolicy;

/// Prefix shared by every variable read here
pub const ENV_PREFIX: &str = "POCKET_TODO_";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Local persistence
    pub storage: StorageConfig,
    /// Remote seed list
    pub seed: SeedConfig,
    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Local persistence configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the snapshot file
    pub data_dir: PathBuf,
    /// Storage key; the file is `<data_dir>/<key>.json`
    pub key: String,
}

/// Remote seed list configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Endpoint returning a JSON array of todos
    pub url: String,
    /// Requested number of records (0 = no limit)
    pub limit: u32,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Retries after a transient failure
    pub retries: u32,
    /// Fetch on start when the stored collection is empty
    pub on_start: bool,
    /// How fetched todos combine with existing ones
    pub policy: SeedPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from `lookup`, which maps a full variable name to
    /// its value.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        Self {
            storage: StorageConfig {
                data_dir: var("DATA_DIR").map_or_else(|| PathBuf::from("./.pocket-todo"), PathBuf::from),
                key: var("STORAGE_KEY").unwrap_or_else(|| "todos".to_string()),
            },
            seed: SeedConfig {
                url: var("SEED_URL").unwrap_or_else(|| DEFAULT_SEED_URL.to_string()),
                limit: parse_or("SEED_LIMIT", var("SEED_LIMIT"), 20),
                timeout: parse_or("SEED_TIMEOUT_SECS", var("SEED_TIMEOUT_SECS"), 10),
                retries: parse_or("SEED_RETRIES", var("SEED_RETRIES"), 2),
                on_start: parse_or("SEED_ON_START", var("SEED_ON_START"), true),
                policy: parse_or("SEED_POLICY", var("SEED_POLICY"), SeedPolicy::Replace),
            },
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            shutdown_timeout: parse_or("SHUTDOWN_TIMEOUT_SECS", var("SHUTDOWN_TIMEOUT_SECS"), 5),
        }
    }

    /// Graceful shutdown timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

impl SeedConfig {
    /// Request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Requested number of records, `None` when unlimited
    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        if self.limit == 0 { None } else { Some(self.limit) }
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = raw else {
        return default;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(
                variable = %format!("{ENV_PREFIX}{name}"),
                value = %raw,
                error = %error,
                default = %default,
                "Invalid configuration value, using default"
            );
            default
        },
    }
}
