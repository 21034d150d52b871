//! Configuration for feedindex
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::query::TiePolicy;

/// Main configuration for a feed engine
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the persisted feed index
    /// Internal structure:
    ///   {data_dir}/
    ///     └── feeds.sst        (both feed indexes, one sorted table)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Volatile State Configuration
    // -------------------------------------------------------------------------
    /// JSON snapshot of unstable units, if any
    pub volatile_snapshot: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Query Configuration
    // -------------------------------------------------------------------------
    /// Tie policy for reads that don't specify one
    pub default_tie_policy: TiePolicy,

    /// Queries slower than this are logged at warn level (milliseconds)
    pub slow_query_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./feedindex_data"),
            volatile_snapshot: None,
            default_tie_policy: TiePolicy::Last,
            slow_query_ms: 200,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the volatile state snapshot file
    pub fn volatile_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.volatile_snapshot = Some(path.into());
        self
    }

    /// Set the default tie policy
    pub fn default_tie_policy(mut self, policy: TiePolicy) -> Self {
        self.config.default_tie_policy = policy;
        self
    }

    /// Set the slow query threshold (in milliseconds)
    pub fn slow_query_ms(mut self, ms: u64) -> Self {
        self.config.slow_query_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
