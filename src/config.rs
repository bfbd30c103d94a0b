//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Sweep loop interval in milliseconds
    pub gc_interval_ms: u64,
    /// Grace period in milliseconds a record survives once unreferenced
    pub min_ttl_ms: u64,
    /// Maximum record age in milliseconds, 0 = never expires by age
    pub max_ttl_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `GC_INTERVAL_MS` - Sweep frequency in milliseconds (default: 1000)
    /// - `MIN_TTL_MS` - Default grace period in milliseconds (default: 0)
    /// - `MAX_TTL_MS` - Default maximum age in milliseconds (default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gc_interval_ms: env_u64("GC_INTERVAL_MS").unwrap_or(defaults.gc_interval_ms),
            min_ttl_ms: env_u64("MIN_TTL_MS").unwrap_or(defaults.min_ttl_ms),
            max_ttl_ms: env_u64("MAX_TTL_MS").unwrap_or(defaults.max_ttl_ms),
        }
    }

    /// Sweep loop interval.
    pub fn gc_interval(&self) -> Duration {
        Duration::from_millis(self.gc_interval_ms)
    }

    /// Default grace period for fetched records.
    pub fn min_ttl(&self) -> Duration {
        Duration::from_millis(self.min_ttl_ms)
    }

    /// Default maximum age for fetched records.
    pub fn max_ttl(&self) -> Duration {
        Duration::from_millis(self.max_ttl_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gc_interval_ms: 1000,
            min_ttl_ms: 0,
            max_ttl_ms: 0,
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
