//! Voting core configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Tunables for the vote generator and request aggregator.
///
/// Can be parsed from a TOML fragment via [`VotingConfig::from_toml_str`] or
/// built programmatically. [`VotingConfig::test`] shortens every window so
/// integration tests run in seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VotingConfig {
    /// Minimum interval between successive vote regenerations for the same
    /// root, in seconds.
    #[serde(default = "default_round_time_s")]
    pub round_time_s: u64,

    /// Maximum age of a per-peer request pool, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Per-peer coalescing window, in milliseconds.
    #[serde(default = "default_small_delay_ms")]
    pub small_delay_ms: u64,

    /// Maximum queued request entries per peer pool.
    #[serde(default = "default_max_channel_requests")]
    pub max_channel_requests: usize,

    /// Global cap on cached local votes.
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// How long the generator worker waits for a batch to fill, in
    /// milliseconds.
    #[serde(default = "default_vote_generator_delay_ms")]
    pub vote_generator_delay_ms: u64,

    /// Queue size at which the worker waits a second delay for a full batch
    /// instead of flushing a small one immediately.
    #[serde(default = "default_vote_generator_threshold")]
    pub vote_generator_threshold: usize,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_round_time_s() -> u64 {
    45
}

fn default_max_delay_ms() -> u64 {
    300
}

fn default_small_delay_ms() -> u64 {
    50
}

fn default_max_channel_requests() -> usize {
    512
}

fn default_max_history() -> usize {
    100_000
}

fn default_vote_generator_delay_ms() -> u64 {
    100
}

fn default_vote_generator_threshold() -> usize {
    3
}

// ── Impl ───────────────────────────────────────────────────────────────

impl VotingConfig {
    /// Production defaults.
    pub fn production() -> Self {
        Self::default()
    }

    /// Shortened windows for tests: 1 s round time, 50 ms / 10 ms pool
    /// delays.
    pub fn test() -> Self {
        Self {
            round_time_s: 1,
            max_delay_ms: 50,
            small_delay_ms: 10,
            ..Self::default()
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("VotingConfig is always serializable to TOML")
    }

    pub fn round_time(&self) -> Duration {
        Duration::from_secs(self.round_time_s)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn small_delay(&self) -> Duration {
        Duration::from_millis(self.small_delay_ms)
    }

    pub fn vote_generator_delay(&self) -> Duration {
        Duration::from_millis(self.vote_generator_delay_ms)
    }
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            round_time_s: default_round_time_s(),
            max_delay_ms: default_max_delay_ms(),
            small_delay_ms: default_small_delay_ms(),
            max_channel_requests: default_max_channel_requests(),
            max_history: default_max_history(),
            vote_generator_delay_ms: default_vote_generator_delay_ms(),
            vote_generator_threshold: default_vote_generator_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_defaults() {
        let config = VotingConfig::production();
        assert_eq!(config.round_time(), Duration::from_secs(45));
        assert_eq!(config.max_delay(), Duration::from_millis(300));
        assert_eq!(config.small_delay(), Duration::from_millis(50));
        assert_eq!(config.max_history, 100_000);
    }

    #[test]
    fn test_profile_shortens_windows() {
        let config = VotingConfig::test();
        assert_eq!(config.round_time(), Duration::from_secs(1));
        assert_eq!(config.max_delay(), Duration::from_millis(50));
        assert_eq!(config.small_delay(), Duration::from_millis(10));
    }

    #[test]
    fn toml_roundtrip() {
        let config = VotingConfig::test();
        let text = config.to_toml_string();
        let parsed = VotingConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.round_time_s, config.round_time_s);
        assert_eq!(parsed.max_channel_requests, config.max_channel_requests);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let parsed = VotingConfig::from_toml_str("round_time_s = 7").unwrap();
        assert_eq!(parsed.round_time_s, 7);
        assert_eq!(parsed.max_delay_ms, 300);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(VotingConfig::from_toml_str("round_time_s = \"soon\"").is_err());
    }
}
