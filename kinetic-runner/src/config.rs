//! Serializable run configuration.
//!
//! One immutable `RunConfig` is constructed per run (TOML file or
//! defaults) and passed by reference into the batch pipeline, simulator,
//! and validator — no process-wide mutable state, so repeated and parallel
//! runs are deterministic. `run_id()` is a content hash usable for caching
//! and report provenance.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use kinetic_core::sim::SimParams;
use kinetic_core::state::StateParams;
use kinetic_core::strategy::{DefensiveParams, GrowthParams};

use crate::validator::BootstrapSettings;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

/// Errors loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Benchmark symbol driving the global regime and report comparison.
    pub benchmark: String,
    /// Volatility proxy symbol driving the crisis halt.
    pub volatility_proxy: String,
    /// Proxy close above this suspends all new entries for the day.
    pub crisis_level: f64,
    /// Inclusive simulation window; `None` means the full data range.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    pub sim: SimParams,
    pub state: StateParams,
    pub growth: GrowthParams,
    pub defensive: DefensiveParams,
    pub bootstrap: BootstrapSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            benchmark: "SPY".to_string(),
            volatility_proxy: "^VIX".to_string(),
            crisis_level: 35.0,
            start_date: None,
            end_date: None,
            sim: SimParams::default(),
            state: StateParams::default(),
            growth: GrowthParams::default(),
            defensive: DefensiveParams::default(),
            bootstrap: BootstrapSettings::default(),
        }
    }
}

impl RunConfig {
    /// Parse a TOML document. Missing fields fall back to defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.benchmark.is_empty() {
            return Err(ConfigError::Invalid("benchmark symbol must not be empty"));
        }
        if !(self.crisis_level > 0.0) {
            return Err(ConfigError::Invalid("crisis_level must be > 0"));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ConfigError::Invalid("end_date precedes start_date"));
            }
        }
        Ok(())
    }

    /// Deterministic content hash of this configuration.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
