//! Simulator configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with QMC_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::Path;

use qmc_ir::{GateFallback, Precision};
use qmc_sim::NoiseModel;

use crate::strategy::StrategyChoice;

/// Options recognised by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimConfig {
    /// Allow the accelerated and hybrid strategies
    #[serde(default)]
    pub enable_accelerated: bool,

    /// Memory budget in GB (1 GB = 1024³ bytes)
    #[serde(default = "default_max_memory_gb", rename = "maxMemoryGB")]
    pub max_memory_gb: f64,

    /// Size of the worker pool
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Amplitude precision for every run
    #[serde(default)]
    pub precision: Precision,

    /// Strategy used when the caller passes `auto`
    #[serde(default)]
    pub strategy: StrategyChoice,

    /// Handling of unknown gate names in circuit input
    #[serde(default)]
    pub gate_fallback: GateFallback,

    /// Parallelization ratio above which level parallelism is chosen
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: f64,

    /// Headroom divisor when sizing memory chunks
    #[serde(default = "default_chunk_safety_factor")]
    pub chunk_safety_factor: f64,

    /// Fixed seed for gate-time randomness and sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Pauli errors injected after every unitary gate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<NoiseModel>,
}

fn default_max_memory_gb() -> f64 {
    8.0
}

fn default_max_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

fn default_parallel_threshold() -> f64 {
    0.2
}

fn default_chunk_safety_factor() -> f64 {
    4.0
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            enable_accelerated: false,
            max_memory_gb: default_max_memory_gb(),
            max_workers: default_max_workers(),
            precision: Precision::default(),
            strategy: StrategyChoice::default(),
            gate_fallback: GateFallback::default(),
            parallel_threshold: default_parallel_threshold(),
            chunk_safety_factor: default_chunk_safety_factor(),
            seed: None,
            noise: None,
        }
    }
}

impl SimConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config = Self::from_yaml(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML text without validating it.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        serde_yaml_ng::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml_ng::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        SimConfig::default().merge_env()
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => SimConfig::default(),
        };
        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `QMC_*` process environment variables.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Override fields from `QMC_*` variables resolved by `lookup`.
    ///
    /// Only variables that are set override the current values. A set
    /// variable that does not parse is an error.
    pub fn merge_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::ParseError(format!("{key}: cannot parse '{value}'")))
        }

        if let Some(v) = lookup("QMC_ENABLE_ACCELERATED") {
            self.enable_accelerated = parsed("QMC_ENABLE_ACCELERATED", &v)?;
        }
        if let Some(v) = lookup("QMC_MAX_MEMORY_GB") {
            self.max_memory_gb = parsed("QMC_MAX_MEMORY_GB", &v)?;
        }
        if let Some(v) = lookup("QMC_MAX_WORKERS") {
            self.max_workers = parsed("QMC_MAX_WORKERS", &v)?;
        }
        if let Some(v) = lookup("QMC_PRECISION") {
            self.precision = Precision::from_name(&v)
                .ok_or_else(|| ConfigError::ParseError(format!("QMC_PRECISION: unknown precision '{v}'")))?;
        }
        if let Some(v) = lookup("QMC_STRATEGY") {
            self.strategy = StrategyChoice::from_name(&v)
                .ok_or_else(|| ConfigError::ParseError(format!("QMC_STRATEGY: unknown strategy '{v}'")))?;
        }
        if let Some(v) = lookup("QMC_GATE_FALLBACK") {
            self.gate_fallback = GateFallback::from_name(&v).ok_or_else(|| {
                ConfigError::ParseError(format!("QMC_GATE_FALLBACK: unknown policy '{v}'"))
            })?;
        }
        if let Some(v) = lookup("QMC_PARALLEL_THRESHOLD") {
            self.parallel_threshold = parsed("QMC_PARALLEL_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("QMC_CHUNK_SAFETY_FACTOR") {
            self.chunk_safety_factor = parsed("QMC_CHUNK_SAFETY_FACTOR", &v)?;
        }
        if let Some(v) = lookup("QMC_SEED") {
            self.seed = Some(parsed("QMC_SEED", &v)?);
        }
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_memory_gb.is_finite() || self.max_memory_gb <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "maxMemoryGB must be a positive number, got {}",
                self.max_memory_gb
            )));
        }
        if self.max_workers == 0 {
            return Err(ConfigError::ValidationError(
                "maxWorkers must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.parallel_threshold) {
            return Err(ConfigError::ValidationError(format!(
                "parallelThreshold must lie in [0, 1], got {}",
                self.parallel_threshold
            )));
        }
        if !self.chunk_safety_factor.is_finite() || self.chunk_safety_factor <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "chunkSafetyFactor must be a positive number, got {}",
                self.chunk_safety_factor
            )));
        }
        if let Some(noise) = &self.noise {
            noise
                .validate()
                .map_err(|e| ConfigError::ValidationError(format!("noise: {e}")))?;
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
