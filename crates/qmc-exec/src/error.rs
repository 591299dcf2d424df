//! Error types for the execution coordinator.

use thiserror::Error;

use qmc_ir::IrError;
use qmc_mem::MemError;
use qmc_sim::SimError;

use crate::config::ConfigError;

/// Errors raised by analysis, simulation and benchmarking.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecError {
    /// Circuit failed construction or validation.
    #[error(transparent)]
    Circuit(#[from] IrError),

    /// State-vector engine failure.
    #[error(transparent)]
    Simulation(#[from] SimError),

    /// Estimator or chunk planner rejected its inputs.
    #[error(transparent)]
    Memory(#[from] MemError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The run needs more memory than the configured budget.
    #[error(
        "Simulation requires {required_bytes} bytes ({required_gb:.3} GB) but the budget is {budget_bytes} bytes ({budget_gb:.3} GB); {}",
        .remedies.join("; ")
    )]
    ResourceExhausted {
        /// Estimated total bytes.
        required_bytes: u64,
        /// Configured budget in bytes.
        budget_bytes: u64,
        /// Estimated total in GB.
        required_gb: f64,
        /// Configured budget in GB.
        budget_gb: f64,
        /// Suggested changes, most relevant first.
        remedies: Vec<String>,
    },

    /// Requested backend is disabled or not present.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// Worker pool could not be built.
    #[error("Worker pool error: {0}")]
    Pool(String),

    /// Report file could not be read or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for coordinator operations.
pub type ExecResult<T> = Result<T, ExecError>;
