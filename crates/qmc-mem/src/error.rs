//! Error types for the memory crate.

use thiserror::Error;

/// Errors raised by estimation and chunk planning.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MemError {
    /// A chunk must hold at least one amplitude.
    #[error("Maximum chunk size must be positive")]
    ZeroChunkSize,

    /// Safety factor must be a positive finite number.
    #[error("Invalid chunk safety factor: {0}")]
    InvalidSafetyFactor(f64),

    /// Budget must be a non-negative finite number of GB.
    #[error("Invalid memory budget: {0} GB")]
    InvalidBudget(f64),
}

/// Result type for memory operations.
pub type MemResult<T> = Result<T, MemError>;
