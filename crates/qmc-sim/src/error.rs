//! Error types for the state-vector engine.

use thiserror::Error;

/// Errors raised by the state-vector engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// Width cannot be addressed on this platform.
    #[error("Cannot simulate {qubits} qubits: at most {max} are addressable")]
    TooManyQubits {
        /// Requested width.
        qubits: u32,
        /// Platform limit.
        max: u32,
    },

    /// The allocator refused the amplitude buffer.
    #[error("Failed to allocate {bytes} bytes for a {qubits}-qubit state")]
    Allocation {
        /// Requested width.
        qubits: u32,
        /// Requested bytes.
        bytes: u64,
    },

    /// Gate cannot be turned into a kernel.
    #[error("Malformed gate {gate}: {reason}")]
    MalformedGate {
        /// Rendered gate.
        gate: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The probability distribution could not be sampled.
    #[error("Sampling failed: {0}")]
    Sampling(String),

    /// Noise rates or scale factor out of range.
    #[error("Invalid noise model: {0}")]
    InvalidNoise(String),

    /// Amplitudes do not form a valid state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type for engine operations.
pub type SimResult<T> = Result<T, SimError>;
