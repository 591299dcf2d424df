//! Memory estimation and chunk planning for the qmc simulator.
//!
//! The estimator answers three questions before any state is allocated:
//! how many bytes a run needs, whether that fits the configured budget, and
//! what to change when it does not.
//!
//! ```rust
//! use qmc_ir::{Circuit, Precision};
//! use qmc_mem::{estimate, fits_budget};
//!
//! let circuit = Circuit::with_qubits("ten", 10);
//! let est = estimate(&circuit, Precision::Single);
//! assert_eq!(est.amplitude_bytes, 8192);
//! assert!(fits_budget(&est, 1 << 20));
//! ```

pub mod advisor;
pub mod chunks;
pub mod error;
pub mod estimate;

pub use advisor::{ChunkPlanSummary, DEFAULT_SAFETY_FACTOR, MemoryEstimator, OptimizationThresholds};
pub use chunks::{chunk_count, chunk_size_for_budget, plan_chunks};
pub use error::{MemError, MemResult};
pub use estimate::{
    BYTES_PER_GB, MemoryEstimate, bytes_to_gb, estimate, fits_budget, gb_to_bytes, state_size,
};
