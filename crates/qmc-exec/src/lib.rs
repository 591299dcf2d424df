//! Memory-aware execution coordinator for the qmc simulator.
//!
//! The [`Coordinator`] ties the other crates together: it validates a
//! circuit, estimates its memory footprint against the configured budget,
//! groups its gates into dependency levels, picks an execution
//! [`Strategy`], runs the state-vector engine on a bounded worker pool and
//! samples the final state.
//!
//! # Strategies
//!
//! | Strategy | Level application |
//! |----------|-------------------|
//! | `sequential` | gate by gate, program order |
//! | `parallel` | in-place chunked levels on the worker pool |
//! | `accelerated` | every level on the [`Accelerator`] |
//! | `hybrid` | multi-gate levels chunked, single-gate levels on the accelerator |
//!
//! Automatic selection prefers hybrid, then accelerated, then parallel,
//! then sequential. Accelerated strategies without a ready accelerator run
//! as parallel with a warning.
//!
//! # Example
//!
//! ```rust
//! use qmc_exec::{Coordinator, SimConfig, StrategyChoice};
//! use qmc_ir::Circuit;
//!
//! let config = SimConfig { max_workers: 2, seed: Some(1), ..SimConfig::default() };
//! let mut coordinator = Coordinator::with_config(config).unwrap();
//! let result = coordinator
//!     .simulate(&Circuit::bell().unwrap(), 1000, StrategyChoice::Auto)
//!     .unwrap();
//!
//! assert_eq!(result.results.values().sum::<u64>(), 1000);
//! assert!(result.results.keys().all(|k| k == "00" || k == "11"));
//! ```

pub mod backend;
pub mod benchmark;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod result;
pub mod strategy;
pub mod telemetry;

pub use backend::{Accelerator, HostAccelerator};
pub use benchmark::{BenchmarkCell, BenchmarkReport, CellOutcome, SpeedupSummary, SystemInfo, synthetic_circuit};
pub use config::{ConfigError, SimConfig};
pub use context::{Context, Diagnostics, NoopDiagnostics, RecordingDiagnostics, TracingDiagnostics};
pub use coordinator::{Coordinator, CoordinatorStatus};
pub use error::{ExecError, ExecResult};
pub use result::{
    MAX_FINAL_STATE_QUBITS, NoiseLevelResult, PerformanceInfo, PerformanceRecord, SimulationResult,
};
pub use strategy::{CircuitAnalysis, CircuitInfo, Strategy, StrategyChoice, choose_strategy};
pub use telemetry::{LogFormat, TelemetryConfig};
