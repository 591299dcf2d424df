//! Dependency-level scheduling for the qmc simulator.
//!
//! Gates are grouped, in program order, into levels whose members act on
//! pairwise disjoint qubits. All gates of a level commute and may be applied
//! concurrently; levels run one after another.
//!
//! The pass is greedy: a gate joins the current level unless it shares a
//! qubit with it, in which case a new level starts. It never moves a gate
//! into an earlier level, so the result is not a minimum-depth layering.
//!
//! ```rust
//! use qmc_ir::Circuit;
//! use qmc_sched::compute_levels;
//!
//! let circuit = Circuit::ghz(3).unwrap();
//! let schedule = compute_levels(circuit.gates());
//! assert_eq!(schedule.num_gates(), circuit.num_gates());
//! ```

pub mod levels;
pub mod stats;

pub use levels::{DependencyLevel, LevelSchedule, compute_levels};
pub use stats::ScheduleStats;
