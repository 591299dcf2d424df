//! Circuit model and gate catalog for the qmc simulator.
//!
//! This crate holds the canonical in-memory representation of a circuit:
//! dense qubits, a closed catalog of gate kinds with fixed arity and
//! parameter counts, timed gates in program order, and the measurement map.
//!
//! # Core Components
//!
//! - **Qubits**: [`QubitId`], [`Qubit`] with a [`QubitKind`] tag and [`MemoryTier`] hint
//! - **Gate catalog**: [`GateKind`], its [`Arity`] and matrix semantics
//! - **Circuit**: [`Circuit`] builder, checked at add-time
//! - **Validation**: [`ValidationReport`] from the full consistency pass
//! - **Input format**: [`CircuitInput`] with a configurable [`GateFallback`]
//! - **Precision**: [`Precision`] tag shared by the estimator and the engine
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qmc_ir::{Circuit, ClbitId, QubitId};
//!
//! let mut circuit = Circuit::with_qubits("bell_state", 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3.0);
//! assert!(circuit.validate().is_valid());
//! ```
//!
//! # Gate parameters
//!
//! | Parameters | Kinds |
//! |------------|-------|
//! | 1 | `RX`, `RY`, `RZ`, `P`, `U1`, `CP`, `CRX`, `CRY`, `CRZ`, `CU1`, `RXX`, `RYY`, `RZZ` |
//! | 2 | `U2` |
//! | 3 | `U3`, `CU3` |
//! | 0 | everything else |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod input;
pub mod precision;
pub mod qubit;
pub mod validation;

pub use circuit::{Circuit, DEFAULT_GATE_DURATION};
pub use error::{IrError, IrResult};
pub use gate::{Arity, Gate, GateKind, Matrix2, Matrix4};
pub use input::{CircuitInput, GateFallback, GateInput, MeasurementInput};
pub use precision::Precision;
pub use qubit::{ClbitId, MemoryTier, Qubit, QubitId, QubitKind};
pub use validation::{ValidationIssue, ValidationReport, ValidationSummary, ValidationWarning};
