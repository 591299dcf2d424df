//! Error types for the IR crate.

use crate::gate::{Arity, GateKind};
use crate::qubit::QubitId;
use crate::validation::ValidationReport;
use thiserror::Error;

/// Errors raised while building or validating a circuit.
///
/// Gate-level variants carry the index the rejected gate would have had
/// in the circuit's program order.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Operand qubit is not part of the circuit.
    #[error("Gate {gate_index} ({kind}) references {qubit}, but the circuit has {width} qubits")]
    QubitNotFound {
        /// Index of the rejected gate.
        gate_index: usize,
        /// Kind of the rejected gate.
        kind: GateKind,
        /// The missing qubit.
        qubit: QubitId,
        /// Circuit width at the time of the call.
        width: u32,
    },

    /// Wrong number of operand qubits for the gate kind.
    #[error("Gate {gate_index} ({kind}) requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Index of the rejected gate.
        gate_index: usize,
        /// Kind of the rejected gate.
        kind: GateKind,
        /// Arity required by the catalog.
        expected: Arity,
        /// Operands supplied.
        got: usize,
    },

    /// Wrong number of parameters for the gate kind.
    #[error("Gate {gate_index} ({kind}) requires {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Index of the rejected gate.
        gate_index: usize,
        /// Kind of the rejected gate.
        kind: GateKind,
        /// Parameters required by the catalog.
        expected: usize,
        /// Parameters supplied.
        got: usize,
    },

    /// The same qubit appears twice among a gate's operands.
    #[error("Gate {gate_index} ({kind}) uses {qubit} more than once")]
    DuplicateQubit {
        /// Index of the rejected gate.
        gate_index: usize,
        /// Kind of the rejected gate.
        kind: GateKind,
        /// The repeated qubit.
        qubit: QubitId,
    },

    /// Start time before zero.
    #[error("Gate {gate_index} ({kind}) has negative start time {time}")]
    NegativeStartTime {
        /// Index of the rejected gate.
        gate_index: usize,
        /// Kind of the rejected gate.
        kind: GateKind,
        /// The offending start time.
        time: f64,
    },

    /// Duration of zero or less (or not a number).
    #[error("Gate {gate_index} ({kind}) has non-positive duration {duration}")]
    NonPositiveDuration {
        /// Index of the rejected gate.
        gate_index: usize,
        /// Kind of the rejected gate.
        kind: GateKind,
        /// The offending duration.
        duration: f64,
    },

    /// Gate name outside the catalog under the strict fallback policy.
    #[error("Gate {gate_index} has unknown kind '{name}'")]
    UnknownGateKind {
        /// Index of the rejected gate in the input.
        gate_index: usize,
        /// The unrecognised name.
        name: String,
    },

    /// Full validation pass found errors.
    #[error("Circuit failed validation: {}", .0.errors_summary())]
    InvalidCircuit(ValidationReport),

    /// Circuit input could not be parsed.
    #[error("Invalid circuit input: {0}")]
    InvalidInput(String),
}

impl IrError {
    /// Whether this error belongs to the validation family (as opposed to malformed input).
    pub fn is_validation(&self) -> bool {
        !matches!(self, IrError::InvalidInput(_))
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
