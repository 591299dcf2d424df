//! Full consistency pass over a circuit.
//!
//! [`validate`] checks every gate against the catalog and the circuit width,
//! the per-qubit timing intervals, and the measure/reset discipline. Fatal
//! findings go to [`ValidationReport::errors`], advisory ones to
//! [`ValidationReport::warnings`].

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::circuit::Circuit;
use crate::gate::{Arity, GateKind};
use crate::qubit::QubitId;

/// Tolerance when comparing gate times.
const TIME_EPSILON: f64 = 1e-9;

/// A fatal validation finding.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ValidationIssue {
    /// Operand outside `0..width`.
    QubitOutOfRange {
        /// Gate index.
        gate_index: usize,
        /// Gate kind.
        kind: GateKind,
        /// The missing qubit.
        qubit: QubitId,
    },
    /// Operand count does not match the kind's arity.
    OperandCount {
        /// Gate index.
        gate_index: usize,
        /// Gate kind.
        kind: GateKind,
        /// Required arity.
        expected: Arity,
        /// Operands present.
        got: usize,
    },
    /// Parameter count does not match the kind's table.
    ParameterCount {
        /// Gate index.
        gate_index: usize,
        /// Gate kind.
        kind: GateKind,
        /// Required parameters.
        expected: usize,
        /// Parameters present.
        got: usize,
    },
    /// Start time below zero.
    NegativeStartTime {
        /// Gate index.
        gate_index: usize,
        /// Gate kind.
        kind: GateKind,
        /// Start time.
        time: f64,
    },
    /// Duration of zero or less.
    NonPositiveDuration {
        /// Gate index.
        gate_index: usize,
        /// Gate kind.
        kind: GateKind,
        /// Duration.
        duration: f64,
    },
    /// Two gates occupy the same qubit at overlapping times.
    TimingOverlap {
        /// Earlier gate.
        first: usize,
        /// Kind of the earlier gate.
        first_kind: GateKind,
        /// Later gate.
        second: usize,
        /// Kind of the later gate.
        second_kind: GateKind,
        /// Shared qubit.
        qubit: QubitId,
    },
    /// A non-barrier gate touches a measured qubit without an intervening reset.
    UsedAfterMeasure {
        /// The reused qubit.
        qubit: QubitId,
        /// Offending gate.
        gate_index: usize,
        /// Kind of the offending gate.
        kind: GateKind,
        /// The measurement gate.
        measured_at: usize,
    },
    /// Two resets on a qubit with nothing in between.
    RepeatedReset {
        /// The qubit.
        qubit: QubitId,
        /// The redundant reset.
        gate_index: usize,
        /// The preceding reset.
        previous: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::QubitOutOfRange {
                gate_index,
                kind,
                qubit,
            } => write!(f, "Gate {gate_index} ({kind}) uses {qubit} which is not in the circuit"),
            ValidationIssue::OperandCount {
                gate_index,
                kind,
                expected,
                got,
            } => write!(f, "Gate {gate_index} ({kind}) requires {expected} qubits, got {got}"),
            ValidationIssue::ParameterCount {
                gate_index,
                kind,
                expected,
                got,
            } => write!(
                f,
                "Gate {gate_index} ({kind}) requires {expected} parameters, got {got}"
            ),
            ValidationIssue::NegativeStartTime {
                gate_index,
                kind,
                time,
            } => write!(f, "Gate {gate_index} ({kind}) has negative start time {time}"),
            ValidationIssue::NonPositiveDuration {
                gate_index,
                kind,
                duration,
            } => write!(f, "Gate {gate_index} ({kind}) has non-positive duration {duration}"),
            ValidationIssue::TimingOverlap {
                first,
                first_kind,
                second,
                second_kind,
                qubit,
            } => write!(
                f,
                "Gates {first} ({first_kind}) and {second} ({second_kind}) overlap in time on qubit {}",
                qubit.0
            ),
            ValidationIssue::UsedAfterMeasure {
                qubit,
                gate_index,
                kind,
                measured_at,
            } => write!(
                f,
                "Qubit {} is used in gate {gate_index} ({kind}) after being measured in gate {measured_at}",
                qubit.0
            ),
            ValidationIssue::RepeatedReset {
                qubit,
                gate_index,
                previous,
            } => write!(
                f,
                "Qubit {} is reset in gate {gate_index} immediately after reset in gate {previous}",
                qubit.0
            ),
        }
    }
}

/// An advisory validation finding.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ValidationWarning {
    /// Qubit is operated on but never measured.
    NeverMeasured {
        /// The qubit.
        qubit: QubitId,
    },
    /// Qubit is measured, reset, and then used again.
    ReusedAfterReset {
        /// The qubit.
        qubit: QubitId,
        /// The measurement gate.
        measured_at: usize,
        /// The reset gate.
        reset_at: usize,
        /// The gate reusing the qubit.
        reused_at: usize,
    },
    /// Qubit is never touched by any gate.
    UnusedQubit {
        /// The qubit.
        qubit: QubitId,
    },
    /// The last gate in program order is a barrier.
    TrailingBarrier {
        /// Index of the barrier.
        gate_index: usize,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::NeverMeasured { qubit } => {
                write!(f, "Qubit {} is used but never measured", qubit.0)
            }
            ValidationWarning::ReusedAfterReset {
                qubit,
                measured_at,
                reset_at,
                reused_at,
            } => write!(
                f,
                "Qubit {} is measured in gate {measured_at}, reset in gate {reset_at} and reused in gate {reused_at}",
                qubit.0
            ),
            ValidationWarning::UnusedQubit { qubit } => {
                write!(f, "Qubit {} is never used", qubit.0)
            }
            ValidationWarning::TrailingBarrier { gate_index } => {
                write!(f, "Circuit ends with a barrier (gate {gate_index})")
            }
        }
    }
}

/// Wire form of a validation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// True when there are no errors.
    pub valid: bool,
    /// Rendered errors.
    pub errors: Vec<String>,
    /// Rendered warnings.
    pub warnings: Vec<String>,
}

/// Result of [`Circuit::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(into = "ValidationSummary")]
pub struct ValidationReport {
    /// Fatal findings.
    pub errors: Vec<ValidationIssue>,
    /// Advisory findings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// True when no fatal finding was recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Rendered form, as exchanged with external callers.
    pub fn summary(&self) -> ValidationSummary {
        ValidationSummary {
            valid: self.is_valid(),
            errors: self.errors.iter().map(ToString::to_string).collect(),
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
        }
    }

    /// One-line description of the errors, used in error messages.
    pub fn errors_summary(&self) -> String {
        match self.errors.as_slice() {
            [] => "no errors".to_string(),
            [only] => only.to_string(),
            [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
        }
    }
}

impl From<ValidationReport> for ValidationSummary {
    fn from(report: ValidationReport) -> Self {
        report.summary()
    }
}

/// Per-qubit walk state for the measure/reset discipline.
#[derive(Default)]
struct QubitTrack {
    measured_at: Option<usize>,
    reset_after_measure: Option<(usize, usize)>,
    last_reset: Option<usize>,
}

/// Run the full consistency pass.
pub fn validate(circuit: &Circuit) -> ValidationReport {
    let mut report = ValidationReport::default();
    let width = circuit.num_qubits();
    let gates = circuit.gates();

    // Catalog, range and timing checks, per gate
    for (index, gate) in gates.iter().enumerate() {
        let kind = gate.kind();
        if !kind.arity().accepts(gate.qubits().len()) {
            report.errors.push(ValidationIssue::OperandCount {
                gate_index: index,
                kind,
                expected: kind.arity(),
                got: gate.qubits().len(),
            });
        }
        if gate.params().len() != kind.num_params() {
            report.errors.push(ValidationIssue::ParameterCount {
                gate_index: index,
                kind,
                expected: kind.num_params(),
                got: gate.params().len(),
            });
        }
        for &qubit in gate.qubits() {
            if qubit.0 >= width {
                report.errors.push(ValidationIssue::QubitOutOfRange {
                    gate_index: index,
                    kind,
                    qubit,
                });
            }
        }
        if gate.time() < 0.0 {
            report.errors.push(ValidationIssue::NegativeStartTime {
                gate_index: index,
                kind,
                time: gate.time(),
            });
        }
        if gate.duration().is_nan() || gate.duration() <= 0.0 {
            report.errors.push(ValidationIssue::NonPositiveDuration {
                gate_index: index,
                kind,
                duration: gate.duration(),
            });
        }
    }

    // Per-qubit gate indices in program order
    let mut timelines: FxHashMap<QubitId, Vec<usize>> = FxHashMap::default();
    for (index, gate) in gates.iter().enumerate() {
        for &qubit in gate.qubits() {
            timelines.entry(qubit).or_default().push(index);
        }
    }
    let mut timelines: Vec<(QubitId, Vec<usize>)> = timelines.into_iter().collect();
    timelines.sort_unstable_by_key(|(qubit, _)| *qubit);

    for (qubit, program) in timelines {
        let mut by_time = program.clone();
        by_time.sort_by(|&a, &b| gates[a].time().total_cmp(&gates[b].time()).then(a.cmp(&b)));

        // Overlaps against the interval reaching furthest so far
        let mut furthest: Option<usize> = None;
        for &index in &by_time {
            if let Some(prev) = furthest {
                if gates[index].time() < gates[prev].end_time() - TIME_EPSILON {
                    report.errors.push(ValidationIssue::TimingOverlap {
                        first: prev,
                        first_kind: gates[prev].kind(),
                        second: index,
                        second_kind: gates[index].kind(),
                        qubit,
                    });
                }
                if gates[index].end_time() > gates[prev].end_time() {
                    furthest = Some(index);
                }
            } else {
                furthest = Some(index);
            }
        }

        // Measure / reset discipline follows execution order, not start times
        let mut track = QubitTrack::default();
        for &index in &program {
            let kind = gates[index].kind();
            match kind {
                GateKind::BARRIER => {}
                GateKind::MEASURE => {
                    track.measured_at = Some(index);
                    track.reset_after_measure = None;
                    track.last_reset = None;
                }
                GateKind::RESET => {
                    if let Some(previous) = track.last_reset {
                        report.errors.push(ValidationIssue::RepeatedReset {
                            qubit,
                            gate_index: index,
                            previous,
                        });
                    }
                    if let Some(measured_at) = track.measured_at.take() {
                        track.reset_after_measure = Some((measured_at, index));
                    }
                    track.last_reset = Some(index);
                }
                _ => {
                    if let Some(measured_at) = track.measured_at.take() {
                        report.errors.push(ValidationIssue::UsedAfterMeasure {
                            qubit,
                            gate_index: index,
                            kind,
                            measured_at,
                        });
                    }
                    if let Some((measured_at, reset_at)) = track.reset_after_measure.take() {
                        report.warnings.push(ValidationWarning::ReusedAfterReset {
                            qubit,
                            measured_at,
                            reset_at,
                            reused_at: index,
                        });
                    }
                    track.last_reset = None;
                }
            }
        }
    }

    // Advisory checks
    for q in 0..width {
        let qubit = QubitId(q);
        let touched = circuit
            .gates_on_qubit(qubit)
            .any(|(_, g)| g.kind() != GateKind::BARRIER);
        let measured = circuit.measurements().contains_key(&qubit)
            || circuit
                .gates_on_qubit(qubit)
                .any(|(_, g)| g.kind() == GateKind::MEASURE);
        if !touched {
            report.warnings.push(ValidationWarning::UnusedQubit { qubit });
        } else if !measured {
            report.warnings.push(ValidationWarning::NeverMeasured { qubit });
        }
    }
    if let Some(last) = gates.last() {
        if last.kind() == GateKind::BARRIER {
            report.warnings.push(ValidationWarning::TrailingBarrier {
                gate_index: gates.len() - 1,
            });
        }
    }

    report
}
