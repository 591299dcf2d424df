//! Serializable circuit input, as exchanged with API and CLI layers.
//!
//! ```json
//! { "width": 2,
//!   "gates": [{ "kind": "H", "qubits": [0], "parameters": [] },
//!             { "kind": "CX", "qubits": [0, 1], "parameters": [] }],
//!   "measurements": [{ "qubit": 0, "classicalBit": 0 }] }
//! ```

use serde::{Deserialize, Serialize};

use crate::circuit::{Circuit, DEFAULT_GATE_DURATION};
use crate::error::{IrError, IrResult};
use crate::gate::GateKind;
use crate::qubit::{ClbitId, QubitId};

/// How gate names outside the catalog are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateFallback {
    /// Reject the circuit with [`IrError::UnknownGateKind`].
    #[default]
    Strict,
    /// Substitute an identity on the first operand and emit a warning.
    Lenient,
}

impl GateFallback {
    /// Parse from a configuration string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "strict" => Some(GateFallback::Strict),
            "lenient" => Some(GateFallback::Lenient),
            _ => None,
        }
    }
}

/// One gate of a [`CircuitInput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateInput {
    /// Gate name, resolved with [`GateKind::from_name`].
    pub kind: String,
    /// Operand qubit ids.
    pub qubits: Vec<u32>,
    /// Gate parameters.
    #[serde(default)]
    pub parameters: Vec<f64>,
    /// Optional start time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    /// Optional duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// One measurement of a [`CircuitInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementInput {
    /// Measured qubit.
    pub qubit: u32,
    /// Classical bit receiving the outcome.
    pub classical_bit: u32,
}

/// Wire form of a circuit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInput {
    /// Number of qubits.
    pub width: u32,
    /// Gates in program order.
    #[serde(default)]
    pub gates: Vec<GateInput>,
    /// Terminal measurements, appended after the gates.
    #[serde(default)]
    pub measurements: Vec<MeasurementInput>,
}

impl CircuitInput {
    /// Parse from JSON text.
    pub fn from_json(text: &str) -> IrResult<Self> {
        serde_json::from_str(text).map_err(|e| IrError::InvalidInput(e.to_string()))
    }

    /// Render as JSON text.
    pub fn to_json(&self) -> IrResult<String> {
        serde_json::to_string(self).map_err(|e| IrError::InvalidInput(e.to_string()))
    }
}

impl Circuit {
    /// Build a circuit from its wire form.
    ///
    /// Returns the circuit and the warnings produced by the lenient fallback
    /// (empty under [`GateFallback::Strict`]).
    pub fn from_input(
        name: impl Into<String>,
        input: &CircuitInput,
        fallback: GateFallback,
    ) -> IrResult<(Self, Vec<String>)> {
        let mut circuit = Circuit::with_qubits(name, input.width);
        let mut warnings = vec![];

        for (index, gate) in input.gates.iter().enumerate() {
            let qubits: Vec<QubitId> = gate.qubits.iter().copied().map(QubitId).collect();
            let duration = gate.duration.unwrap_or(DEFAULT_GATE_DURATION);

            let (kind, qubits, params) = match GateKind::from_name(&gate.kind) {
                Some(kind) => (kind, qubits, gate.parameters.clone()),
                None => match (fallback, qubits.first()) {
                    (GateFallback::Lenient, Some(&first)) => {
                        warnings.push(format!(
                            "Gate {index} has unknown kind '{}'; substituted identity on {first}",
                            gate.kind
                        ));
                        (GateKind::I, vec![first], vec![])
                    }
                    (GateFallback::Lenient, None) => {
                        warnings.push(format!(
                            "Gate {index} has unknown kind '{}' and no operands; skipped",
                            gate.kind
                        ));
                        continue;
                    }
                    (GateFallback::Strict, _) => {
                        return Err(IrError::UnknownGateKind {
                            gate_index: index,
                            name: gate.kind.clone(),
                        });
                    }
                },
            };

            circuit.push_gate(kind, &qubits, &params, gate.time, duration)?;
            if kind == GateKind::MEASURE {
                if let Some(&qubit) = qubits.first() {
                    circuit.record_measurement(qubit, ClbitId(qubit.0));
                }
            }
        }

        for m in &input.measurements {
            circuit.measure(QubitId(m.qubit), ClbitId(m.classical_bit))?;
        }

        Ok((circuit, warnings))
    }

    /// Wire form of this circuit.
    ///
    /// Measurement gates are emitted as `measurements` entries when they are
    /// the last operation on their qubit, and inline otherwise.
    pub fn to_input(&self) -> CircuitInput {
        let mut gates = vec![];
        let mut measurements = vec![];

        for (index, gate) in self.gates().iter().enumerate() {
            if gate.kind() == GateKind::MEASURE {
                let qubit = gate.qubits()[0];
                let terminal = self
                    .gates_on_qubit(qubit)
                    .all(|(other, _)| other <= index);
                if terminal {
                    if let Some(clbit) = self.measurements().get(&qubit) {
                        measurements.push(MeasurementInput {
                            qubit: qubit.0,
                            classical_bit: clbit.0,
                        });
                        continue;
                    }
                }
            }
            gates.push(GateInput {
                kind: gate.kind().name().to_string(),
                qubits: gate.qubits().iter().map(|q| q.0).collect(),
                parameters: gate.params().to_vec(),
                time: Some(gate.time()),
                duration: Some(gate.duration()),
            });
        }

        CircuitInput {
            width: self.num_qubits(),
            gates,
            measurements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BELL_JSON: &str = r#"{
        "width": 2,
        "gates": [
            { "kind": "h", "qubits": [0], "parameters": [] },
            { "kind": "CX", "qubits": [0, 1] }
        ],
        "measurements": [
            { "qubit": 0, "classicalBit": 0 },
            { "qubit": 1, "classicalBit": 1 }
        ]
    }"#;

    #[test]
    fn test_parse_bell() {
        let input = CircuitInput::from_json(BELL_JSON).unwrap();
        let (circuit, warnings) =
            Circuit::from_input("bell", &input, GateFallback::Strict).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_gates(), 4);
        assert_eq!(circuit.gates()[1].kind(), GateKind::CNOT);
        assert!(circuit.validate().is_valid());
    }

    #[test]
    fn test_unknown_kind_strict() {
        let input = CircuitInput {
            width: 1,
            gates: vec![GateInput {
                kind: "WOBBLE".into(),
                qubits: vec![0],
                parameters: vec![],
                time: None,
                duration: None,
            }],
            measurements: vec![],
        };
        let err = Circuit::from_input("x", &input, GateFallback::Strict).unwrap_err();
        assert!(matches!(err, IrError::UnknownGateKind { gate_index: 0, ref name } if name == "WOBBLE"));
    }

    #[test]
    fn test_unknown_kind_lenient() {
        let input = CircuitInput {
            width: 2,
            gates: vec![GateInput {
                kind: "wobble".into(),
                qubits: vec![1, 0],
                parameters: vec![0.5],
                time: None,
                duration: None,
            }],
            measurements: vec![],
        };
        let (circuit, warnings) =
            Circuit::from_input("x", &input, GateFallback::Lenient).unwrap();
        assert_eq!(circuit.num_gates(), 1);
        assert_eq!(circuit.gates()[0].kind(), GateKind::I);
        assert_eq!(circuit.gates()[0].qubits(), &[QubitId(1)]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("wobble"));
    }

    #[test]
    fn test_catalog_errors_surface_with_index() {
        let input = CircuitInput {
            width: 1,
            gates: vec![
                GateInput {
                    kind: "H".into(),
                    qubits: vec![0],
                    parameters: vec![],
                    time: None,
                    duration: None,
                },
                GateInput {
                    kind: "RZ".into(),
                    qubits: vec![0],
                    parameters: vec![],
                    time: None,
                    duration: None,
                },
            ],
            measurements: vec![],
        };
        let err = Circuit::from_input("x", &input, GateFallback::Strict).unwrap_err();
        assert!(matches!(
            err,
            IrError::ParameterCountMismatch {
                gate_index: 1,
                kind: GateKind::RZ,
                ..
            }
        ));
    }

    #[test]
    fn test_to_input_keeps_terminal_measurements_separate() {
        let circuit = Circuit::bell().unwrap();
        let input = circuit.to_input();
        assert_eq!(input.gates.len(), 2);
        assert_eq!(input.measurements.len(), 2);

        let (rebuilt, _) = Circuit::from_input("bell", &input, GateFallback::Strict).unwrap();
        assert_eq!(rebuilt.gates(), circuit.gates());
    }

    #[test]
    fn test_fallback_from_name() {
        assert_eq!(GateFallback::from_name("LENIENT"), Some(GateFallback::Lenient));
        assert_eq!(GateFallback::default(), GateFallback::Strict);
        assert_eq!(GateFallback::from_name("loose"), None);
    }
}
