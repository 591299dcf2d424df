//! Gates compiled to kernel calls in a fixed precision.

use num_complex::{Complex, Complex64};

use qmc_ir::{Gate, GateKind, Matrix2, Matrix4};

use crate::error::{SimError, SimResult};
use crate::kernels::{self, Mat2, Mat4};
use crate::real::Real;

fn cast<T: Real>(c: Complex64) -> Complex<T> {
    Complex::new(T::real(c.re), T::real(c.im))
}

fn cast2<T: Real>(m: &Matrix2) -> Mat2<T> {
    m.map(|row| row.map(cast::<T>))
}

fn cast4<T: Real>(m: &Matrix4) -> Mat4<T> {
    m.map(|row| row.map(cast::<T>))
}

/// A gate resolved to the kernel that applies it.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOp<T> {
    /// Single-qubit matrix.
    Single { qubit: usize, matrix: Mat2<T> },
    /// Controlled single-qubit matrix.
    Controlled {
        control: usize,
        target: usize,
        matrix: Mat2<T>,
    },
    /// CNOT fast path.
    Cnot { control: usize, target: usize },
    /// CZ fast path.
    Cz { a: usize, b: usize },
    /// Controlled-phase fast path.
    ControlledPhase {
        control: usize,
        target: usize,
        phase: Complex<T>,
    },
    /// General two-qubit matrix.
    TwoQubit { q0: usize, q1: usize, matrix: Mat4<T> },
    /// SWAP fast path.
    Swap { a: usize, b: usize },
    /// Toffoli fast path.
    Toffoli { c0: usize, c1: usize, target: usize },
    /// Fredkin fast path.
    Cswap { control: usize, a: usize, b: usize },
    /// CCZ fast path.
    Ccz { a: usize, b: usize, c: usize },
    /// Projective reset to |0⟩.
    Reset { qubit: usize },
    /// Identity, barrier and terminal measurement.
    Nop,
}

fn operand(gate: &Gate, pos: usize) -> SimResult<usize> {
    gate.qubits()
        .get(pos)
        .map(|q| q.index())
        .ok_or_else(|| SimError::MalformedGate {
            gate: gate.to_string(),
            reason: format!("missing operand {pos}"),
        })
}

fn missing_matrix(gate: &Gate) -> SimError {
    SimError::MalformedGate {
        gate: gate.to_string(),
        reason: "no matrix for this kind".to_string(),
    }
}

impl<T: Real> GateOp<T> {
    /// Resolve `gate` to its kernel, converting matrices to `T`.
    pub fn compile(gate: &Gate) -> SimResult<Self> {
        let kind = gate.kind();
        let params = gate.params();
        let op = match kind {
            GateKind::I | GateKind::MEASURE | GateKind::BARRIER => GateOp::Nop,
            GateKind::RESET => GateOp::Reset {
                qubit: operand(gate, 0)?,
            },
            GateKind::CNOT => GateOp::Cnot {
                control: operand(gate, 0)?,
                target: operand(gate, 1)?,
            },
            GateKind::CZ => GateOp::Cz {
                a: operand(gate, 0)?,
                b: operand(gate, 1)?,
            },
            GateKind::CP | GateKind::CU1 => GateOp::ControlledPhase {
                control: operand(gate, 0)?,
                target: operand(gate, 1)?,
                phase: cast(Complex64::from_polar(1.0, params.first().copied().unwrap_or(0.0))),
            },
            GateKind::CY
            | GateKind::CH
            | GateKind::CRX
            | GateKind::CRY
            | GateKind::CRZ
            | GateKind::CU3 => {
                let matrix = kind
                    .controlled_target(params)
                    .ok_or_else(|| missing_matrix(gate))?;
                GateOp::Controlled {
                    control: operand(gate, 0)?,
                    target: operand(gate, 1)?,
                    matrix: cast2(&matrix),
                }
            }
            GateKind::SWAP => GateOp::Swap {
                a: operand(gate, 0)?,
                b: operand(gate, 1)?,
            },
            GateKind::ISWAP | GateKind::RXX | GateKind::RYY | GateKind::RZZ => {
                let matrix = kind
                    .two_qubit_matrix(params)
                    .ok_or_else(|| missing_matrix(gate))?;
                GateOp::TwoQubit {
                    q0: operand(gate, 0)?,
                    q1: operand(gate, 1)?,
                    matrix: cast4(&matrix),
                }
            }
            GateKind::TOFFOLI => GateOp::Toffoli {
                c0: operand(gate, 0)?,
                c1: operand(gate, 1)?,
                target: operand(gate, 2)?,
            },
            GateKind::CSWAP => GateOp::Cswap {
                control: operand(gate, 0)?,
                a: operand(gate, 1)?,
                b: operand(gate, 2)?,
            },
            GateKind::CCZ => GateOp::Ccz {
                a: operand(gate, 0)?,
                b: operand(gate, 1)?,
                c: operand(gate, 2)?,
            },
            _ => {
                let matrix = kind.matrix(params).ok_or_else(|| missing_matrix(gate))?;
                GateOp::Single {
                    qubit: operand(gate, 0)?,
                    matrix: cast2(&matrix),
                }
            }
        };
        Ok(op)
    }

    /// Whether the op is a unitary kernel (everything but reset and no-op).
    pub fn is_unitary(&self) -> bool {
        !matches!(self, GateOp::Reset { .. } | GateOp::Nop)
    }

    /// Highest qubit touched by the op.
    pub fn max_qubit(&self) -> Option<usize> {
        match *self {
            GateOp::Single { qubit, .. } | GateOp::Reset { qubit } => Some(qubit),
            GateOp::Controlled {
                control, target, ..
            }
            | GateOp::Cnot { control, target }
            | GateOp::ControlledPhase {
                control, target, ..
            } => Some(control.max(target)),
            GateOp::Cz { a, b } | GateOp::Swap { a, b } => Some(a.max(b)),
            GateOp::TwoQubit { q0, q1, .. } => Some(q0.max(q1)),
            GateOp::Toffoli { c0, c1, target } => Some(c0.max(c1).max(target)),
            GateOp::Cswap { control, a, b } => Some(control.max(a).max(b)),
            GateOp::Ccz { a, b, c } => Some(a.max(b).max(c)),
            GateOp::Nop => None,
        }
    }

    /// Apply a unitary op to `amps` in place. Reset and no-op do nothing here.
    pub fn apply(&self, amps: &mut [Complex<T>]) {
        match self {
            GateOp::Single { qubit, matrix } => kernels::apply_single(amps, matrix, *qubit),
            GateOp::Controlled {
                control,
                target,
                matrix,
            } => kernels::apply_controlled(amps, matrix, *control, *target),
            GateOp::Cnot { control, target } => kernels::apply_cnot(amps, *control, *target),
            GateOp::Cz { a, b } => kernels::apply_cz(amps, *a, *b),
            GateOp::ControlledPhase {
                control,
                target,
                phase,
            } => kernels::apply_controlled_phase(amps, *phase, *control, *target),
            GateOp::TwoQubit { q0, q1, matrix } => kernels::apply_two_qubit(amps, matrix, *q0, *q1),
            GateOp::Swap { a, b } => kernels::apply_swap(amps, *a, *b),
            GateOp::Toffoli { c0, c1, target } => kernels::apply_toffoli(amps, *c0, *c1, *target),
            GateOp::Cswap { control, a, b } => kernels::apply_cswap(amps, *control, *a, *b),
            GateOp::Ccz { a, b, c } => kernels::apply_ccz(amps, *a, *b, *c),
            GateOp::Reset { .. } | GateOp::Nop => {}
        }
    }
}

/// A unitary gate as a dense matrix, for the fresh-output-buffer path.
#[derive(Debug, Clone)]
pub struct DenseOp<T> {
    /// Operand bit positions, most significant first.
    pub qubits: Vec<usize>,
    /// Row-major `2^k × 2^k` matrix.
    pub matrix: Vec<Complex<T>>,
}

impl<T: Real> DenseOp<T> {
    /// Dense form of `gate`, or `None` for non-unitary kinds and the identity.
    pub fn compile(gate: &Gate) -> Option<Self> {
        if gate.kind() == GateKind::I {
            return None;
        }
        let matrix = gate.dense_matrix()?;
        Some(Self {
            qubits: gate.qubits().iter().map(|q| q.index()).collect(),
            matrix: matrix.into_iter().map(cast::<T>).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmc_ir::{Circuit, QubitId};

    #[test]
    fn test_compile_picks_fast_paths() {
        let mut circuit = Circuit::with_qubits("ops", 3);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        circuit.cp(0.5, QubitId(1), QubitId(0)).unwrap();
        circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        circuit.measure(QubitId(1), qmc_ir::ClbitId(0)).unwrap();

        let ops: Vec<GateOp<f64>> = circuit
            .gates()
            .iter()
            .map(|g| GateOp::compile(g).unwrap())
            .collect();
        assert_eq!(
            ops[0],
            GateOp::Cnot {
                control: 0,
                target: 2
            }
        );
        assert!(matches!(
            ops[1],
            GateOp::ControlledPhase {
                control: 1,
                target: 0,
                ..
            }
        ));
        assert_eq!(ops[2].max_qubit(), Some(2));
        assert_eq!(ops[3], GateOp::Nop);
        assert!(!ops[3].is_unitary());
    }

    #[test]
    fn test_single_precision_matrix() {
        let mut circuit = Circuit::with_qubits("f32", 1);
        circuit.h(QubitId(0)).unwrap();
        let op: GateOp<f32> = GateOp::compile(&circuit.gates()[0]).unwrap();
        let GateOp::Single { matrix, .. } = op else {
            panic!("expected single-qubit op");
        };
        assert!((matrix[0][0].re - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_dense_skips_non_unitary() {
        let mut circuit = Circuit::with_qubits("dense", 1);
        circuit.reset(QubitId(0)).unwrap();
        circuit.x(QubitId(0)).unwrap();
        assert!(DenseOp::<f64>::compile(&circuit.gates()[0]).is_none());
        let dense = DenseOp::<f64>::compile(&circuit.gates()[1]).unwrap();
        assert_eq!(dense.matrix.len(), 4);
        assert_eq!(dense.qubits, vec![0]);
    }
}
