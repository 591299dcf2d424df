//! Gate catalog and placed gates.
//!
//! [`GateKind`] is the closed set of operations a circuit may contain. Every
//! kind carries a fixed arity and parameter count, checked when a gate is
//! appended to a [`Circuit`](crate::Circuit), and a matrix semantics used by
//! the state-vector engine.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

use crate::qubit::QubitId;

/// A 2×2 complex matrix, row-major.
pub type Matrix2 = [[Complex64; 2]; 2];

/// A 4×4 complex matrix, row-major. The first operand is the most significant bit.
pub type Matrix4 = [[Complex64; 4]; 4];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// Number of operand qubits a gate kind takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many qubits.
    Fixed(u32),
    /// One or more qubits.
    Variadic,
}

impl Arity {
    /// Whether `count` operands satisfy this arity.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => count == n as usize,
            Arity::Variadic => count >= 1,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{n}"),
            Arity::Variadic => f.write_str("at least 1"),
        }
    }
}

/// Closed catalog of gate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateKind {
    // Single-qubit, no parameters
    /// Identity.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
    /// Hadamard.
    H,
    /// S = sqrt(Z).
    S,
    /// S-dagger.
    Sdg,
    /// T = sqrt(S).
    T,
    /// T-dagger.
    Tdg,
    /// sqrt(X).
    SX,
    /// sqrt(Y).
    SY,

    // Single-qubit, parameterized
    /// Rotation around X: `[θ]`.
    RX,
    /// Rotation around Y: `[θ]`.
    RY,
    /// Rotation around Z: `[θ]`.
    RZ,
    /// Phase gate: `[φ]`.
    P,
    /// U1, equivalent to P: `[λ]`.
    U1,
    /// U2: `[φ, λ]`.
    U2,
    /// Universal single-qubit gate: `[θ, φ, λ]`.
    U3,

    // Two-qubit
    /// Controlled-X.
    CNOT,
    /// Controlled-Y.
    CY,
    /// Controlled-Z.
    CZ,
    /// Controlled-Hadamard.
    CH,
    /// SWAP.
    SWAP,
    /// iSWAP.
    ISWAP,
    /// Controlled phase: `[φ]`.
    CP,
    /// Controlled RX: `[θ]`.
    CRX,
    /// Controlled RY: `[θ]`.
    CRY,
    /// Controlled RZ: `[θ]`.
    CRZ,
    /// Controlled U1: `[λ]`.
    CU1,
    /// Controlled U3: `[θ, φ, λ]`.
    CU3,
    /// XX interaction: `[θ]`.
    RXX,
    /// YY interaction: `[θ]`.
    RYY,
    /// ZZ interaction: `[θ]`.
    RZZ,

    // Three-qubit
    /// Toffoli (CCX).
    TOFFOLI,
    /// Fredkin (controlled SWAP).
    CSWAP,
    /// Doubly controlled Z.
    CCZ,

    // Non-unitary
    /// Computational-basis measurement.
    MEASURE,
    /// Reset to |0⟩.
    RESET,
    /// Scheduling barrier.
    BARRIER,
}

impl GateKind {
    /// Every kind in the catalog.
    pub const ALL: [GateKind; 39] = [
        GateKind::I,
        GateKind::X,
        GateKind::Y,
        GateKind::Z,
        GateKind::H,
        GateKind::S,
        GateKind::Sdg,
        GateKind::T,
        GateKind::Tdg,
        GateKind::SX,
        GateKind::SY,
        GateKind::RX,
        GateKind::RY,
        GateKind::RZ,
        GateKind::P,
        GateKind::U1,
        GateKind::U2,
        GateKind::U3,
        GateKind::CNOT,
        GateKind::CY,
        GateKind::CZ,
        GateKind::CH,
        GateKind::SWAP,
        GateKind::ISWAP,
        GateKind::CP,
        GateKind::CRX,
        GateKind::CRY,
        GateKind::CRZ,
        GateKind::CU1,
        GateKind::CU3,
        GateKind::RXX,
        GateKind::RYY,
        GateKind::RZZ,
        GateKind::TOFFOLI,
        GateKind::CSWAP,
        GateKind::CCZ,
        GateKind::MEASURE,
        GateKind::RESET,
        GateKind::BARRIER,
    ];

    /// Canonical upper-case name.
    pub const fn name(self) -> &'static str {
        match self {
            GateKind::I => "I",
            GateKind::X => "X",
            GateKind::Y => "Y",
            GateKind::Z => "Z",
            GateKind::H => "H",
            GateKind::S => "S",
            GateKind::Sdg => "SDG",
            GateKind::T => "T",
            GateKind::Tdg => "TDG",
            GateKind::SX => "SX",
            GateKind::SY => "SY",
            GateKind::RX => "RX",
            GateKind::RY => "RY",
            GateKind::RZ => "RZ",
            GateKind::P => "P",
            GateKind::U1 => "U1",
            GateKind::U2 => "U2",
            GateKind::U3 => "U3",
            GateKind::CNOT => "CNOT",
            GateKind::CY => "CY",
            GateKind::CZ => "CZ",
            GateKind::CH => "CH",
            GateKind::SWAP => "SWAP",
            GateKind::ISWAP => "ISWAP",
            GateKind::CP => "CP",
            GateKind::CRX => "CRX",
            GateKind::CRY => "CRY",
            GateKind::CRZ => "CRZ",
            GateKind::CU1 => "CU1",
            GateKind::CU3 => "CU3",
            GateKind::RXX => "RXX",
            GateKind::RYY => "RYY",
            GateKind::RZZ => "RZZ",
            GateKind::TOFFOLI => "TOFFOLI",
            GateKind::CSWAP => "CSWAP",
            GateKind::CCZ => "CCZ",
            GateKind::MEASURE => "MEASURE",
            GateKind::RESET => "RESET",
            GateKind::BARRIER => "BARRIER",
        }
    }

    /// Resolve a kind from its name, case-insensitively.
    ///
    /// Accepts the canonical names plus the common aliases `CX`, `CCX`,
    /// `FREDKIN`, `U`, `PHASE` and `ID`. Returns `None` for anything outside
    /// the catalog.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CX" => return Some(GateKind::CNOT),
            "CCX" => return Some(GateKind::TOFFOLI),
            "FREDKIN" => return Some(GateKind::CSWAP),
            "U" => return Some(GateKind::U3),
            "PHASE" => return Some(GateKind::P),
            "ID" => return Some(GateKind::I),
            _ => {}
        }
        Self::ALL.into_iter().find(|k| k.name() == upper)
    }

    /// Number of operand qubits.
    pub const fn arity(self) -> Arity {
        match self {
            GateKind::BARRIER => Arity::Variadic,
            GateKind::CNOT
            | GateKind::CY
            | GateKind::CZ
            | GateKind::CH
            | GateKind::SWAP
            | GateKind::ISWAP
            | GateKind::CP
            | GateKind::CRX
            | GateKind::CRY
            | GateKind::CRZ
            | GateKind::CU1
            | GateKind::CU3
            | GateKind::RXX
            | GateKind::RYY
            | GateKind::RZZ => Arity::Fixed(2),
            GateKind::TOFFOLI | GateKind::CSWAP | GateKind::CCZ => Arity::Fixed(3),
            _ => Arity::Fixed(1),
        }
    }

    /// Number of required floating-point parameters.
    pub const fn num_params(self) -> usize {
        match self {
            GateKind::RX
            | GateKind::RY
            | GateKind::RZ
            | GateKind::P
            | GateKind::U1
            | GateKind::CP
            | GateKind::CRX
            | GateKind::CRY
            | GateKind::CRZ
            | GateKind::CU1
            | GateKind::RXX
            | GateKind::RYY
            | GateKind::RZZ => 1,
            GateKind::U2 => 2,
            GateKind::U3 | GateKind::CU3 => 3,
            _ => 0,
        }
    }

    /// Whether this kind is a unitary transform of the state.
    pub const fn is_unitary(self) -> bool {
        !matches!(
            self,
            GateKind::MEASURE | GateKind::RESET | GateKind::BARRIER
        )
    }

    /// Single-qubit matrix of this kind, or `None` for multi-qubit and non-unitary kinds.
    pub fn matrix(self, params: &[f64]) -> Option<Matrix2> {
        let p = |i: usize| params.get(i).copied().unwrap_or(0.0);
        let m = match self {
            GateKind::I => [[ONE, ZERO], [ZERO, ONE]],
            GateKind::X => [[ZERO, ONE], [ONE, ZERO]],
            GateKind::Y => [[ZERO, -I], [I, ZERO]],
            GateKind::Z => [[ONE, ZERO], [ZERO, -ONE]],
            GateKind::H => {
                let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
                [[h, h], [h, -h]]
            }
            GateKind::S => phase(std::f64::consts::FRAC_PI_2),
            GateKind::Sdg => phase(-std::f64::consts::FRAC_PI_2),
            GateKind::T => phase(std::f64::consts::FRAC_PI_4),
            GateKind::Tdg => phase(-std::f64::consts::FRAC_PI_4),
            GateKind::SX => {
                let a = Complex64::new(0.5, 0.5);
                let b = Complex64::new(0.5, -0.5);
                [[a, b], [b, a]]
            }
            GateKind::SY => {
                let a = Complex64::new(0.5, 0.5);
                [[a, -a], [a, a]]
            }
            GateKind::RX => rx(p(0)),
            GateKind::RY => ry(p(0)),
            GateKind::RZ => rz(p(0)),
            GateKind::P | GateKind::U1 => phase(p(0)),
            GateKind::U2 => {
                let (phi, lambda) = (p(0), p(1));
                let s = FRAC_1_SQRT_2;
                [
                    [Complex64::new(s, 0.0), -Complex64::from_polar(s, lambda)],
                    [
                        Complex64::from_polar(s, phi),
                        Complex64::from_polar(s, phi + lambda),
                    ],
                ]
            }
            GateKind::U3 => u3(p(0), p(1), p(2)),
            _ => return None,
        };
        Some(m)
    }

    /// Target unitary of a controlled two-qubit kind (control is the first operand).
    pub fn controlled_target(self, params: &[f64]) -> Option<Matrix2> {
        let p = |i: usize| params.get(i).copied().unwrap_or(0.0);
        match self {
            GateKind::CNOT => GateKind::X.matrix(&[]),
            GateKind::CY => GateKind::Y.matrix(&[]),
            GateKind::CZ => GateKind::Z.matrix(&[]),
            GateKind::CH => GateKind::H.matrix(&[]),
            GateKind::CP | GateKind::CU1 => Some(phase(p(0))),
            GateKind::CRX => Some(rx(p(0))),
            GateKind::CRY => Some(ry(p(0))),
            GateKind::CRZ => Some(rz(p(0))),
            GateKind::CU3 => Some(u3(p(0), p(1), p(2))),
            _ => None,
        }
    }

    /// 4×4 matrix of a two-qubit kind.
    pub fn two_qubit_matrix(self, params: &[f64]) -> Option<Matrix4> {
        if let Some(u) = self.controlled_target(params) {
            let mut m = [[ZERO; 4]; 4];
            m[0][0] = ONE;
            m[1][1] = ONE;
            m[2][2] = u[0][0];
            m[2][3] = u[0][1];
            m[3][2] = u[1][0];
            m[3][3] = u[1][1];
            return Some(m);
        }

        let theta = params.first().copied().unwrap_or(0.0);
        let (c, s) = ((theta / 2.0).cos(), (theta / 2.0).sin());
        let c = Complex64::new(c, 0.0);
        let is = Complex64::new(0.0, s);
        let m = match self {
            GateKind::SWAP => [
                [ONE, ZERO, ZERO, ZERO],
                [ZERO, ZERO, ONE, ZERO],
                [ZERO, ONE, ZERO, ZERO],
                [ZERO, ZERO, ZERO, ONE],
            ],
            GateKind::ISWAP => [
                [ONE, ZERO, ZERO, ZERO],
                [ZERO, ZERO, I, ZERO],
                [ZERO, I, ZERO, ZERO],
                [ZERO, ZERO, ZERO, ONE],
            ],
            GateKind::RXX => [
                [c, ZERO, ZERO, -is],
                [ZERO, c, -is, ZERO],
                [ZERO, -is, c, ZERO],
                [-is, ZERO, ZERO, c],
            ],
            GateKind::RYY => [
                [c, ZERO, ZERO, is],
                [ZERO, c, -is, ZERO],
                [ZERO, -is, c, ZERO],
                [is, ZERO, ZERO, c],
            ],
            GateKind::RZZ => {
                let minus = Complex64::from_polar(1.0, -theta / 2.0);
                let plus = Complex64::from_polar(1.0, theta / 2.0);
                [
                    [minus, ZERO, ZERO, ZERO],
                    [ZERO, plus, ZERO, ZERO],
                    [ZERO, ZERO, plus, ZERO],
                    [ZERO, ZERO, ZERO, minus],
                ]
            }
            _ => return None,
        };
        Some(m)
    }

    /// Full `2^k × 2^k` unitary of any unitary kind, row-major.
    ///
    /// Row and column indices encode operand bits with the first operand as
    /// the most significant bit. Returns `None` for non-unitary kinds.
    pub fn dense_matrix(self, params: &[f64]) -> Option<Vec<Complex64>> {
        if let Some(m) = self.matrix(params) {
            return Some(m.iter().flatten().copied().collect());
        }
        if let Some(m) = self.two_qubit_matrix(params) {
            return Some(m.iter().flatten().copied().collect());
        }

        let mut m = vec![ZERO; 64];
        for i in 0..8 {
            m[i * 8 + i] = ONE;
        }
        match self {
            GateKind::TOFFOLI => permute_rows(&mut m, 6, 7),
            GateKind::CSWAP => permute_rows(&mut m, 5, 6),
            GateKind::CCZ => m[63] = -ONE,
            _ => return None,
        }
        Some(m)
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn phase(phi: f64) -> Matrix2 {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, phi)]]
}

fn rx(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let is = Complex64::new(0.0, (theta / 2.0).sin());
    [[c, -is], [-is, c]]
}

fn ry(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    [[c, -s], [s, c]]
}

fn rz(theta: f64) -> Matrix2 {
    [
        [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
        [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

fn u3(theta: f64, phi: f64, lambda: f64) -> Matrix2 {
    let (c, s) = ((theta / 2.0).cos(), (theta / 2.0).sin());
    [
        [Complex64::new(c, 0.0), -Complex64::from_polar(s, lambda)],
        [
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        ],
    ]
}

fn permute_rows(m: &mut [Complex64], a: usize, b: usize) {
    m[a * 8 + a] = ZERO;
    m[b * 8 + b] = ZERO;
    m[a * 8 + b] = ONE;
    m[b * 8 + a] = ONE;
}

/// A gate placed in a circuit: kind, operands, parameters and timing.
///
/// Gates are created by [`Circuit`](crate::Circuit) after the catalog checks
/// pass and are immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    kind: GateKind,
    qubits: Vec<QubitId>,
    params: Vec<f64>,
    time: f64,
    duration: f64,
}

impl Gate {
    pub(crate) fn new(
        kind: GateKind,
        qubits: Vec<QubitId>,
        params: Vec<f64>,
        time: f64,
        duration: f64,
    ) -> Self {
        Self {
            kind,
            qubits,
            params,
            time,
            duration,
        }
    }

    /// The gate kind.
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// Operand qubits, in order.
    pub fn qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    /// Parameters.
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Start time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Duration.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// `time + duration`.
    pub fn end_time(&self) -> f64 {
        self.time + self.duration
    }

    /// Whether the gate touches `qubit`.
    pub fn acts_on(&self, qubit: QubitId) -> bool {
        self.qubits.contains(&qubit)
    }

    /// Highest operand qubit.
    pub fn max_qubit(&self) -> Option<QubitId> {
        self.qubits.iter().copied().max()
    }

    /// Full unitary of this gate, see [`GateKind::dense_matrix`].
    pub fn dense_matrix(&self) -> Option<Vec<Complex64>> {
        self.kind.dense_matrix(&self.params)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|p| format!("{p:.4}")).collect();
            write!(f, "({})", params.join(", "))?;
        }
        let qubits: Vec<String> = self.qubits.iter().map(ToString::to_string).collect();
        write!(f, " {} @ {}", qubits.join(", "), self.time)
    }
}
