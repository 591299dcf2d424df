//! High-level circuit builder API.

use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateKind};
use crate::qubit::{ClbitId, MemoryTier, Qubit, QubitId, QubitKind};
use crate::validation::{self, ValidationReport};

/// Duration given to gates added without an explicit one.
pub const DEFAULT_GATE_DURATION: f64 = 1.0;

/// A quantum circuit: qubits, gates in program order, and measurement targets.
///
/// Gates are checked against the catalog when appended; the rest of the
/// invariants (timing overlaps, measure/reset discipline) are checked by
/// [`Circuit::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Qubits, indexed by id.
    qubits: Vec<Qubit>,
    /// Gates in insertion order.
    gates: Vec<Gate>,
    /// Measurement targets.
    measurements: BTreeMap<QubitId, ClbitId>,
    /// Max end time over all gates.
    depth: f64,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            gates: vec![],
            measurements: BTreeMap::new(),
            depth: 0.0,
        }
    }

    /// Create a circuit with `num_qubits` logical qubits.
    pub fn with_qubits(name: impl Into<String>, num_qubits: u32) -> Self {
        let mut circuit = Self::new(name);
        circuit.add_qubits(num_qubits);
        circuit
    }

    /// Append `n` fresh logical qubits and return their ids.
    pub fn add_qubits(&mut self, n: u32) -> Vec<QubitId> {
        (0..n)
            .map(|_| self.add_qubit_with(QubitKind::Logical, MemoryTier::L1))
            .collect()
    }

    /// Append one qubit with an explicit classification and memory tier.
    pub fn add_qubit_with(&mut self, kind: QubitKind, tier: MemoryTier) -> QubitId {
        let id = QubitId(self.num_qubits());
        self.qubits.push(Qubit::with_kind(id, kind, tier));
        id
    }

    /// Name of the circuit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits (the circuit width).
    pub fn num_qubits(&self) -> u32 {
        u32::try_from(self.qubits.len()).unwrap_or(u32::MAX)
    }

    /// Number of gates.
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    /// Max end time over all gates, `0.0` for an empty circuit.
    pub fn depth(&self) -> f64 {
        self.depth
    }

    /// Gates in program order.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Qubits in id order.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Look up a qubit.
    pub fn qubit(&self, id: QubitId) -> Option<&Qubit> {
        self.qubits.get(id.index())
    }

    /// Measurement targets, qubit to classical bit.
    pub fn measurements(&self) -> &BTreeMap<QubitId, ClbitId> {
        &self.measurements
    }

    // =========================================================================
    // Gate insertion
    // =========================================================================

    /// Append a gate starting as soon as all its operands are free.
    pub fn add_gate(
        &mut self,
        kind: GateKind,
        qubits: &[QubitId],
        params: &[f64],
    ) -> IrResult<&mut Self> {
        self.push_gate(kind, qubits, params, None, DEFAULT_GATE_DURATION)?;
        Ok(self)
    }

    /// Append a gate with an explicit start time and duration.
    pub fn add_gate_at(
        &mut self,
        kind: GateKind,
        qubits: &[QubitId],
        params: &[f64],
        start: f64,
        duration: f64,
    ) -> IrResult<&mut Self> {
        self.push_gate(kind, qubits, params, Some(start), duration)?;
        Ok(self)
    }

    /// Check a gate against the catalog and the circuit, then append it.
    ///
    /// Returns the index of the new gate. Nothing is modified on error.
    pub(crate) fn push_gate(
        &mut self,
        kind: GateKind,
        qubits: &[QubitId],
        params: &[f64],
        start: Option<f64>,
        duration: f64,
    ) -> IrResult<usize> {
        let gate_index = self.gates.len();

        if !kind.arity().accepts(qubits.len()) {
            return Err(IrError::QubitCountMismatch {
                gate_index,
                kind,
                expected: kind.arity(),
                got: qubits.len(),
            });
        }
        if params.len() != kind.num_params() {
            return Err(IrError::ParameterCountMismatch {
                gate_index,
                kind,
                expected: kind.num_params(),
                got: params.len(),
            });
        }

        let mut seen = FxHashSet::default();
        for &qubit in qubits {
            if qubit.0 >= self.num_qubits() {
                return Err(IrError::QubitNotFound {
                    gate_index,
                    kind,
                    qubit,
                    width: self.num_qubits(),
                });
            }
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    gate_index,
                    kind,
                    qubit,
                });
            }
        }

        let time = start.unwrap_or_else(|| {
            qubits
                .iter()
                .map(|q| self.qubits[q.index()].last_used())
                .fold(0.0, f64::max)
        });
        if time < 0.0 || time.is_nan() {
            return Err(IrError::NegativeStartTime {
                gate_index,
                kind,
                time,
            });
        }
        if duration.is_nan() || duration <= 0.0 {
            return Err(IrError::NonPositiveDuration {
                gate_index,
                kind,
                duration,
            });
        }

        let gate = Gate::new(kind, qubits.to_vec(), params.to_vec(), time, duration);
        let end = gate.end_time();
        for q in qubits {
            self.qubits[q.index()].touch(end);
        }
        self.depth = self.depth.max(end);
        self.gates.push(gate);
        Ok(gate_index)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::H, &[qubit], &[])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::X, &[qubit], &[])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::Y, &[qubit], &[])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::Z, &[qubit], &[])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::S, &[qubit], &[])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::T, &[qubit], &[])
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::RX, &[qubit], &[theta])
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::RY, &[qubit], &[theta])
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::RZ, &[qubit], &[theta])
    }

    /// Apply phase gate.
    pub fn p(&mut self, phi: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::P, &[qubit], &[phi])
    }

    /// Apply universal U3 gate.
    pub fn u3(&mut self, theta: f64, phi: f64, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::U3, &[qubit], &[theta, phi, lambda])
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::CNOT, &[control, target], &[])
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::CZ, &[control, target], &[])
    }

    /// Apply controlled-phase gate.
    pub fn cp(&mut self, phi: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::CP, &[control, target], &[phi])
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::SWAP, &[q1, q2], &[])
    }

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::TOFFOLI, &[c1, c2, target], &[])
    }

    /// Apply controlled-SWAP gate.
    pub fn cswap(&mut self, control: QubitId, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::CSWAP, &[control, q1, q2], &[])
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure `qubit` into `clbit`.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::MEASURE, &[qubit], &[])?;
        self.measurements.insert(qubit, clbit);
        Ok(self)
    }

    pub(crate) fn record_measurement(&mut self, qubit: QubitId, clbit: ClbitId) {
        self.measurements.insert(qubit, clbit);
    }

    /// Measure every qubit into the classical bit of the same index.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        for q in 0..self.num_qubits() {
            self.measure(QubitId(q), ClbitId(q))?;
        }
        Ok(self)
    }

    /// Reset `qubit` to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.add_gate(GateKind::RESET, &[qubit], &[])
    }

    /// Barrier across `qubits`.
    pub fn barrier(&mut self, qubits: &[QubitId]) -> IrResult<&mut Self> {
        self.add_gate(GateKind::BARRIER, qubits, &[])
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Full consistency pass.
    pub fn validate(&self) -> ValidationReport {
        validation::validate(self)
    }

    /// Run [`Circuit::validate`] and fail if it reports any error.
    pub fn ensure_valid(&self) -> IrResult<ValidationReport> {
        let report = self.validate();
        if report.is_valid() {
            Ok(report)
        } else {
            Err(IrError::InvalidCircuit(report))
        }
    }

    /// Gates touching `qubit`, with their program-order indices.
    pub fn gates_on_qubit(&self, qubit: QubitId) -> impl Iterator<Item = (usize, &Gate)> {
        self.gates
            .iter()
            .enumerate()
            .filter(move |(_, g)| g.acts_on(qubit))
    }

    /// First start and last end time of the gates on `qubit`.
    pub fn qubit_lifetime(&self, qubit: QubitId) -> Option<(f64, f64)> {
        self.gates_on_qubit(qubit).fold(None, |acc, (_, g)| match acc {
            None => Some((g.time(), g.end_time())),
            Some((start, end)) => Some((start.min(g.time()), end.max(g.end_time()))),
        })
    }

    /// Number of gates of each kind.
    pub fn gate_counts(&self) -> BTreeMap<GateKind, usize> {
        let mut counts = BTreeMap::new();
        for gate in &self.gates {
            *counts.entry(gate.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of distinct gate kinds used.
    pub fn distinct_kinds(&self) -> usize {
        self.gate_counts().len()
    }

    /// Append `other` after this circuit's current depth.
    ///
    /// Qubit `i` of `other` is placed on `qubit_map[i]`, or on qubit `i` when
    /// no map is given. Measurement targets are carried over.
    pub fn compose(&mut self, other: &Circuit, qubit_map: Option<&[QubitId]>) -> IrResult<&mut Self> {
        let map: Vec<QubitId> = match qubit_map {
            Some(map) => map.to_vec(),
            None => (0..other.num_qubits()).map(QubitId).collect(),
        };
        if map.len() != other.qubits.len() {
            return Err(IrError::InvalidInput(format!(
                "qubit map has {} entries but the appended circuit has {} qubits",
                map.len(),
                other.qubits.len()
            )));
        }

        let offset = self.depth;
        let mut staged = self.clone();
        for gate in &other.gates {
            let qubits: Vec<QubitId> = gate.qubits().iter().map(|q| map[q.index()]).collect();
            staged.push_gate(
                gate.kind(),
                &qubits,
                gate.params(),
                Some(gate.time() + offset),
                gate.duration(),
            )?;
        }
        for (qubit, clbit) in &other.measurements {
            staged.measurements.insert(map[qubit.index()], *clbit);
        }
        *self = staged;
        Ok(self)
    }

    // =========================================================================
    // Prebuilt circuits
    // =========================================================================

    /// Create a Bell state circuit with measurements.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_qubits("bell", 2);
        circuit.h(QubitId(0))?.cx(QubitId(0), QubitId(1))?.measure_all()?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit with measurements.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_qubits(format!("ghz_{n}"), n);
        if n == 0 {
            return Ok(circuit);
        }

        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        circuit.measure_all()?;
        Ok(circuit)
    }

    /// Create a QFT circuit (without measurements).
    pub fn qft(n: u32) -> IrResult<Self> {
        use std::f64::consts::PI;

        let mut circuit = Self::with_qubits(format!("qft_{n}"), n);
        for i in 0..n {
            circuit.h(QubitId(i))?;
            for j in (i + 1)..n {
                let angle = PI / f64::from(1u32 << (j - i).min(31));
                circuit.cp(angle, QubitId(j), QubitId(i))?;
            }
        }
        for i in 0..n / 2 {
            circuit.swap(QubitId(i), QubitId(n - 1 - i))?;
        }
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
        assert_eq!(circuit.num_gates(), 0);
        assert_eq!(circuit.depth(), 0.0);
    }

    #[test]
    fn test_add_qubits_returns_dense_ids() {
        let mut circuit = Circuit::new("test");
        let first = circuit.add_qubits(2);
        let ancilla = circuit.add_qubit_with(QubitKind::Ancilla, MemoryTier::L2);
        assert_eq!(first, vec![QubitId(0), QubitId(1)]);
        assert_eq!(ancilla, QubitId(2));
        assert_eq!(circuit.qubit(ancilla).unwrap().kind(), QubitKind::Ancilla);
    }

    #[test]
    fn test_asap_timing() {
        let mut circuit = Circuit::with_qubits("timing", 3);
        circuit.h(QubitId(0)).unwrap();
        circuit.h(QubitId(1)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.x(QubitId(2)).unwrap();

        let times: Vec<f64> = circuit.gates().iter().map(Gate::time).collect();
        assert_eq!(times, vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(circuit.depth(), 2.0);
        assert_eq!(circuit.qubit(QubitId(1)).unwrap().last_used(), 2.0);
    }

    #[test]
    fn test_rotation_without_parameter() {
        let mut circuit = Circuit::with_qubits("rot", 1);
        circuit.h(QubitId(0)).unwrap();
        let err = circuit.add_gate(GateKind::RX, &[QubitId(0)], &[]).unwrap_err();
        assert!(matches!(
            err,
            IrError::ParameterCountMismatch {
                gate_index: 1,
                kind: GateKind::RX,
                expected: 1,
                got: 0
            }
        ));
        assert_eq!(err.to_string(), "Gate 1 (RX) requires 1 parameters, got 0");
        assert_eq!(circuit.num_gates(), 1);
    }

    #[test]
    fn test_add_time_rejections() {
        let mut circuit = Circuit::with_qubits("bad", 2);
        assert!(matches!(
            circuit.x(QubitId(5)),
            Err(IrError::QubitNotFound { gate_index: 0, .. })
        ));
        assert!(matches!(
            circuit.add_gate(GateKind::CNOT, &[QubitId(0)], &[]),
            Err(IrError::QubitCountMismatch { got: 1, .. })
        ));
        assert!(matches!(
            circuit.cx(QubitId(1), QubitId(1)),
            Err(IrError::DuplicateQubit { .. })
        ));
        assert!(matches!(
            circuit.add_gate_at(GateKind::X, &[QubitId(0)], &[], -1.0, 1.0),
            Err(IrError::NegativeStartTime { .. })
        ));
        assert!(matches!(
            circuit.add_gate_at(GateKind::X, &[QubitId(0)], &[], 0.0, 0.0),
            Err(IrError::NonPositiveDuration { .. })
        ));
        assert_eq!(circuit.num_gates(), 0);
        assert_eq!(circuit.depth(), 0.0);
    }

    #[test]
    fn test_measure_records_target() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_gates(), 4);
        assert_eq!(circuit.measurements().get(&QubitId(1)), Some(&ClbitId(1)));
    }

    #[test]
    fn test_ghz_and_qft() {
        let ghz = Circuit::ghz(4).unwrap();
        assert_eq!(ghz.gate_counts().get(&GateKind::CNOT), Some(&3));
        assert_eq!(ghz.gate_counts().get(&GateKind::MEASURE), Some(&4));

        let qft = Circuit::qft(3).unwrap();
        // 3 H, 3 CP, 1 SWAP
        assert_eq!(qft.num_gates(), 7);
        assert_eq!(qft.distinct_kinds(), 3);
    }

    #[test]
    fn test_qubit_lifetime() {
        let mut circuit = Circuit::with_qubits("life", 2);
        circuit.h(QubitId(0)).unwrap();
        circuit.x(QubitId(0)).unwrap();
        assert_eq!(circuit.qubit_lifetime(QubitId(0)), Some((0.0, 2.0)));
        assert_eq!(circuit.qubit_lifetime(QubitId(1)), None);
    }

    #[test]
    fn test_compose_shifts_and_remaps() {
        let mut base = Circuit::with_qubits("base", 3);
        base.h(QubitId(0)).unwrap();

        let mut tail = Circuit::with_qubits("tail", 2);
        tail.cx(QubitId(0), QubitId(1)).unwrap();
        tail.measure(QubitId(1), ClbitId(0)).unwrap();

        base.compose(&tail, Some(&[QubitId(2), QubitId(1)])).unwrap();
        assert_eq!(base.num_gates(), 3);
        assert_eq!(base.gates()[1].qubits(), &[QubitId(2), QubitId(1)]);
        assert_eq!(base.gates()[1].time(), 1.0);
        assert_eq!(base.measurements().get(&QubitId(1)), Some(&ClbitId(0)));
        assert_eq!(base.depth(), 3.0);
    }

    #[test]
    fn test_compose_rejects_bad_map() {
        let mut base = Circuit::with_qubits("base", 1);
        let mut tail = Circuit::with_qubits("tail", 2);
        tail.x(QubitId(1)).unwrap();
        assert!(base.compose(&tail, Some(&[QubitId(0)])).is_err());
        assert!(base.compose(&tail, None).is_err());
        assert_eq!(base.num_gates(), 0);
    }
}
