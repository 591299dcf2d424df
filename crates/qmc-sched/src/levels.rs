//! Greedy level construction.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qmc_ir::{Gate, QubitId};

/// Gates that act on pairwise disjoint qubits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyLevel {
    /// Indices into the circuit's gate list, ascending.
    pub gate_indices: Vec<usize>,
}

impl DependencyLevel {
    pub fn len(&self) -> usize {
        self.gate_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gate_indices.is_empty()
    }

    /// Resolve the indices against the gate list the level was built from.
    pub fn gates<'a>(&self, gates: &'a [Gate]) -> Vec<&'a Gate> {
        self.gate_indices.iter().filter_map(|&i| gates.get(i)).collect()
    }
}

/// Ordered levels covering every gate exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSchedule {
    pub levels: Vec<DependencyLevel>,
}

impl LevelSchedule {
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Total gates across all levels.
    pub fn num_gates(&self) -> usize {
        self.levels.iter().map(DependencyLevel::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependencyLevel> {
        self.levels.iter()
    }

    /// Fraction of gates that share their level with at least one other gate.
    ///
    /// Zero for an empty schedule.
    pub fn parallelization_ratio(&self) -> f64 {
        let total = self.num_gates();
        if total == 0 {
            return 0.0;
        }
        let parallel: usize = self
            .levels
            .iter()
            .filter(|level| level.len() > 1)
            .map(DependencyLevel::len)
            .sum();
        parallel as f64 / total as f64
    }
}

/// Group `gates` into dependency levels in a single pass.
pub fn compute_levels(gates: &[Gate]) -> LevelSchedule {
    let mut levels = Vec::new();
    let mut current = DependencyLevel::default();
    let mut used: FxHashSet<QubitId> = FxHashSet::default();

    for (index, gate) in gates.iter().enumerate() {
        let conflicts = gate.qubits().iter().any(|q| used.contains(q));
        if conflicts {
            levels.push(std::mem::take(&mut current));
            used.clear();
        }
        used.extend(gate.qubits().iter().copied());
        current.gate_indices.push(index);
    }
    if !current.is_empty() {
        levels.push(current);
    }

    let schedule = LevelSchedule { levels };
    debug!(
        gates = gates.len(),
        levels = schedule.num_levels(),
        ratio = schedule.parallelization_ratio(),
        "Computed dependency levels"
    );
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmc_ir::Circuit;

    #[test]
    fn test_empty() {
        let schedule = compute_levels(&[]);
        assert_eq!(schedule.num_levels(), 0);
        assert_eq!(schedule.parallelization_ratio(), 0.0);
    }

    #[test]
    fn test_disjoint_gates_share_a_level() {
        let mut circuit = Circuit::with_qubits("layer", 4);
        for q in 0..4 {
            circuit.h(QubitId(q)).unwrap();
        }
        let schedule = compute_levels(circuit.gates());
        assert_eq!(schedule.num_levels(), 1);
        assert_eq!(schedule.levels[0].gate_indices, vec![0, 1, 2, 3]);
        assert_eq!(schedule.parallelization_ratio(), 1.0);
    }

    #[test]
    fn test_conflict_starts_new_level() {
        let mut circuit = Circuit::with_qubits("chain", 3);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.h(QubitId(2)).unwrap();
        circuit.cx(QubitId(1), QubitId(2)).unwrap();

        let schedule = compute_levels(circuit.gates());
        let indices: Vec<_> = schedule.iter().map(|l| l.gate_indices.clone()).collect();
        assert_eq!(indices, vec![vec![0], vec![1, 2], vec![3]]);
        assert!((schedule.parallelization_ratio() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_chain_gives_single_gate_levels() {
        for n in 1..8u32 {
            let mut circuit = Circuit::with_qubits("ladder", n + 1);
            for q in 0..n {
                circuit.cx(QubitId(q), QubitId(q + 1)).unwrap();
            }
            let schedule = compute_levels(circuit.gates());
            assert_eq!(schedule.num_levels(), n as usize);
            assert!(schedule.iter().all(|level| level.len() == 1));
            assert_eq!(schedule.parallelization_ratio(), 0.0);
        }
    }

    #[test]
    fn test_greedy_does_not_backfill() {
        // H(2) could join level 0 but arrives after the conflict on q0
        let mut circuit = Circuit::with_qubits("greedy", 3);
        circuit.h(QubitId(0)).unwrap();
        circuit.x(QubitId(0)).unwrap();
        circuit.h(QubitId(2)).unwrap();
        let schedule = compute_levels(circuit.gates());
        assert_eq!(schedule.levels[0].gate_indices, vec![0]);
        assert_eq!(schedule.levels[1].gate_indices, vec![1, 2]);
    }

    #[test]
    fn test_level_resolves_gates() {
        let circuit = Circuit::bell().unwrap();
        let schedule = compute_levels(circuit.gates());
        let first = schedule.levels[0].gates(circuit.gates());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind(), qmc_ir::GateKind::H);
    }
}
