//! Budget checks and optimization advisories.

use serde::{Deserialize, Serialize};
use tracing::debug;

use qmc_ir::{Circuit, Precision};

use crate::chunks::{chunk_count, chunk_size_for_budget};
use crate::error::{MemError, MemResult};
use crate::estimate::{MemoryEstimate, bytes_to_gb, estimate, fits_budget, gb_to_bytes, state_size};

/// Default chunk safety factor.
pub const DEFAULT_SAFETY_FACTOR: f64 = 4.0;

/// Limits above which [`MemoryEstimator::suggest_optimizations`] advises.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationThresholds {
    /// Width beyond which decomposition is advised.
    pub max_width: u32,
    /// Gate count beyond which fusion and batching are advised.
    pub max_gates: usize,
    /// Matrix caching is advised when distinct kinds fall below
    /// `gates / repetition_divisor`.
    pub repetition_divisor: f64,
}

impl Default for OptimizationThresholds {
    fn default() -> Self {
        Self {
            max_width: 20,
            max_gates: 1000,
            repetition_divisor: 4.0,
        }
    }
}

/// How a state would be split to respect the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPlanSummary {
    /// Amplitudes per chunk.
    pub chunk_size: u64,
    pub num_chunks: u64,
}

/// Estimator bound to a memory budget and precision.
#[derive(Debug, Clone)]
pub struct MemoryEstimator {
    budget_bytes: u64,
    precision: Precision,
    safety_factor: f64,
    thresholds: OptimizationThresholds,
}

impl MemoryEstimator {
    /// Build from a budget in GB.
    pub fn new(max_memory_gb: f64, precision: Precision) -> MemResult<Self> {
        if !max_memory_gb.is_finite() || max_memory_gb < 0.0 {
            return Err(MemError::InvalidBudget(max_memory_gb));
        }
        Ok(Self {
            budget_bytes: gb_to_bytes(max_memory_gb),
            precision,
            safety_factor: DEFAULT_SAFETY_FACTOR,
            thresholds: OptimizationThresholds::default(),
        })
    }

    pub fn with_safety_factor(mut self, safety_factor: f64) -> MemResult<Self> {
        if !safety_factor.is_finite() || safety_factor <= 0.0 {
            return Err(MemError::InvalidSafetyFactor(safety_factor));
        }
        self.safety_factor = safety_factor;
        Ok(self)
    }

    pub fn with_thresholds(mut self, thresholds: OptimizationThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn budget_bytes(&self) -> u64 {
        self.budget_bytes
    }

    pub fn budget_gb(&self) -> f64 {
        bytes_to_gb(self.budget_bytes)
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn safety_factor(&self) -> f64 {
        self.safety_factor
    }

    /// Estimate `circuit` in this estimator's precision.
    pub fn estimate(&self, circuit: &Circuit) -> MemoryEstimate {
        estimate(circuit, self.precision)
    }

    pub fn fits(&self, estimate: &MemoryEstimate) -> bool {
        fits_budget(estimate, self.budget_bytes)
    }

    /// Chunk layout of a `width`-qubit state under the budget.
    pub fn chunk_plan(&self, width: u32) -> MemResult<ChunkPlanSummary> {
        let chunk_size = chunk_size_for_budget(self.budget_bytes, self.precision, self.safety_factor)?;
        Ok(ChunkPlanSummary {
            chunk_size,
            num_chunks: chunk_count(state_size(width), chunk_size),
        })
    }

    /// Ordered advisories for `circuit`.
    ///
    /// Never empty: a circuit that trips no threshold gets a single
    /// all-clear entry.
    pub fn suggest_optimizations(&self, circuit: &Circuit) -> Vec<String> {
        let mut suggestions = Vec::new();
        let est = self.estimate(circuit);

        if !self.fits(&est) {
            suggestions.push(format!(
                "Circuit requires {} bytes ({:.1} GB) but limit is {} bytes ({:.1} GB)",
                est.total_bytes(),
                est.total_gb(),
                self.budget_bytes,
                self.budget_gb()
            ));
            suggestions.push("Consider using memory chunking or reducing precision".to_string());
        }

        if circuit.num_qubits() > self.thresholds.max_width {
            suggestions.push("Large qubit count detected - consider circuit decomposition".to_string());
        }

        let gates = circuit.num_gates();
        if gates > self.thresholds.max_gates {
            suggestions.push("High gate count - consider gate optimization and batching".to_string());
        }

        if (circuit.distinct_kinds() as f64) < gates as f64 / self.thresholds.repetition_divisor {
            suggestions.push("Many repeated gates detected - enable gate matrix caching".to_string());
        }

        if suggestions.is_empty() {
            suggestions.push("Circuit is well-optimized for current memory settings".to_string());
        }
        debug!(count = suggestions.len(), "Generated memory suggestions");
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmc_ir::QubitId;

    #[test]
    fn test_well_optimized() {
        let estimator = MemoryEstimator::new(1.0, Precision::Double).unwrap();
        let circuit = Circuit::bell().unwrap();
        let suggestions = estimator.suggest_optimizations(&circuit);
        assert_eq!(suggestions, vec!["Circuit is well-optimized for current memory settings"]);
    }

    #[test]
    fn test_over_budget_reports_numbers() {
        let estimator = MemoryEstimator::new(0.0, Precision::Single).unwrap();
        let circuit = Circuit::with_qubits("ten", 10);
        let suggestions = estimator.suggest_optimizations(&circuit);
        assert!(suggestions[0].contains("24576 bytes"));
        assert!(suggestions[0].contains("limit is 0 bytes"));
        assert_eq!(suggestions[1], "Consider using memory chunking or reducing precision");
    }

    #[test]
    fn test_width_gates_and_repetition() {
        let estimator = MemoryEstimator::new(1024.0, Precision::Single).unwrap();
        let mut circuit = Circuit::with_qubits("wide", 21);
        for _ in 0..1001 {
            circuit.h(QubitId(0)).unwrap();
        }
        let suggestions = estimator.suggest_optimizations(&circuit);
        assert_eq!(
            suggestions,
            vec![
                "Large qubit count detected - consider circuit decomposition",
                "High gate count - consider gate optimization and batching",
                "Many repeated gates detected - enable gate matrix caching",
            ]
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let estimator = MemoryEstimator::new(1.0, Precision::Double)
            .unwrap()
            .with_thresholds(OptimizationThresholds {
                max_width: 1,
                max_gates: 10,
                repetition_divisor: 4.0,
            });
        let suggestions = estimator.suggest_optimizations(&Circuit::bell().unwrap());
        assert_eq!(suggestions.len(), 1);
        assert!(suggestions[0].starts_with("Large qubit count"));
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(MemoryEstimator::new(-1.0, Precision::Double).is_err());
        assert!(MemoryEstimator::new(f64::INFINITY, Precision::Double).is_err());
        let estimator = MemoryEstimator::new(1.0, Precision::Double).unwrap();
        assert!(estimator.with_safety_factor(0.0).is_err());
    }

    #[test]
    fn test_chunk_plan() {
        let estimator = MemoryEstimator::new(1.0, Precision::Double).unwrap();
        let plan = estimator.chunk_plan(30).unwrap();
        assert_eq!(plan.chunk_size, 1 << 24);
        assert_eq!(plan.num_chunks, 1 << 6);
    }
}
