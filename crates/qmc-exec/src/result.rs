//! Result bundles and performance history records.

use chrono::{DateTime, Utc};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use qmc_sim::Counts;

use crate::strategy::{CircuitInfo, Strategy};

/// Widest circuit whose amplitudes are included in a result (`2^5 = 32`).
pub const MAX_FINAL_STATE_QUBITS: u32 = 5;

/// Timing and placement of a run. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInfo {
    /// Allocation, gate application and sampling.
    pub total_time: f64,
    pub gate_time: f64,
    pub sampling_time: f64,
    pub strategy_used: Strategy,
    pub device_type: String,
}

/// Outcome of [`Coordinator::simulate`](crate::Coordinator::simulate).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Histogram keyed by bitstring, highest qubit first.
    pub results: Counts,
    pub shots: u64,
    pub circuit_info: CircuitInfo,
    pub performance: PerformanceInfo,
    /// Amplitudes of small states.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_state: Option<Vec<Complex64>>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl SimulationResult {
    /// Fraction of shots that produced `bitstring`.
    pub fn probability(&self, bitstring: &str) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        self.results.get(bitstring).copied().unwrap_or(0) as f64 / self.shots as f64
    }

    /// Most frequent bitstring, ties broken by the smaller bitstring.
    pub fn most_frequent(&self) -> Option<&str> {
        self.results
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(k, _)| k.as_str())
    }
}

/// One entry of the coordinator's performance history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub circuit_name: String,
    pub circuit_info: CircuitInfo,
    pub shots: u64,
    pub strategy: Strategy,
    pub total_time: f64,
    pub gate_time: f64,
    pub sampling_time: f64,
}

/// One run of a noise-scaling sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoiseLevelResult {
    /// Factor applied to every rate of the configured noise model.
    pub scale: f64,
    pub result: SimulationResult,
}
