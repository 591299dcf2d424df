//! Strategy benchmark sweeps over synthetic circuits.
//!
//! Every cell of a `(qubits, gates)` grid is simulated with each strategy
//! the coordinator can run. Speedups are real wall-clock ratios against the
//! sequential run of the same cell.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use qmc_ir::{Circuit, Precision, QubitId};

use crate::coordinator::Coordinator;
use crate::error::ExecResult;
use crate::strategy::Strategy;

/// Result of one strategy on one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CellOutcome {
    #[serde(rename_all = "camelCase")]
    Succeeded {
        /// Strategy that actually ran, after any downgrade.
        strategy_used: Strategy,
        total_time: f64,
        gate_time: f64,
    },
    Failed { error: String },
}

impl CellOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CellOutcome::Succeeded { .. })
    }

    fn total_time(&self) -> Option<f64> {
        match self {
            CellOutcome::Succeeded { total_time, .. } => Some(*total_time),
            CellOutcome::Failed { .. } => None,
        }
    }
}

/// All strategies on one `(qubits, gates)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkCell {
    pub qubits: u32,
    pub gates: usize,
    pub outcomes: BTreeMap<Strategy, CellOutcome>,
}

/// Speedup of one strategy over sequential across the cells where both succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedupSummary {
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub samples: usize,
}

/// Host facts recorded with a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub max_workers: usize,
    pub precision: Precision,
    pub accelerator: Option<String>,
}

/// Full output of [`Coordinator::benchmark_sweep`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub system: SystemInfo,
    pub shots: u64,
    pub cells: Vec<BenchmarkCell>,
    pub speedups: BTreeMap<Strategy, SpeedupSummary>,
    pub recommendations: Vec<String>,
    /// Wall-clock seconds for the whole sweep.
    pub benchmark_time: f64,
}

impl BenchmarkReport {
    /// Write the report as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ExecResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), "Benchmark report saved");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ExecResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Number of failed strategy runs across all cells.
    pub fn failures(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|cell| cell.outcomes.values())
            .filter(|outcome| !outcome.is_success())
            .count()
    }
}

/// Random H / X / CNOT circuit, reproducible from `seed`.
///
/// CNOTs are only drawn when the circuit has at least two qubits.
pub fn synthetic_circuit(qubits: u32, gates: usize, seed: u64) -> ExecResult<Circuit> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut circuit = Circuit::with_qubits(format!("benchmark_{qubits}q_{gates}g"), qubits);
    if qubits == 0 {
        return Ok(circuit);
    }

    for _ in 0..gates {
        match rng.gen_range(0..3) {
            2 if qubits > 1 => {
                let control = rng.gen_range(0..qubits);
                let mut target = rng.gen_range(0..qubits - 1);
                if target >= control {
                    target += 1;
                }
                circuit.cx(QubitId(control), QubitId(target))?;
            }
            0 => {
                circuit.h(QubitId(rng.gen_range(0..qubits)))?;
            }
            _ => {
                circuit.x(QubitId(rng.gen_range(0..qubits)))?;
            }
        }
    }
    Ok(circuit)
}

/// Per-strategy speedups against sequential.
fn speedups(cells: &[BenchmarkCell]) -> BTreeMap<Strategy, SpeedupSummary> {
    let mut ratios: BTreeMap<Strategy, Vec<f64>> = BTreeMap::new();
    for cell in cells {
        let Some(baseline) = cell
            .outcomes
            .get(&Strategy::Sequential)
            .and_then(CellOutcome::total_time)
        else {
            continue;
        };
        for (&strategy, outcome) in &cell.outcomes {
            if strategy == Strategy::Sequential {
                continue;
            }
            if let Some(time) = outcome.total_time().filter(|t| *t > 0.0) {
                ratios.entry(strategy).or_default().push(baseline / time);
            }
        }
    }

    ratios
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(strategy, values)| {
            let summary = SpeedupSummary {
                average: values.iter().sum::<f64>() / values.len() as f64,
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                samples: values.len(),
            };
            (strategy, summary)
        })
        .collect()
}

fn recommendations(speedups: &BTreeMap<Strategy, SpeedupSummary>) -> Vec<String> {
    let mut recommendations = Vec::new();

    let best = speedups
        .iter()
        .max_by(|a, b| a.1.average.total_cmp(&b.1.average));
    if let Some((strategy, summary)) = best {
        recommendations.push(format!(
            "Best performing strategy: {strategy} ({:.2}x speedup)",
            summary.average
        ));
    }

    let parallel_gain = [Strategy::Parallel, Strategy::Hybrid]
        .iter()
        .filter_map(|s| speedups.get(s))
        .any(|summary| summary.average > 1.0);
    if parallel_gain {
        recommendations.push("Parallel execution shows benefits for this system".to_string());
    }

    if recommendations.is_empty() {
        recommendations.push("Sequential simulation is optimal for current configuration".to_string());
    }
    recommendations
}

impl Coordinator {
    /// Run every available strategy on a synthetic circuit per grid cell.
    ///
    /// A failing run is recorded in its cell and the sweep continues.
    #[instrument(skip(self))]
    pub fn benchmark_sweep(
        &mut self,
        qubit_range: &[u32],
        gate_counts: &[usize],
        shots: u64,
    ) -> ExecResult<BenchmarkReport> {
        let started = Instant::now();
        let strategies = self.available_strategies();
        let base_seed = self.config().seed.unwrap_or(0);
        let mut cells = Vec::with_capacity(qubit_range.len() * gate_counts.len());

        for &qubits in qubit_range {
            for &gates in gate_counts {
                let seed = base_seed ^ (u64::from(qubits) << 32) ^ gates as u64;
                let circuit = synthetic_circuit(qubits, gates, seed)?;
                let mut outcomes = BTreeMap::new();

                for &strategy in &strategies {
                    let outcome = match self.simulate(&circuit, shots, strategy.into()) {
                        Ok(result) => CellOutcome::Succeeded {
                            strategy_used: result.performance.strategy_used,
                            total_time: result.performance.total_time,
                            gate_time: result.performance.gate_time,
                        },
                        Err(e) => {
                            warn!(qubits, gates, %strategy, error = %e, "Benchmark run failed");
                            CellOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                    };
                    outcomes.insert(strategy, outcome);
                }
                cells.push(BenchmarkCell {
                    qubits,
                    gates,
                    outcomes,
                });
            }
        }

        let speedups = speedups(&cells);
        let recommendations = recommendations(&speedups);
        let status = self.status();
        let report = BenchmarkReport {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            system: SystemInfo {
                max_workers: status.max_workers,
                precision: status.precision,
                accelerator: status.accelerator_name.filter(|_| status.accelerator_available),
            },
            shots,
            cells,
            speedups,
            recommendations,
            benchmark_time: started.elapsed().as_secs_f64(),
        };
        self.last_benchmark = Some(report.timestamp);
        info!(
            cells = report.cells.len(),
            failures = report.failures(),
            seconds = report.benchmark_time,
            "Benchmark sweep finished"
        );
        Ok(report)
    }
}
