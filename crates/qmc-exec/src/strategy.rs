//! Execution strategies and automatic selection.

use serde::{Deserialize, Serialize};
use std::fmt;

use qmc_mem::{ChunkPlanSummary, MemoryEstimate};
use qmc_sched::{LevelSchedule, ScheduleStats};

/// How the gates of a circuit are applied to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Gate by gate in program order.
    Sequential,
    /// Level by level on the worker pool, in place.
    Parallel,
    /// Level by level on the accelerator.
    Accelerated,
    /// Multi-gate levels on the worker pool, single-gate levels on the accelerator.
    Hybrid,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Sequential,
        Strategy::Parallel,
        Strategy::Accelerated,
        Strategy::Hybrid,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Parallel => "parallel",
            Strategy::Accelerated => "accelerated",
            Strategy::Hybrid => "hybrid",
        }
    }

    /// Whether the strategy needs an accelerator.
    pub const fn needs_accelerator(self) -> bool {
        matches!(self, Strategy::Accelerated | Strategy::Hybrid)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strategy requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyChoice {
    /// Pick from the circuit analysis.
    #[default]
    Auto,
    Sequential,
    Parallel,
    Accelerated,
    Hybrid,
}

impl StrategyChoice {
    /// Parse from a configuration string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "auto" => Some(StrategyChoice::Auto),
            "sequential" => Some(StrategyChoice::Sequential),
            "parallel" => Some(StrategyChoice::Parallel),
            "accelerated" => Some(StrategyChoice::Accelerated),
            "hybrid" => Some(StrategyChoice::Hybrid),
            _ => None,
        }
    }

    /// The fixed strategy, or `None` for [`StrategyChoice::Auto`].
    pub const fn fixed(self) -> Option<Strategy> {
        match self {
            StrategyChoice::Auto => None,
            StrategyChoice::Sequential => Some(Strategy::Sequential),
            StrategyChoice::Parallel => Some(Strategy::Parallel),
            StrategyChoice::Accelerated => Some(Strategy::Accelerated),
            StrategyChoice::Hybrid => Some(Strategy::Hybrid),
        }
    }
}

impl From<Strategy> for StrategyChoice {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Sequential => StrategyChoice::Sequential,
            Strategy::Parallel => StrategyChoice::Parallel,
            Strategy::Accelerated => StrategyChoice::Accelerated,
            Strategy::Hybrid => StrategyChoice::Hybrid,
        }
    }
}

/// Width, size and depth of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInfo {
    pub qubits: u32,
    pub gates: usize,
    pub depth: f64,
}

/// Everything strategy selection needs to know about a circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitAnalysis {
    pub circuit_info: CircuitInfo,
    pub memory: MemoryEstimate,
    pub budget_bytes: u64,
    pub fits_budget: bool,
    pub schedule: LevelSchedule,
    pub schedule_stats: ScheduleStats,
    pub parallelization_ratio: f64,
    /// Chunk layout under the budget and safety factor.
    pub chunk_plan: ChunkPlanSummary,
    /// An accelerator is enabled and reports itself available.
    pub accelerator_ready: bool,
    pub suggestions: Vec<String>,
}

impl CircuitAnalysis {
    /// Eligible for an accelerator: fits the budget and one is ready.
    pub fn accelerated_eligible(&self) -> bool {
        self.fits_budget && self.accelerator_ready
    }

    /// Eligible for level parallelism: ratio strictly above `threshold`.
    pub fn parallel_eligible(&self, threshold: f64) -> bool {
        self.parallelization_ratio > threshold
    }
}

/// Pick a strategy from an analysis.
///
/// Preference order is hybrid, accelerated, parallel, sequential.
pub fn choose_strategy(analysis: &CircuitAnalysis, parallel_threshold: f64) -> Strategy {
    match (
        analysis.accelerated_eligible(),
        analysis.parallel_eligible(parallel_threshold),
    ) {
        (true, true) => Strategy::Hybrid,
        (true, false) => Strategy::Accelerated,
        (false, true) => Strategy::Parallel,
        (false, false) => Strategy::Sequential,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmc_ir::{Circuit, Precision};

    fn analysis(fits: bool, ready: bool, ratio: f64) -> CircuitAnalysis {
        let circuit = Circuit::bell().unwrap();
        CircuitAnalysis {
            circuit_info: CircuitInfo {
                qubits: 2,
                gates: 4,
                depth: 3.0,
            },
            memory: qmc_mem::estimate(&circuit, Precision::Double),
            budget_bytes: 1024,
            fits_budget: fits,
            schedule: LevelSchedule::default(),
            schedule_stats: ScheduleStats::default(),
            parallelization_ratio: ratio,
            chunk_plan: ChunkPlanSummary {
                chunk_size: 16,
                num_chunks: 1,
            },
            accelerator_ready: ready,
            suggestions: Vec::new(),
        }
    }

    #[test]
    fn test_selection_table() {
        assert_eq!(choose_strategy(&analysis(true, true, 0.5), 0.2), Strategy::Hybrid);
        assert_eq!(choose_strategy(&analysis(true, true, 0.1), 0.2), Strategy::Accelerated);
        assert_eq!(choose_strategy(&analysis(true, false, 0.5), 0.2), Strategy::Parallel);
        assert_eq!(choose_strategy(&analysis(false, true, 0.5), 0.2), Strategy::Parallel);
        assert_eq!(choose_strategy(&analysis(true, false, 0.1), 0.2), Strategy::Sequential);
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(choose_strategy(&analysis(false, false, 0.2), 0.2), Strategy::Sequential);
    }

    #[test]
    fn test_choice_names() {
        assert_eq!(StrategyChoice::from_name("Hybrid"), Some(StrategyChoice::Hybrid));
        assert_eq!(StrategyChoice::from_name("gpu"), None);
        assert_eq!(StrategyChoice::Auto.fixed(), None);
        assert_eq!(StrategyChoice::from(Strategy::Parallel).fixed(), Some(Strategy::Parallel));
        assert_eq!(Strategy::Accelerated.to_string(), "accelerated");
    }
}
