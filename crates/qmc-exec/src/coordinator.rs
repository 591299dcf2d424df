//! The execution coordinator: analysis, strategy selection and runs.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use num_complex::Complex64;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use qmc_ir::{Circuit, CircuitInput, Precision};
use qmc_mem::{MemoryEstimator, bytes_to_gb};
use qmc_sched::{LevelSchedule, ScheduleStats, compute_levels};
use qmc_sim::{Counts, StateBuffer};

use crate::backend::{Accelerator, HostAccelerator};
use crate::config::{ConfigError, SimConfig};
use crate::context::Context;
use crate::error::{ExecError, ExecResult};
use crate::result::{
    MAX_FINAL_STATE_QUBITS, NoiseLevelResult, PerformanceInfo, PerformanceRecord, SimulationResult,
};
use crate::strategy::{CircuitAnalysis, CircuitInfo, Strategy, StrategyChoice, choose_strategy};

/// Device type reported when no accelerator takes part in a run.
const HOST_DEVICE: &str = "CPU";

/// Snapshot of the coordinator's capabilities and state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorStatus {
    pub accelerator_enabled: bool,
    pub accelerator_available: bool,
    pub accelerator_name: Option<String>,
    pub max_workers: usize,
    #[serde(rename = "maxMemoryGB")]
    pub max_memory_gb: f64,
    pub precision: Precision,
    pub history_len: usize,
    pub last_benchmark: Option<DateTime<Utc>>,
}

/// Output of one run before it is packaged into a result.
struct RunOutput {
    counts: Counts,
    final_state: Option<Vec<Complex64>>,
    total_time: f64,
    gate_time: f64,
    sampling_time: f64,
}

/// Owns the worker pool, the memory budget, the optional accelerator and
/// the performance history.
pub struct Coordinator {
    context: Context,
    estimator: MemoryEstimator,
    pool: rayon::ThreadPool,
    accelerator: Option<Arc<dyn Accelerator>>,
    history: Vec<PerformanceRecord>,
    pub(crate) last_benchmark: Option<DateTime<Utc>>,
}

impl Coordinator {
    /// Build a coordinator from a validated context.
    ///
    /// Attaches a [`HostAccelerator`] when accelerated execution is enabled.
    pub fn new(context: Context) -> ExecResult<Self> {
        context.config.validate()?;
        let config = &context.config;

        let estimator = MemoryEstimator::new(config.max_memory_gb, config.precision)?
            .with_safety_factor(config.chunk_safety_factor)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_workers)
            .thread_name(|i| format!("qmc-worker-{i}"))
            .build()
            .map_err(|e| ExecError::Pool(e.to_string()))?;
        let accelerator = config
            .enable_accelerated
            .then(|| Arc::new(HostAccelerator::new()) as Arc<dyn Accelerator>);

        info!(
            workers = config.max_workers,
            max_memory_gb = config.max_memory_gb,
            precision = %config.precision,
            accelerated = config.enable_accelerated,
            "Coordinator initialized"
        );

        Ok(Self {
            context,
            estimator,
            pool,
            accelerator,
            history: Vec::new(),
            last_benchmark: None,
        })
    }

    /// Coordinator with `config` and tracing diagnostics.
    pub fn with_config(config: SimConfig) -> ExecResult<Self> {
        Self::new(Context::new(config))
    }

    /// Replace the accelerator. It is only used while accelerated execution
    /// is enabled in the configuration.
    pub fn with_accelerator(mut self, accelerator: Arc<dyn Accelerator>) -> Self {
        self.accelerator = Some(accelerator);
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.context.config
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The accelerator if it is enabled and available.
    fn ready_accelerator(&self) -> ExecResult<&Arc<dyn Accelerator>> {
        if !self.context.config.enable_accelerated {
            return Err(ExecError::BackendUnavailable(
                "accelerated execution is disabled".to_string(),
            ));
        }
        match &self.accelerator {
            Some(accelerator) if accelerator.is_available() => Ok(accelerator),
            Some(accelerator) => Err(ExecError::BackendUnavailable(format!(
                "accelerator '{}' is not available",
                accelerator.name()
            ))),
            None => Err(ExecError::BackendUnavailable(
                "no accelerator attached".to_string(),
            )),
        }
    }

    /// Memory, schedule and advisory analysis of `circuit`.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    pub fn analyze(&self, circuit: &Circuit) -> ExecResult<CircuitAnalysis> {
        let memory = self.estimator.estimate(circuit);
        let schedule = compute_levels(circuit.gates());
        let schedule_stats = ScheduleStats::from(&schedule);

        let analysis = CircuitAnalysis {
            circuit_info: circuit_info(circuit),
            memory,
            budget_bytes: self.estimator.budget_bytes(),
            fits_budget: self.estimator.fits(&memory),
            parallelization_ratio: schedule_stats.parallelization_ratio,
            schedule,
            schedule_stats,
            chunk_plan: self.estimator.chunk_plan(circuit.num_qubits())?,
            accelerator_ready: self.ready_accelerator().is_ok(),
            suggestions: self.estimator.suggest_optimizations(circuit),
        };
        debug!(
            total_bytes = memory.total_bytes(),
            fits = analysis.fits_budget,
            levels = analysis.schedule_stats.num_levels,
            ratio = analysis.parallelization_ratio,
            "Circuit analyzed"
        );
        Ok(analysis)
    }

    /// Strategy for `analysis` under the configured threshold.
    pub fn choose_strategy(&self, analysis: &CircuitAnalysis) -> Strategy {
        choose_strategy(analysis, self.context.config.parallel_threshold)
    }

    /// Validate, analyze, check the budget, execute and sample.
    ///
    /// Nothing is allocated for a circuit that fails validation or exceeds
    /// the memory budget. A requested accelerated or hybrid strategy without
    /// a ready accelerator runs as parallel and says so in the warnings.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name(), qubits = circuit.num_qubits()))]
    pub fn simulate(
        &mut self,
        circuit: &Circuit,
        shots: u64,
        choice: StrategyChoice,
    ) -> ExecResult<SimulationResult> {
        let report = circuit.ensure_valid()?;
        let mut warnings: Vec<String> = report.warnings.iter().map(ToString::to_string).collect();

        let analysis = self.analyze(circuit)?;
        if !analysis.fits_budget {
            return Err(self.resource_error(&analysis));
        }

        let requested = choice
            .fixed()
            .or_else(|| self.context.config.strategy.fixed())
            .unwrap_or_else(|| self.choose_strategy(&analysis));
        let (strategy, accelerator) = self.resolve_backend(requested, &mut warnings);

        let seed = self.context.config.seed.unwrap_or_else(rand::random);
        let run = self.pool.install(|| {
            self.execute(circuit, &analysis.schedule, strategy, accelerator.as_deref(), shots, seed)
        })?;

        let device_type = accelerator
            .as_deref()
            .map_or(HOST_DEVICE, |a| a.device_type())
            .to_string();
        let circuit_info = analysis.circuit_info;

        self.history.push(PerformanceRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            circuit_name: circuit.name().to_string(),
            circuit_info,
            shots,
            strategy,
            total_time: run.total_time,
            gate_time: run.gate_time,
            sampling_time: run.sampling_time,
        });
        info!(
            %strategy,
            total_time = run.total_time,
            gate_time = run.gate_time,
            sampling_time = run.sampling_time,
            "Simulation finished"
        );

        Ok(SimulationResult {
            results: run.counts,
            shots,
            circuit_info,
            performance: PerformanceInfo {
                total_time: run.total_time,
                gate_time: run.gate_time,
                sampling_time: run.sampling_time,
                strategy_used: strategy,
                device_type,
            },
            final_state: run.final_state,
            warnings,
        })
    }

    /// Build a circuit from its wire form under the configured gate
    /// fallback, then [`simulate`](Self::simulate) it.
    pub fn simulate_input(
        &mut self,
        name: &str,
        input: &CircuitInput,
        shots: u64,
        choice: StrategyChoice,
    ) -> ExecResult<SimulationResult> {
        let (circuit, substitutions) =
            Circuit::from_input(name, input, self.context.config.gate_fallback)?;
        for message in &substitutions {
            self.context.diagnostics().warn(message);
        }
        let mut result = self.simulate(&circuit, shots, choice)?;
        result.warnings.splice(0..0, substitutions);
        Ok(result)
    }

    /// Run `circuit` once per factor in `scales`, with the configured noise
    /// model's rates multiplied by that factor.
    ///
    /// The configured model is restored afterwards, also when a run fails.
    pub fn simulate_noise_levels(
        &mut self,
        circuit: &Circuit,
        shots: u64,
        scales: &[f64],
    ) -> ExecResult<Vec<NoiseLevelResult>> {
        let base = self.context.config.noise.ok_or_else(|| {
            ConfigError::ValidationError("a noise model is required for noise scaling".to_string())
        })?;

        let mut results = Vec::with_capacity(scales.len());
        let outcome = scales.iter().try_for_each(|&scale| {
            self.context.config.noise = Some(base.scaled(scale)?);
            let result = self.simulate(circuit, shots, StrategyChoice::Auto)?;
            results.push(NoiseLevelResult { scale, result });
            Ok::<_, ExecError>(())
        });
        self.context.config.noise = Some(base);
        outcome?;
        Ok(results)
    }

    /// Downgrade accelerator strategies that cannot run.
    fn resolve_backend(
        &self,
        requested: Strategy,
        warnings: &mut Vec<String>,
    ) -> (Strategy, Option<Arc<dyn Accelerator>>) {
        if !requested.needs_accelerator() {
            return (requested, None);
        }
        match self.ready_accelerator() {
            Ok(accelerator) => (requested, Some(Arc::clone(accelerator))),
            Err(e) => {
                warn!(%requested, error = %e, "Falling back to parallel execution");
                let message = format!("{requested} strategy unavailable ({e}); using parallel");
                self.context.diagnostics().warn(&message);
                warnings.push(message);
                (Strategy::Parallel, None)
            }
        }
    }

    fn resource_error(&self, analysis: &CircuitAnalysis) -> ExecError {
        let mut remedies = Vec::new();
        if self.estimator.precision() == Precision::Double {
            remedies.push("use single precision to halve the footprint".to_string());
        }
        remedies.push("reduce the number of qubits; each one removed halves the footprint".to_string());
        remedies.push(format!(
            "split the state into {} chunks of {} amplitudes",
            analysis.chunk_plan.num_chunks, analysis.chunk_plan.chunk_size
        ));
        ExecError::ResourceExhausted {
            required_bytes: analysis.memory.total_bytes(),
            budget_bytes: analysis.budget_bytes,
            required_gb: analysis.memory.total_gb(),
            budget_gb: bytes_to_gb(analysis.budget_bytes),
            remedies,
        }
    }

    /// Allocate, apply every gate with `strategy`, then sample.
    fn execute(
        &self,
        circuit: &Circuit,
        schedule: &LevelSchedule,
        strategy: Strategy,
        accelerator: Option<&dyn Accelerator>,
        shots: u64,
        seed: u64,
    ) -> ExecResult<RunOutput> {
        let started = Instant::now();
        let mut state = StateBuffer::new(circuit.num_qubits(), self.context.config.precision)?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let gates = circuit.gates();
        let noise = self.context.config.noise.filter(|n| !n.is_noiseless());

        let gate_start = Instant::now();
        match (strategy, accelerator) {
            (Strategy::Sequential, _) => {
                for gate in gates {
                    state.apply_gate(gate, &mut rng)?;
                    if let Some(noise) = &noise {
                        state.apply_noise(&[gate], noise, &mut rng);
                    }
                }
            }
            (Strategy::Accelerated, Some(accelerator)) => {
                for level in schedule.iter() {
                    let level_gates = level.gates(gates);
                    accelerator.apply_level(&mut state, &level_gates, &mut rng)?;
                    if let Some(noise) = &noise {
                        state.apply_noise(&level_gates, noise, &mut rng);
                    }
                }
            }
            (Strategy::Hybrid, Some(accelerator)) => {
                for level in schedule.iter() {
                    let level_gates = level.gates(gates);
                    if level_gates.len() > 1 {
                        state.apply_level_chunked(&level_gates, &mut rng)?;
                    } else {
                        accelerator.apply_level(&mut state, &level_gates, &mut rng)?;
                    }
                    if let Some(noise) = &noise {
                        state.apply_noise(&level_gates, noise, &mut rng);
                    }
                }
            }
            _ => {
                for level in schedule.iter() {
                    let level_gates = level.gates(gates);
                    state.apply_level_chunked(&level_gates, &mut rng)?;
                    if let Some(noise) = &noise {
                        state.apply_noise(&level_gates, noise, &mut rng);
                    }
                }
            }
        }
        if let Some(accelerator) = accelerator {
            accelerator.finish(&mut state);
        }
        let gate_time = gate_start.elapsed().as_secs_f64();

        let sample_start = Instant::now();
        let counts = state.sample(shots, seed.wrapping_add(1), self.context.config.max_workers)?;
        let sampling_time = sample_start.elapsed().as_secs_f64();

        let final_state =
            (circuit.num_qubits() <= MAX_FINAL_STATE_QUBITS).then(|| state.to_complex64());

        Ok(RunOutput {
            counts,
            final_state,
            total_time: started.elapsed().as_secs_f64(),
            gate_time,
            sampling_time,
        })
    }

    /// Records of every run so far, oldest first.
    pub fn history(&self) -> &[PerformanceRecord] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            accelerator_enabled: self.context.config.enable_accelerated,
            accelerator_available: self.ready_accelerator().is_ok(),
            accelerator_name: self.accelerator.as_ref().map(|a| a.name().to_string()),
            max_workers: self.pool.current_num_threads(),
            max_memory_gb: self.context.config.max_memory_gb,
            precision: self.context.config.precision,
            history_len: self.history.len(),
            last_benchmark: self.last_benchmark,
        }
    }

    /// Strategies that can run without a downgrade.
    pub fn available_strategies(&self) -> Vec<Strategy> {
        let ready = self.ready_accelerator().is_ok();
        Strategy::ALL
            .into_iter()
            .filter(|s| ready || !s.needs_accelerator())
            .collect()
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("context", &self.context)
            .field("workers", &self.pool.current_num_threads())
            .field("accelerator", &self.accelerator.as_ref().map(|a| a.name().to_string()))
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}

fn circuit_info(circuit: &Circuit) -> CircuitInfo {
    CircuitInfo {
        qubits: circuit.num_qubits(),
        gates: circuit.num_gates(),
        depth: circuit.depth(),
    }
}
