//! End-to-end coordinator behavior across strategies, budgets and input formats.

use std::sync::Arc;

use proptest::prelude::*;
use qmc_exec::{
    Accelerator, BenchmarkReport, CellOutcome, Context, Coordinator, ExecError, RecordingDiagnostics, SimConfig,
    Strategy, StrategyChoice,
};
use qmc_ir::{Circuit, CircuitInput, ClbitId, Gate, GateFallback, GateKind, Precision, QubitId};
use qmc_sim::{NoiseModel, SimResult, StateBuffer};
use rand::rngs::SmallRng;

fn config() -> SimConfig {
    SimConfig {
        max_workers: 2,
        seed: Some(2024),
        ..SimConfig::default()
    }
}

/// Accelerator that is attached but never available.
struct OfflineAccelerator;

impl Accelerator for OfflineAccelerator {
    fn name(&self) -> &str {
        "offline"
    }

    fn device_type(&self) -> &str {
        "GPU"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn apply_level(&self, _state: &mut StateBuffer, _gates: &[&Gate], _rng: &mut SmallRng) -> SimResult<()> {
        unreachable!("offline accelerator must not receive work")
    }
}

#[test]
fn test_every_strategy_agrees_on_distribution() {
    let mut config = config();
    config.enable_accelerated = true;
    let mut coordinator = Coordinator::with_config(config).unwrap();
    let circuit = Circuit::qft(4).unwrap();

    let mut states = Vec::new();
    for strategy in Strategy::ALL {
        let result = coordinator.simulate(&circuit, 100, strategy.into()).unwrap();
        assert_eq!(result.performance.strategy_used, strategy);
        states.push(result.final_state.unwrap());
    }
    for other in &states[1..] {
        for (a, b) in states[0].iter().zip(other) {
            assert!((a - b).norm() < 1e-10);
        }
    }
    assert_eq!(coordinator.history().len(), 4);
}

#[test]
fn test_unavailable_accelerator_downgrades() {
    let sink = Arc::new(RecordingDiagnostics::new());
    let mut config = config();
    config.enable_accelerated = true;
    let context = Context::new(config).with_diagnostics(sink.clone());
    let mut coordinator = Coordinator::new(context)
        .unwrap()
        .with_accelerator(Arc::new(OfflineAccelerator));

    let analysis = coordinator.analyze(&Circuit::ghz(3).unwrap()).unwrap();
    assert!(!analysis.accelerator_ready);

    let result = coordinator
        .simulate(&Circuit::ghz(3).unwrap(), 50, StrategyChoice::Accelerated)
        .unwrap();
    assert_eq!(result.performance.strategy_used, Strategy::Parallel);
    assert_eq!(result.performance.device_type, "CPU");
    assert!(sink.messages()[0].contains("accelerator 'offline' is not available"));
    assert_eq!(coordinator.available_strategies(), vec![Strategy::Sequential, Strategy::Parallel]);
}

#[test]
fn test_single_precision_run() {
    let mut config = config();
    config.precision = Precision::Single;
    let mut coordinator = Coordinator::with_config(config).unwrap();
    let result = coordinator
        .simulate(&Circuit::ghz(5).unwrap(), 2000, StrategyChoice::Parallel)
        .unwrap();
    assert_eq!(result.results.len(), 2);
    let zeros = result.probability("00000");
    assert!((0.4..=0.6).contains(&zeros), "p(00000) = {zeros}");
}

#[test]
fn test_final_state_only_for_small_circuits() {
    let mut coordinator = Coordinator::with_config(config()).unwrap();
    let small = coordinator.simulate(&Circuit::ghz(5).unwrap(), 1, StrategyChoice::Auto).unwrap();
    assert_eq!(small.final_state.map(|s| s.len()), Some(32));
    let large = coordinator.simulate(&Circuit::ghz(6).unwrap(), 1, StrategyChoice::Auto).unwrap();
    assert!(large.final_state.is_none());
}

#[test]
fn test_seeded_runs_repeat() {
    let mut coordinator = Coordinator::with_config(config()).unwrap();
    let circuit = Circuit::qft(3).unwrap();
    let a = coordinator.simulate(&circuit, 500, StrategyChoice::Auto).unwrap();
    let b = coordinator.simulate(&circuit, 500, StrategyChoice::Auto).unwrap();
    assert_eq!(a.results, b.results);
}

#[test]
fn test_lenient_input_substitutes_identity() {
    let input = CircuitInput::from_json(
        r#"{ "width": 2,
             "gates": [{ "kind": "H", "qubits": [0] },
                       { "kind": "MYSTERY", "qubits": [1] },
                       { "kind": "CX", "qubits": [0, 1] }],
             "measurements": [{ "qubit": 0, "classicalBit": 0 }, { "qubit": 1, "classicalBit": 1 }] }"#,
    )
    .unwrap();

    let mut strict = Coordinator::with_config(config()).unwrap();
    let err = strict.simulate_input("strict", &input, 10, StrategyChoice::Auto).unwrap_err();
    assert!(matches!(err, ExecError::Circuit(_)));

    let sink = Arc::new(RecordingDiagnostics::new());
    let mut config = config();
    config.gate_fallback = GateFallback::Lenient;
    let mut lenient = Coordinator::new(Context::new(config).with_diagnostics(sink.clone())).unwrap();
    let result = lenient.simulate_input("lenient", &input, 100, StrategyChoice::Auto).unwrap();
    assert!(result.warnings[0].contains("MYSTERY"));
    assert_eq!(sink.messages().len(), 1);
    assert!(result.results.keys().all(|k| k == "00" || k == "11"));
}

#[test]
fn test_resource_error_message_names_numbers() {
    let mut config = config();
    config.max_memory_gb = 0.001;
    let mut coordinator = Coordinator::with_config(config).unwrap();
    let err = coordinator
        .simulate(&Circuit::with_qubits("wide", 20), 1, StrategyChoice::Auto)
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("50331648 bytes"), "{message}");
    assert!(message.contains("1073741 bytes"), "{message}");
}

#[test]
fn test_benchmark_sweep_and_report_round_trip() {
    let mut coordinator = Coordinator::with_config(config()).unwrap();
    let report = coordinator.benchmark_sweep(&[2, 3], &[10, 20], 50).unwrap();

    assert_eq!(report.cells.len(), 4);
    for cell in &report.cells {
        assert_eq!(cell.outcomes.len(), 2);
        assert!(cell.outcomes.values().all(CellOutcome::is_success));
    }
    assert_eq!(report.failures(), 0);
    assert!(!report.recommendations.is_empty());
    assert_eq!(coordinator.history().len(), 8);
    assert_eq!(coordinator.status().last_benchmark, Some(report.timestamp));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.json");
    report.save(&path).unwrap();
    let loaded = BenchmarkReport::load(&path).unwrap();
    assert_eq!(loaded.id, report.id);
    assert_eq!(loaded.timestamp, report.timestamp);
    assert_eq!(loaded.cells.len(), report.cells.len());
    assert_eq!(loaded.recommendations, report.recommendations);
}

#[test]
fn test_benchmark_records_failures_and_continues() {
    let mut config = config();
    config.max_memory_gb = 0.0001;
    let mut coordinator = Coordinator::with_config(config).unwrap();
    // 2 qubits fit, 14 qubits do not
    let report = coordinator.benchmark_sweep(&[2, 14], &[5], 10).unwrap();
    assert_eq!(report.cells.len(), 2);
    assert!(report.cells[0].outcomes.values().all(CellOutcome::is_success));
    assert!(report.cells[1].outcomes.values().all(|o| !o.is_success()));
    assert_eq!(report.failures(), 2);
}

#[test]
fn test_execution_follows_program_order_not_start_times() {
    // the reset carries the earliest start time but runs after the X
    let mut circuit = Circuit::with_qubits("early_reset", 1);
    circuit.add_gate_at(GateKind::X, &[QubitId(0)], &[], 3.0, 1.0).unwrap();
    circuit.add_gate_at(GateKind::RESET, &[QubitId(0)], &[], 0.0, 1.0).unwrap();
    circuit.add_gate_at(GateKind::MEASURE, &[QubitId(0)], &[], 4.0, 1.0).unwrap();

    let mut coordinator = Coordinator::with_config(config()).unwrap();
    let result = coordinator.simulate(&circuit, 100, StrategyChoice::Auto).unwrap();
    assert_eq!(result.results.get("0"), Some(&100));

    let mut late_measure = Circuit::with_qubits("late_measure", 1);
    late_measure
        .add_gate_at(GateKind::MEASURE, &[QubitId(0)], &[], 5.0, 1.0)
        .unwrap();
    late_measure.add_gate_at(GateKind::X, &[QubitId(0)], &[], 0.0, 1.0).unwrap();
    let err = coordinator.simulate(&late_measure, 10, StrategyChoice::Auto).unwrap_err();
    assert!(err.to_string().contains("after being measured"), "{err}");
}

fn flip_circuit() -> Circuit {
    let mut circuit = Circuit::with_qubits("flip", 1);
    circuit.x(QubitId(0)).unwrap();
    circuit.measure(QubitId(0), ClbitId(0)).unwrap();
    circuit
}

#[test]
fn test_noise_applies_on_every_strategy() {
    let mut config = config();
    config.enable_accelerated = true;
    config.noise = Some(NoiseModel::new(0.0, 1.0, 0.0).unwrap());
    let mut coordinator = Coordinator::with_config(config).unwrap();

    for strategy in Strategy::ALL {
        let result = coordinator.simulate(&flip_circuit(), 200, strategy.into()).unwrap();
        assert_eq!(result.results.get("0"), Some(&200), "{strategy}");
    }
}

#[test]
fn test_noise_level_sweep() {
    let mut config = config();
    let base = NoiseModel::new(0.0, 1.0, 0.0).unwrap();
    config.noise = Some(base);
    let mut coordinator = Coordinator::with_config(config).unwrap();

    let levels = coordinator
        .simulate_noise_levels(&flip_circuit(), 100, &[0.0, 1.0])
        .unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].scale, 0.0);
    assert_eq!(levels[0].result.results.get("1"), Some(&100));
    assert_eq!(levels[1].result.results.get("0"), Some(&100));
    assert_eq!(coordinator.config().noise, Some(base));

    assert!(coordinator.simulate_noise_levels(&flip_circuit(), 10, &[-2.0]).is_err());
    assert_eq!(coordinator.config().noise, Some(base));

    let mut noiseless = Coordinator::with_config(self::config()).unwrap();
    let err = noiseless
        .simulate_noise_levels(&flip_circuit(), 10, &[1.0])
        .unwrap_err();
    assert!(matches!(err, ExecError::Config(_)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_counts_sum_to_shots(qubits in 1u32..5, gates in 0usize..30, shots in 0u64..2000) {
        let mut coordinator = Coordinator::with_config(config()).unwrap();
        let circuit = qmc_exec::synthetic_circuit(qubits, gates, 5).unwrap();
        let result = coordinator.simulate(&circuit, shots, StrategyChoice::Auto).unwrap();
        prop_assert_eq!(result.results.values().sum::<u64>(), shots);
        prop_assert!(result.results.keys().all(|k| k.len() == qubits as usize));
    }
}

#[test]
fn test_analysis_reports_schedule() {
    let coordinator = Coordinator::with_config(config()).unwrap();
    let mut circuit = Circuit::with_qubits("layers", 4);
    circuit.h(QubitId(0)).unwrap();
    circuit.h(QubitId(1)).unwrap();
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    let analysis = coordinator.analyze(&circuit).unwrap();
    assert_eq!(analysis.schedule_stats.num_levels, 2);
    assert!(analysis.fits_budget);
    assert!(analysis.parallelization_ratio > 0.6);
    let json = serde_json::to_value(&analysis).unwrap();
    assert!(json["memory"]["amplitudeBytes"].is_number());
}
