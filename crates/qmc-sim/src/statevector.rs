//! Dense state vector in a fixed precision.

use num_complex::{Complex, Complex64};
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, trace};

use qmc_ir::{Gate, Precision};

use crate::error::{SimError, SimResult};
use crate::kernels::{self, Mat2};
use crate::noise::{NoiseModel, Pauli};
use crate::op::{DenseOp, GateOp};
use crate::real::Real;
use crate::sampling::{self, Counts};

/// Tolerance on the squared norm accepted by [`StateVector::from_amplitudes`].
const NORM_TOLERANCE: f64 = 1e-6;

/// A state of `n` qubits held as `2^n` complex amplitudes.
///
/// Basis index bit `k` is the value of qubit `k`.
#[derive(Debug, Clone)]
pub struct StateVector<T: Real> {
    amplitudes: Vec<Complex<T>>,
    num_qubits: u32,
    /// Output buffer of the fresh-buffer level path, allocated on first use.
    scratch: Vec<Complex<T>>,
}

fn zero<T: Real>() -> Complex<T> {
    Complex::new(T::zero(), T::zero())
}

fn alloc<T: Real>(num_qubits: u32) -> SimResult<Vec<Complex<T>>> {
    let max = usize::BITS - 2;
    if num_qubits > max {
        return Err(SimError::TooManyQubits {
            qubits: num_qubits,
            max,
        });
    }
    let len = 1usize << num_qubits;
    let bytes = (len as u64).saturating_mul(T::PRECISION.bytes_per_amplitude());
    let mut amplitudes = Vec::new();
    amplitudes
        .try_reserve_exact(len)
        .map_err(|_| SimError::Allocation {
            qubits: num_qubits,
            bytes,
        })?;
    amplitudes.resize(len, zero());
    Ok(amplitudes)
}

impl<T: Real> StateVector<T> {
    /// Allocate `|0…0⟩` on `num_qubits` qubits.
    pub fn new(num_qubits: u32) -> SimResult<Self> {
        let mut amplitudes = alloc::<T>(num_qubits)?;
        amplitudes[0] = Complex::new(T::one(), T::zero());
        debug!(qubits = num_qubits, len = amplitudes.len(), "Allocated state vector");
        Ok(Self {
            amplitudes,
            num_qubits,
            scratch: Vec::new(),
        })
    }

    /// Wrap existing amplitudes. The length must be a power of two and the
    /// state normalized.
    pub fn from_amplitudes(amplitudes: Vec<Complex<T>>) -> SimResult<Self> {
        if !amplitudes.len().is_power_of_two() {
            return Err(SimError::InvalidState(format!(
                "length {} is not a power of two",
                amplitudes.len()
            )));
        }
        let num_qubits = amplitudes.len().trailing_zeros();
        let state = Self {
            amplitudes,
            num_qubits,
            scratch: Vec::new(),
        };
        let norm = state.norm_sqr();
        if (norm - 1.0).abs() > NORM_TOLERANCE {
            return Err(SimError::InvalidState(format!(
                "squared norm is {norm}, expected 1"
            )));
        }
        Ok(state)
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Precision of the amplitudes.
    pub fn precision(&self) -> Precision {
        T::PRECISION
    }

    /// Bytes held by the amplitude vector, excluding any scratch buffer.
    pub fn memory_bytes(&self) -> u64 {
        self.amplitudes.len() as u64 * T::PRECISION.bytes_per_amplitude()
    }

    /// Raw amplitudes.
    pub fn amplitudes(&self) -> &[Complex<T>] {
        &self.amplitudes
    }

    /// Apply a 2×2 matrix to `qubit`.
    pub fn apply_single_qubit(&mut self, matrix: &Mat2<T>, qubit: usize) {
        kernels::apply_single(&mut self.amplitudes, matrix, qubit);
    }

    /// Apply a 2×2 matrix to `target` where `control` is set.
    pub fn apply_controlled(&mut self, matrix: &Mat2<T>, control: usize, target: usize) {
        kernels::apply_controlled(&mut self.amplitudes, matrix, control, target);
    }

    /// Apply one gate. Resets draw their outcome from `rng`.
    pub fn apply_gate<R: Rng>(&mut self, gate: &Gate, rng: &mut R) -> SimResult<()> {
        let op = GateOp::compile(gate)?;
        self.apply_op(&op, rng);
        Ok(())
    }

    /// Apply a compiled op.
    pub fn apply_op<R: Rng>(&mut self, op: &GateOp<T>, rng: &mut R) {
        match *op {
            GateOp::Reset { qubit } => self.reset(qubit, rng),
            _ => op.apply(&mut self.amplitudes),
        }
    }

    /// Apply the errors `noise` draws for each operand of each unitary gate.
    ///
    /// Gates of one level touch disjoint qubits, so calling this once after
    /// the level matches calling it after every gate.
    pub fn apply_noise<R: Rng>(&mut self, gates: &[&Gate], noise: &NoiseModel, rng: &mut R) {
        if noise.is_noiseless() {
            return;
        }
        for gate in gates.iter().filter(|g| g.kind().is_unitary()) {
            for qubit in gate.qubits() {
                if let Some(pauli) = noise.sample_error(rng) {
                    trace!(qubit = qubit.index(), ?pauli, "Noise error");
                    kernels::apply_single(&mut self.amplitudes, &pauli_matrix(pauli), qubit.index());
                }
            }
        }
    }

    /// Apply a dependency level by splitting the state into aligned chunks.
    ///
    /// Gates in a level act on disjoint qubits. The chunk spans every qubit
    /// touched by the level, so each chunk receives all unitary gates
    /// independently and chunks are processed in parallel. A level whose
    /// chunk would be the whole state falls back to per-gate kernels, with
    /// single-qubit gates parallelized inside the kernel. Resets run after
    /// the unitary gates.
    pub fn apply_level_chunked<R: Rng>(&mut self, gates: &[&Gate], rng: &mut R) -> SimResult<()> {
        let ops = gates
            .iter()
            .map(|g| GateOp::<T>::compile(g))
            .collect::<SimResult<Vec<_>>>()?;
        let (unitary, rest): (Vec<_>, Vec<_>) = ops.into_iter().partition(GateOp::is_unitary);

        if let Some(top) = unitary.iter().filter_map(GateOp::max_qubit).max() {
            let chunk = 1usize << (top + 1);
            if chunk < self.amplitudes.len() {
                self.amplitudes.par_chunks_mut(chunk).for_each(|block| {
                    for op in &unitary {
                        op.apply(block);
                    }
                });
            } else {
                for op in &unitary {
                    match op {
                        GateOp::Single { qubit, matrix } => {
                            kernels::apply_single_par(&mut self.amplitudes, matrix, *qubit);
                        }
                        _ => op.apply(&mut self.amplitudes),
                    }
                }
            }
        }

        for op in &rest {
            self.apply_op(op, rng);
        }
        Ok(())
    }

    /// Apply a dependency level gate by gate, each into a fresh output buffer.
    ///
    /// Every output amplitude is computed from the previous buffer only, then
    /// the buffers are swapped. Costs a second state-sized allocation.
    pub fn apply_level_buffered<R: Rng>(&mut self, gates: &[&Gate], rng: &mut R) -> SimResult<()> {
        for gate in gates.iter().filter(|g| g.kind().is_unitary()) {
            let Some(dense) = DenseOp::<T>::compile(gate) else {
                continue;
            };
            if self.scratch.len() != self.amplitudes.len() {
                trace!(qubits = self.num_qubits, "Allocating scratch buffer");
                self.scratch = alloc::<T>(self.num_qubits)?;
            }
            kernels::apply_dense_into(&self.amplitudes, &mut self.scratch, &dense.matrix, &dense.qubits);
            std::mem::swap(&mut self.amplitudes, &mut self.scratch);
        }
        for gate in gates.iter().filter(|g| !g.kind().is_unitary()) {
            self.apply_gate(gate, rng)?;
        }
        Ok(())
    }

    /// Drop the fresh-buffer scratch allocation.
    pub fn release_scratch(&mut self) {
        self.scratch = Vec::new();
    }

    /// Projectively measure `qubit`, then flip it to `|0⟩` if the outcome was 1.
    pub fn reset<R: Rng>(&mut self, qubit: usize, rng: &mut R) {
        let mask = 1usize << qubit;
        let p1: f64 = self
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr().into_f64())
            .sum();
        let one = p1 > 0.0 && rng.gen_range(0.0..1.0) < p1;
        let kept = if one { p1 } else { 1.0 - p1 };
        let scale = T::real(1.0 / kept.max(f64::MIN_POSITIVE).sqrt());

        for i in (0..self.amplitudes.len()).filter(|i| i & mask == 0) {
            let j = i | mask;
            let source = if one { self.amplitudes[j] } else { self.amplitudes[i] };
            self.amplitudes[i] = source * scale;
            self.amplitudes[j] = zero();
        }
    }

    /// Sum of squared magnitudes, accumulated in `f64`.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr().into_f64()).sum()
    }

    /// Probability of each basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes
            .par_iter()
            .map(|a| a.norm_sqr().into_f64())
            .collect()
    }

    /// Sample `shots` measurements of all qubits.
    pub fn sample(&self, shots: u64, seed: u64, streams: usize) -> SimResult<Counts> {
        sampling::sample_counts(&self.probabilities(), self.num_qubits, shots, seed, streams)
    }

    /// Amplitudes widened to `Complex64`.
    pub fn to_complex64(&self) -> Vec<Complex64> {
        self.amplitudes
            .iter()
            .map(|a| Complex64::new(a.re.into_f64(), a.im.into_f64()))
            .collect()
    }
}

fn pauli_matrix<T: Real>(pauli: Pauli) -> Mat2<T> {
    let o = Complex::new(T::zero(), T::zero());
    let l = Complex::new(T::one(), T::zero());
    let i = Complex::new(T::zero(), T::one());
    match pauli {
        Pauli::X => [[o, l], [l, o]],
        Pauli::Y => [[o, -i], [i, o]],
        Pauli::Z => [[l, o], [o, -l]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmc_ir::{Circuit, QubitId};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_certain_bit_flip_undoes_x() {
        let mut circuit = Circuit::with_qubits("flip", 2);
        circuit.x(QubitId(1)).unwrap();
        let gates: Vec<&Gate> = circuit.gates().iter().collect();

        let mut state = StateVector::<f64>::new(2).unwrap();
        let mut rng = SmallRng::seed_from_u64(4);
        state.apply_level_chunked(&gates, &mut rng).unwrap();
        state.apply_noise(&gates, &NoiseModel::new(0.0, 1.0, 0.0).unwrap(), &mut rng);
        assert!(approx(state.probabilities()[0], 1.0));
    }

    #[test]
    fn test_noise_keeps_norm_and_skips_non_unitary() {
        let mut circuit = Circuit::with_qubits("noisy", 3);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        circuit.reset(QubitId(1)).unwrap();
        let noise = NoiseModel::new(0.5, 0.2, 0.2).unwrap();

        let mut state = StateVector::<f64>::new(3).unwrap();
        let mut rng = SmallRng::seed_from_u64(21);
        for gate in circuit.gates() {
            state.apply_gate(gate, &mut rng).unwrap();
            state.apply_noise(&[gate], &noise, &mut rng);
        }
        assert!(approx(state.norm_sqr(), 1.0));

        // a reset alone draws no errors
        let mut reset_only = StateVector::<f64>::new(3).unwrap();
        let certain = NoiseModel::new(0.0, 1.0, 0.0).unwrap();
        reset_only.apply_noise(&[&circuit.gates()[2]], &certain, &mut rng);
        assert!(approx(reset_only.probabilities()[0], 1.0));
    }

    #[test]
    fn test_initial_state() {
        let state = StateVector::<f64>::new(3).unwrap();
        assert_eq!(state.amplitudes().len(), 8);
        assert!(approx(state.amplitudes()[0].re, 1.0));
        assert!(approx(state.norm_sqr(), 1.0));
        assert_eq!(state.memory_bytes(), 128);
        assert_eq!(StateVector::<f32>::new(3).unwrap().memory_bytes(), 64);
    }

    #[test]
    fn test_zero_qubits() {
        let state = StateVector::<f64>::new(0).unwrap();
        assert_eq!(state.probabilities(), vec![1.0]);
    }

    #[test]
    fn test_too_many_qubits() {
        assert!(matches!(
            StateVector::<f64>::new(usize::BITS),
            Err(SimError::TooManyQubits { .. })
        ));
    }

    #[test]
    fn test_from_amplitudes_checks() {
        let half = std::f64::consts::FRAC_1_SQRT_2;
        let ok = StateVector::from_amplitudes(vec![Complex::new(half, 0.0), Complex::new(half, 0.0)]).unwrap();
        assert_eq!(ok.num_qubits(), 1);
        assert!(StateVector::<f64>::from_amplitudes(vec![Complex::new(1.0, 0.0); 3]).is_err());
        assert!(StateVector::<f64>::from_amplitudes(vec![Complex::new(1.0, 0.0); 2]).is_err());
    }

    #[test]
    fn test_bell_amplitudes() {
        let circuit = Circuit::bell().unwrap();
        let mut state = StateVector::<f64>::new(2).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        for gate in circuit.gates() {
            state.apply_gate(gate, &mut rng).unwrap();
        }
        let probs = state.probabilities();
        assert!(approx(probs[0b00], 0.5));
        assert!(approx(probs[0b11], 0.5));
        assert!(approx(probs[0b01] + probs[0b10], 0.0));
    }

    #[test]
    fn test_reset_returns_to_zero() {
        let mut circuit = Circuit::with_qubits("reset", 2);
        circuit.x(QubitId(1)).unwrap();
        circuit.h(QubitId(0)).unwrap();
        let mut state = StateVector::<f64>::new(2).unwrap();
        let mut rng = SmallRng::seed_from_u64(5);
        for gate in circuit.gates() {
            state.apply_gate(gate, &mut rng).unwrap();
        }

        state.reset(1, &mut rng);
        let probs = state.probabilities();
        assert!(approx(probs[0b00], 0.5));
        assert!(approx(probs[0b01], 0.5));
        assert!(approx(state.norm_sqr(), 1.0));

        state.reset(0, &mut rng);
        assert!(approx(state.probabilities()[0], 1.0));
    }

    #[test]
    fn test_level_paths_match_sequential() {
        let mut circuit = Circuit::with_qubits("level", 4);
        circuit.h(QubitId(0)).unwrap();
        circuit.ry(0.3, QubitId(1)).unwrap();
        circuit.cx(QubitId(2), QubitId(3)).unwrap();
        let level: Vec<&Gate> = circuit.gates().iter().collect();
        let mut rng = SmallRng::seed_from_u64(1);

        let mut seq = StateVector::<f64>::new(4).unwrap();
        seq.apply_single_qubit(&[[Complex::new(0.0, 0.0), Complex::new(1.0, 0.0)], [Complex::new(1.0, 0.0), Complex::new(0.0, 0.0)]], 2);
        let mut chunked = seq.clone();
        let mut buffered = seq.clone();
        for gate in &level {
            seq.apply_gate(gate, &mut rng).unwrap();
        }
        chunked.apply_level_chunked(&level, &mut rng).unwrap();
        buffered.apply_level_buffered(&level, &mut rng).unwrap();

        for ((a, b), c) in seq
            .amplitudes()
            .iter()
            .zip(chunked.amplitudes())
            .zip(buffered.amplitudes())
        {
            assert!((a - b).norm() < 1e-12);
            assert!((a - c).norm() < 1e-12);
        }
    }

    #[test]
    fn test_chunked_uses_sub_state_chunks() {
        // gates only on qubit 0 of a 5-qubit state: 16 independent chunks
        let mut circuit = Circuit::with_qubits("low", 5);
        circuit.h(QubitId(4)).unwrap();
        circuit.x(QubitId(0)).unwrap();
        let mut rng = SmallRng::seed_from_u64(2);
        let mut state = StateVector::<f32>::new(5).unwrap();
        state.apply_gate(&circuit.gates()[0], &mut rng).unwrap();
        state.apply_level_chunked(&[&circuit.gates()[1]], &mut rng).unwrap();
        let probs = state.probabilities();
        assert!((probs[0b00001] - 0.5).abs() < 1e-6);
        assert!((probs[0b10001] - 0.5).abs() < 1e-6);
    }
}
