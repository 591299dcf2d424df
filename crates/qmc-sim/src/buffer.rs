//! Precision-erased state vector.

use num_complex::Complex64;
use rand::Rng;

use qmc_ir::{Gate, Precision};

use crate::error::SimResult;
use crate::noise::NoiseModel;
use crate::sampling::Counts;
use crate::statevector::StateVector;

/// A state vector whose precision is chosen at run time.
#[derive(Debug, Clone)]
pub enum StateBuffer {
    /// `Complex<f32>` amplitudes.
    Single(StateVector<f32>),
    /// `Complex<f64>` amplitudes.
    Double(StateVector<f64>),
}

macro_rules! dispatch {
    ($self:expr, $state:ident => $body:expr) => {
        match $self {
            StateBuffer::Single($state) => $body,
            StateBuffer::Double($state) => $body,
        }
    };
}

impl StateBuffer {
    /// Allocate `|0…0⟩` on `num_qubits` qubits in `precision`.
    pub fn new(num_qubits: u32, precision: Precision) -> SimResult<Self> {
        Ok(match precision {
            Precision::Single => StateBuffer::Single(StateVector::new(num_qubits)?),
            Precision::Double => StateBuffer::Double(StateVector::new(num_qubits)?),
        })
    }

    pub fn num_qubits(&self) -> u32 {
        dispatch!(self, s => s.num_qubits())
    }

    pub fn precision(&self) -> Precision {
        dispatch!(self, s => s.precision())
    }

    pub fn memory_bytes(&self) -> u64 {
        dispatch!(self, s => s.memory_bytes())
    }

    /// See [`StateVector::apply_gate`].
    pub fn apply_gate<R: Rng>(&mut self, gate: &Gate, rng: &mut R) -> SimResult<()> {
        dispatch!(self, s => s.apply_gate(gate, rng))
    }

    /// See [`StateVector::apply_level_chunked`].
    pub fn apply_level_chunked<R: Rng>(&mut self, gates: &[&Gate], rng: &mut R) -> SimResult<()> {
        dispatch!(self, s => s.apply_level_chunked(gates, rng))
    }

    /// See [`StateVector::apply_level_buffered`].
    pub fn apply_level_buffered<R: Rng>(&mut self, gates: &[&Gate], rng: &mut R) -> SimResult<()> {
        dispatch!(self, s => s.apply_level_buffered(gates, rng))
    }

    /// See [`StateVector::apply_noise`].
    pub fn apply_noise<R: Rng>(&mut self, gates: &[&Gate], noise: &NoiseModel, rng: &mut R) {
        dispatch!(self, s => s.apply_noise(gates, noise, rng))
    }

    pub fn release_scratch(&mut self) {
        dispatch!(self, s => s.release_scratch())
    }

    pub fn norm_sqr(&self) -> f64 {
        dispatch!(self, s => s.norm_sqr())
    }

    pub fn probabilities(&self) -> Vec<f64> {
        dispatch!(self, s => s.probabilities())
    }

    /// See [`StateVector::sample`].
    pub fn sample(&self, shots: u64, seed: u64, streams: usize) -> SimResult<Counts> {
        dispatch!(self, s => s.sample(shots, seed, streams))
    }

    pub fn to_complex64(&self) -> Vec<Complex64> {
        dispatch!(self, s => s.to_complex64())
    }
}
