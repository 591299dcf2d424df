//! Stochastic Pauli noise applied after unitary gates.
//!
//! Each run follows a single noise trajectory: after a gate, every operand
//! qubit draws at most one error from the run's generator, and the sampled
//! Pauli is applied to the state. Shots are then sampled from that one
//! trajectory.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Per-qubit error probabilities applied after every unitary gate.
///
/// The channels are tried in order (depolarizing, bit flip, phase flip) and
/// the first one that fires wins, so a qubit suffers at most one error per
/// gate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoiseModel {
    /// Probability of a uniformly random X, Y or Z.
    #[serde(default)]
    pub depolarizing: f64,
    /// Probability of an X error.
    #[serde(default)]
    pub bit_flip: f64,
    /// Probability of a Z error.
    #[serde(default)]
    pub phase_flip: f64,
}

/// A single-qubit Pauli error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pauli {
    X,
    Y,
    Z,
}

impl NoiseModel {
    pub fn new(depolarizing: f64, bit_flip: f64, phase_flip: f64) -> SimResult<Self> {
        let model = Self {
            depolarizing,
            bit_flip,
            phase_flip,
        };
        model.validate()?;
        Ok(model)
    }

    /// Check that every rate is a probability.
    pub fn validate(&self) -> SimResult<()> {
        for (name, rate) in [
            ("depolarizing", self.depolarizing),
            ("bit_flip", self.bit_flip),
            ("phase_flip", self.phase_flip),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(SimError::InvalidNoise(format!(
                    "{name} rate {rate} is outside [0, 1]"
                )));
            }
        }
        Ok(())
    }

    /// Copy with every rate multiplied by `factor` and capped at 1.
    pub fn scaled(&self, factor: f64) -> SimResult<Self> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(SimError::InvalidNoise(format!(
                "scale factor {factor} must be finite and non-negative"
            )));
        }
        Ok(Self {
            depolarizing: (self.depolarizing * factor).min(1.0),
            bit_flip: (self.bit_flip * factor).min(1.0),
            phase_flip: (self.phase_flip * factor).min(1.0),
        })
    }

    pub fn is_noiseless(&self) -> bool {
        self.depolarizing == 0.0 && self.bit_flip == 0.0 && self.phase_flip == 0.0
    }

    /// Draw the error, if any, that hits one qubit after one gate.
    pub fn sample_error<R: Rng>(&self, rng: &mut R) -> Option<Pauli> {
        if self.depolarizing > 0.0 && rng.gen_range(0.0..1.0) < self.depolarizing {
            return Some(match rng.gen_range(0..3) {
                0 => Pauli::X,
                1 => Pauli::Y,
                _ => Pauli::Z,
            });
        }
        if self.bit_flip > 0.0 && rng.gen_range(0.0..1.0) < self.bit_flip {
            return Some(Pauli::X);
        }
        if self.phase_flip > 0.0 && rng.gen_range(0.0..1.0) < self.phase_flip {
            return Some(Pauli::Z);
        }
        None
    }
}
