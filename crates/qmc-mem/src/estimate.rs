//! Byte requirements of a simulation run.

use serde::{Deserialize, Serialize};

use qmc_ir::{Circuit, Precision};

/// Bytes in one GB.
pub const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Convert GB to bytes, saturating at the `u64` range.
pub fn gb_to_bytes(gb: f64) -> u64 {
    // float-to-int casts saturate; NaN maps to 0
    (gb * BYTES_PER_GB as f64) as u64
}

pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB as f64
}

/// Memory footprint of simulating a circuit in a given precision.
///
/// Recomputed from the circuit on every call; nothing is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEstimate {
    pub width: u32,
    pub precision: Precision,
    /// `2^width` amplitudes.
    pub amplitude_bytes: u64,
    /// One 2×2 matrix per gate.
    pub gate_matrix_bytes: u64,
    /// Double-buffered gate application.
    pub temporary_bytes: u64,
}

impl MemoryEstimate {
    pub fn total_bytes(&self) -> u64 {
        self.amplitude_bytes
            .saturating_add(self.gate_matrix_bytes)
            .saturating_add(self.temporary_bytes)
    }

    pub fn total_gb(&self) -> f64 {
        bytes_to_gb(self.total_bytes())
    }

    pub fn amplitude_gb(&self) -> f64 {
        bytes_to_gb(self.amplitude_bytes)
    }
}

/// Number of amplitudes of a `width`-qubit state, saturating.
pub fn state_size(width: u32) -> u64 {
    1u64.checked_shl(width).unwrap_or(u64::MAX)
}

/// Estimate the bytes needed to simulate `circuit` in `precision`.
pub fn estimate(circuit: &Circuit, precision: Precision) -> MemoryEstimate {
    let bpa = precision.bytes_per_amplitude();
    let width = circuit.num_qubits();
    let amplitude_bytes = state_size(width).saturating_mul(bpa);
    let gate_matrix_bytes = (circuit.num_gates() as u64).saturating_mul(4 * bpa);
    MemoryEstimate {
        width,
        precision,
        amplitude_bytes,
        gate_matrix_bytes,
        temporary_bytes: amplitude_bytes.saturating_mul(2),
    }
}

/// Whether `estimate` fits within `budget_bytes`.
pub fn fits_budget(estimate: &MemoryEstimate, budget_bytes: u64) -> bool {
    estimate.total_bytes() <= budget_bytes
}
