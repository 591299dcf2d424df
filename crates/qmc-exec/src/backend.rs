//! Accelerator backends for level application.

use rand::rngs::SmallRng;

use qmc_ir::Gate;
use qmc_sim::{SimResult, StateBuffer};

/// A device that applies whole dependency levels to a state.
///
/// Implementations must produce the same state as applying the level's
/// gates one after another.
pub trait Accelerator: Send + Sync {
    /// Get the name of this accelerator.
    fn name(&self) -> &str;

    /// Device class reported in results (e.g. "CPU").
    fn device_type(&self) -> &str;

    /// Whether the device can currently take work.
    fn is_available(&self) -> bool;

    /// Apply one level of qubit-disjoint gates.
    fn apply_level(&self, state: &mut StateBuffer, gates: &[&Gate], rng: &mut SmallRng) -> SimResult<()>;

    /// Release per-run resources held in `state`.
    fn finish(&self, _state: &mut StateBuffer) {}
}

/// Host implementation using the fresh-output-buffer path.
///
/// Each gate is computed from the previous buffer into a second one, in
/// parallel over output amplitudes, so the run holds two state-sized buffers.
#[derive(Debug, Clone, Default)]
pub struct HostAccelerator;

impl HostAccelerator {
    pub fn new() -> Self {
        Self
    }
}

impl Accelerator for HostAccelerator {
    fn name(&self) -> &str {
        "host-buffered"
    }

    fn device_type(&self) -> &str {
        "CPU"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn apply_level(&self, state: &mut StateBuffer, gates: &[&Gate], rng: &mut SmallRng) -> SimResult<()> {
        state.apply_level_buffered(gates, rng)
    }

    fn finish(&self, state: &mut StateBuffer) {
        state.release_scratch();
    }
}
