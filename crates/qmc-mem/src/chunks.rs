//! Partitioning of a state into contiguous index ranges.
//!
//! Plans describe where chunk boundaries fall; they do not translate indices
//! for gates whose index groups straddle a boundary.

use std::ops::Range;

use tracing::debug;

use qmc_ir::Precision;

use crate::error::{MemError, MemResult};

/// Split `[0, state_size)` into consecutive ranges of at most `max_chunk_size`.
pub fn plan_chunks(state_size: u64, max_chunk_size: u64) -> MemResult<Vec<Range<u64>>> {
    if max_chunk_size == 0 {
        return Err(MemError::ZeroChunkSize);
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < state_size {
        let end = start.saturating_add(max_chunk_size).min(state_size);
        chunks.push(start..end);
        start = end;
    }
    debug!(state_size, max_chunk_size, chunks = chunks.len(), "Planned memory chunks");
    Ok(chunks)
}

/// Number of ranges [`plan_chunks`] would produce, without building them.
pub fn chunk_count(state_size: u64, max_chunk_size: u64) -> u64 {
    if max_chunk_size == 0 {
        return 0;
    }
    state_size.div_ceil(max_chunk_size)
}

/// Amplitudes per chunk that keep a chunk within `budget_bytes`, leaving
/// headroom by `safety_factor`. Always at least one.
pub fn chunk_size_for_budget(budget_bytes: u64, precision: Precision, safety_factor: f64) -> MemResult<u64> {
    if !safety_factor.is_finite() || safety_factor <= 0.0 {
        return Err(MemError::InvalidSafetyFactor(safety_factor));
    }
    let per_amplitude = precision.bytes_per_amplitude() as f64 * safety_factor;
    let size = (budget_bytes as f64 / per_amplitude).floor() as u64;
    Ok(size.max(1))
}
