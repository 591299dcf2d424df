//! Measurement sampling from a finalized state.
//!
//! Shots are split across independent random streams, one `SmallRng` per
//! stream seeded from the run seed and the stream index, so streams can run
//! concurrently without sharing generator state.

use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::error::{SimError, SimResult};

/// Histogram of sampled bitstrings.
pub type Counts = BTreeMap<String, u64>;

/// Shots below which sampling stays on one stream.
const SHOTS_PER_STREAM: u64 = 1024;

/// Binary form of `index`, most significant qubit first, zero-padded to `width`.
pub fn bitstring(index: usize, width: u32) -> String {
    if width == 0 {
        return String::new();
    }
    format!("{:0width$b}", index, width = width as usize)
}

/// Seed of stream `stream` derived from the run seed.
fn stream_seed(seed: u64, stream: usize) -> u64 {
    seed ^ (stream as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Draw `shots` samples from `probabilities` and histogram them.
///
/// Uses up to `max_streams` independent streams, fewer when the shot count
/// is small. Runs on the current rayon pool.
pub fn sample_counts(
    probabilities: &[f64],
    width: u32,
    shots: u64,
    seed: u64,
    max_streams: usize,
) -> SimResult<Counts> {
    if shots == 0 {
        return Ok(Counts::new());
    }
    let dist = WeightedIndex::new(probabilities).map_err(|e| SimError::Sampling(e.to_string()))?;

    let streams = usize::try_from(shots.div_ceil(SHOTS_PER_STREAM))
        .unwrap_or(usize::MAX)
        .clamp(1, max_streams.max(1));
    let per_stream = shots / streams as u64;
    let remainder = shots % streams as u64;

    let histogram = (0..streams)
        .into_par_iter()
        .map(|stream| {
            let mut rng = SmallRng::seed_from_u64(stream_seed(seed, stream));
            let draws = per_stream + u64::from((stream as u64) < remainder);
            let mut local: FxHashMap<usize, u64> = FxHashMap::default();
            for _ in 0..draws {
                *local.entry(dist.sample(&mut rng)).or_insert(0) += 1;
            }
            local
        })
        .reduce(FxHashMap::default, |mut acc, local| {
            for (index, count) in local {
                *acc.entry(index).or_insert(0) += count;
            }
            acc
        });

    Ok(histogram
        .into_iter()
        .map(|(index, count)| (bitstring(index, width), count))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitstring_padding() {
        assert_eq!(bitstring(1, 3), "001");
        assert_eq!(bitstring(6, 3), "110");
        assert_eq!(bitstring(0, 0), "");
    }

    #[test]
    fn test_zero_width_keys_are_empty() {
        let counts = sample_counts(&[1.0], 0, 3, 5, 2).unwrap();
        assert_eq!(counts.get(""), Some(&3));
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_deterministic_distribution() {
        let counts = sample_counts(&[0.0, 0.0, 1.0, 0.0], 2, 500, 7, 4).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get("10"), Some(&500));
    }

    #[test]
    fn test_shot_total_across_streams() {
        let probs = vec![0.25; 4];
        for streams in [1, 3, 8] {
            let counts = sample_counts(&probs, 2, 10_007, 42, streams).unwrap();
            assert_eq!(counts.values().sum::<u64>(), 10_007);
        }
    }

    #[test]
    fn test_same_seed_same_histogram() {
        let probs = [0.1, 0.2, 0.3, 0.4];
        let a = sample_counts(&probs, 2, 5000, 11, 4).unwrap();
        let b = sample_counts(&probs, 2, 5000, 11, 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_shots_and_bad_weights() {
        assert!(sample_counts(&[1.0], 0, 0, 1, 1).unwrap().is_empty());
        assert!(matches!(
            sample_counts(&[0.0, 0.0], 1, 10, 1, 1),
            Err(SimError::Sampling(_))
        ));
    }
}
