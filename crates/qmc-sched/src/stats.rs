//! Summary statistics of a level schedule.

use serde::{Deserialize, Serialize};

use crate::levels::LevelSchedule;

/// Shape of a [`LevelSchedule`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStats {
    pub num_levels: usize,
    pub max_level_size: usize,
    pub mean_level_size: f64,
    /// Gates in levels of more than one gate.
    pub parallel_gates: usize,
    pub parallelization_ratio: f64,
}

impl ScheduleStats {
    pub fn from_schedule(schedule: &LevelSchedule) -> Self {
        let num_levels = schedule.num_levels();
        let total = schedule.num_gates();
        let max_level_size = schedule.iter().map(|l| l.len()).max().unwrap_or(0);
        let parallel_gates = schedule.iter().filter(|l| l.len() > 1).map(|l| l.len()).sum();
        let mean_level_size = if num_levels == 0 {
            0.0
        } else {
            total as f64 / num_levels as f64
        };
        Self {
            num_levels,
            max_level_size,
            mean_level_size,
            parallel_gates,
            parallelization_ratio: schedule.parallelization_ratio(),
        }
    }
}

impl From<&LevelSchedule> for ScheduleStats {
    fn from(schedule: &LevelSchedule) -> Self {
        Self::from_schedule(schedule)
    }
}
