//! Set-log aggregation into workout totals.

use serde::Serialize;
use tracing::warn;

use crate::store::SetLog;

/// Totals derived from the set logs of one workout log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WorkoutTotals {
    pub sets: i64,
    pub reps: i64,
    /// Sum of `weight * reps` over all sets.
    pub weight: f64,
}

impl WorkoutTotals {
    /// Aggregate the sets belonging to `workout_log_id`.
    ///
    /// The store already filters by log id; rows for any other log are
    /// skipped here as well so totals can never leak across logs. Missing
    /// weight or reps count as zero.
    pub fn from_sets(workout_log_id: &str, sets: &[SetLog]) -> Self {
        let mut totals = WorkoutTotals::default();
        let mut foreign = 0usize;
        for set in sets {
            if set.workout_log_id != workout_log_id {
                foreign += 1;
                continue;
            }
            let reps = set.reps.unwrap_or(0) as i64;
            totals.sets += 1;
            totals.reps += reps;
            totals.weight += set.weight.unwrap_or(0.0) * reps as f64;
        }
        if foreign > 0 {
            warn!(
                workout_log_id,
                skipped = foreign,
                "ignored set logs belonging to other workout logs"
            );
        }
        totals
    }
}
