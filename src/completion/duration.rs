//! Workout duration resolution.

use chrono::{DateTime, Utc};

/// Round to the nearest integer with halves going toward positive infinity
/// (`1.5 -> 2`, `-1.5 -> -1`), matching how clients round durations.
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Minutes to record for a completed workout.
///
/// A client-supplied value always wins, zero included. Otherwise the elapsed
/// time between `started_at` and `now` is used; a missing start time counts
/// as `now`. The result is not clamped, so clock skew can make it negative.
pub fn resolve_duration_minutes(
    supplied: Option<f64>,
    started_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> i64 {
    if let Some(minutes) = supplied {
        return round_half_up(minutes);
    }
    let started_at = started_at.unwrap_or(now);
    let elapsed_ms = (now - started_at).num_milliseconds();
    round_half_up(elapsed_ms as f64 / 60_000.0)
}
