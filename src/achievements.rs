//! Achievement categories and the metric helpers used to evaluate them.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Achievement families re-evaluated after every completed workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    /// Total completed workouts.
    WorkoutCount,
    /// Consecutive calendar weeks with at least one completed workout.
    StreakWeeks,
}

impl AchievementCategory {
    pub const ALL: [AchievementCategory; 2] =
        [AchievementCategory::WorkoutCount, AchievementCategory::StreakWeeks];

    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementCategory::WorkoutCount => "workout_count",
            AchievementCategory::StreakWeeks => "streak_weeks",
        }
    }
}

impl std::fmt::Display for AchievementCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Length of the current weekly streak.
///
/// `active_weeks` holds the week starts (any order, duplicates allowed) that
/// contain at least one completed workout. The streak ends at `current_week`;
/// a current week without activity yet does not break it, so counting then
/// starts from the previous week.
pub fn streak_weeks(active_weeks: &[NaiveDate], current_week: NaiveDate) -> u32 {
    let current_week = week_start(current_week);
    let mut weeks: Vec<NaiveDate> = active_weeks.iter().map(|d| week_start(*d)).collect();
    weeks.sort_unstable_by(|a, b| b.cmp(a));
    weeks.dedup();

    let mut expected = if weeks.contains(&current_week) {
        current_week
    } else {
        current_week - Duration::weeks(1)
    };

    let start = expected;
    let mut streak = 0;
    for week in weeks.into_iter().skip_while(move |w| *w > start) {
        if week != expected {
            break;
        }
        streak += 1;
        expected = expected - Duration::weeks(1);
    }
    streak
}
