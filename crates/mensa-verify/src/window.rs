//! Meal window resolution.

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc};
use mensa_core::models::meal::MealType;
use mensa_core::models::schedule::ScheduleEntry;

/// Weekday index used throughout the schedule: 0 = Sunday .. 6 = Saturday.
pub fn day_of_week(now: DateTime<Utc>) -> u8 {
    now.weekday().num_days_from_sunday() as u8
}

/// Resolve which meal, if any, is being served at `now` given the
/// active schedule entries for that weekday.
///
/// Comparison is at minute precision and inclusive on both ends, so a
/// window of 12:00..14:00 admits scans through 14:00:59. Overlapping
/// windows resolve to the entry with the earliest start time, making
/// the outcome independent of storage order.
pub fn resolve_meal_window(now: DateTime<Utc>, entries: &[ScheduleEntry]) -> Option<MealType> {
    let t = NaiveTime::from_hms_opt(now.time().hour(), now.time().minute(), 0)?;

    entries
        .iter()
        .filter(|e| e.is_active && e.start_time <= t && t <= e.end_time)
        .min_by_key(|e| e.start_time)
        .map(|e| e.meal_type)
}
