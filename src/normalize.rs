use crate::models::{Frequency, NormalizedHabit, RawHabit};
use chrono::{Datelike, Duration, NaiveDate, TimeZone};
use std::collections::HashSet;

pub const DAYS_PER_WEEK: u32 = 7;

/// Derives the UI view of a habit as seen from `today` in `tz`.
///
/// Completion instants are converted to `tz` calendar days before anything
/// is counted, so the same record can yield different dates for viewers in
/// different zones.
pub fn normalize<Tz: TimeZone>(raw: &RawHabit, today: NaiveDate, tz: &Tz) -> NormalizedHabit {
    let completed_dates = completed_dates(raw, tz);
    let goal = match raw.frequency {
        Frequency::EveryDay => None,
        Frequency::Weekly => Some(raw.goal_count.filter(|goal| *goal > 0).unwrap_or(1)),
    };

    NormalizedHabit {
        id: raw.id.clone(),
        title: raw.name.clone(),
        description: raw.description.clone(),
        goal,
        category: raw.category,
        frequency: raw.frequency,
        progress_percent: progress_percent(raw.frequency, &completed_dates, today),
        streak_days: streak_days(raw.frequency, &completed_dates),
        completed_dates,
        created_at: raw.created_at,
        notes: None,
    }
}

/// Local days with a completed entry, in encounter order, without repeats.
fn completed_dates<Tz: TimeZone>(raw: &RawHabit, tz: &Tz) -> Vec<NaiveDate> {
    let mut seen = HashSet::new();
    raw.progress_entries
        .iter()
        .filter(|entry| entry.completed)
        .map(|entry| entry.date.with_timezone(tz).date_naive())
        .filter(|date| seen.insert(*date))
        .collect()
}

pub fn progress_percent(frequency: Frequency, completed: &[NaiveDate], today: NaiveDate) -> f64 {
    match frequency {
        Frequency::EveryDay => {
            if completed.contains(&today) {
                100.0
            } else {
                0.0
            }
        }
        Frequency::Weekly => {
            let done = completed_in_week(completed, today);
            100.0 * f64::from(done) / f64::from(DAYS_PER_WEEK)
        }
    }
}

/// Total completed days for daily habits; the service stores at most one
/// entry per day, so this matches the number of stored completions.
pub fn streak_days(frequency: Frequency, completed: &[NaiveDate]) -> u32 {
    match frequency {
        Frequency::EveryDay => u32::try_from(completed.len()).unwrap_or(u32::MAX),
        Frequency::Weekly => 0,
    }
}

pub fn completed_in_week(completed: &[NaiveDate], today: NaiveDate) -> u32 {
    let (start, end) = week_window(today);
    let count = completed
        .iter()
        .filter(|date| (start..=end).contains(*date))
        .count();
    u32::try_from(count).unwrap_or(DAYS_PER_WEEK)
}

/// Sunday through Saturday of the week containing `today`.
pub fn week_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
    (start, start + Duration::days(i64::from(DAYS_PER_WEEK) - 1))
}

pub fn is_completed_on(habit: &NormalizedHabit, date: NaiveDate) -> bool {
    habit.completed_dates.contains(&date)
}
