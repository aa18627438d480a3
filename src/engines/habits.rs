//! Training-day streaks and weekly consistency.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

pub const CONSISTENCY_WINDOW_DAYS: i64 = 28;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
    pub last_training_day: Option<NaiveDate>,
}

/// Streaks over distinct training days. The current streak survives a
/// missing `today` as long as the athlete trained yesterday.
pub fn compute_streaks<I>(dates: I, today: NaiveDate) -> StreakSummary
where
    I: IntoIterator<Item = NaiveDate>,
{
    let days: BTreeSet<NaiveDate> = dates.into_iter().filter(|d| *d <= today).collect();

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;

    for day in &days {
        run = match previous {
            Some(prev) if *day - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    let current = match previous {
        Some(last) if today - last <= Duration::days(1) => run,
        _ => 0,
    };

    StreakSummary {
        current,
        longest,
        last_training_day: previous,
    }
}

/// Sessions in the last four weeks against the weekly target, capped at 1.0.
pub fn weekly_consistency<I>(dates: I, today: NaiveDate, target_per_week: i32) -> f64
where
    I: IntoIterator<Item = NaiveDate>,
{
    if target_per_week <= 0 {
        return 0.0;
    }
    let start = today - Duration::days(CONSISTENCY_WINDOW_DAYS - 1);
    let sessions = dates
        .into_iter()
        .filter(|d| *d >= start && *d <= today)
        .count() as f64;

    (sessions / (4.0 * target_per_week as f64)).min(1.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct HabitSummary {
    pub streak: StreakSummary,
    pub weekly_target: i32,
    pub consistency: f64,
    pub sessions_last_28_days: usize,
}

pub fn habit_summary(dates: &[NaiveDate], today: NaiveDate, weekly_target: i32) -> HabitSummary {
    let start = today - Duration::days(CONSISTENCY_WINDOW_DAYS - 1);
    HabitSummary {
        streak: compute_streaks(dates.iter().copied(), today),
        weekly_target,
        consistency: weekly_consistency(dates.iter().copied(), today, weekly_target),
        sessions_last_28_days: dates.iter().filter(|d| **d >= start && **d <= today).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, n).unwrap()
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(compute_streaks(Vec::new(), day(10)), StreakSummary::default());
    }

    #[test]
    fn test_streak_alive_through_yesterday() {
        let dates = vec![day(7), day(8), day(9)];
        let summary = compute_streaks(dates, day(10));
        assert_eq!(summary.current, 3);
        assert_eq!(summary.longest, 3);
    }

    #[test]
    fn test_streak_broken_after_gap() {
        let dates = vec![day(1), day(2), day(3), day(4), day(7)];
        let summary = compute_streaks(dates.clone(), day(7));
        assert_eq!(summary.current, 1);
        assert_eq!(summary.longest, 4);

        let later = compute_streaks(dates, day(9));
        assert_eq!(later.current, 0);
        assert_eq!(later.longest, 4);
    }

    #[test]
    fn test_duplicate_days_count_once() {
        let dates = vec![day(5), day(5), day(6)];
        assert_eq!(compute_streaks(dates, day(6)).current, 2);
    }

    #[test]
    fn test_weekly_consistency() {
        let dates: Vec<_> = (1..=28).step_by(3).map(day).collect();
        // 10 sessions against a target of 3 x 4 weeks
        let value = weekly_consistency(dates.iter().copied(), day(28), 3);
        assert!((value - 10.0 / 12.0).abs() < 1e-9);

        assert_eq!(weekly_consistency(dates.iter().copied(), day(28), 2), 1.0);
        assert_eq!(weekly_consistency(dates, day(28), 0), 0.0);
    }
}
