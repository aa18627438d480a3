//! Training-load fatigue heuristics: acute:chronic workload ratio, deload
//! suggestions and per-muscle recovery windows.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::MuscleGroup;

pub const ACUTE_WINDOW_DAYS: i64 = 7;
pub const CHRONIC_WINDOW_DAYS: i64 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingLoad {
    pub date: NaiveDate,
    pub load: f64,
}

/// Load of one session: session RPE x minutes when both are known,
/// otherwise tonnage scaled down to a comparable range.
pub fn session_load(session_rpe: Option<f64>, duration_minutes: Option<i32>, volume: f64) -> f64 {
    match (session_rpe, duration_minutes) {
        (Some(rpe), Some(minutes)) if minutes > 0 => rpe * minutes as f64,
        _ => volume / 100.0,
    }
}

fn window_sum(loads: &[TrainingLoad], as_of: NaiveDate, days: i64) -> f64 {
    let start = as_of - Duration::days(days - 1);
    loads
        .iter()
        .filter(|l| l.date >= start && l.date <= as_of)
        .map(|l| l.load)
        .sum()
}

/// Acute (7-day sum) over chronic (28-day sum as a weekly average).
/// `None` when there is no chronic load to compare against.
pub fn calculate_acwr(loads: &[TrainingLoad], as_of: NaiveDate) -> Option<f64> {
    let acute = window_sum(loads, as_of, ACUTE_WINDOW_DAYS);
    let chronic = window_sum(loads, as_of, CHRONIC_WINDOW_DAYS)
        / (CHRONIC_WINDOW_DAYS / ACUTE_WINDOW_DAYS) as f64;

    if chronic <= 0.0 {
        None
    } else {
        Some(acute / chronic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcwrZone {
    Undertraining,
    Optimal,
    Elevated,
    HighRisk,
}

pub fn classify_acwr(acwr: f64) -> AcwrZone {
    if acwr < 0.8 {
        AcwrZone::Undertraining
    } else if acwr <= 1.3 {
        AcwrZone::Optimal
    } else if acwr < 1.5 {
        AcwrZone::Elevated
    } else {
        AcwrZone::HighRisk
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeloadProtocol {
    /// Fraction of working volume to drop
    pub volume_reduction: f64,
    /// Fraction of working load to drop
    pub intensity_reduction: f64,
    pub duration_days: u32,
    pub reason: String,
}

pub fn suggest_deload_protocol(acwr: Option<f64>, avg_rpe: Option<f64>) -> Option<DeloadProtocol> {
    let acwr_value = acwr.unwrap_or(0.0);
    let rpe_value = avg_rpe.unwrap_or(0.0);

    if acwr_value >= 1.5 || rpe_value >= 9.0 {
        Some(DeloadProtocol {
            volume_reduction: 0.5,
            intensity_reduction: 0.1,
            duration_days: 7,
            reason: deload_reason(acwr, avg_rpe),
        })
    } else if acwr_value > 1.3 || rpe_value >= 8.5 {
        Some(DeloadProtocol {
            volume_reduction: 0.3,
            intensity_reduction: 0.05,
            duration_days: 5,
            reason: deload_reason(acwr, avg_rpe),
        })
    } else {
        None
    }
}

fn deload_reason(acwr: Option<f64>, avg_rpe: Option<f64>) -> String {
    let mut parts = Vec::new();
    if let Some(ratio) = acwr {
        if ratio > 1.3 {
            parts.push(format!("workload ratio {:.2} is above the 0.8-1.3 range", ratio));
        }
    }
    if let Some(rpe) = avg_rpe {
        if rpe >= 8.5 {
            parts.push(format!("average RPE {:.1} over recent sessions", rpe));
        }
    }
    parts.join("; ")
}

/// Fraction of the recovery window that has elapsed, capped at 1.0.
/// Compound lifts get 72 hours, isolation work 48.
pub fn muscle_recovery(last_trained: DateTime<Utc>, now: DateTime<Utc>, compound: bool) -> f64 {
    let window_hours = if compound { 72.0 } else { 48.0 };
    let elapsed = (now - last_trained).num_minutes() as f64 / 60.0;
    (elapsed / window_hours).clamp(0.0, 1.0)
}

/// Most recent working sets for one muscle group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastTrained {
    pub muscle_group: MuscleGroup,
    pub at: DateTime<Utc>,
    pub compound: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MuscleRecovery {
    pub muscle_group: MuscleGroup,
    pub last_trained: DateTime<Utc>,
    pub recovery: f64,
    pub recovered: bool,
}

/// Recovery per muscle group, least recovered first.
pub fn recovery_status(trained: &[LastTrained], now: DateTime<Utc>) -> Vec<MuscleRecovery> {
    let mut muscles: Vec<MuscleRecovery> = trained
        .iter()
        .map(|t| {
            let recovery = muscle_recovery(t.at, now, t.compound);
            MuscleRecovery {
                muscle_group: t.muscle_group,
                last_trained: t.at,
                recovery,
                recovered: recovery >= 1.0,
            }
        })
        .collect();
    muscles.sort_by(|a, b| a.recovery.total_cmp(&b.recovery));
    muscles
}

#[derive(Debug, Clone, Serialize)]
pub struct FatigueReport {
    pub as_of: NaiveDate,
    pub acute_load: f64,
    pub chronic_load: f64,
    pub acwr: Option<f64>,
    pub zone: Option<AcwrZone>,
    pub average_rpe: Option<f64>,
    pub deload: Option<DeloadProtocol>,
    pub muscles: Vec<MuscleRecovery>,
}

pub fn fatigue_report(
    loads: &[TrainingLoad],
    avg_rpe: Option<f64>,
    muscles: Vec<MuscleRecovery>,
    as_of: NaiveDate,
) -> FatigueReport {
    let acwr = calculate_acwr(loads, as_of);
    FatigueReport {
        as_of,
        acute_load: window_sum(loads, as_of, ACUTE_WINDOW_DAYS),
        chronic_load: window_sum(loads, as_of, CHRONIC_WINDOW_DAYS)
            / (CHRONIC_WINDOW_DAYS / ACUTE_WINDOW_DAYS) as f64,
        acwr,
        zone: acwr.map(classify_acwr),
        average_rpe: avg_rpe,
        deload: suggest_deload_protocol(acwr, avg_rpe),
        muscles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, n).unwrap()
    }

    fn steady_loads(until: u32, load: f64) -> Vec<TrainingLoad> {
        (1..=until).map(|d| TrainingLoad { date: day(d), load }).collect()
    }

    #[test]
    fn test_steady_training_gives_ratio_one() {
        let loads = steady_loads(28, 100.0);
        let acwr = calculate_acwr(&loads, day(28)).unwrap();
        assert!((acwr - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_spike_in_last_week() {
        let mut loads = steady_loads(21, 100.0);
        loads.extend((22..=28).map(|d| TrainingLoad { date: day(d), load: 300.0 }));
        // acute 2100, chronic (2100 + 2100) / 4 = 1050
        let acwr = calculate_acwr(&loads, day(28)).unwrap();
        assert!((acwr - 2.0).abs() < 1e-9);
        assert_eq!(classify_acwr(acwr), AcwrZone::HighRisk);
    }

    #[test]
    fn test_no_history_has_no_ratio() {
        assert_eq!(calculate_acwr(&[], day(10)), None);
    }

    #[test]
    fn test_loads_outside_window_are_ignored() {
        let loads = vec![
            TrainingLoad { date: day(1), load: 1000.0 },
            TrainingLoad { date: day(29), load: 100.0 },
        ];
        // as of the 29th the 28-day window starts on the 2nd
        let acwr = calculate_acwr(&loads, day(29)).unwrap();
        assert!((acwr - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify_acwr(0.79), AcwrZone::Undertraining);
        assert_eq!(classify_acwr(0.8), AcwrZone::Optimal);
        assert_eq!(classify_acwr(1.3), AcwrZone::Optimal);
        assert_eq!(classify_acwr(1.4), AcwrZone::Elevated);
        assert_eq!(classify_acwr(1.5), AcwrZone::HighRisk);
    }

    #[test]
    fn test_suggest_deload_protocol() {
        let heavy = suggest_deload_protocol(Some(1.6), Some(7.0)).unwrap();
        assert_eq!(heavy.volume_reduction, 0.5);
        assert_eq!(heavy.duration_days, 7);

        let grinding = suggest_deload_protocol(Some(1.0), Some(9.2)).unwrap();
        assert_eq!(grinding.volume_reduction, 0.5);

        let moderate = suggest_deload_protocol(Some(1.35), Some(8.0)).unwrap();
        assert_eq!(moderate.volume_reduction, 0.3);
        assert_eq!(moderate.intensity_reduction, 0.05);
        assert_eq!(moderate.duration_days, 5);

        assert_eq!(suggest_deload_protocol(Some(1.1), Some(8.0)), None);
        assert_eq!(suggest_deload_protocol(None, None), None);
    }

    #[test]
    fn test_session_load() {
        assert_eq!(session_load(Some(8.0), Some(60), 5000.0), 480.0);
        assert_eq!(session_load(None, Some(60), 5000.0), 50.0);
        assert_eq!(session_load(Some(8.0), Some(0), 5000.0), 50.0);
    }

    #[test]
    fn test_muscle_recovery() {
        let now = Utc::now();
        assert_eq!(muscle_recovery(now - Duration::hours(24), now, false), 0.5);
        assert_eq!(muscle_recovery(now - Duration::hours(36), now, true), 0.5);
        assert_eq!(muscle_recovery(now - Duration::hours(100), now, true), 1.0);
    }

    #[test]
    fn test_recovery_status_orders_least_recovered_first() {
        let now = Utc::now();
        let trained = [
            LastTrained { muscle_group: MuscleGroup::Chest, at: now - Duration::hours(96), compound: true },
            LastTrained { muscle_group: MuscleGroup::Quadriceps, at: now - Duration::hours(36), compound: true },
            LastTrained { muscle_group: MuscleGroup::Biceps, at: now - Duration::hours(36), compound: false },
        ];

        let muscles = recovery_status(&trained, now);
        let order: Vec<MuscleGroup> = muscles.iter().map(|m| m.muscle_group).collect();
        assert_eq!(order, vec![MuscleGroup::Quadriceps, MuscleGroup::Biceps, MuscleGroup::Chest]);
        assert_eq!(muscles[0].recovery, 0.5);
        assert_eq!(muscles[1].recovery, 0.75);
        assert!(!muscles[1].recovered);
        assert!(muscles[2].recovered);
    }

    #[test]
    fn test_fatigue_report() {
        let now = Utc::now();
        let muscles = recovery_status(
            &[LastTrained { muscle_group: MuscleGroup::Back, at: now - Duration::hours(24), compound: false }],
            now,
        );
        let report = fatigue_report(&steady_loads(28, 100.0), Some(7.5), muscles, day(28));
        assert_eq!(report.acute_load, 700.0);
        assert_eq!(report.chronic_load, 700.0);
        assert_eq!(report.zone, Some(AcwrZone::Optimal));
        assert!(report.deload.is_none());
        assert_eq!(report.muscles.len(), 1);
        assert_eq!(report.muscles[0].recovery, 0.5);
    }
}
