//! Double-progression overload engine.
//!
//! Reps climb inside a range at a fixed load; once every working set reaches
//! the top of the range the load goes up and reps drop back to the bottom.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engines::one_rm::best_estimate;
use crate::engines::rpe::average_rpe;
use crate::models::Equipment;

/// Sessions with an average RPE at or above this do not earn a load increase.
pub const GRINDING_RPE: f64 = 9.5;
pub const DELOAD_FACTOR: f64 = 0.9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProgressionConfig {
    pub rep_min: i32,
    pub rep_max: i32,
    pub target_sets: i32,
    pub increment: f64,
}

impl ProgressionConfig {
    pub fn for_exercise(equipment: Equipment, compound: bool) -> Self {
        let (rep_min, rep_max) = if compound { (5, 8) } else { (8, 12) };
        Self {
            rep_min,
            rep_max,
            target_sets: 3,
            increment: equipment.default_increment(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct WorkingSet {
    pub weight: f64,
    pub reps: i32,
    pub rpe: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionPerformance {
    pub performed_on: NaiveDate,
    pub sets: Vec<WorkingSet>,
}

impl SessionPerformance {
    fn top_weight(&self) -> Option<f64> {
        self.sets.iter().map(|s| s.weight).fold(None, |acc: Option<f64>, w| {
            Some(acc.map_or(w, |a| a.max(w)))
        })
    }

    fn top_sets(&self) -> Vec<&WorkingSet> {
        match self.top_weight() {
            Some(top) => self.sets.iter().filter(|s| s.weight >= top).collect(),
            None => Vec::new(),
        }
    }

    fn missed_range(&self, rep_min: i32) -> bool {
        self.top_sets().iter().any(|s| s.reps < rep_min)
    }

    pub fn estimated_one_rm(&self) -> Option<f64> {
        best_estimate(self.sets.iter().map(|s| (s.weight, s.reps)))
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionAction {
    Start,
    Increase,
    AddReps,
    Hold,
    Deload,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressionRecommendation {
    pub action: ProgressionAction,
    pub weight: f64,
    pub target_reps: i32,
    pub sets: i32,
    pub rationale: String,
}

pub fn round_to_increment(value: f64, increment: f64) -> f64 {
    if increment <= 0.0 {
        return value;
    }
    (value / increment).round() * increment
}

/// Recommend the next session's prescription from `history`, oldest first.
pub fn recommend_next(history: &[SessionPerformance], config: &ProgressionConfig) -> ProgressionRecommendation {
    let last = match history.iter().rev().find(|s| !s.sets.is_empty()) {
        Some(last) => last,
        None => {
            return ProgressionRecommendation {
                action: ProgressionAction::Start,
                weight: 0.0,
                target_reps: config.rep_min,
                sets: config.target_sets,
                rationale: "No history yet; pick a load you can lift for the bottom of the rep range"
                    .to_string(),
            }
        }
    };

    let top_weight = last.top_weight().unwrap_or(0.0);
    let top_sets = last.top_sets();
    let best_reps = top_sets.iter().map(|s| s.reps).max().unwrap_or(0);
    let avg = average_rpe(top_sets.iter().map(|s| s.rpe));

    let all_at_max = top_sets.iter().all(|s| s.reps >= config.rep_max);
    let grinding = avg.map_or(false, |rpe| rpe >= GRINDING_RPE);

    if last.missed_range(config.rep_min) {
        let previous = history
            .iter()
            .rev()
            .filter(|s| !s.sets.is_empty())
            .nth(1);
        let missed_twice = previous.map_or(false, |p| {
            p.missed_range(config.rep_min) && p.top_weight().unwrap_or(0.0) >= top_weight
        });

        if missed_twice {
            return ProgressionRecommendation {
                action: ProgressionAction::Deload,
                weight: round_to_increment(top_weight * DELOAD_FACTOR, config.increment),
                target_reps: config.rep_min,
                sets: config.target_sets,
                rationale: format!(
                    "Missed the bottom of the {}-{} range two sessions in a row; drop 10% and rebuild",
                    config.rep_min, config.rep_max
                ),
            };
        }

        return ProgressionRecommendation {
            action: ProgressionAction::Hold,
            weight: top_weight,
            target_reps: config.rep_min,
            sets: config.target_sets,
            rationale: format!("Fell short of {} reps; repeat the load", config.rep_min),
        };
    }

    if config.increment <= 0.0 {
        return ProgressionRecommendation {
            action: ProgressionAction::AddReps,
            weight: top_weight,
            target_reps: best_reps + 1,
            sets: config.target_sets,
            rationale: "Bodyweight movement; progress by adding a rep".to_string(),
        };
    }

    if all_at_max && !grinding {
        return ProgressionRecommendation {
            action: ProgressionAction::Increase,
            weight: round_to_increment(top_weight + config.increment, config.increment),
            target_reps: config.rep_min,
            sets: config.target_sets,
            rationale: format!(
                "All working sets reached {} reps; add {} and restart at {}",
                config.rep_max, config.increment, config.rep_min
            ),
        };
    }

    let rationale = if all_at_max {
        "Top of the range reached but effort was near maximal; consolidate before adding load".to_string()
    } else {
        format!("Build toward {} reps at this load", config.rep_max)
    };

    ProgressionRecommendation {
        action: ProgressionAction::Hold,
        weight: top_weight,
        target_reps: (best_reps + 1).min(config.rep_max),
        sets: config.target_sets,
        rationale,
    }
}

/// No more than a 1% gain in best estimated 1RM over the last three
/// sessions compared with everything before them. Needs four sessions.
pub fn detect_plateau(e1rm_by_session: &[f64]) -> bool {
    if e1rm_by_session.len() < 4 {
        return false;
    }
    let split = e1rm_by_session.len() - 3;
    let before = e1rm_by_session[..split].iter().cloned().fold(f64::MIN, f64::max);
    let recent = e1rm_by_session[split..].iter().cloned().fold(f64::MIN, f64::max);
    recent <= before * 1.01
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(day: u32, sets: &[(f64, i32, Option<f64>)]) -> SessionPerformance {
        SessionPerformance {
            performed_on: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            sets: sets
                .iter()
                .map(|&(weight, reps, rpe)| WorkingSet { weight, reps, rpe })
                .collect(),
        }
    }

    fn barbell() -> ProgressionConfig {
        ProgressionConfig::for_exercise(Equipment::Barbell, true)
    }

    #[test]
    fn test_no_history_starts() {
        let rec = recommend_next(&[], &barbell());
        assert_eq!(rec.action, ProgressionAction::Start);
        assert_eq!(rec.target_reps, 5);
    }

    #[test]
    fn test_all_sets_at_top_increase_load() {
        let history = vec![session(1, &[(100.0, 8, Some(8.0)), (100.0, 8, Some(8.5)), (100.0, 8, Some(9.0))])];
        let rec = recommend_next(&history, &barbell());
        assert_eq!(rec.action, ProgressionAction::Increase);
        assert_eq!(rec.weight, 102.5);
        assert_eq!(rec.target_reps, 5);
    }

    #[test]
    fn test_grinding_at_top_holds() {
        let history = vec![session(1, &[(100.0, 8, Some(10.0)), (100.0, 8, Some(9.5))])];
        let rec = recommend_next(&history, &barbell());
        assert_eq!(rec.action, ProgressionAction::Hold);
        assert_eq!(rec.weight, 100.0);
    }

    #[test]
    fn test_mid_range_holds_weight_and_adds_a_rep() {
        let history = vec![session(1, &[(100.0, 6, Some(8.0)), (100.0, 5, Some(8.5))])];
        let rec = recommend_next(&history, &barbell());
        assert_eq!(rec.action, ProgressionAction::Hold);
        assert_eq!(rec.weight, 100.0);
        assert_eq!(rec.target_reps, 7);
    }

    #[test]
    fn test_single_set_below_top_holds() {
        let history = vec![session(1, &[(100.0, 6, Some(8.0))])];
        let rec = recommend_next(&history, &barbell());
        assert_eq!(rec.action, ProgressionAction::Hold);
        assert_eq!(rec.weight, 100.0);
        assert_eq!(rec.target_reps, 7);
    }

    #[test]
    fn test_target_reps_capped_at_range_top() {
        let history = vec![session(1, &[(100.0, 8, Some(8.0)), (100.0, 7, Some(8.0))])];
        let rec = recommend_next(&history, &barbell());
        assert_eq!(rec.action, ProgressionAction::Hold);
        assert_eq!(rec.target_reps, 8);
    }

    #[test]
    fn test_single_miss_holds() {
        let history = vec![
            session(1, &[(100.0, 6, None)]),
            session(3, &[(102.5, 4, Some(10.0))]),
        ];
        let rec = recommend_next(&history, &barbell());
        assert_eq!(rec.action, ProgressionAction::Hold);
        assert_eq!(rec.weight, 102.5);
    }

    #[test]
    fn test_two_misses_deload() {
        let history = vec![
            session(1, &[(102.5, 4, Some(10.0))]),
            session(3, &[(102.5, 3, Some(10.0))]),
        ];
        let rec = recommend_next(&history, &barbell());
        assert_eq!(rec.action, ProgressionAction::Deload);
        assert_eq!(rec.weight, 92.5);
    }

    #[test]
    fn test_warmup_weight_does_not_define_top_sets() {
        let history = vec![session(1, &[(60.0, 3, None), (100.0, 8, Some(8.0)), (100.0, 8, Some(8.0))])];
        let rec = recommend_next(&history, &barbell());
        assert_eq!(rec.action, ProgressionAction::Increase);
    }

    #[test]
    fn test_bodyweight_adds_reps_past_range() {
        let config = ProgressionConfig::for_exercise(Equipment::Bodyweight, true);
        let history = vec![session(1, &[(0.0, 12, Some(8.0))])];
        let rec = recommend_next(&history, &config);
        assert_eq!(rec.action, ProgressionAction::AddReps);
        assert_eq!(rec.target_reps, 13);
    }

    #[test]
    fn test_round_to_increment() {
        assert_eq!(round_to_increment(101.3, 2.5), 102.5);
        assert_eq!(round_to_increment(101.2, 2.5), 100.0);
        assert_eq!(round_to_increment(33.3, 0.0), 33.3);
    }

    #[test]
    fn test_detect_plateau() {
        assert!(!detect_plateau(&[100.0, 101.0, 102.0]));
        assert!(detect_plateau(&[100.0, 100.0, 100.5, 100.2]));
        assert!(!detect_plateau(&[100.0, 100.0, 102.0, 100.2]));
    }

    #[test]
    fn test_session_estimate() {
        let s = session(1, &[(100.0, 1, None), (90.0, 5, None)]);
        assert!(s.estimated_one_rm().unwrap() >= 100.0);
    }
}
