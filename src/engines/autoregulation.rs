use serde::{Deserialize, Serialize};

use crate::engines::progression::round_to_increment;
use crate::errors::{AppError, AppResult};

/// Load change per RPE point away from target
pub const LOAD_PER_RPE_POINT: f64 = 0.04;
/// Largest single adjustment in either direction
pub const MAX_ADJUSTMENT: f64 = 0.10;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoadAdjustment {
    pub planned_weight: f64,
    pub adjusted_weight: f64,
    pub change_pct: f64,
}

/// Adjust the next set's load from how hard the last one felt.
pub fn adjust_load(planned: f64, target_rpe: f64, actual_rpe: f64, increment: f64) -> LoadAdjustment {
    let raw = (target_rpe - actual_rpe) * LOAD_PER_RPE_POINT;
    let factor = 1.0 + raw.clamp(-MAX_ADJUSTMENT, MAX_ADJUSTMENT);
    let adjusted = round_to_increment(planned * factor, increment).max(0.0);

    LoadAdjustment {
        planned_weight: planned,
        adjusted_weight: adjusted,
        change_pct: if planned > 0.0 {
            (adjusted - planned) / planned * 100.0
        } else {
            0.0
        },
    }
}

/// Pre-session check-in, each answer on a 1-5 scale where 5 is best
/// (for soreness and stress, 5 means "none").
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ReadinessSurvey {
    pub sleep_quality: u8,
    pub soreness: u8,
    pub stress: u8,
    pub motivation: u8,
}

impl ReadinessSurvey {
    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("sleep_quality", self.sleep_quality),
            ("soreness", self.soreness),
            ("stress", self.stress),
            ("motivation", self.motivation),
        ] {
            if !(1..=5).contains(&value) {
                return Err(AppError::validation(format!("{} must be between 1 and 5", name)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResult {
    pub score: f64,
    pub load_multiplier: f64,
    pub recommendation: &'static str,
}

/// 0-100; sleep counts double.
pub fn readiness_score(survey: &ReadinessSurvey) -> f64 {
    let weighted = survey.sleep_quality as f64 * 2.0
        + survey.soreness as f64
        + survey.stress as f64
        + survey.motivation as f64;
    // 5 answers worth of weight, each between 1 and 5
    (weighted - 5.0) / 20.0 * 100.0
}

pub fn readiness_adjustment(score: f64) -> ReadinessResult {
    let (load_multiplier, recommendation) = if score >= 85.0 {
        (1.05, "Well recovered; push for a top set or a small PR attempt")
    } else if score >= 70.0 {
        (1.0, "Train as planned")
    } else if score >= 50.0 {
        (0.9, "Reduce working loads by about 10%")
    } else if score >= 30.0 {
        (0.8, "Reduce loads by 20% and cut accessory volume")
    } else {
        (0.6, "Take a rest day or keep the session very light")
    };

    ReadinessResult {
        score,
        load_multiplier,
        recommendation,
    }
}
