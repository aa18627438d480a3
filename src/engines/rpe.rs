use serde::Serialize;

use crate::errors::{AppError, AppResult};
use crate::models::validation::validate_rpe;

/// Below this RPE the reps in reserve are reported as "4+".
pub const MIN_PRECISE_RPE: f64 = 6.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RpeInterpretation {
    pub rpe: f64,
    pub rir: f64,
    /// Reps the lifter could have completed at this load
    pub max_reps: i32,
    pub description: &'static str,
}

/// Translate an RPE rating for a set of `reps` into reps in reserve.
pub fn interpret_rpe(rpe: f64, reps: i32) -> AppResult<RpeInterpretation> {
    validate_rpe(rpe)?;
    if reps < 0 {
        return Err(AppError::validation("Reps cannot be negative"));
    }

    let (rir, description) = if rpe >= 10.0 {
        (0.0, "Maximal effort, no reps in reserve")
    } else if rpe >= 9.5 {
        (0.5, "No reps left, load could have gone up slightly")
    } else if rpe >= 9.0 {
        (1.0, "One rep left")
    } else if rpe >= 8.5 {
        (1.5, "One or two reps left")
    } else if rpe >= 8.0 {
        (2.0, "Two reps left")
    } else if rpe >= 7.5 {
        (2.5, "Two or three reps left")
    } else if rpe >= 7.0 {
        (3.0, "Three reps left, bar speed still fast")
    } else if rpe >= MIN_PRECISE_RPE {
        (10.0 - rpe, "Four or more reps left")
    } else {
        (4.0, "Light effort")
    };

    Ok(RpeInterpretation {
        rpe,
        rir,
        max_reps: reps + rir.floor() as i32,
        description,
    })
}

/// Mean of the recorded RPE values, ignoring sets without one.
pub fn average_rpe<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), rpe| (sum + rpe, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
