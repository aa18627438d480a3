//! One-repetition-maximum estimation.
//!
//! Epley holds up across rep ranges; Brzycki is tighter at low reps but
//! diverges above ten, so the blended estimate only uses it up to there.

/// Reps above this are estimated with Epley alone.
pub const BLEND_REP_LIMIT: i32 = 10;

pub fn epley(weight: f64, reps: i32) -> f64 {
    if reps <= 1 {
        return weight;
    }
    weight * (1.0 + reps as f64 / 30.0)
}

/// Undefined at 37 reps and beyond.
pub fn brzycki(weight: f64, reps: i32) -> Option<f64> {
    if !(1..37).contains(&reps) {
        return None;
    }
    Some(weight * 36.0 / (37.0 - reps as f64))
}

pub fn estimate_one_rm(weight: f64, reps: i32) -> Option<f64> {
    if reps <= 0 || weight <= 0.0 || !weight.is_finite() {
        return None;
    }
    if reps == 1 {
        return Some(weight);
    }

    let e = epley(weight, reps);
    if reps <= BLEND_REP_LIMIT {
        brzycki(weight, reps).map(|b| (e + b) / 2.0)
    } else {
        Some(e)
    }
}

/// Load that should leave `rir` reps in reserve after `reps` reps,
/// by inverting Epley on the total reps the lifter could do.
pub fn load_for_reps(one_rm: f64, reps: i32, rir: f64) -> f64 {
    let total = reps as f64 + rir.max(0.0);
    if total <= 1.0 {
        return one_rm;
    }
    one_rm / (1.0 + total / 30.0)
}

/// Best estimate over a collection of `(weight, reps)` sets.
pub fn best_estimate<I>(sets: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, i32)>,
{
    sets.into_iter()
        .filter_map(|(weight, reps)| estimate_one_rm(weight, reps))
        .fold(None, |best: Option<f64>, e| Some(best.map_or(e, |b| b.max(e))))
}
