//! Stateless calculators; no account needed.

use axum::{extract::Query, response::Json, routing::{get, post}, Router};

use crate::engines::autoregulation::{adjust_load, LoadAdjustment};
use crate::engines::one_rm::{brzycki, epley, estimate_one_rm, load_for_reps};
use crate::engines::rpe::{interpret_rpe, RpeInterpretation};
use crate::errors::{AppError, AppResult};
use crate::models::{AdjustLoadRequest, OneRmToolQuery, OneRmToolResponse, RepMax, RpeToolQuery};

/// Rep targets listed alongside a 1RM estimate
const REP_MAX_TARGETS: [i32; 6] = [1, 3, 5, 8, 10, 12];
const DEFAULT_INCREMENT: f64 = 2.5;

pub fn tool_routes() -> Router {
    Router::new()
        .route("/rpe", get(rpe))
        .route("/one-rm", get(one_rm))
        .route("/adjust-load", post(adjust))
}

async fn rpe(Query(query): Query<RpeToolQuery>) -> AppResult<Json<RpeInterpretation>> {
    Ok(Json(interpret_rpe(query.rpe, query.reps.unwrap_or(0))?))
}

pub fn one_rm_table(weight: f64, reps: i32) -> AppResult<OneRmToolResponse> {
    let estimated = estimate_one_rm(weight, reps)
        .ok_or_else(|| AppError::validation("Weight and reps must be positive"))?;

    let rep_maxes = REP_MAX_TARGETS
        .iter()
        .map(|&target| RepMax {
            reps: target,
            weight: (load_for_reps(estimated, target, 0.0) * 10.0).round() / 10.0,
        })
        .collect();

    Ok(OneRmToolResponse {
        estimated_one_rm: estimated,
        epley: epley(weight, reps),
        brzycki: brzycki(weight, reps),
        rep_maxes,
    })
}

async fn one_rm(Query(query): Query<OneRmToolQuery>) -> AppResult<Json<OneRmToolResponse>> {
    Ok(Json(one_rm_table(query.weight, query.reps)?))
}

async fn adjust(Json(request): Json<AdjustLoadRequest>) -> AppResult<Json<LoadAdjustment>> {
    if request.planned_weight < 0.0 || !request.planned_weight.is_finite() {
        return Err(AppError::validation("Planned weight cannot be negative"));
    }
    for rpe in [request.target_rpe, request.actual_rpe] {
        if !(1.0..=10.0).contains(&rpe) {
            return Err(AppError::validation("RPE must be between 1 and 10"));
        }
    }

    let increment = request.increment.unwrap_or(DEFAULT_INCREMENT);
    Ok(Json(adjust_load(
        request.planned_weight,
        request.target_rpe,
        request.actual_rpe,
        increment,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_rm_table_single_rep() {
        let table = one_rm_table(140.0, 1).unwrap();
        assert_eq!(table.estimated_one_rm, 140.0);
        assert_eq!(table.rep_maxes[0], RepMax { reps: 1, weight: 140.0 });
    }

    #[test]
    fn test_rep_maxes_decrease() {
        let table = one_rm_table(100.0, 5).unwrap();
        assert!(table
            .rep_maxes
            .windows(2)
            .all(|pair| pair[0].weight > pair[1].weight));
    }

    #[test]
    fn test_one_rm_table_rejects_zero_reps() {
        assert!(one_rm_table(100.0, 0).is_err());
    }
}
