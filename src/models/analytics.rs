use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engines::progression::{ProgressionConfig, ProgressionRecommendation};

#[derive(Debug, Serialize)]
pub struct ProgressionView {
    pub exercise_id: Uuid,
    pub exercise_name: String,
    pub config: ProgressionConfig,
    pub recommendation: ProgressionRecommendation,
    pub plateau: bool,
    pub sessions_analyzed: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OneRmPoint {
    pub performed_on: NaiveDate,
    pub estimated_one_rm: f64,
    pub weight: f64,
    pub reps: i32,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RpeToolQuery {
    pub rpe: f64,
    pub reps: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct OneRmToolQuery {
    pub weight: f64,
    pub reps: i32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RepMax {
    pub reps: i32,
    pub weight: f64,
}

#[derive(Debug, Serialize)]
pub struct OneRmToolResponse {
    pub estimated_one_rm: f64,
    pub epley: f64,
    pub brzycki: Option<f64>,
    /// Loads for common rep targets at zero reps in reserve
    pub rep_maxes: Vec<RepMax>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustLoadRequest {
    pub planned_weight: f64,
    pub target_rpe: f64,
    pub actual_rpe: f64,
    pub increment: Option<f64>,
}
