use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "duel_metric", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DuelMetric {
    Volume,
    Workouts,
    Sets,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "duel_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DuelStatus {
    Pending,
    Active,
    Declined,
    Cancelled,
    Completed,
}

impl DuelStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DuelStatus::Declined | DuelStatus::Cancelled | DuelStatus::Completed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Duel {
    pub id: Uuid,
    pub challenger_id: Uuid,
    pub opponent_id: Uuid,
    pub metric: DuelMetric,
    pub duration_days: i32,
    pub status: DuelStatus,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub challenger_score: Option<f64>,
    pub opponent_score: Option<f64>,
    pub winner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDuelRequest {
    pub opponent_id: Uuid,
    pub metric: DuelMetric,
    pub duration_days: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct DuelQuery {
    pub status: Option<DuelStatus>,
}
