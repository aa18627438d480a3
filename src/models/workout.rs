use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "workout_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkoutStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub performed_on: NaiveDate,
    pub duration_minutes: Option<i32>,
    pub session_rpe: Option<f64>,
    pub notes: Option<String>,
    pub status: WorkoutStatus,
    pub total_volume: f64,
    pub xp_awarded: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SetEntry {
    pub id: Uuid,
    pub session_id: Uuid,
    pub exercise_id: Uuid,
    pub set_number: i32,
    pub weight: f64,
    pub reps: i32,
    pub rpe: Option<f64>,
    pub is_warmup: bool,
    pub created_at: DateTime<Utc>,
}

impl SetEntry {
    pub fn volume(&self) -> f64 {
        if self.is_warmup {
            0.0
        } else {
            self.weight * self.reps as f64
        }
    }
}

/// A set joined with the date of its session, used by the analytics engines.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SetHistoryRow {
    pub session_id: Uuid,
    pub performed_on: NaiveDate,
    pub weight: f64,
    pub reps: i32,
    pub rpe: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkoutRequest {
    pub title: String,
    pub performed_on: Option<NaiveDate>,
    pub duration_minutes: Option<i32>,
    pub session_rpe: Option<f64>,
    pub notes: Option<String>,
    #[serde(default)]
    pub sets: Vec<CreateSetRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorkoutRequest {
    pub title: Option<String>,
    pub performed_on: Option<NaiveDate>,
    pub duration_minutes: Option<i32>,
    pub session_rpe: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSetRequest {
    pub exercise_id: Uuid,
    /// Defaults to the next number for this exercise in the session
    pub set_number: Option<i32>,
    pub weight: f64,
    pub reps: i32,
    pub rpe: Option<f64>,
    #[serde(default)]
    pub is_warmup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSetRequest {
    pub weight: Option<f64>,
    pub reps: Option<i32>,
    pub rpe: Option<f64>,
    pub is_warmup: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkoutQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<WorkoutStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct WorkoutDetail {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub sets: Vec<SetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PersonalRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exercise_id: Uuid,
    pub session_id: Uuid,
    pub weight: f64,
    pub reps: i32,
    pub estimated_one_rm: f64,
    pub achieved_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Returned when a workout is completed
#[derive(Debug, Serialize)]
pub struct CompletionSummary {
    pub session: WorkoutSession,
    pub total_volume: f64,
    pub working_sets: i64,
    pub personal_records: Vec<PersonalRecord>,
    pub xp_awarded: i64,
    pub total_xp: i64,
    pub level: i32,
    pub leveled_up: bool,
    pub achievements_unlocked: Vec<String>,
}
