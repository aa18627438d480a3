use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "goal_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    Strength,   // estimated 1RM on an exercise
    Bodyweight, // reach a bodyweight, either direction
    Volume,     // weekly tonnage
    Frequency,  // workouts per week
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "goal_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub kind: GoalKind,
    pub exercise_id: Option<Uuid>,
    /// Value when the goal was set; progress is measured from here
    pub start_value: f64,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub status: GoalStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Percentage towards the target, capped at 100.
    ///
    /// Bodyweight goals may point downwards; progress is then measured from
    /// the start value towards the target either way.
    pub fn progress_percentage(&self) -> f64 {
        if self.status == GoalStatus::Completed {
            return 100.0;
        }
        let span = self.target_value - self.start_value;
        if span.abs() < f64::EPSILON {
            return if self.is_reached() { 100.0 } else { 0.0 };
        }
        (((self.current_value - self.start_value) / span) * 100.0).clamp(0.0, 100.0)
    }

    pub fn is_reached(&self) -> bool {
        target_reached(self.start_value, self.target_value, self.current_value)
    }

    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        self.target_date.map(|target| (target - today).num_days())
    }
}

/// A target above the start is reached from below, one under it from above.
pub fn target_reached(start: f64, target: f64, current: f64) -> bool {
    if target >= start {
        current >= target
    } else {
        current <= target
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGoalRequest {
    pub title: String,
    pub kind: GoalKind,
    pub exercise_id: Option<Uuid>,
    pub target_value: f64,
    pub current_value: Option<f64>,
    pub unit: Option<String>,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub target_date: Option<NaiveDate>,
    pub status: Option<GoalStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GoalQuery {
    pub status: Option<GoalStatus>,
    pub kind: Option<GoalKind>,
}

#[derive(Debug, Serialize)]
pub struct GoalResponse {
    #[serde(flatten)]
    pub goal: Goal,
    pub progress_percentage: f64,
    pub days_remaining: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(start: f64, target: f64, current: f64) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Bench 100".to_string(),
            kind: GoalKind::Strength,
            exercise_id: None,
            start_value: start,
            target_value: target,
            current_value: current,
            unit: Some("kg".to_string()),
            target_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            status: GoalStatus::Active,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress_percentage_upwards() {
        assert_eq!(goal(0.0, 100.0, 50.0).progress_percentage(), 50.0);
        assert_eq!(goal(80.0, 100.0, 90.0).progress_percentage(), 50.0);
        assert_eq!(goal(0.0, 100.0, 120.0).progress_percentage(), 100.0);
    }

    #[test]
    fn test_progress_percentage_downwards() {
        // cutting from 90 to 80, currently 85
        let g = goal(90.0, 80.0, 85.0);
        assert_eq!(g.progress_percentage(), 50.0);
        assert!(!g.is_reached());
        assert!(goal(90.0, 80.0, 79.5).is_reached());
    }

    #[test]
    fn test_weight_loss_goal_not_reached_above_target() {
        assert!(!target_reached(90.0, 80.0, 90.0));
        assert!(!target_reached(90.0, 80.0, 92.0));
        assert!(target_reached(90.0, 80.0, 80.0));
        // gaining towards 80 from 75
        assert!(!target_reached(75.0, 80.0, 78.0));
        assert!(target_reached(75.0, 80.0, 80.5));
    }

    #[test]
    fn test_days_remaining() {
        let g = goal(0.0, 100.0, 0.0);
        let today = NaiveDate::from_ymd_opt(2024, 5, 22).unwrap();
        assert_eq!(g.days_remaining(today), Some(10));
    }
}
