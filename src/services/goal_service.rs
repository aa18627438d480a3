use chrono::{NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::engines::gamification::{period_bounds, PeriodStats, QuestPeriod};
use crate::errors::{AppError, AppResult};
use crate::models::validation::validate_title;
use crate::models::{
    target_reached, CreateGoalRequest, Goal, GoalKind, GoalQuery, GoalResponse, GoalStatus,
    UpdateGoalRequest,
};
use crate::services::gamification_service::period_stats;

const GOAL_COLUMNS: &str = "id, user_id, title, kind, exercise_id, start_value, target_value, \
     current_value, unit, target_date, status, completed_at, created_at, updated_at";

fn validate_create(request: &CreateGoalRequest) -> AppResult<()> {
    validate_title(&request.title, "Title", 120)?;
    if !request.target_value.is_finite() {
        return Err(AppError::validation("Target value must be a number"));
    }
    match request.kind {
        GoalKind::Strength if request.exercise_id.is_none() => {
            Err(AppError::validation("Strength goals need an exercise"))
        }
        GoalKind::Strength | GoalKind::Volume | GoalKind::Frequency | GoalKind::Bodyweight
            if request.target_value <= 0.0 =>
        {
            Err(AppError::validation("Target value must be positive"))
        }
        _ => Ok(()),
    }
}

/// Starting point of a bodyweight goal: the value given, else the latest weigh-in.
fn bodyweight_baseline(given: Option<f64>, latest: Option<f64>) -> AppResult<f64> {
    given.or(latest).ok_or_else(|| {
        AppError::validation("Log a bodyweight measurement or give a current value for a bodyweight goal")
    })
}

/// This week's value for the goal kinds that reset weekly.
fn weekly_total(kind: GoalKind, stats: &PeriodStats) -> Option<f64> {
    match kind {
        GoalKind::Volume => Some(stats.volume),
        GoalKind::Frequency => Some(stats.workouts as f64),
        _ => None,
    }
}

pub async fn latest_bodyweight(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Option<f64>> {
    let weight = sqlx::query_scalar(
        "SELECT bodyweight FROM body_measurements
         WHERE user_id = $1 AND bodyweight IS NOT NULL
         ORDER BY measured_on DESC
         LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(weight)
}

/// Complete active goals of `kind` whose current value has reached the target.
async fn complete_reached(conn: &mut PgConnection, user_id: Uuid, kind: GoalKind) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE goals SET status = 'completed', completed_at = NOW(), updated_at = NOW()
         WHERE user_id = $1 AND kind = $2 AND status = 'active'
           AND ((target_value >= start_value AND current_value >= target_value)
             OR (target_value < start_value AND current_value <= target_value))",
    )
    .bind(user_id)
    .bind(kind)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        tracing::info!(user_id = %user_id, kind = ?kind, count = result.rows_affected(), "goals completed");
    }
    Ok(())
}

/// Point active bodyweight goals at the most recent weigh-in.
pub async fn sync_bodyweight_goals(conn: &mut PgConnection, user_id: Uuid) -> AppResult<()> {
    let Some(weight) = latest_bodyweight(conn, user_id).await? else {
        return Ok(());
    };

    sqlx::query(
        "UPDATE goals SET current_value = $2, updated_at = NOW()
         WHERE user_id = $1 AND kind = 'bodyweight' AND status = 'active'",
    )
    .bind(user_id)
    .bind(weight)
    .execute(&mut *conn)
    .await?;

    complete_reached(conn, user_id, GoalKind::Bodyweight).await
}

/// Set weekly volume and frequency goals to this week's totals.
pub async fn sync_weekly_goals(conn: &mut PgConnection, user_id: Uuid, today: NaiveDate) -> AppResult<()> {
    let (start, end) = period_bounds(QuestPeriod::Weekly, today);
    let stats = period_stats(conn, user_id, start, end).await?;

    for kind in [GoalKind::Volume, GoalKind::Frequency] {
        let Some(total) = weekly_total(kind, &stats) else {
            continue;
        };
        sqlx::query(
            "UPDATE goals SET current_value = $3, updated_at = NOW()
             WHERE user_id = $1 AND kind = $2 AND status = 'active'",
        )
        .bind(user_id)
        .bind(kind)
        .bind(total)
        .execute(&mut *conn)
        .await?;

        complete_reached(conn, user_id, kind).await?;
    }
    Ok(())
}

pub fn goal_response(goal: Goal, today: NaiveDate) -> GoalResponse {
    GoalResponse {
        progress_percentage: goal.progress_percentage(),
        days_remaining: goal.days_remaining(today),
        goal,
    }
}

#[derive(Clone)]
pub struct GoalService {
    db: PgPool,
}

impl GoalService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a goal. Bodyweight goals start from the latest weigh-in unless
    /// a current value is given; weekly goals start at zero and pick up this
    /// week's total.
    pub async fn create_goal(&self, user_id: Uuid, request: CreateGoalRequest) -> AppResult<GoalResponse> {
        validate_create(&request)?;
        let today = Utc::now().date_naive();
        let mut conn = self.db.acquire().await?;

        let (start, current) = match request.kind {
            GoalKind::Bodyweight => {
                let latest = latest_bodyweight(&mut conn, user_id).await?;
                let baseline = bodyweight_baseline(request.current_value, latest)?;
                (baseline, baseline)
            }
            GoalKind::Volume | GoalKind::Frequency => {
                let (week_start, week_end) = period_bounds(QuestPeriod::Weekly, today);
                let stats = period_stats(&mut conn, user_id, week_start, week_end).await?;
                let current = request
                    .current_value
                    .or_else(|| weekly_total(request.kind, &stats))
                    .unwrap_or(0.0);
                (0.0, current)
            }
            GoalKind::Strength | GoalKind::Custom => {
                let current = request.current_value.unwrap_or(0.0);
                (current, current)
            }
        };

        let reached = request.kind != GoalKind::Custom && target_reached(start, request.target_value, current);
        let (status, completed_at) = if reached {
            (GoalStatus::Completed, Some(Utc::now()))
        } else {
            (GoalStatus::Active, None)
        };

        let goal = sqlx::query_as::<_, Goal>(&format!(
            "INSERT INTO goals
                (id, user_id, title, kind, exercise_id, start_value, target_value, current_value,
                 unit, target_date, status, completed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {}",
            GOAL_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.title.trim())
        .bind(request.kind)
        .bind(request.exercise_id)
        .bind(start)
        .bind(request.target_value)
        .bind(current)
        .bind(request.unit)
        .bind(request.target_date)
        .bind(status)
        .bind(completed_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Validation(_) => AppError::not_found("Exercise"),
            other => other,
        })?;

        tracing::info!(user_id = %user_id, goal_id = %goal.id, kind = ?goal.kind, "goal created");
        Ok(goal_response(goal, today))
    }

    pub async fn list_goals(&self, user_id: Uuid, query: GoalQuery) -> AppResult<Vec<GoalResponse>> {
        let goals = sqlx::query_as::<_, Goal>(&format!(
            "SELECT {} FROM goals
             WHERE user_id = $1
               AND ($2::goal_status IS NULL OR status = $2)
               AND ($3::goal_kind IS NULL OR kind = $3)
             ORDER BY status, target_date NULLS LAST, created_at DESC",
            GOAL_COLUMNS
        ))
        .bind(user_id)
        .bind(query.status)
        .bind(query.kind)
        .fetch_all(&self.db)
        .await?;

        let today = Utc::now().date_naive();
        Ok(goals.into_iter().map(|g| goal_response(g, today)).collect())
    }

    async fn fetch_goal(&self, user_id: Uuid, goal_id: Uuid) -> AppResult<Goal> {
        sqlx::query_as::<_, Goal>(&format!(
            "SELECT {} FROM goals WHERE id = $1 AND user_id = $2",
            GOAL_COLUMNS
        ))
        .bind(goal_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Goal"))
    }

    pub async fn get_goal(&self, user_id: Uuid, goal_id: Uuid) -> AppResult<GoalResponse> {
        let goal = self.fetch_goal(user_id, goal_id).await?;
        Ok(goal_response(goal, Utc::now().date_naive()))
    }

    /// Apply the update; an active goal whose current value reaches the
    /// target is marked completed.
    pub async fn update_goal(&self, user_id: Uuid, goal_id: Uuid, request: UpdateGoalRequest) -> AppResult<GoalResponse> {
        if let Some(title) = &request.title {
            validate_title(title, "Title", 120)?;
        }

        let mut goal = self.fetch_goal(user_id, goal_id).await?;
        if let Some(title) = request.title {
            goal.title = title.trim().to_string();
        }
        if let Some(target) = request.target_value {
            goal.target_value = target;
        }
        if let Some(current) = request.current_value {
            goal.current_value = current;
        }
        if request.target_date.is_some() {
            goal.target_date = request.target_date;
        }
        if let Some(status) = request.status {
            goal.status = status;
        }

        if goal.status == GoalStatus::Active && goal.is_reached() {
            goal.status = GoalStatus::Completed;
        }
        goal.completed_at = match goal.status {
            GoalStatus::Completed => goal.completed_at.or_else(|| Some(Utc::now())),
            _ => None,
        };

        let updated = sqlx::query_as::<_, Goal>(&format!(
            "UPDATE goals SET
                title = $3, target_value = $4, current_value = $5, target_date = $6,
                status = $7, completed_at = $8, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            GOAL_COLUMNS
        ))
        .bind(goal_id)
        .bind(user_id)
        .bind(&goal.title)
        .bind(goal.target_value)
        .bind(goal.current_value)
        .bind(goal.target_date)
        .bind(goal.status)
        .bind(goal.completed_at)
        .fetch_one(&self.db)
        .await?;

        if updated.status == GoalStatus::Completed {
            tracing::info!(user_id = %user_id, goal_id = %goal_id, "goal completed");
        }
        Ok(goal_response(updated, Utc::now().date_naive()))
    }

    pub async fn delete_goal(&self, user_id: Uuid, goal_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND user_id = $2")
            .bind(goal_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Goal"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(kind: GoalKind, exercise_id: Option<Uuid>, target: f64) -> CreateGoalRequest {
        CreateGoalRequest {
            title: "Goal".to_string(),
            kind,
            exercise_id,
            target_value: target,
            current_value: None,
            unit: None,
            target_date: None,
        }
    }

    #[test]
    fn test_strength_goal_needs_exercise() {
        assert!(validate_create(&request(GoalKind::Strength, None, 100.0)).is_err());
        assert!(validate_create(&request(GoalKind::Strength, Some(Uuid::new_v4()), 100.0)).is_ok());
    }

    #[test]
    fn test_target_must_be_positive() {
        assert!(validate_create(&request(GoalKind::Frequency, None, 0.0)).is_err());
        assert!(validate_create(&request(GoalKind::Custom, None, 0.0)).is_ok());
        assert!(validate_create(&request(GoalKind::Custom, None, f64::NAN)).is_err());
    }

    #[test]
    fn test_bodyweight_baseline_prefers_given_value() {
        assert_eq!(bodyweight_baseline(Some(88.0), Some(90.0)).unwrap(), 88.0);
        assert_eq!(bodyweight_baseline(None, Some(90.0)).unwrap(), 90.0);
        assert_matches!(bodyweight_baseline(None, None), Err(AppError::Validation(_)));
    }

    #[test]
    fn test_weekly_total_by_kind() {
        let stats = PeriodStats { workouts: 3, working_sets: 30, volume: 12_500.0 };
        assert_eq!(weekly_total(GoalKind::Volume, &stats), Some(12_500.0));
        assert_eq!(weekly_total(GoalKind::Frequency, &stats), Some(3.0));
        assert_eq!(weekly_total(GoalKind::Strength, &stats), None);
    }
}
