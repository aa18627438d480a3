use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::engines::gamification::workout_xp;
use crate::engines::one_rm::estimate_one_rm;
use crate::errors::{AppError, AppResult};
use crate::models::validation::{pagination, validate_reps, validate_rpe, validate_title, validate_weight};
use crate::models::{
    CompletionSummary, CreateSetRequest, CreateWorkoutRequest, PersonalRecord, SetEntry,
    UpdateSetRequest, UpdateWorkoutRequest, WorkoutDetail, WorkoutQuery, WorkoutSession,
    WorkoutStatus,
};
use crate::services::gamification_service::{
    award_xp, current_xp, unlock_achievements, xp_source, XpTotals,
};
use crate::services::goal_service::sync_weekly_goals;

const SESSION_COLUMNS: &str = "id, user_id, title, performed_on, duration_minutes, session_rpe, notes, \
     status, total_volume, xp_awarded, completed_at, created_at, updated_at";
const SET_COLUMNS: &str =
    "id, session_id, exercise_id, set_number, weight, reps, rpe, is_warmup, created_at";

/// Best set of one exercise inside a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestSet {
    pub exercise_id: Uuid,
    pub weight: f64,
    pub reps: i32,
    pub estimated_one_rm: f64,
}

/// Working-set volume and count; warm-ups are excluded from both.
pub fn working_totals(sets: &[SetEntry]) -> (f64, i64) {
    sets.iter()
        .filter(|s| !s.is_warmup)
        .fold((0.0, 0), |(volume, count), s| (volume + s.volume(), count + 1))
}

/// Highest estimated 1RM per exercise among working sets.
pub fn best_sets(sets: &[SetEntry]) -> HashMap<Uuid, BestSet> {
    let mut best: HashMap<Uuid, BestSet> = HashMap::new();
    for set in sets.iter().filter(|s| !s.is_warmup) {
        let Some(e1rm) = estimate_one_rm(set.weight, set.reps) else {
            continue;
        };
        let candidate = BestSet {
            exercise_id: set.exercise_id,
            weight: set.weight,
            reps: set.reps,
            estimated_one_rm: e1rm,
        };
        best.entry(set.exercise_id)
            .and_modify(|current| {
                if e1rm > current.estimated_one_rm {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }
    best
}

/// A session best is a record only when it beats an earlier best.
/// The first time an exercise is logged just sets the baseline.
pub fn is_personal_record(session_best: f64, previous_best: Option<f64>) -> bool {
    matches!(previous_best, Some(previous) if session_best > previous + 1e-9)
}

fn validate_set(weight: f64, reps: i32, rpe: Option<f64>) -> AppResult<()> {
    validate_weight(weight)?;
    validate_reps(reps)?;
    if let Some(rpe) = rpe {
        validate_rpe(rpe)?;
    }
    Ok(())
}

fn validate_session_fields(duration_minutes: Option<i32>, session_rpe: Option<f64>) -> AppResult<()> {
    if let Some(minutes) = duration_minutes {
        if !(1..=600).contains(&minutes) {
            return Err(AppError::validation("Duration must be between 1 and 600 minutes"));
        }
    }
    if let Some(rpe) = session_rpe {
        validate_rpe(rpe)?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct WorkoutService {
    db: PgPool,
}

impl WorkoutService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_workout(&self, user_id: Uuid, request: CreateWorkoutRequest) -> AppResult<WorkoutDetail> {
        validate_title(&request.title, "Title", 100)?;
        validate_session_fields(request.duration_minutes, request.session_rpe)?;
        for set in &request.sets {
            validate_set(set.weight, set.reps, set.rpe)?;
        }

        let mut tx = self.db.begin().await?;
        let session = sqlx::query_as::<_, WorkoutSession>(&format!(
            "INSERT INTO workout_sessions (id, user_id, title, performed_on, duration_minutes, session_rpe, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.title.trim())
        .bind(request.performed_on.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(request.duration_minutes)
        .bind(request.session_rpe)
        .bind(&request.notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut sets = Vec::with_capacity(request.sets.len());
        for set in request.sets {
            sets.push(insert_set(&mut tx, session.id, set).await?);
        }
        tx.commit().await?;

        tracing::info!(user_id = %user_id, workout_id = %session.id, sets = sets.len(), "workout created");
        Ok(WorkoutDetail { session, sets })
    }

    pub async fn list_workouts(&self, user_id: Uuid, query: WorkoutQuery) -> AppResult<Vec<WorkoutSession>> {
        let (limit, offset) = pagination(query.limit, query.offset);
        let sessions = sqlx::query_as::<_, WorkoutSession>(&format!(
            "SELECT {} FROM workout_sessions
             WHERE user_id = $1
               AND ($2::date IS NULL OR performed_on >= $2)
               AND ($3::date IS NULL OR performed_on <= $3)
               AND ($4::workout_status IS NULL OR status = $4)
             ORDER BY performed_on DESC, created_at DESC
             LIMIT $5 OFFSET $6",
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .bind(query.from)
        .bind(query.to)
        .bind(query.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(sessions)
    }

    pub async fn get_workout(&self, user_id: Uuid, workout_id: Uuid) -> AppResult<WorkoutDetail> {
        let mut conn = self.db.acquire().await?;
        let session = fetch_session(&mut conn, user_id, workout_id, false).await?;
        let sets = fetch_sets(&mut conn, workout_id).await?;
        Ok(WorkoutDetail { session, sets })
    }

    pub async fn update_workout(
        &self,
        user_id: Uuid,
        workout_id: Uuid,
        request: UpdateWorkoutRequest,
    ) -> AppResult<WorkoutSession> {
        if let Some(title) = &request.title {
            validate_title(title, "Title", 100)?;
        }
        validate_session_fields(request.duration_minutes, request.session_rpe)?;

        let session = sqlx::query_as::<_, WorkoutSession>(&format!(
            "UPDATE workout_sessions SET
                title = COALESCE($3, title),
                performed_on = COALESCE($4, performed_on),
                duration_minutes = COALESCE($5, duration_minutes),
                session_rpe = COALESCE($6, session_rpe),
                notes = COALESCE($7, notes),
                updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(workout_id)
        .bind(user_id)
        .bind(request.title.as_deref().map(str::trim))
        .bind(request.performed_on)
        .bind(request.duration_minutes)
        .bind(request.session_rpe)
        .bind(request.notes)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Workout"))?;

        Ok(session)
    }

    /// XP already earned by a completed workout stays with the user.
    pub async fn delete_workout(&self, user_id: Uuid, workout_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM workout_sessions WHERE id = $1 AND user_id = $2")
            .bind(workout_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Workout"));
        }
        tracing::info!(user_id = %user_id, workout_id = %workout_id, "workout deleted");
        Ok(())
    }

    pub async fn add_set(&self, user_id: Uuid, workout_id: Uuid, request: CreateSetRequest) -> AppResult<SetEntry> {
        validate_set(request.weight, request.reps, request.rpe)?;

        let mut tx = self.db.begin().await?;
        let session = fetch_session(&mut tx, user_id, workout_id, true).await?;
        ensure_editable(&session)?;
        let set = insert_set(&mut tx, workout_id, request).await?;
        tx.commit().await?;

        Ok(set)
    }

    pub async fn update_set(
        &self,
        user_id: Uuid,
        workout_id: Uuid,
        set_id: Uuid,
        request: UpdateSetRequest,
    ) -> AppResult<SetEntry> {
        let mut tx = self.db.begin().await?;
        let session = fetch_session(&mut tx, user_id, workout_id, true).await?;
        ensure_editable(&session)?;

        let current = fetch_set(&mut tx, workout_id, set_id).await?;
        let weight = request.weight.unwrap_or(current.weight);
        let reps = request.reps.unwrap_or(current.reps);
        let rpe = request.rpe.or(current.rpe);
        validate_set(weight, reps, rpe)?;

        let set = sqlx::query_as::<_, SetEntry>(&format!(
            "UPDATE set_entries SET weight = $3, reps = $4, rpe = $5, is_warmup = $6
             WHERE id = $1 AND session_id = $2
             RETURNING {}",
            SET_COLUMNS
        ))
        .bind(set_id)
        .bind(workout_id)
        .bind(weight)
        .bind(reps)
        .bind(rpe)
        .bind(request.is_warmup.unwrap_or(current.is_warmup))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(set)
    }

    pub async fn delete_set(&self, user_id: Uuid, workout_id: Uuid, set_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let session = fetch_session(&mut tx, user_id, workout_id, true).await?;
        ensure_editable(&session)?;

        let result = sqlx::query("DELETE FROM set_entries WHERE id = $1 AND session_id = $2")
            .bind(set_id)
            .bind(workout_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Set"));
        }
        tx.commit().await?;
        Ok(())
    }

    /// Finish a workout in one transaction: total its volume, record PRs,
    /// advance goals, pay out XP and unlock achievements.
    pub async fn complete_workout(&self, user_id: Uuid, workout_id: Uuid) -> AppResult<CompletionSummary> {
        let today = Utc::now().date_naive();
        let mut tx = self.db.begin().await?;

        let session = fetch_session(&mut tx, user_id, workout_id, true).await?;
        if session.status == WorkoutStatus::Completed {
            return Err(AppError::conflict("Workout is already completed"));
        }

        let sets = fetch_sets(&mut tx, workout_id).await?;
        let (total_volume, working_sets) = working_totals(&sets);
        if working_sets == 0 {
            return Err(AppError::validation("Log at least one working set before completing a workout"));
        }

        let mut personal_records = Vec::new();
        for best in best_sets(&sets).into_values() {
            let previous = previous_best(&mut tx, user_id, best.exercise_id, workout_id).await?;
            if is_personal_record(best.estimated_one_rm, previous) {
                let record = insert_record(&mut tx, user_id, &session, &best).await?;
                personal_records.push(record);
            }
            sync_strength_goals(&mut tx, user_id, best.exercise_id, best.estimated_one_rm).await?;
        }

        let xp = workout_xp(total_volume, working_sets, personal_records.len());
        let session = sqlx::query_as::<_, WorkoutSession>(&format!(
            "UPDATE workout_sessions
             SET status = 'completed', total_volume = $2, xp_awarded = $3,
                 completed_at = NOW(), updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(workout_id)
        .bind(total_volume)
        .bind(xp)
        .fetch_one(&mut *tx)
        .await?;
        sync_weekly_goals(&mut tx, user_id, today).await?;

        let totals = award_xp(&mut tx, user_id, xp, xp_source::WORKOUT, Some(workout_id)).await?;
        let achievements = unlock_achievements(&mut tx, user_id, today).await?;
        // Achievement XP may have raised the level again since the workout payout.
        let current = XpTotals {
            previous_level: totals.previous_level,
            ..current_xp(&mut tx, user_id).await?
        };

        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            workout_id = %workout_id,
            volume = total_volume,
            prs = personal_records.len(),
            xp,
            "workout completed"
        );

        Ok(CompletionSummary {
            session,
            total_volume,
            working_sets,
            personal_records,
            xp_awarded: xp,
            total_xp: current.xp,
            level: current.level,
            leveled_up: current.leveled_up(),
            achievements_unlocked: achievements.iter().map(|a| a.code.to_string()).collect(),
        })
    }

    pub async fn personal_records(&self, user_id: Uuid, exercise_id: Option<Uuid>) -> AppResult<Vec<PersonalRecord>> {
        let records = sqlx::query_as::<_, PersonalRecord>(
            "SELECT id, user_id, exercise_id, session_id, weight, reps, estimated_one_rm, achieved_on, created_at
             FROM personal_records
             WHERE user_id = $1 AND ($2::uuid IS NULL OR exercise_id = $2)
             ORDER BY achieved_on DESC, created_at DESC",
        )
        .bind(user_id)
        .bind(exercise_id)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }
}

fn ensure_editable(session: &WorkoutSession) -> AppResult<()> {
    if session.status == WorkoutStatus::Completed {
        return Err(AppError::conflict("Completed workouts cannot be edited"));
    }
    Ok(())
}

async fn fetch_session(
    conn: &mut PgConnection,
    user_id: Uuid,
    workout_id: Uuid,
    for_update: bool,
) -> AppResult<WorkoutSession> {
    let sql = format!(
        "SELECT {} FROM workout_sessions WHERE id = $1 AND user_id = $2{}",
        SESSION_COLUMNS,
        if for_update { " FOR UPDATE" } else { "" }
    );
    sqlx::query_as::<_, WorkoutSession>(&sql)
        .bind(workout_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("Workout"))
}

async fn fetch_sets(conn: &mut PgConnection, workout_id: Uuid) -> AppResult<Vec<SetEntry>> {
    let sets = sqlx::query_as::<_, SetEntry>(&format!(
        "SELECT {} FROM set_entries WHERE session_id = $1 ORDER BY created_at, set_number",
        SET_COLUMNS
    ))
    .bind(workout_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(sets)
}

async fn fetch_set(conn: &mut PgConnection, workout_id: Uuid, set_id: Uuid) -> AppResult<SetEntry> {
    sqlx::query_as::<_, SetEntry>(&format!(
        "SELECT {} FROM set_entries WHERE id = $1 AND session_id = $2",
        SET_COLUMNS
    ))
    .bind(set_id)
    .bind(workout_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found("Set"))
}

async fn insert_set(conn: &mut PgConnection, workout_id: Uuid, request: CreateSetRequest) -> AppResult<SetEntry> {
    let set_number = match request.set_number {
        Some(n) if n > 0 => n,
        Some(_) => return Err(AppError::validation("Set number must be positive")),
        None => {
            sqlx::query_scalar::<_, i32>(
                "SELECT COALESCE(MAX(set_number), 0) + 1 FROM set_entries
                 WHERE session_id = $1 AND exercise_id = $2",
            )
            .bind(workout_id)
            .bind(request.exercise_id)
            .fetch_one(&mut *conn)
            .await?
        }
    };

    let set = sqlx::query_as::<_, SetEntry>(&format!(
        "INSERT INTO set_entries (id, session_id, exercise_id, set_number, weight, reps, rpe, is_warmup)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {}",
        SET_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(workout_id)
    .bind(request.exercise_id)
    .bind(set_number)
    .bind(request.weight)
    .bind(request.reps)
    .bind(request.rpe)
    .bind(request.is_warmup)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::conflict(format!("Set {} already exists for this exercise", set_number)),
        AppError::Validation(_) => AppError::not_found("Exercise"),
        other => other,
    })?;

    Ok(set)
}

/// Best estimated 1RM for an exercise over the user's other completed workouts.
async fn previous_best(
    conn: &mut PgConnection,
    user_id: Uuid,
    exercise_id: Uuid,
    workout_id: Uuid,
) -> AppResult<Option<f64>> {
    let rows: Vec<(f64, i32)> = sqlx::query_as(
        "SELECT s.weight, s.reps FROM set_entries s
         JOIN workout_sessions w ON w.id = s.session_id
         WHERE w.user_id = $1 AND s.exercise_id = $2 AND w.id <> $3
           AND w.status = 'completed' AND NOT s.is_warmup",
    )
    .bind(user_id)
    .bind(exercise_id)
    .bind(workout_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(crate::engines::one_rm::best_estimate(rows))
}

async fn insert_record(
    conn: &mut PgConnection,
    user_id: Uuid,
    session: &WorkoutSession,
    best: &BestSet,
) -> AppResult<PersonalRecord> {
    let record = sqlx::query_as::<_, PersonalRecord>(
        "INSERT INTO personal_records (id, user_id, exercise_id, session_id, weight, reps, estimated_one_rm, achieved_on)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING id, user_id, exercise_id, session_id, weight, reps, estimated_one_rm, achieved_on, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(best.exercise_id)
    .bind(session.id)
    .bind(best.weight)
    .bind(best.reps)
    .bind(best.estimated_one_rm)
    .bind(session.performed_on)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(user_id = %user_id, exercise_id = %best.exercise_id, e1rm = best.estimated_one_rm, "personal record");
    Ok(record)
}

/// Raise active strength goals on this exercise and complete any that hit their target.
async fn sync_strength_goals(conn: &mut PgConnection, user_id: Uuid, exercise_id: Uuid, e1rm: f64) -> AppResult<()> {
    sqlx::query(
        "UPDATE goals SET
            current_value = GREATEST(current_value, $3),
            status = CASE WHEN GREATEST(current_value, $3) >= target_value THEN 'completed'::goal_status ELSE status END,
            completed_at = CASE WHEN GREATEST(current_value, $3) >= target_value THEN NOW() ELSE completed_at END,
            updated_at = NOW()
         WHERE user_id = $1 AND exercise_id = $2 AND kind = 'strength' AND status = 'active'",
    )
    .bind(user_id)
    .bind(exercise_id)
    .bind(e1rm)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Completed sessions by date, for engines that work on daily history.
pub async fn completed_dates(db: &PgPool, user_id: Uuid, since: Option<NaiveDate>) -> AppResult<Vec<NaiveDate>> {
    let dates = sqlx::query_scalar(
        "SELECT performed_on FROM workout_sessions
         WHERE user_id = $1 AND status = 'completed'
           AND ($2::date IS NULL OR performed_on >= $2)
         ORDER BY performed_on",
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(db)
    .await?;
    Ok(dates)
}
