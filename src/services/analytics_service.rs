use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::engines::autoregulation::{readiness_adjustment, readiness_score, ReadinessResult, ReadinessSurvey};
use crate::engines::fatigue::{
    fatigue_report, recovery_status, session_load, FatigueReport, LastTrained, TrainingLoad,
    CHRONIC_WINDOW_DAYS,
};
use crate::engines::habits::{habit_summary, HabitSummary};
use crate::engines::one_rm::estimate_one_rm;
use crate::engines::progression::{
    detect_plateau, recommend_next, ProgressionConfig, SessionPerformance, WorkingSet,
};
use crate::engines::rpe::average_rpe;
use crate::errors::{AppError, AppResult};
use crate::models::{Exercise, MuscleGroup, OneRmPoint, ProgressionView, SetHistoryRow};
use crate::services::workout_service::completed_dates;

pub const RPE_WINDOW_DAYS: i64 = 14;
/// Sessions considered when looking for a plateau
pub const PLATEAU_SESSIONS: usize = 6;

#[derive(sqlx::FromRow)]
struct LoadRow {
    performed_on: NaiveDate,
    session_rpe: Option<f64>,
    duration_minutes: Option<i32>,
    total_volume: f64,
}

#[derive(sqlx::FromRow)]
struct MuscleRow {
    muscle_group: MuscleGroup,
    last_trained: DateTime<Utc>,
    is_compound: bool,
}

/// Group set rows (ordered by session) into per-session performances.
pub fn group_sessions(rows: &[SetHistoryRow]) -> Vec<SessionPerformance> {
    let mut sessions: Vec<(Uuid, SessionPerformance)> = Vec::new();
    for row in rows {
        let set = WorkingSet {
            weight: row.weight,
            reps: row.reps,
            rpe: row.rpe,
        };
        match sessions.last_mut() {
            Some((id, session)) if *id == row.session_id => session.sets.push(set),
            _ => sessions.push((
                row.session_id,
                SessionPerformance {
                    performed_on: row.performed_on,
                    sets: vec![set],
                },
            )),
        }
    }
    sessions.into_iter().map(|(_, s)| s).collect()
}

/// Best estimated 1RM of each session, oldest first.
pub fn one_rm_points(rows: &[SetHistoryRow]) -> Vec<OneRmPoint> {
    let mut points: Vec<(Uuid, OneRmPoint)> = Vec::new();
    for row in rows {
        let Some(e1rm) = estimate_one_rm(row.weight, row.reps) else {
            continue;
        };
        let point = OneRmPoint {
            performed_on: row.performed_on,
            estimated_one_rm: e1rm,
            weight: row.weight,
            reps: row.reps,
        };
        match points.last_mut() {
            Some((id, best)) if *id == row.session_id => {
                if e1rm > best.estimated_one_rm {
                    *best = point;
                }
            }
            _ => points.push((row.session_id, point)),
        }
    }
    points.into_iter().map(|(_, p)| p).collect()
}

#[derive(Clone)]
pub struct AnalyticsService {
    db: PgPool,
}

impl AnalyticsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn fatigue(&self, user_id: Uuid, today: NaiveDate) -> AppResult<FatigueReport> {
        let since = today - Duration::days(CHRONIC_WINDOW_DAYS - 1);
        let rows = sqlx::query_as::<_, LoadRow>(
            "SELECT performed_on, session_rpe, duration_minutes, total_volume
             FROM workout_sessions
             WHERE user_id = $1 AND status = 'completed' AND performed_on BETWEEN $2 AND $3",
        )
        .bind(user_id)
        .bind(since)
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        let loads: Vec<TrainingLoad> = rows
            .iter()
            .map(|r| TrainingLoad {
                date: r.performed_on,
                load: session_load(r.session_rpe, r.duration_minutes, r.total_volume),
            })
            .collect();

        let rpes: Vec<Option<f64>> = sqlx::query_scalar(
            "SELECT s.rpe FROM set_entries s
             JOIN workout_sessions w ON w.id = s.session_id
             WHERE w.user_id = $1 AND w.status = 'completed' AND NOT s.is_warmup
               AND w.performed_on BETWEEN $2 AND $3",
        )
        .bind(user_id)
        .bind(today - Duration::days(RPE_WINDOW_DAYS - 1))
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        // Latest working set per muscle group; compound work wins a tie.
        let trained: Vec<LastTrained> = sqlx::query_as::<_, MuscleRow>(
            "SELECT DISTINCT ON (e.muscle_group)
                e.muscle_group, w.completed_at AS last_trained, e.is_compound
             FROM set_entries s
             JOIN workout_sessions w ON w.id = s.session_id
             JOIN exercises e ON e.id = s.exercise_id
             WHERE w.user_id = $1 AND w.status = 'completed' AND NOT s.is_warmup
               AND w.completed_at IS NOT NULL
             ORDER BY e.muscle_group, w.completed_at DESC, e.is_compound DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(|row| LastTrained {
            muscle_group: row.muscle_group,
            at: row.last_trained,
            compound: row.is_compound,
        })
        .collect();

        let muscles = recovery_status(&trained, Utc::now());
        Ok(fatigue_report(&loads, average_rpe(rpes), muscles, today))
    }

    async fn exercise(&self, exercise_id: Uuid) -> AppResult<Exercise> {
        sqlx::query_as::<_, Exercise>(
            "SELECT id, name, muscle_group, equipment, is_compound, description, created_at
             FROM exercises WHERE id = $1",
        )
        .bind(exercise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Exercise"))
    }

    async fn set_history(&self, user_id: Uuid, exercise_id: Uuid) -> AppResult<Vec<SetHistoryRow>> {
        let rows = sqlx::query_as::<_, SetHistoryRow>(
            "SELECT w.id AS session_id, w.performed_on, s.weight, s.reps, s.rpe
             FROM set_entries s
             JOIN workout_sessions w ON w.id = s.session_id
             WHERE w.user_id = $1 AND s.exercise_id = $2
               AND w.status = 'completed' AND NOT s.is_warmup
             ORDER BY w.performed_on, w.completed_at, w.id, s.set_number",
        )
        .bind(user_id)
        .bind(exercise_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    pub async fn progression(&self, user_id: Uuid, exercise_id: Uuid) -> AppResult<ProgressionView> {
        let exercise = self.exercise(exercise_id).await?;
        let rows = self.set_history(user_id, exercise_id).await?;
        let sessions = group_sessions(&rows);

        let config = ProgressionConfig::for_exercise(exercise.equipment, exercise.is_compound);
        let recommendation = recommend_next(&sessions, &config);

        let recent: Vec<f64> = sessions
            .iter()
            .rev()
            .take(PLATEAU_SESSIONS)
            .filter_map(SessionPerformance::estimated_one_rm)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        Ok(ProgressionView {
            exercise_id,
            exercise_name: exercise.name,
            config,
            recommendation,
            plateau: detect_plateau(&recent),
            sessions_analyzed: sessions.len(),
        })
    }

    pub async fn one_rm_history(&self, user_id: Uuid, exercise_id: Uuid, limit: Option<i64>) -> AppResult<Vec<OneRmPoint>> {
        self.exercise(exercise_id).await?;
        let rows = self.set_history(user_id, exercise_id).await?;
        let points = one_rm_points(&rows);

        let keep = limit.unwrap_or(50).clamp(1, 365) as usize;
        let skip = points.len().saturating_sub(keep);
        Ok(points.into_iter().skip(skip).collect())
    }

    pub async fn habits(&self, user_id: Uuid, today: NaiveDate) -> AppResult<HabitSummary> {
        let weekly_target: i32 = sqlx::query_scalar("SELECT weekly_target FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        // Streaks need the full history, not just the consistency window.
        let dates = completed_dates(&self.db, user_id, None).await?;
        Ok(habit_summary(&dates, today, weekly_target))
    }
}

pub fn check_readiness(survey: &ReadinessSurvey) -> AppResult<ReadinessResult> {
    survey.validate()?;
    Ok(readiness_adjustment(readiness_score(survey)))
}
