use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::engines::duel::{
    duel_outcome, duel_window, transition, validate_duration, DuelAction, DuelOutcome, ParticipantRole,
    DUEL_DRAW_XP, DUEL_WIN_XP,
};
use crate::errors::{AppError, AppResult};
use crate::models::{CreateDuelRequest, Duel, DuelMetric, DuelQuery, DuelStatus};
use crate::services::friend_service::are_friends;
use crate::services::gamification_service::{award_xp, unlock_achievements, xp_source};

const DUEL_COLUMNS: &str = "id, challenger_id, opponent_id, metric, duration_days, status, starts_at, ends_at, \
     challenger_score, opponent_score, winner_id, created_at, resolved_at";

fn role_of(duel: &Duel, user_id: Uuid) -> AppResult<ParticipantRole> {
    if duel.challenger_id == user_id {
        Ok(ParticipantRole::Challenger)
    } else if duel.opponent_id == user_id {
        Ok(ParticipantRole::Opponent)
    } else {
        Err(AppError::not_found("Duel"))
    }
}

/// Score of one participant from workouts completed inside the window.
async fn participant_score(
    conn: &mut PgConnection,
    user_id: Uuid,
    metric: DuelMetric,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> AppResult<f64> {
    let sql = match metric {
        DuelMetric::Volume => {
            "SELECT COALESCE(SUM(total_volume), 0)::float8 FROM workout_sessions
             WHERE user_id = $1 AND status = 'completed' AND completed_at >= $2 AND completed_at < $3"
        }
        DuelMetric::Workouts => {
            "SELECT COUNT(*)::float8 FROM workout_sessions
             WHERE user_id = $1 AND status = 'completed' AND completed_at >= $2 AND completed_at < $3"
        }
        DuelMetric::Sets => {
            "SELECT COUNT(*)::float8 FROM set_entries s
             JOIN workout_sessions w ON w.id = s.session_id
             WHERE w.user_id = $1 AND w.status = 'completed' AND NOT s.is_warmup
               AND w.completed_at >= $2 AND w.completed_at < $3"
        }
    };

    let score: f64 = sqlx::query_scalar(sql)
        .bind(user_id)
        .bind(starts_at)
        .bind(ends_at)
        .fetch_one(&mut *conn)
        .await?;
    Ok(score)
}

#[derive(Clone)]
pub struct DuelService {
    db: PgPool,
}

impl DuelService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_duel(&self, challenger_id: Uuid, request: CreateDuelRequest) -> AppResult<Duel> {
        validate_duration(request.duration_days)?;
        if challenger_id == request.opponent_id {
            return Err(AppError::validation("You cannot duel yourself"));
        }

        let mut tx = self.db.begin().await?;
        if !are_friends(&mut tx, challenger_id, request.opponent_id).await? {
            return Err(AppError::validation("You can only challenge friends"));
        }

        let open: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM duels
              WHERE status IN ('pending', 'active')
                AND ((challenger_id = $1 AND opponent_id = $2) OR (challenger_id = $2 AND opponent_id = $1)))",
        )
        .bind(challenger_id)
        .bind(request.opponent_id)
        .fetch_one(&mut *tx)
        .await?;
        if open {
            return Err(AppError::conflict("There is already an open duel between you"));
        }

        let duel = sqlx::query_as::<_, Duel>(&format!(
            "INSERT INTO duels (id, challenger_id, opponent_id, metric, duration_days)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            DUEL_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(challenger_id)
        .bind(request.opponent_id)
        .bind(request.metric)
        .bind(request.duration_days)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(duel_id = %duel.id, challenger = %challenger_id, opponent = %duel.opponent_id, "duel issued");
        Ok(duel)
    }

    pub async fn list_duels(&self, user_id: Uuid, query: DuelQuery) -> AppResult<Vec<Duel>> {
        let duels = sqlx::query_as::<_, Duel>(&format!(
            "SELECT {} FROM duels
             WHERE (challenger_id = $1 OR opponent_id = $1)
               AND ($2::duel_status IS NULL OR status = $2)
             ORDER BY created_at DESC",
            DUEL_COLUMNS
        ))
        .bind(user_id)
        .bind(query.status)
        .fetch_all(&self.db)
        .await?;
        Ok(duels)
    }

    pub async fn get_duel(&self, user_id: Uuid, duel_id: Uuid) -> AppResult<Duel> {
        let mut conn = self.db.acquire().await?;
        let duel = fetch_duel(&mut conn, duel_id, false).await?;
        role_of(&duel, user_id)?;
        Ok(duel)
    }

    pub async fn accept_duel(&self, user_id: Uuid, duel_id: Uuid) -> AppResult<Duel> {
        self.respond(user_id, duel_id, DuelAction::Accept).await
    }

    pub async fn decline_duel(&self, user_id: Uuid, duel_id: Uuid) -> AppResult<Duel> {
        self.respond(user_id, duel_id, DuelAction::Decline).await
    }

    pub async fn cancel_duel(&self, user_id: Uuid, duel_id: Uuid) -> AppResult<Duel> {
        self.respond(user_id, duel_id, DuelAction::Cancel).await
    }

    async fn respond(&self, user_id: Uuid, duel_id: Uuid, action: DuelAction) -> AppResult<Duel> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let duel = fetch_duel(&mut tx, duel_id, true).await?;
        let role = role_of(&duel, user_id)?;
        let next = transition(duel.status, action, role, now, duel.ends_at)?;

        let (starts_at, ends_at) = match next {
            DuelStatus::Active => {
                let (start, end) = duel_window(now, duel.duration_days);
                (Some(start), Some(end))
            }
            _ => (duel.starts_at, duel.ends_at),
        };

        let updated = sqlx::query_as::<_, Duel>(&format!(
            "UPDATE duels SET status = $2, starts_at = $3, ends_at = $4,
                resolved_at = CASE WHEN $2 IN ('declined'::duel_status, 'cancelled'::duel_status) THEN $5 ELSE resolved_at END
             WHERE id = $1
             RETURNING {}",
            DUEL_COLUMNS
        ))
        .bind(duel_id)
        .bind(next)
        .bind(starts_at)
        .bind(ends_at)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(duel_id = %duel_id, user_id = %user_id, ?action, status = ?next, "duel updated");
        Ok(updated)
    }

    /// Score both sides once the window has closed and pay out XP.
    pub async fn resolve_duel(&self, user_id: Uuid, duel_id: Uuid) -> AppResult<Duel> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let duel = fetch_duel(&mut tx, duel_id, true).await?;
        let role = role_of(&duel, user_id)?;
        transition(duel.status, DuelAction::Resolve, role, now, duel.ends_at)?;

        let (starts_at, ends_at) = match (duel.starts_at, duel.ends_at) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(AppError::Internal(anyhow::anyhow!("active duel {} has no window", duel_id))),
        };

        let challenger_score = participant_score(&mut tx, duel.challenger_id, duel.metric, starts_at, ends_at).await?;
        let opponent_score = participant_score(&mut tx, duel.opponent_id, duel.metric, starts_at, ends_at).await?;
        let outcome = duel_outcome(challenger_score, opponent_score);

        let winner_id = match outcome {
            DuelOutcome::ChallengerWins => Some(duel.challenger_id),
            DuelOutcome::OpponentWins => Some(duel.opponent_id),
            DuelOutcome::Draw => None,
        };

        let updated = sqlx::query_as::<_, Duel>(&format!(
            "UPDATE duels SET status = 'completed', challenger_score = $2, opponent_score = $3,
                winner_id = $4, resolved_at = $5
             WHERE id = $1
             RETURNING {}",
            DUEL_COLUMNS
        ))
        .bind(duel_id)
        .bind(challenger_score)
        .bind(opponent_score)
        .bind(winner_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        match winner_id {
            Some(winner) => {
                award_xp(&mut tx, winner, DUEL_WIN_XP, xp_source::DUEL, Some(duel_id)).await?;
            }
            None => {
                for participant in [duel.challenger_id, duel.opponent_id] {
                    award_xp(&mut tx, participant, DUEL_DRAW_XP, xp_source::DUEL, Some(duel_id)).await?;
                }
            }
        }
        let today = now.date_naive();
        for participant in [duel.challenger_id, duel.opponent_id] {
            unlock_achievements(&mut tx, participant, today).await?;
        }
        tx.commit().await?;

        tracing::info!(duel_id = %duel_id, ?outcome, challenger_score, opponent_score, "duel resolved");
        Ok(updated)
    }
}

async fn fetch_duel(conn: &mut PgConnection, duel_id: Uuid, for_update: bool) -> AppResult<Duel> {
    let sql = format!(
        "SELECT {} FROM duels WHERE id = $1{}",
        DUEL_COLUMNS,
        if for_update { " FOR UPDATE" } else { "" }
    );
    sqlx::query_as::<_, Duel>(&sql)
        .bind(duel_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("Duel"))
}
