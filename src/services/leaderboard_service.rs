use chrono::{Datelike, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::engines::gamification::{period_bounds, rank_entries, QuestPeriod};
use crate::errors::{AppError, AppResult};
use crate::models::validation::pagination;
use crate::models::{
    Leaderboard, LeaderboardMetric, LeaderboardPeriod, LeaderboardQuery, LeaderboardScope, ScoredUser,
};
use crate::services::guild_service::guild_of;

/// First day counted by the period, or `None` for all time.
pub fn period_start(period: LeaderboardPeriod, today: NaiveDate) -> Option<NaiveDate> {
    match period {
        LeaderboardPeriod::Weekly => Some(period_bounds(QuestPeriod::Weekly, today).0),
        LeaderboardPeriod::Monthly => today.with_day(1),
        LeaderboardPeriod::AllTime => None,
    }
}

/// Score expression per metric; `$1` is the period start.
fn score_sql(metric: LeaderboardMetric) -> &'static str {
    match metric {
        LeaderboardMetric::Xp => {
            "CASE WHEN $1::date IS NULL THEN u.xp ELSE COALESCE(
                (SELECT SUM(e.amount) FROM xp_events e
                  WHERE e.user_id = u.id AND e.created_at >= $1::date), 0) END"
        }
        LeaderboardMetric::Volume => {
            "COALESCE((SELECT SUM(w.total_volume) FROM workout_sessions w
                WHERE w.user_id = u.id AND w.status = 'completed'
                  AND ($1::date IS NULL OR w.performed_on >= $1)), 0)"
        }
        LeaderboardMetric::Workouts => {
            "(SELECT COUNT(*) FROM workout_sessions w
                WHERE w.user_id = u.id AND w.status = 'completed'
                  AND ($1::date IS NULL OR w.performed_on >= $1))"
        }
    }
}

/// Population filter per scope; `$2` is the viewer or the guild.
fn scope_sql(scope: LeaderboardScope) -> &'static str {
    match scope {
        LeaderboardScope::Global => "$2::uuid IS NOT NULL",
        LeaderboardScope::Friends => {
            "(u.id = $2 OR u.id IN (
                SELECT CASE WHEN f.requester_id = $2 THEN f.addressee_id ELSE f.requester_id END
                FROM friendships f
                WHERE f.status = 'accepted' AND (f.requester_id = $2 OR f.addressee_id = $2)))"
        }
        LeaderboardScope::Guild => "u.id IN (SELECT m.user_id FROM guild_members m WHERE m.guild_id = $2)",
    }
}

#[derive(Clone)]
pub struct LeaderboardService {
    db: PgPool,
}

impl LeaderboardService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn leaderboard(&self, user_id: Uuid, query: LeaderboardQuery, today: NaiveDate) -> AppResult<Leaderboard> {
        let scope = query.scope.unwrap_or(LeaderboardScope::Global);
        let subject = match scope {
            LeaderboardScope::Guild => {
                let mut conn = self.db.acquire().await?;
                guild_of(&mut conn, user_id)
                    .await?
                    .ok_or_else(|| AppError::validation("Join a guild to see a guild leaderboard"))?
            }
            _ => user_id,
        };

        self.ranked(
            query.metric.unwrap_or(LeaderboardMetric::Xp),
            query.period.unwrap_or(LeaderboardPeriod::Weekly),
            scope,
            subject,
            query.limit,
            today,
        )
        .await
    }

    pub async fn guild_leaderboard(&self, guild_id: Uuid, query: LeaderboardQuery, today: NaiveDate) -> AppResult<Leaderboard> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM guilds WHERE id = $1)")
            .bind(guild_id)
            .fetch_one(&self.db)
            .await?;
        if !exists {
            return Err(AppError::not_found("Guild"));
        }

        self.ranked(
            query.metric.unwrap_or(LeaderboardMetric::Xp),
            query.period.unwrap_or(LeaderboardPeriod::Weekly),
            LeaderboardScope::Guild,
            guild_id,
            query.limit,
            today,
        )
        .await
    }

    async fn ranked(
        &self,
        metric: LeaderboardMetric,
        period: LeaderboardPeriod,
        scope: LeaderboardScope,
        subject: Uuid,
        limit: Option<i64>,
        today: NaiveDate,
    ) -> AppResult<Leaderboard> {
        let (limit, _) = pagination(limit, None);
        let sql = format!(
            "SELECT u.id AS user_id, u.display_name, ({})::float8 AS score
             FROM users u
             WHERE {}
             ORDER BY score DESC, u.display_name
             LIMIT $3",
            score_sql(metric),
            scope_sql(scope)
        );

        let scores = sqlx::query_as::<_, ScoredUser>(&sql)
            .bind(period_start(period, today))
            .bind(subject)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;

        Ok(Leaderboard {
            metric,
            period,
            scope,
            entries: rank_entries(scores),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_start() {
        // a Thursday
        let today = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        assert_eq!(period_start(LeaderboardPeriod::Weekly, today), NaiveDate::from_ymd_opt(2024, 8, 12));
        assert_eq!(period_start(LeaderboardPeriod::Monthly, today), NaiveDate::from_ymd_opt(2024, 8, 1));
        assert_eq!(period_start(LeaderboardPeriod::AllTime, today), None);
    }

    #[test]
    fn test_every_scope_binds_subject() {
        for scope in [LeaderboardScope::Global, LeaderboardScope::Friends, LeaderboardScope::Guild] {
            assert!(scope_sql(scope).contains("$2"));
        }
        for metric in [LeaderboardMetric::Xp, LeaderboardMetric::Volume, LeaderboardMetric::Workouts] {
            assert!(score_sql(metric).contains("$1"));
        }
    }
}
