use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::engines::gamification::{
    evaluate_achievements, find_quest, level_for_xp, period_bounds, quest_progress, Achievement,
    LevelProgress, PeriodStats, UserStats, ACHIEVEMENTS, QUESTS,
};
use crate::engines::habits::compute_streaks;
use crate::errors::{AppError, AppResult};
use crate::models::{AchievementView, ProgressSummary, QuestClaimResponse, QuestView};

/// XP source tags stored on `xp_events`
pub mod xp_source {
    pub const WORKOUT: &str = "workout";
    pub const ACHIEVEMENT: &str = "achievement";
    pub const QUEST: &str = "quest";
    pub const DUEL: &str = "duel";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpTotals {
    pub xp: i64,
    pub level: i32,
    pub previous_level: i32,
}

impl XpTotals {
    pub fn leveled_up(&self) -> bool {
        self.level > self.previous_level
    }
}

#[derive(sqlx::FromRow)]
struct XpRow {
    xp: i64,
    level: i32,
}

/// Add XP to a user, record the event and recompute the level.
pub async fn award_xp(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i64,
    source: &str,
    reference_id: Option<Uuid>,
) -> AppResult<XpTotals> {
    let current = sqlx::query_as::<_, XpRow>("SELECT xp, level FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if amount <= 0 {
        return Ok(XpTotals {
            xp: current.xp,
            level: current.level,
            previous_level: current.level,
        });
    }

    let xp = current.xp + amount;
    let level = level_for_xp(xp);

    sqlx::query("UPDATE users SET xp = $2, level = $3, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(xp)
        .bind(level)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "INSERT INTO xp_events (id, user_id, amount, source, reference_id)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(amount)
    .bind(source)
    .bind(reference_id)
    .execute(&mut *conn)
    .await?;

    if level > current.level {
        tracing::info!(user_id = %user_id, level, "user leveled up");
    }

    Ok(XpTotals {
        xp,
        level,
        previous_level: current.level,
    })
}

pub async fn current_xp(conn: &mut PgConnection, user_id: Uuid) -> AppResult<XpTotals> {
    let row = sqlx::query_as::<_, XpRow>("SELECT xp, level FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(XpTotals {
        xp: row.xp,
        level: row.level,
        previous_level: row.level,
    })
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total_workouts: i64,
    total_volume: f64,
    personal_records: i64,
    level: i32,
    friends: i64,
    duels_won: i64,
    in_guild: bool,
}

pub async fn load_stats(conn: &mut PgConnection, user_id: Uuid, today: NaiveDate) -> AppResult<UserStats> {
    let row = sqlx::query_as::<_, StatsRow>(
        "SELECT
            (SELECT COUNT(*) FROM workout_sessions
              WHERE user_id = u.id AND status = 'completed') AS total_workouts,
            (SELECT COALESCE(SUM(total_volume), 0)::float8 FROM workout_sessions
              WHERE user_id = u.id AND status = 'completed') AS total_volume,
            (SELECT COUNT(*) FROM personal_records WHERE user_id = u.id) AS personal_records,
            u.level,
            (SELECT COUNT(*) FROM friendships
              WHERE status = 'accepted' AND (requester_id = u.id OR addressee_id = u.id)) AS friends,
            (SELECT COUNT(*) FROM duels WHERE winner_id = u.id) AS duels_won,
            EXISTS (SELECT 1 FROM guild_members WHERE user_id = u.id) AS in_guild
         FROM users u
         WHERE u.id = $1",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found("User"))?;

    let days: Vec<NaiveDate> = sqlx::query_scalar(
        "SELECT DISTINCT performed_on FROM workout_sessions
         WHERE user_id = $1 AND status = 'completed'
         ORDER BY performed_on",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    let streaks = compute_streaks(days, today);

    Ok(UserStats {
        total_workouts: row.total_workouts,
        total_volume: row.total_volume,
        current_streak: streaks.current,
        longest_streak: streaks.longest,
        personal_records: row.personal_records,
        level: row.level,
        friends: row.friends,
        duels_won: row.duels_won,
        in_guild: row.in_guild,
    })
}

async fn unlocked_codes(conn: &mut PgConnection, user_id: Uuid) -> AppResult<HashSet<String>> {
    let codes: Vec<String> =
        sqlx::query_scalar("SELECT achievement_code FROM user_achievements WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(codes.into_iter().collect())
}

/// Unlock every achievement the user now qualifies for and pay out its XP.
/// Repeats because achievement XP can raise the level past a level badge.
pub async fn unlock_achievements(
    conn: &mut PgConnection,
    user_id: Uuid,
    today: NaiveDate,
) -> AppResult<Vec<&'static Achievement>> {
    let mut unlocked = unlocked_codes(conn, user_id).await?;
    let mut newly = Vec::new();

    loop {
        let stats = load_stats(conn, user_id, today).await?;
        let earned = evaluate_achievements(&stats, &unlocked);
        if earned.is_empty() {
            break;
        }

        for achievement in earned {
            sqlx::query(
                "INSERT INTO user_achievements (user_id, achievement_code) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(achievement.code)
            .execute(&mut *conn)
            .await?;

            award_xp(conn, user_id, achievement.xp_reward, xp_source::ACHIEVEMENT, None).await?;
            tracing::info!(user_id = %user_id, code = achievement.code, "achievement unlocked");

            unlocked.insert(achievement.code.to_string());
            newly.push(achievement);
        }
    }

    Ok(newly)
}

/// Totals from completed workouts performed between `start` and `end`.
pub async fn period_stats(
    conn: &mut PgConnection,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<PeriodStats> {
    let stats = sqlx::query_as::<_, PeriodStats>(
        "SELECT
            COUNT(*) AS workouts,
            COALESCE(SUM((SELECT COUNT(*) FROM set_entries s
                          WHERE s.session_id = w.id AND NOT s.is_warmup)), 0)::bigint AS working_sets,
            COALESCE(SUM(w.total_volume), 0)::float8 AS volume
         FROM workout_sessions w
         WHERE w.user_id = $1 AND w.status = 'completed'
           AND w.performed_on BETWEEN $2 AND $3",
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_one(&mut *conn)
    .await?;

    Ok(stats)
}

#[derive(sqlx::FromRow)]
struct UnlockedRow {
    achievement_code: String,
    unlocked_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct GamificationService {
    db: PgPool,
}

impl GamificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn progress(&self, user_id: Uuid, today: NaiveDate) -> AppResult<ProgressSummary> {
        let mut conn = self.db.acquire().await?;
        let stats = load_stats(&mut conn, user_id, today).await?;
        let xp: i64 = sqlx::query_scalar("SELECT xp FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;
        let unlocked = unlocked_codes(&mut conn, user_id).await?;

        Ok(ProgressSummary {
            xp,
            level_progress: LevelProgress::from_xp(xp),
            stats,
            achievements_unlocked: unlocked.len(),
            achievements_total: ACHIEVEMENTS.len(),
        })
    }

    pub async fn achievements(&self, user_id: Uuid) -> AppResult<Vec<AchievementView>> {
        let rows = sqlx::query_as::<_, UnlockedRow>(
            "SELECT achievement_code, unlocked_at FROM user_achievements WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        let unlocked: HashMap<String, DateTime<Utc>> = rows
            .into_iter()
            .map(|r| (r.achievement_code, r.unlocked_at))
            .collect();

        Ok(ACHIEVEMENTS
            .iter()
            .map(|a| {
                let unlocked_at = unlocked.get(a.code).copied();
                AchievementView {
                    code: a.code,
                    name: a.name,
                    description: a.description,
                    xp_reward: a.xp_reward,
                    unlocked: unlocked_at.is_some(),
                    unlocked_at,
                }
            })
            .collect())
    }

    pub async fn quests(&self, user_id: Uuid, today: NaiveDate) -> AppResult<Vec<QuestView>> {
        let mut conn = self.db.acquire().await?;
        let mut views = Vec::with_capacity(QUESTS.len());

        for quest in QUESTS {
            let (start, end) = period_bounds(quest.period, today);
            let stats = period_stats(&mut conn, user_id, start, end).await?;
            let claimed: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM quest_claims
                  WHERE user_id = $1 AND quest_code = $2 AND period_start = $3)",
            )
            .bind(user_id)
            .bind(quest.code)
            .bind(start)
            .fetch_one(&mut *conn)
            .await?;

            let progress = quest_progress(quest.metric, &stats);
            views.push(QuestView {
                code: quest.code,
                title: quest.title,
                period: quest.period,
                period_start: start,
                period_end: end,
                target: quest.target,
                progress: progress.min(quest.target),
                completed: progress >= quest.target,
                claimed,
                xp_reward: quest.xp_reward,
            });
        }

        Ok(views)
    }

    /// Pay out a completed quest once per period.
    pub async fn claim_quest(&self, user_id: Uuid, code: &str, today: NaiveDate) -> AppResult<QuestClaimResponse> {
        let quest = find_quest(code).ok_or_else(|| AppError::not_found("Quest"))?;
        let (start, end) = period_bounds(quest.period, today);

        let mut tx = self.db.begin().await?;
        let stats = period_stats(&mut tx, user_id, start, end).await?;
        if quest_progress(quest.metric, &stats) < quest.target {
            return Err(AppError::validation("Quest is not completed yet"));
        }

        let inserted = sqlx::query(
            "INSERT INTO quest_claims (user_id, quest_code, period_start, xp_awarded)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(quest.code)
        .bind(start)
        .bind(quest.xp_reward)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(AppError::conflict("Quest already claimed for this period"));
        }

        award_xp(&mut tx, user_id, quest.xp_reward, xp_source::QUEST, None).await?;
        unlock_achievements(&mut tx, user_id, today).await?;
        let totals = current_xp(&mut tx, user_id).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user_id, quest = quest.code, "quest claimed");
        Ok(QuestClaimResponse {
            quest_code: quest.code.to_string(),
            xp_awarded: quest.xp_reward,
            total_xp: totals.xp,
            level: totals.level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leveled_up_compares_against_level_before_payout() {
        let same = XpTotals { xp: 90, level: 1, previous_level: 1 };
        assert!(!same.leveled_up());

        // Achievement XP after the workout payout can add a further level.
        let after_achievements = XpTotals { xp: 320, level: 3, previous_level: 1 };
        assert!(after_achievements.leveled_up());
    }
}
