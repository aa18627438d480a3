use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engines::gamification::{LevelProgress, QuestPeriod, UserStats};

#[derive(Debug, Clone, Serialize)]
pub struct AchievementView {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub xp_reward: i64,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestView {
    pub code: &'static str,
    pub title: &'static str,
    pub period: QuestPeriod,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub target: f64,
    pub progress: f64,
    pub completed: bool,
    pub claimed: bool,
    pub xp_reward: i64,
}

#[derive(Debug, Serialize)]
pub struct ProgressSummary {
    pub xp: i64,
    pub level_progress: LevelProgress,
    pub stats: UserStats,
    pub achievements_unlocked: usize,
    pub achievements_total: usize,
}

#[derive(Debug, Serialize)]
pub struct QuestClaimResponse {
    pub quest_code: String,
    pub xp_awarded: i64,
    pub total_xp: i64,
    pub level: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardMetric {
    Xp,
    Volume,
    Workouts,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardPeriod {
    Weekly,
    Monthly,
    AllTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardScope {
    Global,
    Friends,
    Guild,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub metric: Option<LeaderboardMetric>,
    pub period: Option<LeaderboardPeriod>,
    pub scope: Option<LeaderboardScope>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: Uuid,
    pub display_name: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct Leaderboard {
    pub metric: LeaderboardMetric,
    pub period: LeaderboardPeriod,
    pub scope: LeaderboardScope,
    pub entries: Vec<LeaderboardEntry>,
}

/// Raw leaderboard score before ranking.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoredUser {
    pub user_id: Uuid,
    pub display_name: String,
    pub score: f64,
}
