//! XP, levels, achievements, quests and leaderboard ranking.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::{LeaderboardEntry, ScoredUser};

pub const BASE_WORKOUT_XP: i64 = 50;
pub const MAX_VOLUME_XP: i64 = 200;
pub const XP_PER_WORKING_SET: i64 = 2;
pub const XP_PER_PERSONAL_RECORD: i64 = 100;

/// XP for completing a workout: a flat base, one point per 100 kg of volume
/// (capped), a little per working set and a bonus for each PR.
pub fn workout_xp(volume: f64, working_sets: i64, personal_records: usize) -> i64 {
    let volume_xp = ((volume.max(0.0) / 100.0).floor() as i64).min(MAX_VOLUME_XP);
    BASE_WORKOUT_XP
        + volume_xp
        + XP_PER_WORKING_SET * working_sets.max(0)
        + XP_PER_PERSONAL_RECORD * personal_records as i64
}

/// Total XP needed to reach `level`. Level 1 starts at zero.
pub fn xp_for_level(level: i32) -> i64 {
    let level = level.max(1) as i64;
    50 * (level - 1) * level
}

pub fn level_for_xp(xp: i64) -> i32 {
    let mut level = 1;
    while xp_for_level(level + 1) <= xp {
        level += 1;
    }
    level
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelProgress {
    pub level: i32,
    pub xp_into_level: i64,
    pub xp_for_next: i64,
}

impl LevelProgress {
    pub fn from_xp(xp: i64) -> Self {
        let level = level_for_xp(xp);
        let floor = xp_for_level(level);
        Self {
            level,
            xp_into_level: xp - floor,
            xp_for_next: xp_for_level(level + 1) - floor,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStats {
    pub total_workouts: i64,
    pub total_volume: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub personal_records: i64,
    pub level: i32,
    pub friends: i64,
    pub duels_won: i64,
    pub in_guild: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criterion {
    Workouts(i64),
    Volume(f64),
    Streak(u32),
    PersonalRecords(i64),
    Level(i32),
    Friends(i64),
    DuelsWon(i64),
    GuildMember,
}

impl Criterion {
    pub fn is_met(&self, stats: &UserStats) -> bool {
        match *self {
            Criterion::Workouts(n) => stats.total_workouts >= n,
            Criterion::Volume(kg) => stats.total_volume >= kg,
            Criterion::Streak(days) => stats.longest_streak.max(stats.current_streak) >= days,
            Criterion::PersonalRecords(n) => stats.personal_records >= n,
            Criterion::Level(level) => stats.level >= level,
            Criterion::Friends(n) => stats.friends >= n,
            Criterion::DuelsWon(n) => stats.duels_won >= n,
            Criterion::GuildMember => stats.in_guild,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub xp_reward: i64,
    pub criterion: Criterion,
}

pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        code: "first_workout",
        name: "First Light",
        description: "Complete your first workout",
        xp_reward: 50,
        criterion: Criterion::Workouts(1),
    },
    Achievement {
        code: "workouts_10",
        name: "Regular",
        description: "Complete 10 workouts",
        xp_reward: 100,
        criterion: Criterion::Workouts(10),
    },
    Achievement {
        code: "workouts_50",
        name: "Iron Devotee",
        description: "Complete 50 workouts",
        xp_reward: 300,
        criterion: Criterion::Workouts(50),
    },
    Achievement {
        code: "workouts_100",
        name: "Centurion",
        description: "Complete 100 workouts",
        xp_reward: 600,
        criterion: Criterion::Workouts(100),
    },
    Achievement {
        code: "volume_10t",
        name: "Ten Tonnes",
        description: "Lift 10,000 kg of total volume",
        xp_reward: 100,
        criterion: Criterion::Volume(10_000.0),
    },
    Achievement {
        code: "volume_100t",
        name: "Hundred Tonnes",
        description: "Lift 100,000 kg of total volume",
        xp_reward: 400,
        criterion: Criterion::Volume(100_000.0),
    },
    Achievement {
        code: "streak_3",
        name: "Warming Up",
        description: "Train three days in a row",
        xp_reward: 75,
        criterion: Criterion::Streak(3),
    },
    Achievement {
        code: "streak_7",
        name: "Unbroken Week",
        description: "Train seven days in a row",
        xp_reward: 250,
        criterion: Criterion::Streak(7),
    },
    Achievement {
        code: "first_pr",
        name: "New Heights",
        description: "Set your first personal record",
        xp_reward: 50,
        criterion: Criterion::PersonalRecords(1),
    },
    Achievement {
        code: "prs_25",
        name: "Record Breaker",
        description: "Set 25 personal records",
        xp_reward: 300,
        criterion: Criterion::PersonalRecords(25),
    },
    Achievement {
        code: "level_5",
        name: "Rising Star",
        description: "Reach level 5",
        xp_reward: 100,
        criterion: Criterion::Level(5),
    },
    Achievement {
        code: "level_10",
        name: "Astral",
        description: "Reach level 10",
        xp_reward: 250,
        criterion: Criterion::Level(10),
    },
    Achievement {
        code: "first_friend",
        name: "Spotter",
        description: "Add your first friend",
        xp_reward: 25,
        criterion: Criterion::Friends(1),
    },
    Achievement {
        code: "first_duel_win",
        name: "Duelist",
        description: "Win a duel",
        xp_reward: 100,
        criterion: Criterion::DuelsWon(1),
    },
    Achievement {
        code: "guild_member",
        name: "Banner Bearer",
        description: "Join a guild",
        xp_reward: 25,
        criterion: Criterion::GuildMember,
    },
];

/// Achievements whose criterion is met and that are not unlocked yet.
pub fn evaluate_achievements(stats: &UserStats, unlocked: &HashSet<String>) -> Vec<&'static Achievement> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| !unlocked.contains(a.code) && a.criterion.is_met(stats))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestPeriod {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestMetric {
    Workouts,
    WorkingSets,
    Volume,
}

#[derive(Debug, Clone, Copy)]
pub struct Quest {
    pub code: &'static str,
    pub title: &'static str,
    pub period: QuestPeriod,
    pub metric: QuestMetric,
    pub target: f64,
    pub xp_reward: i64,
}

pub const QUESTS: &[Quest] = &[
    Quest {
        code: "daily_workout",
        title: "Complete a workout today",
        period: QuestPeriod::Daily,
        metric: QuestMetric::Workouts,
        target: 1.0,
        xp_reward: 30,
    },
    Quest {
        code: "daily_sets_15",
        title: "Log 15 working sets today",
        period: QuestPeriod::Daily,
        metric: QuestMetric::WorkingSets,
        target: 15.0,
        xp_reward: 40,
    },
    Quest {
        code: "weekly_workouts_3",
        title: "Complete 3 workouts this week",
        period: QuestPeriod::Weekly,
        metric: QuestMetric::Workouts,
        target: 3.0,
        xp_reward: 120,
    },
    Quest {
        code: "weekly_volume_20t",
        title: "Move 20,000 kg this week",
        period: QuestPeriod::Weekly,
        metric: QuestMetric::Volume,
        target: 20_000.0,
        xp_reward: 150,
    },
];

pub fn find_quest(code: &str) -> Option<&'static Quest> {
    QUESTS.iter().find(|q| q.code == code)
}

/// Completed-workout totals inside one quest period.
#[derive(Debug, Clone, Copy, Default, PartialEq, sqlx::FromRow)]
pub struct PeriodStats {
    pub workouts: i64,
    pub working_sets: i64,
    pub volume: f64,
}

pub fn quest_progress(metric: QuestMetric, stats: &PeriodStats) -> f64 {
    match metric {
        QuestMetric::Workouts => stats.workouts as f64,
        QuestMetric::WorkingSets => stats.working_sets as f64,
        QuestMetric::Volume => stats.volume,
    }
}

/// Inclusive first and last day of the period containing `today`.
/// Weeks run Monday to Sunday.
pub fn period_bounds(period: QuestPeriod, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match period {
        QuestPeriod::Daily => (today, today),
        QuestPeriod::Weekly => {
            let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            (start, start + Duration::days(6))
        }
    }
}

/// Competition ranking: equal scores share a rank and the next distinct
/// score skips ahead (1, 2, 2, 4). Ties are listed by name.
pub fn rank_entries(mut scores: Vec<ScoredUser>) -> Vec<LeaderboardEntry> {
    scores.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(scores.len());
    for (index, scored) in scores.into_iter().enumerate() {
        let rank = match entries.last() {
            Some(prev) if prev.score == scored.score => prev.rank,
            _ => index as u32 + 1,
        };
        entries.push(LeaderboardEntry {
            rank,
            user_id: scored.user_id,
            display_name: scored.display_name,
            score: scored.score,
        });
    }
    entries
}
