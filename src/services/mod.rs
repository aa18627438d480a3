// Business logic services

pub mod analytics_service;
pub mod duel_service;
pub mod exercise_service;
pub mod friend_service;
pub mod gamification_service;
pub mod goal_service;
pub mod guild_service;
pub mod leaderboard_service;
pub mod measurement_service;
pub mod user_service;
pub mod workout_service;

pub use analytics_service::AnalyticsService;
pub use duel_service::DuelService;
pub use exercise_service::ExerciseService;
pub use friend_service::FriendService;
pub use gamification_service::GamificationService;
pub use goal_service::GoalService;
pub use guild_service::GuildService;
pub use leaderboard_service::LeaderboardService;
pub use measurement_service::MeasurementService;
pub use user_service::UserService;
pub use workout_service::WorkoutService;
