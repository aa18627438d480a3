use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use super::analytics::analytics_routes;
use super::auth::auth_routes;
use super::duels::duel_routes;
use super::exercises::exercise_routes;
use super::friends::friend_routes;
use super::gamification::gamification_routes;
use super::goals::goal_routes;
use super::guilds::guild_routes;
use super::health::health_check;
use super::leaderboards::leaderboard_routes;
use super::measurements::measurement_routes;
use super::tools::tool_routes;
use super::users::user_routes;
use super::workouts::workout_routes;
use crate::auth::{cors_layer, security_headers_layer, AuthService};

pub fn create_routes(db: PgPool, jwt_secret: &str) -> Router {
    let auth_service = AuthService::new(db.clone(), jwt_secret);

    let api_v1 = Router::new()
        .nest("/auth", auth_routes(auth_service.clone()))
        .nest("/users", user_routes(db.clone(), auth_service.clone()))
        .nest("/exercises", exercise_routes(db.clone(), auth_service.clone()))
        .nest("/workouts", workout_routes(db.clone(), auth_service.clone()))
        .nest("/measurements", measurement_routes(db.clone(), auth_service.clone()))
        .nest("/goals", goal_routes(db.clone(), auth_service.clone()))
        .nest("/friends", friend_routes(db.clone(), auth_service.clone()))
        .nest("/guilds", guild_routes(db.clone(), auth_service.clone()))
        .nest("/leaderboards", leaderboard_routes(db.clone(), auth_service.clone()))
        .nest("/duels", duel_routes(db.clone(), auth_service.clone()))
        .nest("/gamification", gamification_routes(db.clone(), auth_service.clone()))
        .nest("/analytics", analytics_routes(db, auth_service))
        .nest("/tools", tool_routes());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1)
        .layer(security_headers_layer())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}
