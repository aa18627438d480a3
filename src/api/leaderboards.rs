use axum::{
    extract::{Query, State},
    middleware,
    response::Json,
    routing::get,
    Extension, Router,
};
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::errors::AppResult;
use crate::models::{Leaderboard, LeaderboardQuery};
use crate::services::LeaderboardService;

pub fn leaderboard_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/", get(get_leaderboard))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(LeaderboardService::new(db))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn get_leaderboard(
    State(service): State<LeaderboardService>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<LeaderboardQuery>,
) -> AppResult<Json<Leaderboard>> {
    let today = Utc::now().date_naive();
    Ok(Json(service.leaderboard(session.user_id, query, today).await?))
}
