use axum::{
    extract::{Path, State},
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::errors::AppResult;
use crate::models::{AchievementView, ProgressSummary, QuestClaimResponse, QuestView};
use crate::services::GamificationService;

pub fn gamification_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/progress", get(progress))
        .route("/achievements", get(achievements))
        .route("/quests", get(quests))
        .route("/quests/:code/claim", post(claim_quest))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(GamificationService::new(db))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn progress(
    State(service): State<GamificationService>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<ProgressSummary>> {
    let today = Utc::now().date_naive();
    Ok(Json(service.progress(session.user_id, today).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn achievements(
    State(service): State<GamificationService>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<Vec<AchievementView>>> {
    Ok(Json(service.achievements(session.user_id).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn quests(
    State(service): State<GamificationService>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<Vec<QuestView>>> {
    let today = Utc::now().date_naive();
    Ok(Json(service.quests(session.user_id, today).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn claim_quest(
    State(service): State<GamificationService>,
    Extension(session): Extension<UserSession>,
    Path(code): Path<String>,
) -> AppResult<Json<QuestClaimResponse>> {
    let today = Utc::now().date_naive();
    Ok(Json(service.claim_quest(session.user_id, &code, today).await?))
}
