use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::engines::autoregulation::{ReadinessResult, ReadinessSurvey};
use crate::engines::fatigue::FatigueReport;
use crate::engines::habits::HabitSummary;
use crate::errors::AppResult;
use crate::models::{HistoryQuery, OneRmPoint, ProgressionView};
use crate::services::analytics_service::check_readiness;
use crate::services::AnalyticsService;

pub fn analytics_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/fatigue", get(fatigue))
        .route("/progression/:exercise_id", get(progression))
        .route("/one-rm/:exercise_id", get(one_rm_history))
        .route("/habits", get(habits))
        .route("/readiness", post(readiness))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(AnalyticsService::new(db))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn fatigue(
    State(service): State<AnalyticsService>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<FatigueReport>> {
    let today = Utc::now().date_naive();
    Ok(Json(service.fatigue(session.user_id, today).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn progression(
    State(service): State<AnalyticsService>,
    Extension(session): Extension<UserSession>,
    Path(exercise_id): Path<Uuid>,
) -> AppResult<Json<ProgressionView>> {
    Ok(Json(service.progression(session.user_id, exercise_id).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn one_rm_history(
    State(service): State<AnalyticsService>,
    Extension(session): Extension<UserSession>,
    Path(exercise_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<OneRmPoint>>> {
    Ok(Json(service.one_rm_history(session.user_id, exercise_id, query.limit).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn habits(
    State(service): State<AnalyticsService>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<HabitSummary>> {
    let today = Utc::now().date_naive();
    Ok(Json(service.habits(session.user_id, today).await?))
}

#[tracing::instrument(skip(session, survey), fields(user_id = %session.user_id))]
async fn readiness(
    Extension(session): Extension<UserSession>,
    Json(survey): Json<ReadinessSurvey>,
) -> AppResult<Json<ReadinessResult>> {
    Ok(Json(check_readiness(&survey)?))
}
