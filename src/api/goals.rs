use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Extension, Router,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::errors::AppResult;
use crate::models::{CreateGoalRequest, GoalQuery, GoalResponse, UpdateGoalRequest};
use crate::services::GoalService;

pub fn goal_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/", get(list_goals).post(create_goal))
        .route("/:goal_id", get(get_goal).put(update_goal).delete(delete_goal))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(GoalService::new(db))
}

#[tracing::instrument(skip(service, session, request), fields(user_id = %session.user_id))]
async fn create_goal(
    State(service): State<GoalService>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<CreateGoalRequest>,
) -> AppResult<(StatusCode, Json<GoalResponse>)> {
    let goal = service.create_goal(session.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn list_goals(
    State(service): State<GoalService>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<GoalQuery>,
) -> AppResult<Json<Vec<GoalResponse>>> {
    Ok(Json(service.list_goals(session.user_id, query).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn get_goal(
    State(service): State<GoalService>,
    Extension(session): Extension<UserSession>,
    Path(goal_id): Path<Uuid>,
) -> AppResult<Json<GoalResponse>> {
    Ok(Json(service.get_goal(session.user_id, goal_id).await?))
}

#[tracing::instrument(skip(service, session, request), fields(user_id = %session.user_id))]
async fn update_goal(
    State(service): State<GoalService>,
    Extension(session): Extension<UserSession>,
    Path(goal_id): Path<Uuid>,
    Json(request): Json<UpdateGoalRequest>,
) -> AppResult<Json<GoalResponse>> {
    Ok(Json(service.update_goal(session.user_id, goal_id, request).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn delete_goal(
    State(service): State<GoalService>,
    Extension(session): Extension<UserSession>,
    Path(goal_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service.delete_goal(session.user_id, goal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
