use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::errors::AppResult;
use crate::models::{
    CompletionSummary, CreateSetRequest, CreateWorkoutRequest, PersonalRecord, SetEntry,
    UpdateSetRequest, UpdateWorkoutRequest, WorkoutDetail, WorkoutQuery, WorkoutSession,
};
use crate::services::WorkoutService;

#[derive(Debug, Deserialize)]
pub struct RecordQuery {
    pub exercise_id: Option<Uuid>,
}

pub fn workout_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/", get(list_workouts).post(create_workout))
        .route("/personal-records", get(list_personal_records))
        .route(
            "/:workout_id",
            get(get_workout).put(update_workout).delete(delete_workout),
        )
        .route("/:workout_id/complete", post(complete_workout))
        .route("/:workout_id/sets", post(add_set))
        .route("/:workout_id/sets/:set_id", put(update_set).delete(delete_set))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(WorkoutService::new(db))
}

#[tracing::instrument(skip(service, session, request), fields(user_id = %session.user_id))]
async fn create_workout(
    State(service): State<WorkoutService>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<CreateWorkoutRequest>,
) -> AppResult<(StatusCode, Json<WorkoutDetail>)> {
    let workout = service.create_workout(session.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(workout)))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn list_workouts(
    State(service): State<WorkoutService>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<WorkoutQuery>,
) -> AppResult<Json<Vec<WorkoutSession>>> {
    Ok(Json(service.list_workouts(session.user_id, query).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn get_workout(
    State(service): State<WorkoutService>,
    Extension(session): Extension<UserSession>,
    Path(workout_id): Path<Uuid>,
) -> AppResult<Json<WorkoutDetail>> {
    Ok(Json(service.get_workout(session.user_id, workout_id).await?))
}

#[tracing::instrument(skip(service, session, request), fields(user_id = %session.user_id))]
async fn update_workout(
    State(service): State<WorkoutService>,
    Extension(session): Extension<UserSession>,
    Path(workout_id): Path<Uuid>,
    Json(request): Json<UpdateWorkoutRequest>,
) -> AppResult<Json<WorkoutSession>> {
    Ok(Json(service.update_workout(session.user_id, workout_id, request).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn delete_workout(
    State(service): State<WorkoutService>,
    Extension(session): Extension<UserSession>,
    Path(workout_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service.delete_workout(session.user_id, workout_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(service, session, request), fields(user_id = %session.user_id))]
async fn add_set(
    State(service): State<WorkoutService>,
    Extension(session): Extension<UserSession>,
    Path(workout_id): Path<Uuid>,
    Json(request): Json<CreateSetRequest>,
) -> AppResult<(StatusCode, Json<SetEntry>)> {
    let set = service.add_set(session.user_id, workout_id, request).await?;
    Ok((StatusCode::CREATED, Json(set)))
}

#[tracing::instrument(skip(service, session, request), fields(user_id = %session.user_id))]
async fn update_set(
    State(service): State<WorkoutService>,
    Extension(session): Extension<UserSession>,
    Path((workout_id, set_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateSetRequest>,
) -> AppResult<Json<SetEntry>> {
    Ok(Json(service.update_set(session.user_id, workout_id, set_id, request).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn delete_set(
    State(service): State<WorkoutService>,
    Extension(session): Extension<UserSession>,
    Path((workout_id, set_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    service.delete_set(session.user_id, workout_id, set_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn complete_workout(
    State(service): State<WorkoutService>,
    Extension(session): Extension<UserSession>,
    Path(workout_id): Path<Uuid>,
) -> AppResult<Json<CompletionSummary>> {
    Ok(Json(service.complete_workout(session.user_id, workout_id).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn list_personal_records(
    State(service): State<WorkoutService>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<RecordQuery>,
) -> AppResult<Json<Vec<PersonalRecord>>> {
    Ok(Json(service.personal_records(session.user_id, query.exercise_id).await?))
}
