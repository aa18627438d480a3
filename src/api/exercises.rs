use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post, put, MethodRouter},
    Router,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{admin_only_middleware, jwt_auth_middleware, AuthService};
use crate::errors::AppResult;
use crate::models::{CreateExerciseRequest, Exercise, ExerciseQuery, UpdateExerciseRequest};
use crate::services::ExerciseService;

fn admin_only(route: MethodRouter<ExerciseService>) -> MethodRouter<ExerciseService> {
    route.route_layer(middleware::from_fn(admin_only_middleware))
}

/// Anyone signed in can browse the catalog; only admins edit it.
pub fn exercise_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/", get(list_exercises).merge(admin_only(post(create_exercise))))
        .route(
            "/:exercise_id",
            get(get_exercise).merge(admin_only(put(update_exercise).delete(delete_exercise))),
        )
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(ExerciseService::new(db))
}

#[tracing::instrument(skip(service))]
async fn list_exercises(
    State(service): State<ExerciseService>,
    Query(query): Query<ExerciseQuery>,
) -> AppResult<Json<Vec<Exercise>>> {
    Ok(Json(service.list_exercises(query).await?))
}

#[tracing::instrument(skip(service))]
async fn get_exercise(
    State(service): State<ExerciseService>,
    Path(exercise_id): Path<Uuid>,
) -> AppResult<Json<Exercise>> {
    Ok(Json(service.get_exercise(exercise_id).await?))
}

#[tracing::instrument(skip(service, request))]
async fn create_exercise(
    State(service): State<ExerciseService>,
    Json(request): Json<CreateExerciseRequest>,
) -> AppResult<(StatusCode, Json<Exercise>)> {
    let exercise = service.create_exercise(request).await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

#[tracing::instrument(skip(service, request))]
async fn update_exercise(
    State(service): State<ExerciseService>,
    Path(exercise_id): Path<Uuid>,
    Json(request): Json<UpdateExerciseRequest>,
) -> AppResult<Json<Exercise>> {
    Ok(Json(service.update_exercise(exercise_id, request).await?))
}

#[tracing::instrument(skip(service))]
async fn delete_exercise(
    State(service): State<ExerciseService>,
    Path(exercise_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service.delete_exercise(exercise_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
