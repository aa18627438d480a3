use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::errors::AppResult;
use crate::models::{CreateDuelRequest, Duel, DuelQuery};
use crate::services::DuelService;

pub fn duel_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/", get(list_duels).post(create_duel))
        .route("/:duel_id", get(get_duel))
        .route("/:duel_id/accept", post(accept_duel))
        .route("/:duel_id/decline", post(decline_duel))
        .route("/:duel_id/cancel", post(cancel_duel))
        .route("/:duel_id/resolve", post(resolve_duel))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(DuelService::new(db))
}

#[tracing::instrument(skip(service, session, request), fields(user_id = %session.user_id))]
async fn create_duel(
    State(service): State<DuelService>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<CreateDuelRequest>,
) -> AppResult<(StatusCode, Json<Duel>)> {
    let duel = service.create_duel(session.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(duel)))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn list_duels(
    State(service): State<DuelService>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<DuelQuery>,
) -> AppResult<Json<Vec<Duel>>> {
    Ok(Json(service.list_duels(session.user_id, query).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn get_duel(
    State(service): State<DuelService>,
    Extension(session): Extension<UserSession>,
    Path(duel_id): Path<Uuid>,
) -> AppResult<Json<Duel>> {
    Ok(Json(service.get_duel(session.user_id, duel_id).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn accept_duel(
    State(service): State<DuelService>,
    Extension(session): Extension<UserSession>,
    Path(duel_id): Path<Uuid>,
) -> AppResult<Json<Duel>> {
    Ok(Json(service.accept_duel(session.user_id, duel_id).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn decline_duel(
    State(service): State<DuelService>,
    Extension(session): Extension<UserSession>,
    Path(duel_id): Path<Uuid>,
) -> AppResult<Json<Duel>> {
    Ok(Json(service.decline_duel(session.user_id, duel_id).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn cancel_duel(
    State(service): State<DuelService>,
    Extension(session): Extension<UserSession>,
    Path(duel_id): Path<Uuid>,
) -> AppResult<Json<Duel>> {
    Ok(Json(service.cancel_duel(session.user_id, duel_id).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn resolve_duel(
    State(service): State<DuelService>,
    Extension(session): Extension<UserSession>,
    Path(duel_id): Path<Uuid>,
) -> AppResult<Json<Duel>> {
    Ok(Json(service.resolve_duel(session.user_id, duel_id).await?))
}
