use axum::{
    extract::{Path, State},
    middleware,
    response::Json,
    routing::get,
    Extension, Router,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::errors::AppResult;
use crate::models::{ProfileResponse, PublicProfile, UpdateProfileRequest};
use crate::services::UserService;

pub fn user_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/me", get(get_profile).put(update_profile))
        .route("/:user_id", get(get_public_profile))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(UserService::new(db))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn get_profile(
    State(service): State<UserService>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<ProfileResponse>> {
    Ok(Json(service.get_profile(session.user_id).await?))
}

#[tracing::instrument(skip(service, session, request), fields(user_id = %session.user_id))]
async fn update_profile(
    State(service): State<UserService>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileResponse>> {
    Ok(Json(service.update_profile(session.user_id, request).await?))
}

#[tracing::instrument(skip(service))]
async fn get_public_profile(
    State(service): State<UserService>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<PublicProfile>> {
    Ok(Json(service.get_public_profile(user_id).await?))
}
