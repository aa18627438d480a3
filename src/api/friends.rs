use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post},
    Extension, Router,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::errors::AppResult;
use crate::models::{FriendRequest, FriendSummary, Friendship, PendingRequests};
use crate::services::FriendService;

pub fn friend_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/", get(list_friends))
        .route("/requests", get(pending_requests).post(send_request))
        .route("/requests/:friendship_id/accept", post(accept_request))
        .route("/requests/:friendship_id/decline", post(decline_request))
        .route("/:friendship_id", delete(remove_friend))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(FriendService::new(db))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn list_friends(
    State(service): State<FriendService>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<Vec<FriendSummary>>> {
    Ok(Json(service.list_friends(session.user_id).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn pending_requests(
    State(service): State<FriendService>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<PendingRequests>> {
    Ok(Json(service.pending_requests(session.user_id).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id, target = %request.user_id))]
async fn send_request(
    State(service): State<FriendService>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<FriendRequest>,
) -> AppResult<(StatusCode, Json<Friendship>)> {
    let friendship = service.send_request(session.user_id, request.user_id).await?;
    Ok((StatusCode::CREATED, Json(friendship)))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn accept_request(
    State(service): State<FriendService>,
    Extension(session): Extension<UserSession>,
    Path(friendship_id): Path<Uuid>,
) -> AppResult<Json<Friendship>> {
    Ok(Json(service.accept_request(session.user_id, friendship_id).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn decline_request(
    State(service): State<FriendService>,
    Extension(session): Extension<UserSession>,
    Path(friendship_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service.decline_request(session.user_id, friendship_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn remove_friend(
    State(service): State<FriendService>,
    Extension(session): Extension<UserSession>,
    Path(friendship_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service.remove(session.user_id, friendship_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
