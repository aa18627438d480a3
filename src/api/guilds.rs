use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{delete, get, post},
    Extension, Router,
};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::errors::AppResult;
use crate::models::{CreateGuildRequest, GuildDetail, GuildListing, GuildQuery, Leaderboard, LeaderboardQuery};
use crate::services::guild_service::LeaveOutcome;
use crate::services::{GuildService, LeaderboardService};

#[derive(Clone)]
pub struct GuildAppState {
    pub guilds: GuildService,
    pub leaderboards: LeaderboardService,
}

#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub guild_id: Uuid,
    pub outcome: LeaveOutcome,
}

pub fn guild_routes(db: PgPool, auth_service: AuthService) -> Router {
    let state = GuildAppState {
        guilds: GuildService::new(db.clone()),
        leaderboards: LeaderboardService::new(db),
    };

    Router::new()
        .route("/", get(list_guilds).post(create_guild))
        .route("/:guild_id", get(get_guild))
        .route("/:guild_id/join", post(join_guild))
        .route("/:guild_id/leave", post(leave_guild))
        .route("/:guild_id/members/:user_id", delete(kick_member))
        .route("/:guild_id/leaderboard", get(guild_leaderboard))
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(state)
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn create_guild(
    State(state): State<GuildAppState>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<CreateGuildRequest>,
) -> AppResult<(StatusCode, Json<GuildDetail>)> {
    let guild = state.guilds.create_guild(session.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(guild)))
}

async fn list_guilds(
    State(state): State<GuildAppState>,
    Query(query): Query<GuildQuery>,
) -> AppResult<Json<Vec<GuildListing>>> {
    Ok(Json(state.guilds.list_guilds(query).await?))
}

async fn get_guild(
    State(state): State<GuildAppState>,
    Path(guild_id): Path<Uuid>,
) -> AppResult<Json<GuildDetail>> {
    Ok(Json(state.guilds.get_guild(guild_id).await?))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn join_guild(
    State(state): State<GuildAppState>,
    Extension(session): Extension<UserSession>,
    Path(guild_id): Path<Uuid>,
) -> AppResult<Json<GuildDetail>> {
    Ok(Json(state.guilds.join_guild(session.user_id, guild_id).await?))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn leave_guild(
    State(state): State<GuildAppState>,
    Extension(session): Extension<UserSession>,
    Path(guild_id): Path<Uuid>,
) -> AppResult<Json<LeaveResponse>> {
    let outcome = state.guilds.leave_guild(session.user_id, guild_id).await?;
    Ok(Json(LeaveResponse { guild_id, outcome }))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn kick_member(
    State(state): State<GuildAppState>,
    Extension(session): Extension<UserSession>,
    Path((guild_id, member_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    state.guilds.kick_member(session.user_id, guild_id, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn guild_leaderboard(
    State(state): State<GuildAppState>,
    Path(guild_id): Path<Uuid>,
    Query(query): Query<LeaderboardQuery>,
) -> AppResult<Json<Leaderboard>> {
    let today = Utc::now().date_naive();
    Ok(Json(state.leaderboards.guild_leaderboard(guild_id, query, today).await?))
}
