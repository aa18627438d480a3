use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::validation::{like_pattern, pagination, validate_title};
use crate::models::{CreateGuildRequest, Guild, GuildDetail, GuildListing, GuildMember, GuildQuery, GuildRole};
use crate::services::gamification_service::unlock_achievements;

const GUILD_COLUMNS: &str = "id, name, description, owner_id, created_at";

/// What happens when a member asks to leave
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveOutcome {
    Left,
    Disbanded,
}

/// An owner may only leave once everyone else has gone, and then the guild
/// goes with them.
pub fn leave_outcome(role: GuildRole, member_count: i64) -> AppResult<LeaveOutcome> {
    match role {
        GuildRole::Member => Ok(LeaveOutcome::Left),
        GuildRole::Owner if member_count <= 1 => Ok(LeaveOutcome::Disbanded),
        GuildRole::Owner => Err(AppError::conflict(
            "The owner cannot leave while other members remain",
        )),
    }
}

async fn membership_role(conn: &mut PgConnection, guild_id: Uuid, user_id: Uuid) -> AppResult<Option<GuildRole>> {
    let role = sqlx::query_scalar("SELECT role FROM guild_members WHERE guild_id = $1 AND user_id = $2")
        .bind(guild_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(role)
}

pub async fn guild_of(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Option<Uuid>> {
    let guild_id = sqlx::query_scalar("SELECT guild_id FROM guild_members WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(guild_id)
}

#[derive(Clone)]
pub struct GuildService {
    db: PgPool,
}

impl GuildService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_guild(&self, user_id: Uuid, request: CreateGuildRequest) -> AppResult<GuildDetail> {
        validate_title(&request.name, "Guild name", 50)?;
        if let Some(description) = &request.description {
            if description.chars().count() > 500 {
                return Err(AppError::validation("Description cannot be longer than 500 characters"));
            }
        }

        let mut tx = self.db.begin().await?;
        if guild_of(&mut tx, user_id).await?.is_some() {
            return Err(AppError::conflict("Leave your current guild first"));
        }

        let guild = sqlx::query_as::<_, Guild>(&format!(
            "INSERT INTO guilds (id, name, description, owner_id) VALUES ($1, $2, $3, $4) RETURNING {}",
            GUILD_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(request.description)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::conflict("A guild with that name already exists"),
            other => other,
        })?;

        sqlx::query("INSERT INTO guild_members (guild_id, user_id, role) VALUES ($1, $2, 'owner')")
            .bind(guild.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        unlock_achievements(&mut tx, user_id, Utc::now().date_naive()).await?;
        tx.commit().await?;

        tracing::info!(guild_id = %guild.id, owner = %user_id, "guild created");
        self.get_guild(guild.id).await
    }

    pub async fn list_guilds(&self, query: GuildQuery) -> AppResult<Vec<GuildListing>> {
        let (limit, offset) = pagination(query.limit, query.offset);
        let search = like_pattern(query.search.as_deref());

        let guilds = sqlx::query_as::<_, GuildListing>(
            "SELECT g.id, g.name, g.description, g.owner_id, COUNT(m.user_id) AS member_count, g.created_at
             FROM guilds g
             LEFT JOIN guild_members m ON m.guild_id = g.id
             WHERE ($1::text IS NULL OR g.name ILIKE $1)
             GROUP BY g.id
             ORDER BY member_count DESC, g.name
             LIMIT $2 OFFSET $3",
        )
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(guilds)
    }

    pub async fn get_guild(&self, guild_id: Uuid) -> AppResult<GuildDetail> {
        let guild = sqlx::query_as::<_, Guild>(&format!("SELECT {} FROM guilds WHERE id = $1", GUILD_COLUMNS))
            .bind(guild_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Guild"))?;

        let members = sqlx::query_as::<_, GuildMember>(
            "SELECT m.user_id, u.display_name, u.level, m.role, m.joined_at
             FROM guild_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.guild_id = $1
             ORDER BY m.role, m.joined_at",
        )
        .bind(guild_id)
        .fetch_all(&self.db)
        .await?;

        Ok(GuildDetail { guild, members })
    }

    pub async fn join_guild(&self, user_id: Uuid, guild_id: Uuid) -> AppResult<GuildDetail> {
        let mut tx = self.db.begin().await?;
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM guilds WHERE id = $1)")
            .bind(guild_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::not_found("Guild"));
        }
        if guild_of(&mut tx, user_id).await?.is_some() {
            return Err(AppError::conflict("Leave your current guild first"));
        }

        sqlx::query("INSERT INTO guild_members (guild_id, user_id, role) VALUES ($1, $2, 'member')")
            .bind(guild_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::conflict("Leave your current guild first"),
                other => other,
            })?;
        unlock_achievements(&mut tx, user_id, Utc::now().date_naive()).await?;
        tx.commit().await?;

        tracing::info!(guild_id = %guild_id, user_id = %user_id, "joined guild");
        self.get_guild(guild_id).await
    }

    pub async fn leave_guild(&self, user_id: Uuid, guild_id: Uuid) -> AppResult<LeaveOutcome> {
        let mut tx = self.db.begin().await?;
        // Lock the guild row so membership cannot change underneath us.
        sqlx::query("SELECT id FROM guilds WHERE id = $1 FOR UPDATE")
            .bind(guild_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Guild"))?;

        let role = membership_role(&mut tx, guild_id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Guild membership"))?;
        let member_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM guild_members WHERE guild_id = $1")
            .bind(guild_id)
            .fetch_one(&mut *tx)
            .await?;

        let outcome = leave_outcome(role, member_count)?;
        match outcome {
            LeaveOutcome::Left => {
                sqlx::query("DELETE FROM guild_members WHERE guild_id = $1 AND user_id = $2")
                    .bind(guild_id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
            LeaveOutcome::Disbanded => {
                sqlx::query("DELETE FROM guilds WHERE id = $1")
                    .bind(guild_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;

        tracing::info!(guild_id = %guild_id, user_id = %user_id, ?outcome, "left guild");
        Ok(outcome)
    }

    pub async fn kick_member(&self, owner_id: Uuid, guild_id: Uuid, member_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        match membership_role(&mut tx, guild_id, owner_id).await? {
            Some(GuildRole::Owner) => {}
            Some(GuildRole::Member) => return Err(AppError::forbidden("Only the guild owner can remove members")),
            None => return Err(AppError::not_found("Guild membership")),
        }
        if owner_id == member_id {
            return Err(AppError::validation("The owner cannot remove themselves"));
        }

        let result = sqlx::query("DELETE FROM guild_members WHERE guild_id = $1 AND user_id = $2")
            .bind(guild_id)
            .bind(member_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Guild member"));
        }
        tx.commit().await?;

        tracing::info!(guild_id = %guild_id, member = %member_id, "member removed from guild");
        Ok(())
    }
}
