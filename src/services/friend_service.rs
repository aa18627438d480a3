use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{FriendSummary, Friendship, FriendshipStatus, PendingRequests};
use crate::services::gamification_service::unlock_achievements;

const FRIENDSHIP_COLUMNS: &str = "id, requester_id, addressee_id, status, created_at, responded_at";

/// Listing rows seen from `$1`'s side of each friendship.
const SUMMARY_SELECT: &str = "SELECT f.id AS friendship_id, u.id AS user_id, u.display_name, u.level, f.status,
        COALESCE(f.responded_at, f.created_at) AS since
     FROM friendships f
     JOIN users u ON u.id = CASE WHEN f.requester_id = $1 THEN f.addressee_id ELSE f.requester_id END";

pub async fn are_friends(conn: &mut PgConnection, a: Uuid, b: Uuid) -> AppResult<bool> {
    let friends: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM friendships
          WHERE status = 'accepted'
            AND ((requester_id = $1 AND addressee_id = $2) OR (requester_id = $2 AND addressee_id = $1)))",
    )
    .bind(a)
    .bind(b)
    .fetch_one(&mut *conn)
    .await?;
    Ok(friends)
}

async fn fetch_friendship(conn: &mut PgConnection, friendship_id: Uuid) -> AppResult<Friendship> {
    sqlx::query_as::<_, Friendship>(&format!(
        "SELECT {} FROM friendships WHERE id = $1 FOR UPDATE",
        FRIENDSHIP_COLUMNS
    ))
    .bind(friendship_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found("Friend request"))
}

#[derive(Clone)]
pub struct FriendService {
    db: PgPool,
}

impl FriendService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn send_request(&self, user_id: Uuid, target_id: Uuid) -> AppResult<Friendship> {
        if user_id == target_id {
            return Err(AppError::validation("You cannot send a friend request to yourself"));
        }

        let target_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(target_id)
            .fetch_one(&self.db)
            .await?;
        if !target_exists {
            return Err(AppError::not_found("User"));
        }

        let existing = sqlx::query_as::<_, Friendship>(&format!(
            "SELECT {} FROM friendships
             WHERE (requester_id = $1 AND addressee_id = $2) OR (requester_id = $2 AND addressee_id = $1)",
            FRIENDSHIP_COLUMNS
        ))
        .bind(user_id)
        .bind(target_id)
        .fetch_optional(&self.db)
        .await?;

        if let Some(existing) = existing {
            return Err(match existing.status {
                FriendshipStatus::Accepted => AppError::conflict("You are already friends"),
                FriendshipStatus::Pending if existing.requester_id == user_id => {
                    AppError::conflict("Friend request already sent")
                }
                FriendshipStatus::Pending => {
                    AppError::conflict("This user has already sent you a request; accept it instead")
                }
            });
        }

        // The pair index still guards against a concurrent request.
        let friendship = sqlx::query_as::<_, Friendship>(&format!(
            "INSERT INTO friendships (id, requester_id, addressee_id) VALUES ($1, $2, $3) RETURNING {}",
            FRIENDSHIP_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(target_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::conflict("Friend request already exists"),
            other => other,
        })?;

        tracing::info!(from = %user_id, to = %target_id, "friend request sent");
        Ok(friendship)
    }

    /// Accept a pending request and unlock friend achievements for both sides.
    pub async fn accept_request(&self, user_id: Uuid, friendship_id: Uuid) -> AppResult<Friendship> {
        let today = Utc::now().date_naive();
        let mut tx = self.db.begin().await?;

        let friendship = fetch_friendship(&mut tx, friendship_id).await?;
        ensure_addressee(&friendship, user_id)?;

        let accepted = sqlx::query_as::<_, Friendship>(&format!(
            "UPDATE friendships SET status = 'accepted', responded_at = $2
             WHERE id = $1 AND status = 'pending'
             RETURNING {}",
            FRIENDSHIP_COLUMNS
        ))
        .bind(friendship_id)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::conflict("Friend request was already answered"))?;

        for party in [accepted.requester_id, accepted.addressee_id] {
            unlock_achievements(&mut tx, party, today).await?;
        }
        tx.commit().await?;

        tracing::info!(requester = %accepted.requester_id, addressee = %user_id, "friend request accepted");
        Ok(accepted)
    }

    pub async fn decline_request(&self, user_id: Uuid, friendship_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let friendship = fetch_friendship(&mut tx, friendship_id).await?;
        ensure_addressee(&friendship, user_id)?;

        let result = sqlx::query("DELETE FROM friendships WHERE id = $1 AND status = 'pending'")
            .bind(friendship_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::conflict("Friend request was already answered"));
        }
        tx.commit().await?;
        Ok(())
    }

    /// Remove a friend or withdraw a pending request; either party may do it.
    pub async fn remove(&self, user_id: Uuid, friendship_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let friendship = fetch_friendship(&mut tx, friendship_id).await?;
        if !friendship.involves(user_id) {
            return Err(AppError::not_found("Friend request"));
        }

        sqlx::query("DELETE FROM friendships WHERE id = $1")
            .bind(friendship_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!(user_id = %user_id, other = %friendship.other_party(user_id), "friendship removed");
        Ok(())
    }

    pub async fn list_friends(&self, user_id: Uuid) -> AppResult<Vec<FriendSummary>> {
        let friends = sqlx::query_as::<_, FriendSummary>(&format!(
            "{} WHERE f.status = 'accepted' AND (f.requester_id = $1 OR f.addressee_id = $1)
             ORDER BY u.display_name",
            SUMMARY_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(friends)
    }

    pub async fn pending_requests(&self, user_id: Uuid) -> AppResult<PendingRequests> {
        let incoming = sqlx::query_as::<_, FriendSummary>(&format!(
            "{} WHERE f.status = 'pending' AND f.addressee_id = $1 ORDER BY f.created_at DESC",
            SUMMARY_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let outgoing = sqlx::query_as::<_, FriendSummary>(&format!(
            "{} WHERE f.status = 'pending' AND f.requester_id = $1 ORDER BY f.created_at DESC",
            SUMMARY_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PendingRequests { incoming, outgoing })
    }
}

fn ensure_addressee(friendship: &Friendship, user_id: Uuid) -> AppResult<()> {
    if !friendship.involves(user_id) {
        return Err(AppError::not_found("Friend request"));
    }
    if friendship.addressee_id != user_id {
        return Err(AppError::forbidden("Only the recipient can answer a friend request"));
    }
    if friendship.status != FriendshipStatus::Pending {
        return Err(AppError::conflict("Friend request was already answered"));
    }
    Ok(())
}
