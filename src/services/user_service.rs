use sqlx::PgPool;
use uuid::Uuid;

use crate::engines::gamification::LevelProgress;
use crate::errors::{AppError, AppResult};
use crate::models::validation::validate_display_name;
use crate::models::{ProfileResponse, PublicProfile, UpdateProfileRequest, UserProfile};

const PROFILE_COLUMNS: &str = "id, email, display_name, role, bio, height_cm, weight_unit, \
     weekly_target, xp, level, created_at, updated_at";

fn validate_profile_update(request: &UpdateProfileRequest) -> AppResult<()> {
    if let Some(name) = &request.display_name {
        validate_display_name(name)?;
    }
    if let Some(bio) = &request.bio {
        if bio.chars().count() > 500 {
            return Err(AppError::validation("Bio cannot be longer than 500 characters"));
        }
    }
    if let Some(height) = request.height_cm {
        if !(50.0..=272.0).contains(&height) {
            return Err(AppError::validation("Height must be between 50 and 272 cm"));
        }
    }
    if let Some(target) = request.weekly_target {
        if !(1..=14).contains(&target) {
            return Err(AppError::validation("Weekly target must be between 1 and 14 workouts"));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_user(&self, user_id: Uuid) -> AppResult<UserProfile> {
        sqlx::query_as::<_, UserProfile>(&format!("SELECT {} FROM users WHERE id = $1", PROFILE_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<ProfileResponse> {
        let profile = self.get_user(user_id).await?;
        Ok(ProfileResponse {
            level_progress: LevelProgress::from_xp(profile.xp),
            profile,
        })
    }

    pub async fn update_profile(&self, user_id: Uuid, request: UpdateProfileRequest) -> AppResult<ProfileResponse> {
        validate_profile_update(&request)?;

        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "UPDATE users SET
                display_name = COALESCE($2, display_name),
                bio = COALESCE($3, bio),
                height_cm = COALESCE($4, height_cm),
                weight_unit = COALESCE($5, weight_unit),
                weekly_target = COALESCE($6, weekly_target),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(request.display_name.as_deref().map(str::trim))
        .bind(request.bio)
        .bind(request.height_cm)
        .bind(request.weight_unit)
        .bind(request.weekly_target)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

        tracing::debug!(user_id = %user_id, "profile updated");
        Ok(ProfileResponse {
            level_progress: LevelProgress::from_xp(profile.xp),
            profile,
        })
    }

    pub async fn get_public_profile(&self, user_id: Uuid) -> AppResult<PublicProfile> {
        sqlx::query_as::<_, PublicProfile>(
            "SELECT id, display_name, bio, xp, level, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
    }
}
