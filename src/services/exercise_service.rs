use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::validation::{like_pattern, pagination, validate_title};
use crate::models::{CreateExerciseRequest, Exercise, ExerciseQuery, UpdateExerciseRequest};

const EXERCISE_COLUMNS: &str = "id, name, muscle_group, equipment, is_compound, description, created_at";

#[derive(Clone)]
pub struct ExerciseService {
    db: PgPool,
}

impl ExerciseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_exercises(&self, query: ExerciseQuery) -> AppResult<Vec<Exercise>> {
        let (limit, offset) = pagination(query.limit, query.offset);
        let search = like_pattern(query.search.as_deref());

        let exercises = sqlx::query_as::<_, Exercise>(&format!(
            "SELECT {} FROM exercises
             WHERE ($1::muscle_group IS NULL OR muscle_group = $1)
               AND ($2::equipment IS NULL OR equipment = $2)
               AND ($3::text IS NULL OR name ILIKE $3)
             ORDER BY name
             LIMIT $4 OFFSET $5",
            EXERCISE_COLUMNS
        ))
        .bind(query.muscle_group)
        .bind(query.equipment)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(exercises)
    }

    pub async fn get_exercise(&self, exercise_id: Uuid) -> AppResult<Exercise> {
        sqlx::query_as::<_, Exercise>(&format!("SELECT {} FROM exercises WHERE id = $1", EXERCISE_COLUMNS))
            .bind(exercise_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Exercise"))
    }

    pub async fn create_exercise(&self, request: CreateExerciseRequest) -> AppResult<Exercise> {
        validate_title(&request.name, "Exercise name", 80)?;

        let exercise = sqlx::query_as::<_, Exercise>(&format!(
            "INSERT INTO exercises (id, name, muscle_group, equipment, is_compound, description)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            EXERCISE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(request.muscle_group)
        .bind(request.equipment)
        .bind(request.is_compound)
        .bind(request.description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::conflict("An exercise with that name already exists"),
            other => other,
        })?;

        tracing::info!(exercise_id = %exercise.id, name = %exercise.name, "exercise created");
        Ok(exercise)
    }

    pub async fn update_exercise(&self, exercise_id: Uuid, request: UpdateExerciseRequest) -> AppResult<Exercise> {
        if let Some(name) = &request.name {
            validate_title(name, "Exercise name", 80)?;
        }

        sqlx::query_as::<_, Exercise>(&format!(
            "UPDATE exercises SET
                name = COALESCE($2, name),
                muscle_group = COALESCE($3, muscle_group),
                equipment = COALESCE($4, equipment),
                is_compound = COALESCE($5, is_compound),
                description = COALESCE($6, description)
             WHERE id = $1
             RETURNING {}",
            EXERCISE_COLUMNS
        ))
        .bind(exercise_id)
        .bind(request.name.as_deref().map(str::trim))
        .bind(request.muscle_group)
        .bind(request.equipment)
        .bind(request.is_compound)
        .bind(request.description)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::conflict("An exercise with that name already exists"),
            other => other,
        })?
        .ok_or_else(|| AppError::not_found("Exercise"))
    }

    /// Exercises referenced by logged sets cannot be removed.
    pub async fn delete_exercise(&self, exercise_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(exercise_id)
            .execute(&self.db)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Validation(_) => AppError::conflict("Exercise is referenced by logged sets"),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Exercise"));
        }
        tracing::info!(exercise_id = %exercise_id, "exercise deleted");
        Ok(())
    }
}
