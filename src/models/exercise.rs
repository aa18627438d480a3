use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Type)]
#[sqlx(type_name = "muscle_group", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Quadriceps,
    Hamstrings,
    Glutes,
    Calves,
    Core,
    FullBody,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "equipment", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Barbell,
    Dumbbell,
    Machine,
    Cable,
    Kettlebell,
    Bodyweight,
    Other,
}

impl Equipment {
    /// Smallest practical load jump for this kind of equipment, in kg.
    pub fn default_increment(&self) -> f64 {
        match self {
            Equipment::Barbell => 2.5,
            Equipment::Dumbbell => 2.0,
            Equipment::Machine | Equipment::Cable => 5.0,
            Equipment::Kettlebell => 4.0,
            Equipment::Bodyweight => 0.0,
            Equipment::Other => 2.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub muscle_group: MuscleGroup,
    pub equipment: Equipment,
    pub is_compound: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExerciseRequest {
    pub name: String,
    pub muscle_group: MuscleGroup,
    pub equipment: Equipment,
    #[serde(default)]
    pub is_compound: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateExerciseRequest {
    pub name: Option<String>,
    pub muscle_group: Option<MuscleGroup>,
    pub equipment: Option<Equipment>,
    pub is_compound: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExerciseQuery {
    pub muscle_group: Option<MuscleGroup>,
    pub equipment: Option<Equipment>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
