use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Equipment, MuscleGroup};

/// Built-in exercise catalog: name, muscle group, equipment, compound
pub const DEFAULT_EXERCISES: &[(&str, MuscleGroup, Equipment, bool)] = &[
    ("Back Squat", MuscleGroup::Quadriceps, Equipment::Barbell, true),
    ("Front Squat", MuscleGroup::Quadriceps, Equipment::Barbell, true),
    ("Deadlift", MuscleGroup::Back, Equipment::Barbell, true),
    ("Romanian Deadlift", MuscleGroup::Hamstrings, Equipment::Barbell, true),
    ("Bench Press", MuscleGroup::Chest, Equipment::Barbell, true),
    ("Incline Dumbbell Press", MuscleGroup::Chest, Equipment::Dumbbell, true),
    ("Overhead Press", MuscleGroup::Shoulders, Equipment::Barbell, true),
    ("Barbell Row", MuscleGroup::Back, Equipment::Barbell, true),
    ("Pull-up", MuscleGroup::Back, Equipment::Bodyweight, true),
    ("Dip", MuscleGroup::Triceps, Equipment::Bodyweight, true),
    ("Hip Thrust", MuscleGroup::Glutes, Equipment::Barbell, true),
    ("Leg Press", MuscleGroup::Quadriceps, Equipment::Machine, true),
    ("Lat Pulldown", MuscleGroup::Back, Equipment::Cable, true),
    ("Kettlebell Swing", MuscleGroup::FullBody, Equipment::Kettlebell, true),
    ("Lateral Raise", MuscleGroup::Shoulders, Equipment::Dumbbell, false),
    ("Dumbbell Curl", MuscleGroup::Biceps, Equipment::Dumbbell, false),
    ("Triceps Pushdown", MuscleGroup::Triceps, Equipment::Cable, false),
    ("Leg Curl", MuscleGroup::Hamstrings, Equipment::Machine, false),
    ("Leg Extension", MuscleGroup::Quadriceps, Equipment::Machine, false),
    ("Standing Calf Raise", MuscleGroup::Calves, Equipment::Machine, false),
    ("Plank", MuscleGroup::Core, Equipment::Bodyweight, false),
];

pub struct DatabaseSeeder {
    pool: PgPool,
}

impl DatabaseSeeder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn seed_all(&self) -> Result<()> {
        tracing::info!("Starting database seeding...");
        let inserted = self.seed_exercises().await?;
        tracing::info!(inserted, "Database seeding completed");
        Ok(())
    }

    /// Insert missing catalog entries; existing names are left untouched.
    pub async fn seed_exercises(&self) -> Result<u64> {
        let mut inserted = 0;
        for (name, muscle_group, equipment, compound) in DEFAULT_EXERCISES {
            let result = sqlx::query(
                "INSERT INTO exercises (id, name, muscle_group, equipment, is_compound)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (name) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(*name)
            .bind(*muscle_group)
            .bind(*equipment)
            .bind(*compound)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_names_are_unique() {
        let names: HashSet<_> = DEFAULT_EXERCISES.iter().map(|(name, ..)| *name).collect();
        assert_eq!(names.len(), DEFAULT_EXERCISES.len());
    }
}
