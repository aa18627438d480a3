use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::validation::{pagination, validate_positive};
use crate::models::{
    BodyMeasurement, CreateMeasurementRequest, MeasurementQuery, MeasurementSummary,
    UpdateMeasurementRequest, WeightUnit,
};
use crate::services::goal_service::sync_bodyweight_goals;

const MEASUREMENT_COLUMNS: &str = "id, user_id, measured_on, bodyweight, body_fat_pct, waist_cm, \
     chest_cm, arm_cm, thigh_cm, notes, created_at";
pub const MOVING_AVERAGE_ENTRIES: usize = 7;
pub const DEFAULT_SUMMARY_DAYS: i64 = 30;
const KG_PER_LB: f64 = 0.453_592_37;

struct Metrics {
    bodyweight: Option<f64>,
    body_fat_pct: Option<f64>,
    waist_cm: Option<f64>,
    chest_cm: Option<f64>,
    arm_cm: Option<f64>,
    thigh_cm: Option<f64>,
}

fn validate_metrics(metrics: &Metrics) -> AppResult<()> {
    let values = [
        ("Bodyweight", metrics.bodyweight),
        ("Waist", metrics.waist_cm),
        ("Chest", metrics.chest_cm),
        ("Arm", metrics.arm_cm),
        ("Thigh", metrics.thigh_cm),
    ];
    for (name, value) in values {
        if let Some(v) = value {
            validate_positive(v, name)?;
        }
    }
    if let Some(fat) = metrics.body_fat_pct {
        if !(1.0..=75.0).contains(&fat) {
            return Err(AppError::validation("Body fat must be between 1 and 75 percent"));
        }
    }
    Ok(())
}

/// Difference between the last and first recorded values of one metric.
fn change<F>(entries: &[BodyMeasurement], field: F) -> Option<f64>
where
    F: Fn(&BodyMeasurement) -> Option<f64>,
{
    let mut values = entries.iter().filter_map(&field);
    let first = values.next()?;
    let last = values.last()?;
    Some(last - first)
}

pub fn bmi(bodyweight: f64, unit: WeightUnit, height_cm: f64) -> Option<f64> {
    if height_cm <= 0.0 || bodyweight <= 0.0 {
        return None;
    }
    let kg = match unit {
        WeightUnit::Kg => bodyweight,
        WeightUnit::Lb => bodyweight * KG_PER_LB,
    };
    let meters = height_cm / 100.0;
    Some(kg / (meters * meters))
}

/// Summarise measurements sorted oldest first.
pub fn summarize(entries: Vec<BodyMeasurement>, height_cm: Option<f64>, unit: WeightUnit) -> MeasurementSummary {
    let weights: Vec<f64> = entries.iter().filter_map(|m| m.bodyweight).collect();
    let recent = &weights[weights.len().saturating_sub(MOVING_AVERAGE_ENTRIES)..];
    let moving_average = if recent.is_empty() {
        None
    } else {
        Some(recent.iter().sum::<f64>() / recent.len() as f64)
    };

    let latest_weight = weights.last().copied();
    let bmi = match (latest_weight, height_cm) {
        (Some(weight), Some(height)) => bmi(weight, unit, height),
        _ => None,
    };

    MeasurementSummary {
        bodyweight_change: change(&entries, |m| m.bodyweight),
        body_fat_change: change(&entries, |m| m.body_fat_pct),
        waist_change: change(&entries, |m| m.waist_cm),
        bodyweight_moving_average: moving_average,
        bmi,
        entries: entries.len(),
        latest: entries.last().cloned(),
    }
}

#[derive(sqlx::FromRow)]
struct BodyInfo {
    height_cm: Option<f64>,
    weight_unit: WeightUnit,
}

#[derive(Clone)]
pub struct MeasurementService {
    db: PgPool,
}

impl MeasurementService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_measurement(
        &self,
        user_id: Uuid,
        request: CreateMeasurementRequest,
    ) -> AppResult<BodyMeasurement> {
        let metrics = Metrics {
            bodyweight: request.bodyweight,
            body_fat_pct: request.body_fat_pct,
            waist_cm: request.waist_cm,
            chest_cm: request.chest_cm,
            arm_cm: request.arm_cm,
            thigh_cm: request.thigh_cm,
        };
        validate_metrics(&metrics)?;
        if [
            metrics.bodyweight,
            metrics.body_fat_pct,
            metrics.waist_cm,
            metrics.chest_cm,
            metrics.arm_cm,
            metrics.thigh_cm,
        ]
        .iter()
        .all(Option::is_none)
        {
            return Err(AppError::validation("Record at least one measurement"));
        }

        let mut tx = self.db.begin().await?;
        let measurement = sqlx::query_as::<_, BodyMeasurement>(&format!(
            "INSERT INTO body_measurements
                (id, user_id, measured_on, bodyweight, body_fat_pct, waist_cm, chest_cm, arm_cm, thigh_cm, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {}",
            MEASUREMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.measured_on.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(metrics.bodyweight)
        .bind(metrics.body_fat_pct)
        .bind(metrics.waist_cm)
        .bind(metrics.chest_cm)
        .bind(metrics.arm_cm)
        .bind(metrics.thigh_cm)
        .bind(request.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::conflict("A measurement already exists for that date"),
            other => other,
        })?;

        if measurement.bodyweight.is_some() {
            sync_bodyweight_goals(&mut tx, user_id).await?;
        }
        tx.commit().await?;

        Ok(measurement)
    }

    pub async fn list_measurements(&self, user_id: Uuid, query: MeasurementQuery) -> AppResult<Vec<BodyMeasurement>> {
        let (limit, offset) = pagination(query.limit, query.offset);
        let rows = sqlx::query_as::<_, BodyMeasurement>(&format!(
            "SELECT {} FROM body_measurements
             WHERE user_id = $1
               AND ($2::date IS NULL OR measured_on >= $2)
               AND ($3::date IS NULL OR measured_on <= $3)
             ORDER BY measured_on DESC
             LIMIT $4 OFFSET $5",
            MEASUREMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(query.from)
        .bind(query.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    pub async fn get_measurement(&self, user_id: Uuid, measurement_id: Uuid) -> AppResult<BodyMeasurement> {
        sqlx::query_as::<_, BodyMeasurement>(&format!(
            "SELECT {} FROM body_measurements WHERE id = $1 AND user_id = $2",
            MEASUREMENT_COLUMNS
        ))
        .bind(measurement_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Measurement"))
    }

    pub async fn update_measurement(
        &self,
        user_id: Uuid,
        measurement_id: Uuid,
        request: UpdateMeasurementRequest,
    ) -> AppResult<BodyMeasurement> {
        validate_metrics(&Metrics {
            bodyweight: request.bodyweight,
            body_fat_pct: request.body_fat_pct,
            waist_cm: request.waist_cm,
            chest_cm: request.chest_cm,
            arm_cm: request.arm_cm,
            thigh_cm: request.thigh_cm,
        })?;

        let mut tx = self.db.begin().await?;
        let measurement = sqlx::query_as::<_, BodyMeasurement>(&format!(
            "UPDATE body_measurements SET
                bodyweight = COALESCE($3, bodyweight),
                body_fat_pct = COALESCE($4, body_fat_pct),
                waist_cm = COALESCE($5, waist_cm),
                chest_cm = COALESCE($6, chest_cm),
                arm_cm = COALESCE($7, arm_cm),
                thigh_cm = COALESCE($8, thigh_cm),
                notes = COALESCE($9, notes)
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            MEASUREMENT_COLUMNS
        ))
        .bind(measurement_id)
        .bind(user_id)
        .bind(request.bodyweight)
        .bind(request.body_fat_pct)
        .bind(request.waist_cm)
        .bind(request.chest_cm)
        .bind(request.arm_cm)
        .bind(request.thigh_cm)
        .bind(request.notes)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Measurement"))?;

        if request.bodyweight.is_some() {
            sync_bodyweight_goals(&mut tx, user_id).await?;
        }
        tx.commit().await?;

        Ok(measurement)
    }

    pub async fn delete_measurement(&self, user_id: Uuid, measurement_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let result = sqlx::query("DELETE FROM body_measurements WHERE id = $1 AND user_id = $2")
            .bind(measurement_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Measurement"));
        }
        sync_bodyweight_goals(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn summary(&self, user_id: Uuid, days: Option<i64>, today: NaiveDate) -> AppResult<MeasurementSummary> {
        let days = days.unwrap_or(DEFAULT_SUMMARY_DAYS).clamp(1, 3650);
        let since = today - Duration::days(days - 1);

        let info = sqlx::query_as::<_, BodyInfo>("SELECT height_cm, weight_unit FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let entries = sqlx::query_as::<_, BodyMeasurement>(&format!(
            "SELECT {} FROM body_measurements
             WHERE user_id = $1 AND measured_on BETWEEN $2 AND $3
             ORDER BY measured_on",
            MEASUREMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(since)
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        Ok(summarize(entries, info.height_cm, info.weight_unit))
    }
}
