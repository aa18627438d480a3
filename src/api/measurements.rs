use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Extension, Router,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::errors::AppResult;
use crate::models::{
    BodyMeasurement, CreateMeasurementRequest, MeasurementQuery, MeasurementSummary,
    UpdateMeasurementRequest,
};
use crate::services::MeasurementService;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub days: Option<i64>,
}

pub fn measurement_routes(db: PgPool, auth_service: AuthService) -> Router {
    Router::new()
        .route("/", get(list_measurements).post(create_measurement))
        .route("/summary", get(summary))
        .route(
            "/:measurement_id",
            get(get_measurement).put(update_measurement).delete(delete_measurement),
        )
        .route_layer(middleware::from_fn_with_state(auth_service, jwt_auth_middleware))
        .with_state(MeasurementService::new(db))
}

#[tracing::instrument(skip(service, session, request), fields(user_id = %session.user_id))]
async fn create_measurement(
    State(service): State<MeasurementService>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<CreateMeasurementRequest>,
) -> AppResult<(StatusCode, Json<BodyMeasurement>)> {
    let measurement = service.create_measurement(session.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(measurement)))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn list_measurements(
    State(service): State<MeasurementService>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<MeasurementQuery>,
) -> AppResult<Json<Vec<BodyMeasurement>>> {
    Ok(Json(service.list_measurements(session.user_id, query).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn get_measurement(
    State(service): State<MeasurementService>,
    Extension(session): Extension<UserSession>,
    Path(measurement_id): Path<Uuid>,
) -> AppResult<Json<BodyMeasurement>> {
    Ok(Json(service.get_measurement(session.user_id, measurement_id).await?))
}

#[tracing::instrument(skip(service, session, request), fields(user_id = %session.user_id))]
async fn update_measurement(
    State(service): State<MeasurementService>,
    Extension(session): Extension<UserSession>,
    Path(measurement_id): Path<Uuid>,
    Json(request): Json<UpdateMeasurementRequest>,
) -> AppResult<Json<BodyMeasurement>> {
    Ok(Json(service.update_measurement(session.user_id, measurement_id, request).await?))
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn delete_measurement(
    State(service): State<MeasurementService>,
    Extension(session): Extension<UserSession>,
    Path(measurement_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service.delete_measurement(session.user_id, measurement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(service, session), fields(user_id = %session.user_id))]
async fn summary(
    State(service): State<MeasurementService>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<MeasurementSummary>> {
    let today = Utc::now().date_naive();
    Ok(Json(service.summary(session.user_id, query.days, today).await?))
}
