mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use common::{body_json, offline_app, request};

#[tokio::test]
async fn test_health_check_endpoint() {
    let response = offline_app()
        .oneshot(request(Method::GET, "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "astral-forge");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    for uri in [
        "/api/v1/users/me",
        "/api/v1/exercises",
        "/api/v1/workouts",
        "/api/v1/measurements",
        "/api/v1/goals",
        "/api/v1/friends",
        "/api/v1/guilds",
        "/api/v1/leaderboards",
        "/api/v1/duels",
        "/api/v1/gamification/progress",
        "/api/v1/analytics/fatigue",
    ] {
        let response = offline_app()
            .oneshot(request(Method::GET, uri, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn test_malformed_token_is_rejected() {
    let response = offline_app()
        .oneshot(request(Method::GET, "/api/v1/workouts", Some("not-a-jwt"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/v1/workouts")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let response = offline_app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rpe_tool() {
    let response = offline_app()
        .oneshot(request(Method::GET, "/api/v1/tools/rpe?rpe=8&reps=5", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["rir"], 2.0);
    assert_eq!(body["max_reps"], 7);
}

#[tokio::test]
async fn test_rpe_tool_rejects_out_of_range() {
    let response = offline_app()
        .oneshot(request(Method::GET, "/api/v1/tools/rpe?rpe=11", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_rpe_tool_rejects_off_half_step() {
    let response = offline_app()
        .oneshot(request(Method::GET, "/api/v1/tools/rpe?rpe=6.7&reps=5", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_one_rm_tool() {
    let response = offline_app()
        .oneshot(request(Method::GET, "/api/v1/tools/one-rm?weight=100&reps=1", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["estimated_one_rm"], 100.0);
    assert_eq!(body["rep_maxes"][0]["reps"], 1);
    assert_eq!(body["rep_maxes"][0]["weight"], 100.0);
}

#[tokio::test]
async fn test_adjust_load_tool() {
    let response = offline_app()
        .oneshot(request(
            Method::POST,
            "/api/v1/tools/adjust-load",
            None,
            Some(json!({ "planned_weight": 100.0, "target_rpe": 8.0, "actual_rpe": 9.0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["adjusted_weight"], 95.0);
}

#[tokio::test]
async fn test_adjust_load_rejects_bad_rpe() {
    let response = offline_app()
        .oneshot(request(
            Method::POST,
            "/api/v1/tools/adjust-load",
            None,
            Some(json!({ "planned_weight": 100.0, "target_rpe": 8.0, "actual_rpe": 0.0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = offline_app()
        .oneshot(request(Method::GET, "/api/v1/nope", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
