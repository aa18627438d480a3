//! End-to-end flows against a real database. Skipped unless
//! `TEST_DATABASE_URL` points at a Postgres instance.

mod common;

use axum::http::{Method, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use astral_forge::api::routes::create_routes;
use common::{body_json, request, test_pool, unique_email, TEST_JWT_SECRET};

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request(method, uri, token, body))
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn register(app: &Router, name: &str) -> (String, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({
            "email": unique_email(name),
            "password": "Deadlift225",
            "display_name": name,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

async fn exercise_id(app: &Router, token: &str, search: &str) -> String {
    let (status, body) = call(
        app,
        Method::GET,
        &format!("/api/v1/exercises?search={}", search),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body[0]["id"].as_str().unwrap().to_string()
}

/// Log two working sets of 100x5 on `exercise` and complete the session.
async fn complete_workout(app: &Router, token: &str, exercise: &str) -> Value {
    let (status, workout) = call(
        app,
        Method::POST,
        "/api/v1/workouts",
        Some(token),
        Some(json!({
            "title": "Session",
            "sets": [
                { "exercise_id": exercise, "weight": 100.0, "reps": 5, "rpe": 8.0 },
                { "exercise_id": exercise, "weight": 100.0, "reps": 5, "rpe": 8.0 },
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", workout);

    let uri = format!("/api/v1/workouts/{}/complete", workout["id"].as_str().unwrap());
    let (status, summary) = call(app, Method::POST, &uri, Some(token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", summary);
    summary
}

async fn befriend(app: &Router, from: &str, to: &str, to_id: &str) -> String {
    let (status, friendship) = call(
        app,
        Method::POST,
        "/api/v1/friends/requests",
        Some(from),
        Some(json!({ "user_id": to_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", friendship);
    let id = friendship["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        app,
        Method::POST,
        &format!("/api/v1/friends/requests/{}/accept", id),
        Some(to),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    id
}

async fn unlocked_achievements(app: &Router, token: &str) -> Vec<String> {
    let (status, body) = call(app, Method::GET, "/api/v1/gamification/achievements", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array()
        .unwrap()
        .iter()
        .filter(|a| a["unlocked"] == true)
        .map(|a| a["code"].as_str().unwrap().to_string())
        .collect()
}

async fn get_goal(app: &Router, token: &str, goal_id: &str) -> Value {
    let (status, goal) = call(app, Method::GET, &format!("/api/v1/goals/{}", goal_id), Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    goal
}

async fn duel_xp(pool: &PgPool, user_id: &str, duel_id: Uuid) -> i64 {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0)::bigint FROM xp_events
         WHERE user_id = $1 AND source = 'duel' AND reference_id = $2",
    )
    .bind(Uuid::parse_str(user_id).unwrap())
    .bind(duel_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

fn entry_ids(board: &Value) -> Vec<String> {
    board["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["user_id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_workout_completion_awards_xp_once() {
    let Some(pool) = test_pool().await else {
        println!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let app = create_routes(pool, TEST_JWT_SECRET);

    let (token, _) = register(&app, "lifter").await;
    let squat = exercise_id(&app, &token, "back%20squat").await;

    let (status, workout) = call(
        &app,
        Method::POST,
        "/api/v1/workouts",
        Some(&token),
        Some(json!({
            "title": "Leg day",
            "duration_minutes": 60,
            "session_rpe": 8.0,
            "sets": [
                { "exercise_id": squat, "weight": 60.0, "reps": 5, "is_warmup": true },
                { "exercise_id": squat, "weight": 100.0, "reps": 5, "rpe": 8.0 },
                { "exercise_id": squat, "weight": 100.0, "reps": 5, "rpe": 8.5 },
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", workout);
    assert_eq!(workout["sets"].as_array().unwrap().len(), 3);
    let workout_id = workout["id"].as_str().unwrap().to_string();

    let complete_uri = format!("/api/v1/workouts/{}/complete", workout_id);
    let (status, summary) = call(&app, Method::POST, &complete_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", summary);
    assert_eq!(summary["working_sets"], 2);
    assert_eq!(summary["total_volume"], 1000.0);
    assert!(summary["xp_awarded"].as_i64().unwrap() > 0);
    assert!(summary["achievements_unlocked"]
        .as_array()
        .unwrap()
        .iter()
        .any(|code| code == "first_workout"));

    let (status, _) = call(&app, Method::POST, &complete_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Completed sessions are locked.
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/workouts/{}/sets", workout_id),
        Some(&token),
        Some(json!({ "exercise_id": squat, "weight": 100.0, "reps": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, progress) = call(&app, Method::GET, "/api/v1/gamification/progress", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["xp"], summary["total_xp"]);
    assert_eq!(progress["stats"]["total_workouts"], 1);
}

#[tokio::test]
async fn test_friends_then_duel() {
    let Some(pool) = test_pool().await else {
        println!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let app = create_routes(pool, TEST_JWT_SECRET);

    let (alice, _) = register(&app, "alice").await;
    let (bob, bob_id) = register(&app, "bob").await;

    // Not friends yet.
    let duel_body = json!({ "opponent_id": bob_id, "metric": "workouts", "duration_days": 7 });
    let (status, _) = call(&app, Method::POST, "/api/v1/duels", Some(&alice), Some(duel_body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, friendship) = call(
        &app,
        Method::POST,
        "/api/v1/friends/requests",
        Some(&alice),
        Some(json!({ "user_id": bob_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", friendship);
    let friendship_id = friendship["id"].as_str().unwrap();

    // Only the addressee may accept.
    let accept_uri = format!("/api/v1/friends/requests/{}/accept", friendship_id);
    let (status, _) = call(&app, Method::POST, &accept_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&app, Method::POST, &accept_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, duel) = call(&app, Method::POST, "/api/v1/duels", Some(&alice), Some(duel_body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", duel);
    assert_eq!(duel["status"], "pending");
    let duel_id = duel["id"].as_str().unwrap();

    let (status, accepted) = call(
        &app,
        Method::POST,
        &format!("/api/v1/duels/{}/accept", duel_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "active");
    assert!(accepted["ends_at"].is_string());

    // Too early to resolve.
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/duels/{}/resolve", duel_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_bodyweight_goal_follows_latest_weigh_in() {
    let Some(pool) = test_pool().await else {
        println!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let app = create_routes(pool, TEST_JWT_SECRET);
    let (token, _) = register(&app, "cutter").await;
    let today = Utc::now().date_naive();
    let goal_body = json!({ "title": "Cut to 80", "kind": "bodyweight", "target_value": 80.0 });

    // No weigh-in and no current value: nothing to measure from.
    let (status, _) = call(&app, Method::POST, "/api/v1/goals", Some(&token), Some(goal_body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/measurements",
        Some(&token),
        Some(json!({ "measured_on": (today - Duration::days(10)).to_string(), "bodyweight": 90.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, goal) = call(&app, Method::POST, "/api/v1/goals", Some(&token), Some(goal_body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", goal);
    assert_eq!(goal["start_value"], 90.0);
    assert_eq!(goal["status"], "active");
    let goal_id = goal["id"].as_str().unwrap().to_string();

    // Heavier than the start: a cut is not finished by gaining weight.
    let (status, heavier) = call(
        &app,
        Method::POST,
        "/api/v1/measurements",
        Some(&token),
        Some(json!({ "measured_on": (today - Duration::days(5)).to_string(), "bodyweight": 92.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let goal = get_goal(&app, &token, &goal_id).await;
    assert_eq!(goal["status"], "active");
    assert_eq!(goal["current_value"], 92.0);

    // A backdated weigh-in does not replace the latest one.
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/measurements",
        Some(&token),
        Some(json!({ "measured_on": (today - Duration::days(20)).to_string(), "bodyweight": 79.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let goal = get_goal(&app, &token, &goal_id).await;
    assert_eq!(goal["status"], "active");
    assert_eq!(goal["current_value"], 92.0);

    // Correcting the latest weigh-in resyncs the goal.
    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/v1/measurements/{}", heavier["id"].as_str().unwrap()),
        Some(&token),
        Some(json!({ "bodyweight": 79.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let goal = get_goal(&app, &token, &goal_id).await;
    assert_eq!(goal["status"], "completed");
    assert_eq!(goal["current_value"], 79.5);
    assert_eq!(goal["progress_percentage"], 100.0);
}

#[tokio::test]
async fn test_weekly_goals_complete_with_workouts() {
    let Some(pool) = test_pool().await else {
        println!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let app = create_routes(pool, TEST_JWT_SECRET);
    let (token, _) = register(&app, "regular").await;
    let squat = exercise_id(&app, &token, "back%20squat").await;

    let mut goals = Vec::new();
    for body in [
        json!({ "title": "Train once", "kind": "frequency", "target_value": 1.0 }),
        json!({ "title": "Move 500kg", "kind": "volume", "target_value": 500.0 }),
        json!({ "title": "Move 5t", "kind": "volume", "target_value": 5000.0 }),
    ] {
        let (status, goal) = call(&app, Method::POST, "/api/v1/goals", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", goal);
        assert_eq!(goal["status"], "active");
        goals.push(goal["id"].as_str().unwrap().to_string());
    }

    complete_workout(&app, &token, &squat).await;

    let frequency = get_goal(&app, &token, &goals[0]).await;
    assert_eq!(frequency["status"], "completed");
    assert_eq!(frequency["current_value"], 1.0);

    let small = get_goal(&app, &token, &goals[1]).await;
    assert_eq!(small["status"], "completed");

    let big = get_goal(&app, &token, &goals[2]).await;
    assert_eq!(big["status"], "active");
    assert_eq!(big["current_value"], 1000.0);
    assert_eq!(big["progress_percentage"], 20.0);
}

#[tokio::test]
async fn test_guild_leave_kick_and_disband() {
    let Some(pool) = test_pool().await else {
        println!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let app = create_routes(pool, TEST_JWT_SECRET);
    let (owner, _) = register(&app, "owner").await;
    let (member, member_id) = register(&app, "member").await;

    let name = format!("Iron {}", &Uuid::new_v4().simple().to_string()[..8]);
    let (status, guild) = call(&app, Method::POST, "/api/v1/guilds", Some(&owner), Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", guild);
    let guild_uri = format!("/api/v1/guilds/{}", guild["id"].as_str().unwrap());

    let (status, detail) = call(&app, Method::POST, &format!("{}/join", guild_uri), Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["members"].as_array().unwrap().len(), 2);

    // The owner cannot walk out on other members.
    let (status, _) = call(&app, Method::POST, &format!("{}/leave", guild_uri), Some(&owner), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Members cannot kick.
    let kick_uri = format!("{}/members/{}", guild_uri, member_id);
    let (status, _) = call(&app, Method::DELETE, &kick_uri, Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::DELETE, &kick_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::DELETE, &kick_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::POST, &format!("{}/join", guild_uri), Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, left) = call(&app, Method::POST, &format!("{}/leave", guild_uri), Some(&member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(left["outcome"], "left");

    let (status, left) = call(&app, Method::POST, &format!("{}/leave", guild_uri), Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(left["outcome"], "disbanded");

    let (status, _) = call(&app, Method::GET, &guild_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_social_actions_unlock_achievements() {
    let Some(pool) = test_pool().await else {
        println!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let app = create_routes(pool, TEST_JWT_SECRET);
    let (alice, _) = register(&app, "alice").await;
    let (bob, bob_id) = register(&app, "bob").await;

    let friendship_id = befriend(&app, &alice, &bob, &bob_id).await;
    assert!(unlocked_achievements(&app, &alice).await.contains(&"first_friend".to_string()));
    assert!(unlocked_achievements(&app, &bob).await.contains(&"first_friend".to_string()));

    // An accepted request cannot be declined afterwards.
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/friends/requests/{}/decline", friendship_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let name = format!("Chalk {}", &Uuid::new_v4().simple().to_string()[..8]);
    let (status, guild) = call(&app, Method::POST, "/api/v1/guilds", Some(&alice), Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(unlocked_achievements(&app, &alice).await.contains(&"guild_member".to_string()));

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/guilds/{}/join", guild["id"].as_str().unwrap()),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(unlocked_achievements(&app, &bob).await.contains(&"guild_member".to_string()));
}

#[tokio::test]
async fn test_duel_resolution_pays_the_winner() {
    let Some(pool) = test_pool().await else {
        println!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let app = create_routes(pool.clone(), TEST_JWT_SECRET);
    let (alice, alice_id) = register(&app, "alice").await;
    let (bob, bob_id) = register(&app, "bob").await;
    befriend(&app, &alice, &bob, &bob_id).await;

    let (status, duel) = call(
        &app,
        Method::POST,
        "/api/v1/duels",
        Some(&alice),
        Some(json!({ "opponent_id": bob_id, "metric": "volume", "duration_days": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", duel);
    let duel_id = duel["id"].as_str().unwrap().to_string();
    let (status, _) = call(&app, Method::POST, &format!("/api/v1/duels/{}/accept", duel_id), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);

    let squat = exercise_id(&app, &alice, "back%20squat").await;
    complete_workout(&app, &alice, &squat).await;

    // Close the window now rather than waiting a day.
    let duel_uuid = Uuid::parse_str(&duel_id).unwrap();
    sqlx::query("UPDATE duels SET ends_at = NOW() WHERE id = $1")
        .bind(duel_uuid)
        .execute(&pool)
        .await
        .unwrap();

    let resolve_uri = format!("/api/v1/duels/{}/resolve", duel_id);
    let (status, resolved) = call(&app, Method::POST, &resolve_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK, "{}", resolved);
    assert_eq!(resolved["status"], "completed");
    assert_eq!(resolved["winner_id"], alice_id);
    assert_eq!(resolved["challenger_score"], 1000.0);
    assert_eq!(resolved["opponent_score"], 0.0);

    assert_eq!(duel_xp(&pool, &alice_id, duel_uuid).await, 150);
    assert_eq!(duel_xp(&pool, &bob_id, duel_uuid).await, 0);
    assert!(unlocked_achievements(&app, &alice).await.contains(&"first_duel_win".to_string()));

    let (status, _) = call(&app, Method::POST, &resolve_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_quest_claimed_once_per_period() {
    let Some(pool) = test_pool().await else {
        println!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let app = create_routes(pool, TEST_JWT_SECRET);
    let (token, _) = register(&app, "quester").await;

    let claim_uri = "/api/v1/gamification/quests/daily_workout/claim";
    let (status, _) = call(&app, Method::POST, claim_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let squat = exercise_id(&app, &token, "back%20squat").await;
    complete_workout(&app, &token, &squat).await;

    let (status, claim) = call(&app, Method::POST, claim_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", claim);
    assert!(claim["xp_awarded"].as_i64().unwrap() > 0);

    let (status, _) = call(&app, Method::POST, claim_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_leaderboard_friend_and_guild_scopes() {
    let Some(pool) = test_pool().await else {
        println!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let app = create_routes(pool, TEST_JWT_SECRET);
    let (alice, alice_id) = register(&app, "alice").await;
    let (bob, bob_id) = register(&app, "bob").await;
    let (carol, carol_id) = register(&app, "carol").await;
    befriend(&app, &alice, &bob, &bob_id).await;

    let squat = exercise_id(&app, &alice, "back%20squat").await;
    complete_workout(&app, &bob, &squat).await;

    let (status, board) = call(
        &app,
        Method::GET,
        "/api/v1/leaderboards?metric=volume&period=all_time&scope=friends",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", board);
    assert_eq!(entry_ids(&board), vec![bob_id.clone(), alice_id.clone()]);
    assert_eq!(board["entries"][0]["rank"], 1);
    assert_eq!(board["entries"][0]["score"], 1000.0);

    // No guild yet.
    let guild_board = "/api/v1/leaderboards?metric=workouts&period=all_time&scope=guild";
    let (status, _) = call(&app, Method::GET, guild_board, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let name = format!("Plates {}", &Uuid::new_v4().simple().to_string()[..8]);
    let (status, guild) = call(&app, Method::POST, "/api/v1/guilds", Some(&alice), Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/v1/guilds/{}/join", guild["id"].as_str().unwrap()),
        Some(&carol),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, board) = call(&app, Method::GET, guild_board, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let mut ids = entry_ids(&board);
    ids.sort();
    let mut expected = vec![alice_id, carol_id];
    expected.sort();
    assert_eq!(ids, expected);
    assert!(!entry_ids(&board).contains(&bob_id));
}

#[tokio::test]
async fn test_refresh_and_logout() {
    let Some(pool) = test_pool().await else {
        println!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let app = create_routes(pool, TEST_JWT_SECRET);

    let (status, auth) = call(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({
            "email": unique_email("sleeper"),
            "password": "Deadlift225",
            "display_name": "sleeper",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let refresh_token = auth["refresh_token"].as_str().unwrap().to_string();

    let (status, refreshed) = call(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", refreshed);
    let access = refreshed["access_token"].as_str().unwrap().to_string();

    // An access token is not a refresh token.
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/v1/users/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, Method::POST, "/api/v1/auth/logout", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);

    // The token is blacklisted and the refresh token revoked.
    let (status, _) = call(&app, Method::GET, "/api/v1/users/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
