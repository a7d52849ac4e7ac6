use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use nutrarr::api::AppState;
use nutrarr::config::Config;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.server.secure_cookies = false;

    let state = nutrarr::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let app = nutrarr::api::router(state.clone()).await;
    (app, state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn signup(app: &Router, username: &str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/signup")
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from(
            json!({ "username": username, "password": "secret1" }).to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_signup_defaults() {
    let (app, _) = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    let (status, body) = send(&app, "GET", "/api/profile", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "user");
    assert_eq!(body["data"]["dietary_goal"], "maintain");
    assert_eq!(body["data"]["target_calories"], 2000);
    assert!(body["data"]["height_value"].is_null());
}

#[tokio::test]
async fn test_preview_does_not_persist() {
    let (app, _) = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/profile/preview",
        Some(&cookie),
        Some(json!({
            "height_value": 170.0,
            "height_unit": "cm",
            "weight_value": 70.0,
            "weight_unit": "kg",
            "dietary_goal": "maintain",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["preview_target_calories"], 2560);
    assert_eq!(body["data"]["requires_confirmation"], false);

    // Nothing was written
    let (_, body) = send(&app, "GET", "/api/profile", Some(&cookie), None).await;
    assert_eq!(body["data"]["target_calories"], 2000);
    assert!(body["data"]["height_value"].is_null());
}

#[tokio::test]
async fn test_preview_requires_height_and_weight() {
    let (app, _) = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/profile/preview",
        Some(&cookie),
        Some(json!({ "height_value": 170.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide height and weight");
}

#[tokio::test]
async fn test_complete_profile_computes_target() {
    let (app, _) = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    // Missing fields are reported by name
    let (status, body) = send(
        &app,
        "POST",
        "/api/profile/complete",
        Some(&cookie),
        Some(json!({ "height_value": 170.0, "weight_value": 70.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("height_unit"));
    assert!(error.contains("weight_unit"));
    assert!(error.contains("dietary_goal"));

    let (status, body) = send(
        &app,
        "POST",
        "/api/profile/complete",
        Some(&cookie),
        Some(json!({
            "height_value": 170.0,
            "height_unit": "cm",
            "weight_value": 70.0,
            "weight_unit": "kg",
            "dietary_goal": "maintain",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["target_calories"], 2560);
    assert_eq!(body["data"]["profile_complete"], true);

    let (_, body) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(body["data"]["profile_complete"], true);
}

#[tokio::test]
async fn test_complete_profile_validates_units_and_goal() {
    let (app, _) = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/profile/complete",
        Some(&cookie),
        Some(json!({
            "height_value": 170.0,
            "height_unit": "m",
            "weight_value": 70.0,
            "weight_unit": "kg",
            "dietary_goal": "maintain",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "height_unit must be 'cm' or 'in'");

    let (status, body) = send(
        &app,
        "POST",
        "/api/profile/complete",
        Some(&cookie),
        Some(json!({
            "height_value": 170.0,
            "height_unit": "cm",
            "weight_value": 70.0,
            "weight_unit": "kg",
            "dietary_goal": "keto",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid dietary_goal");
}

#[tokio::test]
async fn test_unrealistic_profile_requires_confirmation() {
    let (app, _) = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/profile/complete",
        Some(&cookie),
        Some(json!({
            "height_value": 90.0,
            "height_unit": "cm",
            "weight_value": 70.0,
            "weight_unit": "kg",
            "dietary_goal": "maintain",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["requires_confirmation"], true);
    assert!(body["preview_target_calories"].is_i64());

    // The same payload with the confirmation flag goes through
    let (status, body) = send(
        &app,
        "POST",
        "/api/profile/complete",
        Some(&cookie),
        Some(json!({
            "height_value": 90.0,
            "height_unit": "cm",
            "weight_value": 70.0,
            "weight_unit": "kg",
            "dietary_goal": "maintain",
            "confirm_unrealistic": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // 22*70 + 6*90 = 2080 -> realistic arithmetic still applies
    assert_eq!(body["data"]["target_calories"], 2080);
}

#[tokio::test]
async fn test_update_profile_requires_both_height_and_weight() {
    let (app, _) = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    let (status, _) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&cookie),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Height alone is not enough while the stored profile has no weight
    let (status, body) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&cookie),
        Some(json!({ "height_value": 170.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Please enter both height and weight to update your goal."
    );
}

#[tokio::test]
async fn test_update_profile_recomputes_target() {
    let (app, _) = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    send(
        &app,
        "POST",
        "/api/profile/complete",
        Some(&cookie),
        Some(json!({
            "height_value": 170.0,
            "height_unit": "cm",
            "weight_value": 70.0,
            "weight_unit": "kg",
            "dietary_goal": "maintain",
        })),
    )
    .await;

    // Switching the goal alone re-derives the target from stored values
    let (status, body) = send(
        &app,
        "PUT",
        "/api/profile",
        Some(&cookie),
        Some(json!({ "dietary_goal": "weight_loss" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // 2560 * 0.8 = 2048 -> 2050
    assert_eq!(body["data"]["target_calories"], 2050);
    assert_eq!(body["data"]["height_value"], 170.0);
}

#[tokio::test]
async fn test_audit_written_only_for_actual_changes() {
    let (app, state) = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    let (_, body) = send(&app, "GET", "/api/profile", Some(&cookie), None).await;
    let user_id = i32::try_from(body["data"]["user_id"].as_i64().unwrap()).unwrap();

    send(
        &app,
        "POST",
        "/api/profile/complete",
        Some(&cookie),
        Some(json!({
            "height_value": 170.0,
            "height_unit": "cm",
            "weight_value": 70.0,
            "weight_unit": "kg",
            "dietary_goal": "maintain",
        })),
    )
    .await;
    assert_eq!(state.store().count_profile_changes(user_id).await.unwrap(), 1);

    // Re-submitting identical values changes nothing and writes nothing
    send(
        &app,
        "POST",
        "/api/profile/complete",
        Some(&cookie),
        Some(json!({
            "height_value": 170.0,
            "height_unit": "cm",
            "weight_value": 70.0,
            "weight_unit": "kg",
            "dietary_goal": "maintain",
        })),
    )
    .await;
    assert_eq!(state.store().count_profile_changes(user_id).await.unwrap(), 1);

    // A real change appends exactly one more record
    send(
        &app,
        "PUT",
        "/api/profile",
        Some(&cookie),
        Some(json!({ "weight_value": 72.0 })),
    )
    .await;
    assert_eq!(state.store().count_profile_changes(user_id).await.unwrap(), 2);
}
