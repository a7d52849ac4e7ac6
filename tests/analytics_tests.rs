use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use nutrarr::config::Config;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.server.secure_cookies = false;

    let state = nutrarr::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    nutrarr::api::router(state).await
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

async fn authenticate(app: &Router, uri: &str, username: &str, password: &str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from(
            json!({ "username": username, "password": password }).to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_success());

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

async fn signup(app: &Router, username: &str) -> String {
    authenticate(app, "/api/auth/signup", username, "secret1").await
}

async fn create_food(app: &Router, cookie: &str, name: &str, calories: f64, density: f64) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/foods",
        Some(cookie),
        Some(json!({
            "food_name": name,
            "calories": calories,
            "protein": 10.0,
            "carbs": 20.0,
            "fat": 4.0,
            "fiber": 3.0,
            "sugars": 2.0,
            "nutrition_density": density,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["food_id"].as_i64().unwrap()
}

async fn log_entry(app: &Router, cookie: &str, food_id: i64, meal_type: &str) {
    let date = chrono::Utc::now().date_naive().to_string();
    let (status, _) = send(
        app,
        "POST",
        "/api/consumption",
        Some(cookie),
        Some(json!({ "food_id": food_id, "date": date, "meal_type": meal_type })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_top_foods_ordered_by_density() {
    let app = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    create_food(&app, &cookie, "Lentils", 230.0, 91.0).await;
    create_food(&app, &cookie, "Candy", 390.0, 5.0).await;
    create_food(&app, &cookie, "Spinach", 23.0, 97.0).await;

    let (status, body) = send(&app, "GET", "/api/analytics/top-foods", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["food_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Spinach", "Lentils", "Candy"]);

    let (_, body) = send(
        &app,
        "GET",
        "/api/analytics/top-foods?limit=1",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_food_nutrition_ordered_by_name() {
    let app = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    create_food(&app, &cookie, "Lentils", 230.0, 91.0).await;
    create_food(&app, &cookie, "Candy", 390.0, 5.0).await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/analytics/food-nutrition",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["food_name"], "Candy");
    assert_eq!(body["data"][0]["avg_calories"], 390.0);
    assert_eq!(body["data"][1]["food_name"], "Lentils");

    let (_, body) = send(
        &app,
        "GET",
        "/api/analytics/food-nutrition?limit=1&offset=1",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["food_name"], "Lentils");
}

#[tokio::test]
async fn test_overall_health_score_404_without_entries() {
    let app = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    let (_, me) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    let user_id = me["data"]["user_id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/analytics/overall-health-score/{user_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let food_id = create_food(&app, &cookie, "Lentils", 230.0, 91.0).await;
    log_entry(&app, &cookie, food_id, "lunch").await;
    log_entry(&app, &cookie, food_id, "dinner").await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/analytics/overall-health-score/{user_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["entries_count"], 2);
    assert_eq!(body["data"]["days_tracked"], 1);
    assert!(body["data"]["overall_health_score"].is_number());
}

#[tokio::test]
async fn test_user_progress_window() {
    let app = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    let food_id = create_food(&app, &cookie, "Lentils", 230.0, 91.0).await;
    log_entry(&app, &cookie, food_id, "lunch").await;
    log_entry(&app, &cookie, food_id, "dinner").await;

    let (_, me) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    let user_id = me["data"]["user_id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/analytics/user-progress/{user_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["meals_count"], 2);
    assert_eq!(rows[0]["total_calories"], 460.0);
    // Fresh signup target is 2000
    assert_eq!(rows[0]["target_calories"], 2000);
    assert_eq!(rows[0]["calorie_difference"], -1540.0);
}

#[tokio::test]
async fn test_daily_health_score_groups_by_date() {
    let app = spawn_app().await;
    let cookie = signup(&app, "alice").await;

    let food_id = create_food(&app, &cookie, "Lentils", 230.0, 91.0).await;
    log_entry(&app, &cookie, food_id, "lunch").await;
    log_entry(&app, &cookie, food_id, "dinner").await;

    let (_, me) = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    let user_id = me["data"]["user_id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/analytics/daily-health-score/{user_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["entries_count"], 2);
}

#[tokio::test]
async fn test_meal_distribution() {
    let app = spawn_app().await;
    let cookie = signup(&app, "alice").await;
    let admin = authenticate(&app, "/api/auth/login", "admin", "admin123").await;

    let food_id = create_food(&app, &cookie, "Lentils", 230.0, 91.0).await;
    log_entry(&app, &cookie, food_id, "breakfast").await;
    log_entry(&app, &cookie, food_id, "breakfast").await;
    log_entry(&app, &cookie, food_id, "lunch").await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/analytics/meal-distribution",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["meal_type"], "breakfast");
    assert_eq!(rows[0]["count"], 2);
    assert_eq!(rows[1]["meal_type"], "lunch");

    // Admin must say whose distribution they want
    let (status, body) = send(
        &app,
        "GET",
        "/api/analytics/meal-distribution",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "user_id query parameter is required for admin"
    );
}

#[tokio::test]
async fn test_popular_foods_scoping() {
    let app = spawn_app().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let admin = authenticate(&app, "/api/auth/login", "admin", "admin123").await;

    let lentils = create_food(&app, &alice, "Lentils", 230.0, 91.0).await;
    let candy = create_food(&app, &alice, "Candy", 390.0, 5.0).await;
    log_entry(&app, &alice, lentils, "lunch").await;
    log_entry(&app, &alice, lentils, "dinner").await;
    log_entry(&app, &alice, candy, "snack").await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/analytics/popular-foods",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows[0]["food_name"], "Lentils");
    assert_eq!(rows[0]["times_consumed"], 2);
    assert_eq!(rows[1]["food_name"], "Candy");

    // Bob never logged anything; a spoofed user_id still scopes to him
    let (_, me) = send(&app, "GET", "/api/auth/me", Some(&alice), None).await;
    let alice_id = me["data"]["user_id"].as_i64().unwrap();
    let (_, body) = send(
        &app,
        "GET",
        &format!("/api/analytics/popular-foods?user_id={alice_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    // Admin without user_id gets the global ranking
    let (status, body) = send(
        &app,
        "GET",
        "/api/analytics/popular-foods",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["food_name"], "Lentils");
}

#[tokio::test]
async fn test_non_admin_analytics_are_self_scoped() {
    let app = spawn_app().await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;

    let food_id = create_food(&app, &alice, "Lentils", 230.0, 91.0).await;
    log_entry(&app, &alice, food_id, "lunch").await;

    let (_, me) = send(&app, "GET", "/api/auth/me", Some(&alice), None).await;
    let alice_id = me["data"]["user_id"].as_i64().unwrap();

    // Bob asking for alice's progress gets his own (empty) series
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/analytics/user-progress/{alice_id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}
