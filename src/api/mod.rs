use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod analytics;
mod consumption;
mod error;
mod foods;
mod observability;
mod profile;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, session_ttl_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_ttl_minutes,
        )
    };

    let protected_routes = create_protected_router();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_ttl_minutes,
        )));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/health", get(system::health))
        .layer(session_layer)
        .with_state(state.clone());

    // Cookie-carried sessions require credentialed CORS, which in turn
    // requires explicit origins. A wildcard config falls back to the open
    // (credential-less) policy.
    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(profile::get_profile))
        .route("/profile", put(profile::update_profile))
        .route("/profile/preview", post(profile::preview_target))
        .route("/profile/complete", post(profile::complete_profile))
        .route("/foods", get(foods::list_foods))
        .route("/foods", post(foods::create_food))
        .route("/foods/{id}", get(foods::get_food))
        .route("/foods/{id}", put(foods::update_food))
        .route("/foods/{id}", delete(foods::delete_food))
        .route("/users", post(users::create_user))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}", put(users::update_user))
        .route("/users/{id}", delete(users::delete_user))
        .route("/consumption", post(consumption::create_consumption))
        .route("/consumption", get(consumption::list_consumption))
        .route("/consumption/{id}", get(consumption::get_consumption))
        .route("/consumption/{id}", put(consumption::update_consumption))
        .route("/consumption/{id}", delete(consumption::delete_consumption))
        .route("/analytics/food-nutrition", get(analytics::food_nutrition))
        .route("/analytics/top-foods", get(analytics::top_foods))
        .route(
            "/analytics/user-progress/{id}",
            get(analytics::user_progress),
        )
        .route(
            "/analytics/daily-health-score/{id}",
            get(analytics::daily_health_score),
        )
        .route(
            "/analytics/overall-health-score/{id}",
            get(analytics::overall_health_score),
        )
        .route(
            "/analytics/meal-distribution",
            get(analytics::meal_distribution),
        )
        .route("/analytics/popular-foods", get(analytics::popular_foods))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::auth_middleware))
}
