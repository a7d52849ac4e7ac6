use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, validation};

/// Session key holding the authenticated principal.
const SESSION_USER_KEY: &str = "user";

/// Typed principal attached to the session: everything the handlers need
/// for RBAC without another user lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: i32,
    pub username: String,
    pub role: String,
}

impl SessionUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: i32,
    pub username: String,
    pub role: String,
    pub profile_complete: bool,
}

// ============================================================================
// Middleware & helpers
// ============================================================================

/// Gate for every protected route: a request without a session principal
/// never reaches a handler.
pub async fn auth_middleware(
    session: Session,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if let Ok(Some(user)) = session.get::<SessionUser>(SESSION_USER_KEY).await {
        tracing::Span::current().record("user_id", user.user_id);
        return Ok(next.run(request).await);
    }

    Err(ApiError::Unauthorized("Not authenticated".to_string()))
}

/// Read the principal, failing with 401 when the session is empty.
pub async fn current_user(session: &Session) -> Result<SessionUser, ApiError> {
    session
        .get::<SessionUser>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}

/// Admin gate used by the user-management endpoints.
pub fn require_admin(user: &SessionUser) -> Result<(), ApiError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("You don't have permission"))
    }
}

async fn establish_session(session: &Session, user: &SessionUser) -> Result<(), ApiError> {
    session
        .insert(SESSION_USER_KEY, user)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/signup
/// Create a normal user account and log it in. The body profile is
/// collected later during onboarding.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionUser>>), ApiError> {
    let username = validation::validate_username(&payload.username)?;
    validation::validate_password(&payload.password)?;

    if state
        .store()
        .username_exists(username)
        .await
        .map_err(|e| ApiError::internal(format!("Signup failed: {e}")))?
    {
        return Err(ApiError::validation("Username already exists"));
    }

    let security = state.config().read().await.security.clone();
    let user = state
        .store()
        .create_user_account(username, &payload.password, &security)
        .await
        .map_err(|e| ApiError::internal(format!("Signup failed: {e}")))?;

    let principal = SessionUser {
        user_id: user.user_id,
        username: user.username,
        role: user.role,
    };
    establish_session(&session, &principal).await?;

    tracing::info!("New account created: {}", principal.username);

    Ok((StatusCode::CREATED, Json(ApiResponse::success(principal))))
}

/// POST /api/auth/login
/// Verify credentials and establish the cookie session. The error message
/// never distinguishes unknown users from wrong passwords.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionUser>>, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    let user = state
        .store()
        .verify_user_password(username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    let principal = SessionUser {
        user_id: user.user_id,
        username: user.username,
        role: user.role,
    };
    establish_session(&session, &principal).await?;

    Ok(Json(ApiResponse::success(principal)))
}

/// POST /api/auth/logout
/// Invalidate the current session.
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /api/auth/me
/// Current principal plus whether the body profile has been completed.
/// A storage failure degrades profile_complete to false instead of
/// failing the whole call.
pub async fn me(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let principal = current_user(&session).await?;

    let profile_complete = match state.store().get_user_by_id(principal.user_id).await {
        Ok(Some(user)) => user.height_value.is_some() && user.weight_value.is_some(),
        Ok(None) | Err(_) => false,
    };

    Ok(Json(ApiResponse::success(MeResponse {
        user_id: principal.user_id,
        username: principal.username,
        role: principal.role,
        profile_complete,
    })))
}
