use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{current_user, require_admin};
use super::profile::{ProfileInputs, audit_profile_change};
use super::types::UserProgressDto;
use super::{ApiError, ApiResponse, AppState, DeletedResponse};
use crate::db::{ProfileWrite, User};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub role: Option<String>,
    pub dietary_goal: Option<String>,
    pub height_value: Option<f64>,
    pub height_unit: Option<String>,
    pub weight_value: Option<f64>,
    pub weight_unit: Option<String>,
    #[serde(default)]
    pub confirm_unrealistic: bool,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub dietary_goal: Option<String>,
    pub height_value: Option<f64>,
    pub height_unit: Option<String>,
    pub weight_value: Option<f64>,
    pub weight_unit: Option<String>,
    #[serde(default)]
    pub confirm_unrealistic: bool,
}

impl UpdateUserRequest {
    const fn is_empty(&self) -> bool {
        self.role.is_none()
            && self.dietary_goal.is_none()
            && self.height_value.is_none()
            && self.height_unit.is_none()
            && self.weight_value.is_none()
            && self.weight_unit.is_none()
    }

    /// Any field that feeds the calorie target.
    const fn touches_calorie_inputs(&self) -> bool {
        self.dietary_goal.is_some()
            || self.height_value.is_some()
            || self.height_unit.is_some()
            || self.weight_value.is_some()
            || self.weight_unit.is_some()
    }
}

#[derive(Serialize)]
pub struct UserWithProgress {
    #[serde(flatten)]
    pub user: User,
    pub progress: UserProgressDto,
}

// ============================================================================
// Handlers (all admin-only)
// ============================================================================

/// POST /api/users
/// Admin-created account with a full body profile; target_calories is
/// computed, never taken from the payload.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let current = current_user(&session).await?;
    require_admin(&current)?;

    let Some(username) = payload.username.as_deref().map(str::trim).filter(|u| !u.is_empty())
    else {
        return Err(ApiError::validation("Missing required field: username"));
    };

    let mut missing = Vec::new();
    if payload.height_value.is_none() {
        missing.push("height_value");
    }
    if payload.height_unit.is_none() {
        missing.push("height_unit");
    }
    if payload.weight_value.is_none() {
        missing.push("weight_value");
    }
    if payload.weight_unit.is_none() {
        missing.push("weight_unit");
    }
    if !missing.is_empty() {
        return Err(ApiError::validation(format!(
            "Missing fields: {}",
            missing.join(", ")
        )));
    }

    let inputs = ProfileInputs {
        height_value: payload.height_value.unwrap_or_default(),
        height_unit: payload.height_unit.unwrap_or_else(|| "cm".to_string()),
        weight_value: payload.weight_value.unwrap_or_default(),
        weight_unit: payload.weight_unit.unwrap_or_else(|| "kg".to_string()),
        dietary_goal: payload.dietary_goal.unwrap_or_else(|| "maintain".to_string()),
    };
    let target = inputs.gate_and_target(
        payload.confirm_unrealistic,
        "Your height/weight look unusual. Please confirm to continue.",
    )?;

    if state
        .store()
        .username_exists(username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create user: {e}")))?
    {
        return Err(ApiError::validation("Username already exists"));
    }

    let user = state
        .store()
        .create_managed_user(
            username,
            payload.role.as_deref().unwrap_or("user"),
            &inputs.dietary_goal,
            target,
            inputs.height_value,
            &inputs.height_unit,
            inputs.weight_value,
            &inputs.weight_unit,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create user: {e}")))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let current = current_user(&session).await?;
    require_admin(&current)?;

    let users = state
        .store()
        .list_users()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list users: {e}")))?;

    Ok(Json(ApiResponse::success(users)))
}

/// GET /api/users/{id}
/// User row plus the lifetime tracking rollup.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<UserWithProgress>>, ApiError> {
    let current = current_user(&session).await?;
    require_admin(&current)?;

    let user = state
        .store()
        .get_user_by_id(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load user: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    let rollup = state
        .store()
        .user_rollup(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load user progress: {e}")))?;

    Ok(Json(ApiResponse::success(UserWithProgress {
        user,
        progress: rollup.into(),
    })))
}

/// PUT /api/users/{id}
/// Admin patch of role and body profile. target_calories recomputes when
/// any calorie input changes; the unrealistic gate applies the same way as
/// for self-service updates.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let current = current_user(&session).await?;
    require_admin(&current)?;

    if payload.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let old = state
        .store()
        .get_user_by_id(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load user: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    let role = payload.role.clone().unwrap_or_else(|| old.role.clone());
    let dietary_goal = payload
        .dietary_goal
        .clone()
        .unwrap_or_else(|| old.dietary_goal.clone());
    let height_value = payload.height_value.or(old.height_value);
    let height_unit = payload.height_unit.clone().or_else(|| old.height_unit.clone());
    let weight_value = payload.weight_value.or(old.weight_value);
    let weight_unit = payload.weight_unit.clone().or_else(|| old.weight_unit.clone());

    let target = if payload.touches_calorie_inputs() {
        let (Some(h), Some(w)) = (height_value, weight_value) else {
            return Err(ApiError::validation(
                "Please set height and weight before setting a goal.",
            ));
        };

        let inputs = ProfileInputs {
            height_value: h,
            height_unit: height_unit.clone().unwrap_or_else(|| "cm".to_string()),
            weight_value: w,
            weight_unit: weight_unit.clone().unwrap_or_else(|| "kg".to_string()),
            dietary_goal: dietary_goal.clone(),
        };
        inputs.gate_and_target(
            payload.confirm_unrealistic,
            "Height/weight look unusual. Please confirm to continue.",
        )?
    } else {
        old.target_calories
    };

    let updated = state
        .store()
        .apply_user_profile(
            user_id,
            ProfileWrite {
                role,
                dietary_goal,
                target_calories: target,
                height_value,
                height_unit,
                weight_value,
                weight_unit,
            },
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update user: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    audit_profile_change(&state, user_id, current.user_id, &current.role, &old, &updated).await;

    Ok(Json(ApiResponse::success(updated)))
}

/// DELETE /api/users/{id}
/// Removes the account; consumption entries cascade with it.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<DeletedResponse<User>>>, ApiError> {
    let current = current_user(&session).await?;
    require_admin(&current)?;

    let deleted = state
        .store()
        .delete_user(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete user: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    tracing::info!("User {} deleted by {}", deleted.username, current.username);

    Ok(Json(ApiResponse::success(DeletedResponse { deleted })))
}
