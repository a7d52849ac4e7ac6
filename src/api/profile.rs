use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_user;
use super::{ApiError, ApiResponse, AppState};
use crate::db::{ProfileWrite, User};
use crate::domain;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct PreviewRequest {
    pub dietary_goal: Option<String>,
    pub height_value: Option<f64>,
    pub height_unit: Option<String>,
    pub weight_value: Option<f64>,
    pub weight_unit: Option<String>,
}

#[derive(Serialize)]
pub struct PreviewResponse {
    pub preview_target_calories: i32,
    pub requires_confirmation: bool,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub dietary_goal: Option<String>,
    pub height_value: Option<f64>,
    pub height_unit: Option<String>,
    pub weight_value: Option<f64>,
    pub weight_unit: Option<String>,
    #[serde(default)]
    pub confirm_unrealistic: bool,
}

impl UpdateProfileRequest {
    const fn is_empty(&self) -> bool {
        self.dietary_goal.is_none()
            && self.height_value.is_none()
            && self.height_unit.is_none()
            && self.weight_value.is_none()
            && self.weight_unit.is_none()
    }
}

#[derive(Deserialize)]
pub struct CompleteProfileRequest {
    pub height_value: Option<f64>,
    pub height_unit: Option<String>,
    pub weight_value: Option<f64>,
    pub weight_unit: Option<String>,
    pub dietary_goal: Option<String>,
    #[serde(default)]
    pub confirm_unrealistic: bool,
}

#[derive(Serialize)]
pub struct CompleteProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub profile_complete: bool,
}

/// Merged profile inputs ready for the calorie calculator.
pub(super) struct ProfileInputs {
    pub height_value: f64,
    pub height_unit: String,
    pub weight_value: f64,
    pub weight_unit: String,
    pub dietary_goal: String,
}

impl ProfileInputs {
    /// Apply the unrealistic-value gate, then compute the calorie target.
    /// A flagged profile without the confirmation flag turns into the
    /// requires-confirmation rejection carrying the preview.
    pub(super) fn gate_and_target(&self, confirmed: bool, message: &str) -> Result<i32, ApiError> {
        let h_cm = domain::to_cm(self.height_value, &self.height_unit);
        let w_kg = domain::to_kg(self.weight_value, &self.weight_unit);
        let preview = domain::target_calories(
            self.height_value,
            &self.height_unit,
            self.weight_value,
            &self.weight_unit,
            &self.dietary_goal,
        );

        if domain::unrealistic(h_cm, w_kg) && !confirmed {
            return Err(ApiError::requires_confirmation(message, preview));
        }

        Ok(preview)
    }
}

/// Write an audit record for a profile mutation; failures are logged and
/// never fail the primary request.
pub(super) async fn audit_profile_change(
    state: &AppState,
    target_user_id: i32,
    actor_id: i32,
    actor_role: &str,
    old: &User,
    new: &User,
) {
    if let Err(e) = state
        .store()
        .record_profile_change(target_user_id, actor_id, actor_role, old, new)
        .await
    {
        tracing::warn!("Failed to record profile change for user {target_user_id}: {e}");
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let current = current_user(&session).await?;

    let user = state
        .store()
        .get_user_by_id(current.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load profile: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    Ok(Json(ApiResponse::success(user)))
}

/// POST /api/profile/preview
/// Compute the calorie target for hypothetical inputs without saving.
pub async fn preview_target(
    session: Session,
    Json(payload): Json<PreviewRequest>,
) -> Result<Json<ApiResponse<PreviewResponse>>, ApiError> {
    current_user(&session).await?;

    let (Some(height_value), Some(weight_value)) = (payload.height_value, payload.weight_value)
    else {
        return Err(ApiError::validation("Please provide height and weight"));
    };

    let height_unit = payload.height_unit.unwrap_or_else(|| "cm".to_string());
    let weight_unit = payload.weight_unit.unwrap_or_else(|| "kg".to_string());
    let dietary_goal = payload.dietary_goal.unwrap_or_else(|| "maintain".to_string());

    let preview = domain::target_calories(
        height_value,
        &height_unit,
        weight_value,
        &weight_unit,
        &dietary_goal,
    );
    let requires_confirmation = domain::unrealistic(
        domain::to_cm(height_value, &height_unit),
        domain::to_kg(weight_value, &weight_unit),
    );

    Ok(Json(ApiResponse::success(PreviewResponse {
        preview_target_calories: preview,
        requires_confirmation,
    })))
}

/// PUT /api/profile
/// Partial update of the own body profile; target_calories always
/// recomputes server-side from the merged values.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let current = current_user(&session).await?;

    if payload.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let old = state
        .store()
        .get_user_by_id(current.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load profile: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    let height_value = payload.height_value.or(old.height_value);
    let weight_value = payload.weight_value.or(old.weight_value);
    let (Some(height_value), Some(weight_value)) = (height_value, weight_value) else {
        return Err(ApiError::validation(
            "Please enter both height and weight to update your goal.",
        ));
    };

    let inputs = ProfileInputs {
        height_value,
        height_unit: payload
            .height_unit
            .or_else(|| old.height_unit.clone())
            .unwrap_or_else(|| "cm".to_string()),
        weight_value,
        weight_unit: payload
            .weight_unit
            .or_else(|| old.weight_unit.clone())
            .unwrap_or_else(|| "kg".to_string()),
        dietary_goal: payload
            .dietary_goal
            .clone()
            .unwrap_or_else(|| old.dietary_goal.clone()),
    };

    let target = inputs.gate_and_target(
        payload.confirm_unrealistic,
        "Your height/weight look unusual. Please confirm to continue.",
    )?;

    let updated = state
        .store()
        .apply_user_profile(
            current.user_id,
            ProfileWrite {
                role: old.role.clone(),
                dietary_goal: inputs.dietary_goal,
                target_calories: target,
                height_value: Some(inputs.height_value),
                height_unit: Some(inputs.height_unit),
                weight_value: Some(inputs.weight_value),
                weight_unit: Some(inputs.weight_unit),
            },
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update profile: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    audit_profile_change(
        &state,
        current.user_id,
        current.user_id,
        &current.role,
        &old,
        &updated,
    )
    .await;

    Ok(Json(ApiResponse::success(updated)))
}

/// POST /api/profile/complete
/// Onboarding: all profile fields at once, strictly validated.
pub async fn complete_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CompleteProfileRequest>,
) -> Result<Json<ApiResponse<CompleteProfileResponse>>, ApiError> {
    let current = current_user(&session).await?;

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
    if payload.dietary_goal.is_none() {
        missing.push("dietary_goal");
    }
    if !missing.is_empty() {
        return Err(ApiError::validation(format!(
            "Missing fields: {}",
            missing.join(", ")
        )));
    }

    let height_value = payload.height_value.unwrap_or_default();
    let height_unit = payload.height_unit.unwrap_or_default();
    let weight_value = payload.weight_value.unwrap_or_default();
    let weight_unit = payload.weight_unit.unwrap_or_default();
    let dietary_goal = payload.dietary_goal.unwrap_or_default();

    domain::validate_height_unit(&height_unit).map_err(|e| ApiError::validation(e.to_string()))?;
    domain::validate_weight_unit(&weight_unit).map_err(|e| ApiError::validation(e.to_string()))?;
    domain::DietaryGoal::parse(&dietary_goal).map_err(|e| ApiError::validation(e.to_string()))?;

    let inputs = ProfileInputs {
        height_value,
        height_unit,
        weight_value,
        weight_unit,
        dietary_goal,
    };
    let target = inputs.gate_and_target(
        payload.confirm_unrealistic,
        "Your height/weight look unusual. Please confirm to continue.",
    )?;

    let old = state
        .store()
        .get_user_by_id(current.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load profile: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    let updated = state
        .store()
        .apply_user_profile(
            current.user_id,
            ProfileWrite {
                role: old.role.clone(),
                dietary_goal: inputs.dietary_goal,
                target_calories: target,
                height_value: Some(inputs.height_value),
                height_unit: Some(inputs.height_unit),
                weight_value: Some(inputs.weight_value),
                weight_unit: Some(inputs.weight_unit),
            },
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to complete profile: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    audit_profile_change(
        &state,
        current.user_id,
        current.user_id,
        &current.role,
        &old,
        &updated,
    )
    .await;

    Ok(Json(ApiResponse::success(CompleteProfileResponse {
        user: updated,
        profile_complete: true,
    })))
}
