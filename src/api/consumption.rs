use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{SessionUser, current_user};
use super::types::ConsumptionDto;
use super::{ApiError, ApiResponse, AppState, DeletedResponse, validation};
use crate::db::{EntryCreateOutcome, EntryPatch, NewEntry};
use crate::entities::consumption;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct CreateConsumptionRequest {
    pub user_id: Option<i32>,
    pub food_id: Option<i32>,
    pub date: Option<String>,
    pub portion_size: Option<f64>,
    pub meal_type: Option<String>,
}

#[derive(Deserialize)]
pub struct ListConsumptionQuery {
    pub user_id: Option<i32>,
    pub date: Option<String>,
    pub meal_type: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
pub struct UpdateConsumptionRequest {
    pub date: Option<String>,
    pub meal_type: Option<String>,
    pub portion_size: Option<f64>,
}

/// Only the owning user or an admin may touch a log entry.
fn check_entry_ownership(current: &SessionUser, entry: &consumption::Model) -> Result<(), ApiError> {
    if !current.is_admin() && entry.user_id != current.user_id {
        return Err(ApiError::forbidden("You don't have permission"));
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/consumption
/// Log a meal: resolve the food, scale its nutrition by the portion and
/// persist the snapshot. Admins may log on behalf of any user; everyone
/// else is pinned to their own session identity no matter what the payload
/// says.
pub async fn create_consumption(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateConsumptionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ConsumptionDto>>), ApiError> {
    let current = current_user(&session).await?;

    let mut missing = Vec::new();
    if payload.food_id.is_none() {
        missing.push("food_id");
    }
    if payload.date.is_none() {
        missing.push("date");
    }
    if !missing.is_empty() {
        return Err(ApiError::validation(format!(
            "Missing fields: {}",
            missing.join(", ")
        )));
    }

    let user_id = if current.is_admin() {
        payload
            .user_id
            .ok_or_else(|| ApiError::validation("Missing field: user_id"))?
    } else {
        current.user_id
    };

    let date = payload.date.unwrap_or_default();
    validation::validate_date(&date)?;
    let portion_size = validation::validate_portion_size(payload.portion_size.unwrap_or(1.0))?;

    let outcome = state
        .store()
        .create_consumption(NewEntry {
            user_id,
            food_id: payload.food_id.unwrap_or_default(),
            date,
            portion_size,
            meal_type: payload.meal_type,
        })
        .await
        .map_err(|e| ApiError::internal(format!("Failed to log consumption: {e}")))?;

    match outcome {
        EntryCreateOutcome::Created(entry) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::success(ConsumptionDto::from(entry))),
        )),
        EntryCreateOutcome::FoodMissing => {
            Err(ApiError::NotFound("Food item not found".to_string()))
        }
    }
}

/// GET /api/consumption
/// Entries for one user, newest first. Admins pick the user via the
/// user_id query parameter; everyone else is scoped to themselves.
pub async fn list_consumption(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<ListConsumptionQuery>,
) -> Result<Json<ApiResponse<Vec<ConsumptionDto>>>, ApiError> {
    let current = current_user(&session).await?;

    let user_id = if current.is_admin() {
        query.user_id.ok_or_else(|| {
            ApiError::validation("user_id query parameter is required for admin")
        })?
    } else {
        current.user_id
    };

    if let Some(date) = query.date.as_deref() {
        validation::validate_date(date)?;
    }
    let limit = validation::validate_limit(query.limit.unwrap_or(100))?;
    let offset = query.offset.unwrap_or(0);

    let rows = state
        .store()
        .list_consumption(
            user_id,
            query.date.as_deref(),
            query.meal_type.as_deref(),
            limit,
            offset,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list consumption: {e}")))?;

    Ok(Json(ApiResponse::success(
        rows.into_iter()
            .map(|(entry, food_name)| ConsumptionDto::from_entry(entry, Some(food_name)))
            .collect(),
    )))
}

/// GET /api/consumption/{id}
pub async fn get_consumption(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(entry_id): Path<i32>,
) -> Result<Json<ApiResponse<ConsumptionDto>>, ApiError> {
    let current = current_user(&session).await?;

    let (entry, food_name) = state
        .store()
        .get_consumption_with_food(entry_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load consumption entry: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    check_entry_ownership(&current, &entry)?;

    Ok(Json(ApiResponse::success(ConsumptionDto::from_entry(
        entry,
        Some(food_name),
    ))))
}

/// PUT /api/consumption/{id}
/// Patch date/meal_type/portion_size. A portion change rebuilds the whole
/// nutrition snapshot from the food item; nutrition values themselves are
/// never accepted from the client.
pub async fn update_consumption(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(entry_id): Path<i32>,
    Json(payload): Json<UpdateConsumptionRequest>,
) -> Result<Json<ApiResponse<ConsumptionDto>>, ApiError> {
    let current = current_user(&session).await?;

    let patch = EntryPatch {
        date: payload.date,
        meal_type: payload.meal_type,
        portion_size: payload.portion_size,
    };
    if patch.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }
    if let Some(date) = patch.date.as_deref() {
        validation::validate_date(date)?;
    }
    if let Some(portion) = patch.portion_size {
        validation::validate_portion_size(portion)?;
    }

    let entry = state
        .store()
        .get_consumption(entry_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load consumption entry: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    check_entry_ownership(&current, &entry)?;

    let updated = state
        .store()
        .update_consumption(entry_id, patch)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update consumption entry: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    Ok(Json(ApiResponse::success(ConsumptionDto::from(updated))))
}

/// DELETE /api/consumption/{id}
pub async fn delete_consumption(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(entry_id): Path<i32>,
) -> Result<Json<ApiResponse<DeletedResponse<ConsumptionDto>>>, ApiError> {
    let current = current_user(&session).await?;

    let entry = state
        .store()
        .get_consumption(entry_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load consumption entry: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    check_entry_ownership(&current, &entry)?;

    let deleted = state
        .store()
        .delete_consumption(entry_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete consumption entry: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    Ok(Json(ApiResponse::success(DeletedResponse {
        deleted: ConsumptionDto::from(deleted),
    })))
}
