use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{SessionUser, current_user};
use super::types::FoodDto;
use super::{ApiError, ApiResponse, AppState, DeletedResponse, validation};
use crate::db::{FoodDeleteOutcome, FoodPatch, NewFood};
use crate::entities::food_items;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct ListFoodsQuery {
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreateFoodRequest {
    pub food_name: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugars: Option<f64>,
    pub nutrition_density: Option<f64>,
}

#[derive(Deserialize)]
pub struct UpdateFoodRequest {
    pub food_name: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugars: Option<f64>,
    pub nutrition_density: Option<f64>,
}

impl From<UpdateFoodRequest> for FoodPatch {
    fn from(req: UpdateFoodRequest) -> Self {
        Self {
            food_name: req.food_name,
            calories: req.calories,
            protein: req.protein,
            carbs: req.carbs,
            fat: req.fat,
            fiber: req.fiber,
            sugars: req.sugars,
            nutrition_density: req.nutrition_density,
        }
    }
}

/// Only the creator or an admin may mutate a catalog entry.
fn check_food_ownership(
    current: &SessionUser,
    food: &food_items::Model,
    action: &str,
) -> Result<(), ApiError> {
    if !current.is_admin() && food.created_by_user_id != Some(current.user_id) {
        return Err(ApiError::forbidden(format!(
            "You can only {action} food items you created"
        )));
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/foods
/// Catalog listing with optional name/id search and pagination.
pub async fn list_foods(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<ListFoodsQuery>,
) -> Result<Json<ApiResponse<Vec<FoodDto>>>, ApiError> {
    current_user(&session).await?;

    let limit = validation::validate_limit(query.limit.unwrap_or(100))?;
    let offset = query.offset.unwrap_or(0);

    let foods = state
        .store()
        .list_foods(query.search.as_deref(), limit, offset)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list foods: {e}")))?;

    Ok(Json(ApiResponse::success(
        foods.into_iter().map(FoodDto::from).collect(),
    )))
}

/// POST /api/foods
/// All seven nutrition fields are required; the creating user becomes the
/// owner.
pub async fn create_food(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateFoodRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FoodDto>>), ApiError> {
    let current = current_user(&session).await?;

    let mut missing = Vec::new();
    if payload.food_name.as_deref().map(str::trim).filter(|n| !n.is_empty()).is_none() {
        missing.push("food_name");
    }
    if payload.calories.is_none() {
        missing.push("calories");
    }
    if payload.protein.is_none() {
        missing.push("protein");
    }
    if payload.carbs.is_none() {
        missing.push("carbs");
    }
    if payload.fat.is_none() {
        missing.push("fat");
    }
    if payload.fiber.is_none() {
        missing.push("fiber");
    }
    if payload.sugars.is_none() {
        missing.push("sugars");
    }
    if !missing.is_empty() {
        return Err(ApiError::validation(format!(
            "Missing fields: {}",
            missing.join(", ")
        )));
    }

    let food = NewFood {
        food_name: payload.food_name.unwrap_or_default().trim().to_string(),
        calories: payload.calories.unwrap_or_default(),
        protein: payload.protein.unwrap_or_default(),
        carbs: payload.carbs.unwrap_or_default(),
        fat: payload.fat.unwrap_or_default(),
        fiber: payload.fiber.unwrap_or_default(),
        sugars: payload.sugars.unwrap_or_default(),
        nutrition_density: payload.nutrition_density.unwrap_or(0.0),
    };

    let created = state
        .store()
        .create_food(food, current.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create food: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(FoodDto::from(created))),
    ))
}

/// GET /api/foods/{id}
pub async fn get_food(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(food_id): Path<i32>,
) -> Result<Json<ApiResponse<FoodDto>>, ApiError> {
    current_user(&session).await?;

    let food = state
        .store()
        .get_food(food_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load food: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    Ok(Json(ApiResponse::success(FoodDto::from(food))))
}

/// PUT /api/foods/{id}
/// Partial update, owner-or-admin.
pub async fn update_food(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(food_id): Path<i32>,
    Json(payload): Json<UpdateFoodRequest>,
) -> Result<Json<ApiResponse<FoodDto>>, ApiError> {
    let current = current_user(&session).await?;

    let patch = FoodPatch::from(payload);
    if patch.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let food = state
        .store()
        .get_food(food_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load food: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    check_food_ownership(&current, &food, "edit")?;

    let updated = state
        .store()
        .update_food(food_id, patch)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update food: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    Ok(Json(ApiResponse::success(FoodDto::from(updated))))
}

/// DELETE /api/foods/{id}
/// Owner-or-admin; refuses (as a client error) while any consumption entry
/// still references the food.
pub async fn delete_food(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(food_id): Path<i32>,
) -> Result<Json<ApiResponse<DeletedResponse<FoodDto>>>, ApiError> {
    let current = current_user(&session).await?;

    let food = state
        .store()
        .get_food(food_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load food: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    check_food_ownership(&current, &food, "delete")?;

    match state
        .store()
        .delete_food(food_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete food: {e}")))?
    {
        FoodDeleteOutcome::Deleted(deleted) => Ok(Json(ApiResponse::success(DeletedResponse {
            deleted: FoodDto::from(deleted),
        }))),
        FoodDeleteOutcome::NotFound => Err(ApiError::NotFound("Not found".to_string())),
        FoodDeleteOutcome::Referenced(count) => Err(ApiError::validation(format!(
            "Food item is referenced by {count} consumption entries and cannot be deleted"
        ))),
    }
}
