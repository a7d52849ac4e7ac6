use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{SessionUser, current_user};
use super::types::{
    DailyScoreDto, DailySummaryDto, FoodNutritionDto, MealDistributionDto, OverallScoreDto,
    PopularFoodDto, TopFoodDto,
};
use super::{ApiError, ApiResponse, AppState, validation};

// ============================================================================
// Query Types
// ============================================================================

#[derive(Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
}

#[derive(Deserialize)]
pub struct UserWindowQuery {
    pub user_id: Option<i32>,
    pub days: Option<i64>,
}

#[derive(Deserialize)]
pub struct PopularFoodsQuery {
    pub user_id: Option<i32>,
    pub limit: Option<u64>,
}

/// Non-admin callers are always scoped to themselves, regardless of the id
/// they asked for.
fn scope_to_caller(current: &SessionUser, requested: i32) -> i32 {
    if current.is_admin() {
        requested
    } else {
        current.user_id
    }
}

/// First date (inclusive) of a trailing N-day window ending today.
fn window_start(days: i64) -> String {
    let days = days.max(0);
    (chrono::Utc::now().date_naive() - chrono::Duration::days(days)).to_string()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/analytics/food-nutrition
/// Per-food nutrition facts for the catalog chart.
pub async fn food_nutrition(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<FoodNutritionDto>>>, ApiError> {
    current_user(&session).await?;

    let limit = validation::validate_limit(query.limit.unwrap_or(20))?;
    let offset = query.offset.unwrap_or(0);

    let foods = state
        .store()
        .food_nutrition(limit, offset)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load food nutrition: {e}")))?;

    Ok(Json(ApiResponse::success(
        foods.into_iter().map(FoodNutritionDto::from).collect(),
    )))
}

/// GET /api/analytics/top-foods
/// Most nutritious foods by density score.
pub async fn top_foods(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<TopFoodDto>>>, ApiError> {
    current_user(&session).await?;

    let limit = validation::validate_limit(query.limit.unwrap_or(20))?;

    let foods = state
        .store()
        .top_foods(limit)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load top foods: {e}")))?;

    Ok(Json(ApiResponse::success(
        foods.into_iter().map(TopFoodDto::from).collect(),
    )))
}

/// GET /api/analytics/user-progress/{id}
/// Daily summary with calorie-difference-from-target over a trailing
/// window (default 30 days).
pub async fn user_progress(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(user_id): Path<i32>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<Vec<DailySummaryDto>>>, ApiError> {
    let current = current_user(&session).await?;
    let user_id = scope_to_caller(&current, user_id);
    let since = window_start(query.days.unwrap_or(30));

    let rows = state
        .store()
        .user_progress(user_id, &since)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load user progress: {e}")))?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(DailySummaryDto::from).collect(),
    )))
}

/// GET /api/analytics/daily-health-score/{id}
pub async fn daily_health_score(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(user_id): Path<i32>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<Vec<DailyScoreDto>>>, ApiError> {
    let current = current_user(&session).await?;
    let user_id = scope_to_caller(&current, user_id);
    let since = window_start(query.days.unwrap_or(30));

    let rows = state
        .store()
        .daily_health_score(user_id, &since)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load daily health score: {e}")))?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(DailyScoreDto::from).collect(),
    )))
}

/// GET /api/analytics/overall-health-score/{id}
/// Lifetime rollup; 404 for users who never logged anything.
pub async fn overall_health_score(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(user_id): Path<i32>,
) -> Result<Json<ApiResponse<OverallScoreDto>>, ApiError> {
    let current = current_user(&session).await?;
    let user_id = scope_to_caller(&current, user_id);

    let row = state
        .store()
        .overall_health_score(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load overall health score: {e}")))?
        .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

    Ok(Json(ApiResponse::success(OverallScoreDto {
        user_id,
        overall_health_score: super::types::round2(row.overall_health_score),
        entries_count: row.entries_count,
        days_tracked: row.days_tracked,
    })))
}

/// GET /api/analytics/meal-distribution
/// Meal-type breakdown over a trailing window. Admins pick the user via
/// the query parameter.
pub async fn meal_distribution(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<UserWindowQuery>,
) -> Result<Json<ApiResponse<Vec<MealDistributionDto>>>, ApiError> {
    let current = current_user(&session).await?;

    let user_id = if current.is_admin() {
        query.user_id.ok_or_else(|| {
            ApiError::validation("user_id query parameter is required for admin")
        })?
    } else {
        current.user_id
    };
    let since = window_start(query.days.unwrap_or(30));

    let rows = state
        .store()
        .meal_distribution(user_id, &since)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load meal distribution: {e}")))?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(MealDistributionDto::from).collect(),
    )))
}

/// GET /api/analytics/popular-foods
/// Most frequently consumed foods. Admins may omit user_id for the global
/// ranking; everyone else gets their own.
pub async fn popular_foods(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<PopularFoodsQuery>,
) -> Result<Json<ApiResponse<Vec<PopularFoodDto>>>, ApiError> {
    let current = current_user(&session).await?;

    let user_id = if current.is_admin() {
        query.user_id
    } else {
        Some(current.user_id)
    };
    let limit = validation::validate_limit(query.limit.unwrap_or(20))?;

    let rows = state
        .store()
        .popular_foods(user_id, limit)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load popular foods: {e}")))?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(PopularFoodDto::from).collect(),
    )))
}
