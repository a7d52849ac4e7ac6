use serde::Serialize;

use crate::db::{
    DailyScoreRow, DailySummaryRow, MealDistributionRow, PopularFoodRow, UserRollupRow,
};
use crate::entities::{consumption, food_items};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Wrapper returned by destructive endpoints: the row as it was deleted.
#[derive(Debug, Serialize)]
pub struct DeletedResponse<T> {
    pub deleted: T,
}

#[derive(Debug, Serialize)]
pub struct FoodDto {
    pub food_id: i32,
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugars: f64,
    pub nutrition_density: f64,
    pub created_by_user_id: Option<i32>,
    pub created_at: String,
}

impl From<food_items::Model> for FoodDto {
    fn from(model: food_items::Model) -> Self {
        Self {
            food_id: model.id,
            food_name: model.food_name,
            calories: model.calories,
            protein: model.protein,
            carbs: model.carbs,
            fat: model.fat,
            fiber: model.fiber,
            sugars: model.sugars,
            nutrition_density: model.nutrition_density,
            created_by_user_id: model.created_by_user_id,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConsumptionDto {
    pub entry_id: i32,
    pub user_id: i32,
    pub food_id: i32,
    pub date: String,
    pub portion_size: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugars: f64,
    pub health_score: f64,
    pub meal_type: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_name: Option<String>,
}

impl ConsumptionDto {
    #[must_use]
    pub fn from_entry(model: consumption::Model, food_name: Option<String>) -> Self {
        Self {
            entry_id: model.id,
            user_id: model.user_id,
            food_id: model.food_id,
            date: model.date,
            portion_size: model.portion_size,
            calories: model.calories,
            protein: model.protein,
            carbs: model.carbs,
            fat: model.fat,
            fiber: model.fiber,
            sugars: model.sugars,
            health_score: model.health_score,
            meal_type: model.meal_type,
            created_at: model.created_at,
            food_name,
        }
    }
}

impl From<consumption::Model> for ConsumptionDto {
    fn from(model: consumption::Model) -> Self {
        Self::from_entry(model, None)
    }
}

/// Round to two decimal places for response shaping.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Serialize)]
pub struct FoodNutritionDto {
    pub food_id: i32,
    pub food_name: String,
    pub avg_calories: f64,
    pub avg_protein: f64,
    pub avg_carbs: f64,
    pub avg_fat: f64,
}

impl From<food_items::Model> for FoodNutritionDto {
    fn from(model: food_items::Model) -> Self {
        Self {
            food_id: model.id,
            food_name: model.food_name,
            avg_calories: round2(model.calories),
            avg_protein: round2(model.protein),
            avg_carbs: round2(model.carbs),
            avg_fat: round2(model.fat),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TopFoodDto {
    pub food_id: i32,
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub fiber: f64,
    pub sugars: f64,
    pub nutrition_density: f64,
}

impl From<food_items::Model> for TopFoodDto {
    fn from(model: food_items::Model) -> Self {
        Self {
            food_id: model.id,
            food_name: model.food_name,
            calories: model.calories,
            protein: model.protein,
            fiber: model.fiber,
            sugars: model.sugars,
            nutrition_density: model.nutrition_density,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailySummaryDto {
    pub date: String,
    pub meals_count: i64,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub total_fiber: f64,
    pub total_sugars: f64,
    pub avg_health_score: f64,
    pub target_calories: i32,
    pub calorie_difference: f64,
}

impl From<DailySummaryRow> for DailySummaryDto {
    fn from(row: DailySummaryRow) -> Self {
        let total_calories = round2(row.total_calories);
        Self {
            date: row.date,
            meals_count: row.meals_count,
            total_calories,
            total_protein: round2(row.total_protein),
            total_carbs: round2(row.total_carbs),
            total_fat: round2(row.total_fat),
            total_fiber: round2(row.total_fiber),
            total_sugars: round2(row.total_sugars),
            avg_health_score: round2(row.avg_health_score),
            target_calories: row.target_calories,
            calorie_difference: round2(total_calories - f64::from(row.target_calories)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailyScoreDto {
    pub date: String,
    pub daily_health_score: f64,
    pub entries_count: i64,
}

impl From<DailyScoreRow> for DailyScoreDto {
    fn from(row: DailyScoreRow) -> Self {
        Self {
            date: row.date,
            daily_health_score: round2(row.daily_health_score),
            entries_count: row.entries_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OverallScoreDto {
    pub user_id: i32,
    pub overall_health_score: f64,
    pub entries_count: i64,
    pub days_tracked: i64,
}

#[derive(Debug, Serialize)]
pub struct MealDistributionDto {
    pub meal_type: String,
    pub count: i64,
    pub total_calories: f64,
    pub avg_health_score: f64,
}

impl From<MealDistributionRow> for MealDistributionDto {
    fn from(row: MealDistributionRow) -> Self {
        Self {
            meal_type: row.meal_type,
            count: row.count,
            total_calories: round2(row.total_calories),
            avg_health_score: row.avg_health_score.round(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PopularFoodDto {
    pub food_id: i32,
    pub food_name: String,
    pub times_consumed: i64,
    pub avg_health_score: f64,
    pub total_calories_consumed: f64,
}

impl From<PopularFoodRow> for PopularFoodDto {
    fn from(row: PopularFoodRow) -> Self {
        Self {
            food_id: row.food_id,
            food_name: row.food_name,
            times_consumed: row.times_consumed,
            avg_health_score: row.avg_health_score.round(),
            total_calories_consumed: round2(row.total_calories_consumed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserProgressDto {
    pub days_tracked: i64,
    pub total_entries: i64,
    pub avg_daily_calories: f64,
    pub avg_daily_protein: f64,
    pub avg_health_score: f64,
    pub last_entry_date: Option<String>,
}

impl From<UserRollupRow> for UserProgressDto {
    fn from(row: UserRollupRow) -> Self {
        Self {
            days_tracked: row.days_tracked,
            total_entries: row.total_entries,
            avg_daily_calories: round2(row.avg_daily_calories),
            avg_daily_protein: round2(row.avg_daily_protein),
            avg_health_score: round2(row.avg_health_score),
            last_entry_date: row.last_entry_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(75.4166), 75.42);
        assert_eq!(round2(75.414), 75.41);
        assert_eq!(round2(0.0), 0.0);
    }
}
