use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{consumption, food_items, prelude::*};

/// New catalog entry; every nutrition field is required at the API boundary.
#[derive(Debug, Clone)]
pub struct NewFood {
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugars: f64,
    pub nutrition_density: f64,
}

/// Partial catalog update. Only present fields are written.
#[derive(Debug, Clone, Default)]
pub struct FoodPatch {
    pub food_name: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub sugars: Option<f64>,
    pub nutrition_density: Option<f64>,
}

impl FoodPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.food_name.is_none()
            && self.calories.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fat.is_none()
            && self.fiber.is_none()
            && self.sugars.is_none()
            && self.nutrition_density.is_none()
    }
}

/// Outcome of a delete attempt against the referential restriction.
#[derive(Debug)]
pub enum FoodDeleteOutcome {
    Deleted(food_items::Model),
    NotFound,
    /// Still referenced by this many consumption entries.
    Referenced(u64),
}

pub struct FoodRepository {
    conn: DatabaseConnection,
}

impl FoodRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// List foods ordered by name. A search term matches as a
    /// case-insensitive substring of the name, or as the exact id when it
    /// parses as an integer.
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<food_items::Model>> {
        let mut query = FoodItems::find().order_by_asc(food_items::Column::FoodName);

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let mut cond = Condition::any().add(food_items::Column::FoodName.contains(term));
            if let Ok(id) = term.parse::<i32>() {
                cond = cond.add(food_items::Column::Id.eq(id));
            }
            query = query.filter(cond);
        }

        let foods = query
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to list food items")?;

        Ok(foods)
    }

    pub async fn get(&self, id: i32) -> Result<Option<food_items::Model>> {
        let food = FoodItems::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query food item")?;

        Ok(food)
    }

    pub async fn create(&self, food: NewFood, owner_id: i32) -> Result<food_items::Model> {
        let active = food_items::ActiveModel {
            food_name: Set(food.food_name),
            calories: Set(food.calories),
            protein: Set(food.protein),
            carbs: Set(food.carbs),
            fat: Set(food.fat),
            fiber: Set(food.fiber),
            sugars: Set(food.sugars),
            nutrition_density: Set(food.nutrition_density),
            created_by_user_id: Set(Some(owner_id)),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert food item")?;

        Ok(model)
    }

    pub async fn update(
        &self,
        id: i32,
        patch: FoodPatch,
    ) -> Result<Option<food_items::Model>> {
        let Some(food) = FoodItems::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query food item for update")?
        else {
            return Ok(None);
        };

        let mut active: food_items::ActiveModel = food.into();
        if let Some(name) = patch.food_name {
            active.food_name = Set(name);
        }
        if let Some(v) = patch.calories {
            active.calories = Set(v);
        }
        if let Some(v) = patch.protein {
            active.protein = Set(v);
        }
        if let Some(v) = patch.carbs {
            active.carbs = Set(v);
        }
        if let Some(v) = patch.fat {
            active.fat = Set(v);
        }
        if let Some(v) = patch.fiber {
            active.fiber = Set(v);
        }
        if let Some(v) = patch.sugars {
            active.sugars = Set(v);
        }
        if let Some(v) = patch.nutrition_density {
            active.nutrition_density = Set(v);
        }

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update food item")?;

        Ok(Some(model))
    }

    /// Delete a food item unless a consumption entry still references it.
    /// The check and the delete run in one transaction so a concurrent log
    /// write cannot slip between them.
    pub async fn delete(&self, id: i32) -> Result<FoodDeleteOutcome> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to open transaction")?;

        let Some(food) = FoodItems::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to query food item for delete")?
        else {
            txn.rollback().await.ok();
            return Ok(FoodDeleteOutcome::NotFound);
        };

        let references = Consumption::find()
            .filter(consumption::Column::FoodId.eq(id))
            .count(&txn)
            .await
            .context("Failed to count consumption references")?;

        if references > 0 {
            txn.rollback().await.ok();
            return Ok(FoodDeleteOutcome::Referenced(references));
        }

        let deleted = food.clone();
        food.delete(&txn)
            .await
            .context("Failed to delete food item")?;

        txn.commit().await.context("Failed to commit delete")?;

        Ok(FoodDeleteOutcome::Deleted(deleted))
    }
}
