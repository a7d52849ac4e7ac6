use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::domain;
use crate::entities::{consumption, prelude::*};

/// New log entry as accepted from the API; nutrition comes from the food.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub user_id: i32,
    pub food_id: i32,
    pub date: String,
    pub portion_size: f64,
    pub meal_type: Option<String>,
}

/// Patch surface for a log entry. Nutrition fields are never accepted from
/// the client; a portion change recomputes the snapshot from the food item.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub date: Option<String>,
    pub meal_type: Option<String>,
    pub portion_size: Option<f64>,
}

impl EntryPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.date.is_none() && self.meal_type.is_none() && self.portion_size.is_none()
    }
}

#[derive(Debug)]
pub enum EntryCreateOutcome {
    Created(consumption::Model),
    FoodMissing,
}

pub struct ConsumptionRepository {
    conn: DatabaseConnection,
}

impl ConsumptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Resolve the food, scale its nutrition by the portion and insert the
    /// snapshot. Runs in one transaction so a concurrent food update cannot
    /// produce a mixed snapshot.
    pub async fn create(&self, entry: NewEntry) -> Result<EntryCreateOutcome> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to open transaction")?;

        let Some(food) = FoodItems::find_by_id(entry.food_id)
            .one(&txn)
            .await
            .context("Failed to query food item for consumption entry")?
        else {
            txn.rollback().await.ok();
            return Ok(EntryCreateOutcome::FoodMissing);
        };

        let portion = entry.portion_size;
        let calories = food.calories * portion;
        let protein = food.protein * portion;
        let fiber = food.fiber * portion;
        let sugars = food.sugars * portion;

        let active = consumption::ActiveModel {
            user_id: Set(entry.user_id),
            food_id: Set(entry.food_id),
            date: Set(entry.date),
            portion_size: Set(portion),
            calories: Set(calories),
            protein: Set(protein),
            carbs: Set(food.carbs * portion),
            fat: Set(food.fat * portion),
            fiber: Set(fiber),
            sugars: Set(sugars),
            health_score: Set(domain::health_score(calories, protein, fiber, sugars)),
            meal_type: Set(entry.meal_type),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&txn)
            .await
            .context("Failed to insert consumption entry")?;

        txn.commit().await.context("Failed to commit entry")?;

        Ok(EntryCreateOutcome::Created(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<consumption::Model>> {
        let entry = Consumption::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query consumption entry")?;

        Ok(entry)
    }

    /// Single entry joined with its food name.
    pub async fn get_with_food(&self, id: i32) -> Result<Option<(consumption::Model, String)>> {
        let row = Consumption::find_by_id(id)
            .find_also_related(FoodItems)
            .one(&self.conn)
            .await
            .context("Failed to query consumption entry")?;

        Ok(row.map(|(entry, food)| {
            let name = food.map(|f| f.food_name).unwrap_or_default();
            (entry, name)
        }))
    }

    /// Entries for one user, newest first (date, then creation time), with
    /// optional date and meal-type filters.
    pub async fn list(
        &self,
        user_id: i32,
        date: Option<&str>,
        meal_type: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<(consumption::Model, String)>> {
        let mut query = Consumption::find()
            .filter(consumption::Column::UserId.eq(user_id))
            .order_by_desc(consumption::Column::Date)
            .order_by_desc(consumption::Column::CreatedAt);

        if let Some(date) = date {
            query = query.filter(consumption::Column::Date.eq(date));
        }
        if let Some(meal_type) = meal_type {
            query = query.filter(consumption::Column::MealType.eq(meal_type));
        }

        let rows = query
            .find_also_related(FoodItems)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to list consumption entries")?;

        Ok(rows
            .into_iter()
            .map(|(entry, food)| {
                let name = food.map(|f| f.food_name).unwrap_or_default();
                (entry, name)
            })
            .collect())
    }

    /// Apply a patch. A portion change re-reads the food item and rebuilds
    /// the whole nutrition snapshot in the same transaction; date and
    /// meal_type apply independently.
    pub async fn update(&self, id: i32, patch: EntryPatch) -> Result<Option<consumption::Model>> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to open transaction")?;

        let Some(entry) = Consumption::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to query consumption entry for update")?
        else {
            txn.rollback().await.ok();
            return Ok(None);
        };

        let food_id = entry.food_id;
        let mut active: consumption::ActiveModel = entry.into();

        if let Some(date) = patch.date {
            active.date = Set(date);
        }
        if let Some(meal_type) = patch.meal_type {
            active.meal_type = Set(Some(meal_type));
        }
        if let Some(portion) = patch.portion_size {
            let food = FoodItems::find_by_id(food_id)
                .one(&txn)
                .await
                .context("Failed to query food item for snapshot recompute")?
                .ok_or_else(|| anyhow::anyhow!("Food item {food_id} missing for entry {id}"))?;

            let calories = food.calories * portion;
            let protein = food.protein * portion;
            let fiber = food.fiber * portion;
            let sugars = food.sugars * portion;

            active.portion_size = Set(portion);
            active.calories = Set(calories);
            active.protein = Set(protein);
            active.carbs = Set(food.carbs * portion);
            active.fat = Set(food.fat * portion);
            active.fiber = Set(fiber);
            active.sugars = Set(sugars);
            active.health_score = Set(domain::health_score(calories, protein, fiber, sugars));
        }

        let model = active
            .update(&txn)
            .await
            .context("Failed to update consumption entry")?;

        txn.commit().await.context("Failed to commit entry update")?;

        Ok(Some(model))
    }

    /// Delete an entry, returning the deleted row.
    pub async fn delete(&self, id: i32) -> Result<Option<consumption::Model>> {
        let Some(entry) = Consumption::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query consumption entry for delete")?
        else {
            return Ok(None);
        };

        let deleted = entry.clone();
        entry
            .delete(&self.conn)
            .await
            .context("Failed to delete consumption entry")?;

        Ok(Some(deleted))
    }
}
