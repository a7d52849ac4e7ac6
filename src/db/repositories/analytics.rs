use anyhow::{Context, Result};
use sea_orm::{
    DatabaseConnection, DbBackend, EntityTrait, FromQueryResult, QueryOrder, QuerySelect,
    Statement,
};

use crate::entities::{food_items, prelude::*};

/// One day of a user's trailing summary window.
#[derive(Debug, Clone, FromQueryResult)]
pub struct DailySummaryRow {
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
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct DailyScoreRow {
    pub date: String,
    pub daily_health_score: f64,
    pub entries_count: i64,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct OverallScoreRow {
    pub overall_health_score: f64,
    pub entries_count: i64,
    pub days_tracked: i64,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct MealDistributionRow {
    pub meal_type: String,
    pub count: i64,
    pub total_calories: f64,
    pub avg_health_score: f64,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct PopularFoodRow {
    pub food_id: i32,
    pub food_name: String,
    pub times_consumed: i64,
    pub avg_health_score: f64,
    pub total_calories_consumed: f64,
}

/// Lifetime rollup shown on the admin user detail page.
#[derive(Debug, Clone, FromQueryResult)]
pub struct UserRollupRow {
    pub days_tracked: i64,
    pub total_entries: i64,
    pub avg_daily_calories: f64,
    pub avg_daily_protein: f64,
    pub avg_health_score: f64,
    pub last_entry_date: Option<String>,
}

/// Read-only aggregations over the consumption log and the food catalog.
/// The grouped rollups are fixed parameterized statements; nothing here
/// ever writes.
pub struct AnalyticsRepository {
    conn: DatabaseConnection,
}

impl AnalyticsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Catalog page for the per-food nutrition chart, ordered by name.
    pub async fn food_nutrition(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<food_items::Model>> {
        let foods = FoodItems::find()
            .order_by_asc(food_items::Column::FoodName)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .context("Failed to query food nutrition")?;

        Ok(foods)
    }

    /// Most nutritious foods by precomputed density score.
    pub async fn top_foods(&self, limit: u64) -> Result<Vec<food_items::Model>> {
        let foods = FoodItems::find()
            .order_by_desc(food_items::Column::NutritionDensity)
            .order_by_asc(food_items::Column::FoodName)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query top foods")?;

        Ok(foods)
    }

    /// Per-day totals for one user since `since` (inclusive), joined with
    /// the user's current calorie target, oldest day first.
    pub async fn user_progress(&self, user_id: i32, since: &str) -> Result<Vec<DailySummaryRow>> {
        let rows = DailySummaryRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            r"
            SELECT c.date              AS date,
                   COUNT(*)           AS meals_count,
                   SUM(c.calories)    AS total_calories,
                   SUM(c.protein)     AS total_protein,
                   SUM(c.carbs)       AS total_carbs,
                   SUM(c.fat)         AS total_fat,
                   SUM(c.fiber)       AS total_fiber,
                   SUM(c.sugars)      AS total_sugars,
                   AVG(c.health_score) AS avg_health_score,
                   u.target_calories  AS target_calories
            FROM consumption c
            INNER JOIN users u ON u.id = c.user_id
            WHERE c.user_id = ? AND c.date >= ?
            GROUP BY c.date
            ORDER BY c.date ASC
            ",
            [user_id.into(), since.into()],
        ))
        .all(&self.conn)
        .await
        .context("Failed to query user progress")?;

        Ok(rows)
    }

    /// Average health score per day for one user since `since`.
    pub async fn daily_health_score(
        &self,
        user_id: i32,
        since: &str,
    ) -> Result<Vec<DailyScoreRow>> {
        let rows = DailyScoreRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            r"
            SELECT date               AS date,
                   AVG(health_score)  AS daily_health_score,
                   COUNT(*)           AS entries_count
            FROM consumption
            WHERE user_id = ? AND date >= ?
            GROUP BY date
            ORDER BY date ASC
            ",
            [user_id.into(), since.into()],
        ))
        .all(&self.conn)
        .await
        .context("Failed to query daily health score")?;

        Ok(rows)
    }

    /// Lifetime score rollup; `None` when the user has no entries at all.
    pub async fn overall_health_score(&self, user_id: i32) -> Result<Option<OverallScoreRow>> {
        let row = OverallScoreRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            r"
            SELECT COALESCE(AVG(health_score), 0.0) AS overall_health_score,
                   COUNT(*)                         AS entries_count,
                   COUNT(DISTINCT date)             AS days_tracked
            FROM consumption
            WHERE user_id = ?
            ",
            [user_id.into()],
        ))
        .one(&self.conn)
        .await
        .context("Failed to query overall health score")?;

        Ok(row.filter(|r| r.entries_count > 0))
    }

    /// Per-meal-type counts and totals for one user since `since`,
    /// most frequent first. Untyped meals are left out.
    pub async fn meal_distribution(
        &self,
        user_id: i32,
        since: &str,
    ) -> Result<Vec<MealDistributionRow>> {
        let rows = MealDistributionRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            r"
            SELECT meal_type          AS meal_type,
                   COUNT(*)           AS count,
                   SUM(calories)      AS total_calories,
                   AVG(health_score)  AS avg_health_score
            FROM consumption
            WHERE user_id = ? AND date >= ? AND meal_type IS NOT NULL
            GROUP BY meal_type
            ORDER BY count DESC
            ",
            [user_id.into(), since.into()],
        ))
        .all(&self.conn)
        .await
        .context("Failed to query meal distribution")?;

        Ok(rows)
    }

    /// Most frequently consumed foods, for one user or across everyone.
    pub async fn popular_foods(
        &self,
        user_id: Option<i32>,
        limit: u64,
    ) -> Result<Vec<PopularFoodRow>> {
        let statement = match user_id {
            Some(user_id) => Statement::from_sql_and_values(
                DbBackend::Sqlite,
                r"
                SELECT f.id            AS food_id,
                       f.food_name     AS food_name,
                       COUNT(c.id)     AS times_consumed,
                       AVG(c.health_score) AS avg_health_score,
                       SUM(c.calories) AS total_calories_consumed
                FROM food_items f
                INNER JOIN consumption c ON c.food_id = f.id
                WHERE c.user_id = ?
                GROUP BY f.id, f.food_name
                ORDER BY times_consumed DESC
                LIMIT ?
                ",
                [user_id.into(), limit.into()],
            ),
            None => Statement::from_sql_and_values(
                DbBackend::Sqlite,
                r"
                SELECT f.id            AS food_id,
                       f.food_name     AS food_name,
                       COUNT(c.id)     AS times_consumed,
                       AVG(c.health_score) AS avg_health_score,
                       SUM(c.calories) AS total_calories_consumed
                FROM food_items f
                INNER JOIN consumption c ON c.food_id = f.id
                GROUP BY f.id, f.food_name
                ORDER BY times_consumed DESC
                LIMIT ?
                ",
                [limit.into()],
            ),
        };

        let rows = PopularFoodRow::find_by_statement(statement)
            .all(&self.conn)
            .await
            .context("Failed to query popular foods")?;

        Ok(rows)
    }

    /// Lifetime tracking rollup for the admin user detail view. Always
    /// returns a row; an untracked user yields zeros.
    pub async fn user_rollup(&self, user_id: i32) -> Result<UserRollupRow> {
        let row = UserRollupRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            r"
            SELECT COUNT(DISTINCT date) AS days_tracked,
                   COUNT(*)             AS total_entries,
                   COALESCE(SUM(calories) / NULLIF(COUNT(DISTINCT date), 0), 0.0) AS avg_daily_calories,
                   COALESCE(SUM(protein) / NULLIF(COUNT(DISTINCT date), 0), 0.0)  AS avg_daily_protein,
                   COALESCE(AVG(health_score), 0.0) AS avg_health_score,
                   MAX(date)            AS last_entry_date
            FROM consumption
            WHERE user_id = ?
            ",
            [user_id.into()],
        ))
        .one(&self.conn)
        .await
        .context("Failed to query user rollup")?;

        row.ok_or_else(|| anyhow::anyhow!("Aggregate query returned no row"))
    }
}
