use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{consumption, food_items};

pub mod migrator;
pub mod repositories;

pub use repositories::analytics::{
    DailyScoreRow, DailySummaryRow, MealDistributionRow, OverallScoreRow, PopularFoodRow,
    UserRollupRow,
};
pub use repositories::consumption::{EntryCreateOutcome, EntryPatch, NewEntry};
pub use repositories::food::{FoodDeleteOutcome, FoodPatch, NewFood};
pub use repositories::user::{ProfileWrite, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn food_repo(&self) -> repositories::food::FoodRepository {
        repositories::food::FoodRepository::new(self.conn.clone())
    }

    fn consumption_repo(&self) -> repositories::consumption::ConsumptionRepository {
        repositories::consumption::ConsumptionRepository::new(self.conn.clone())
    }

    fn audit_repo(&self) -> repositories::audit::AuditRepository {
        repositories::audit::AuditRepository::new(self.conn.clone())
    }

    fn analytics_repo(&self) -> repositories::analytics::AnalyticsRepository {
        repositories::analytics::AnalyticsRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn verify_user_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn create_user_account(
        &self,
        username: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create_account(username, password, security)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_managed_user(
        &self,
        username: &str,
        role: &str,
        dietary_goal: &str,
        target_calories: i32,
        height_value: f64,
        height_unit: &str,
        weight_value: f64,
        weight_unit: &str,
    ) -> Result<User> {
        self.user_repo()
            .create_managed(
                username,
                role,
                dietary_goal,
                target_calories,
                height_value,
                height_unit,
                weight_value,
                weight_unit,
            )
            .await
    }

    pub async fn apply_user_profile(
        &self,
        user_id: i32,
        write: ProfileWrite,
    ) -> Result<Option<User>> {
        self.user_repo().apply_profile(user_id, write).await
    }

    pub async fn delete_user(&self, user_id: i32) -> Result<Option<User>> {
        self.user_repo().delete(user_id).await
    }

    pub async fn ensure_admin_bootstrap(&self, security: &SecurityConfig) -> Result<()> {
        self.user_repo().ensure_admin_bootstrap(security).await
    }

    // ========== Food catalog ==========

    pub async fn list_foods(
        &self,
        search: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<food_items::Model>> {
        self.food_repo().list(search, limit, offset).await
    }

    pub async fn get_food(&self, id: i32) -> Result<Option<food_items::Model>> {
        self.food_repo().get(id).await
    }

    pub async fn create_food(&self, food: NewFood, owner_id: i32) -> Result<food_items::Model> {
        self.food_repo().create(food, owner_id).await
    }

    pub async fn update_food(
        &self,
        id: i32,
        patch: FoodPatch,
    ) -> Result<Option<food_items::Model>> {
        self.food_repo().update(id, patch).await
    }

    pub async fn delete_food(&self, id: i32) -> Result<FoodDeleteOutcome> {
        self.food_repo().delete(id).await
    }

    // ========== Consumption log ==========

    pub async fn create_consumption(&self, entry: NewEntry) -> Result<EntryCreateOutcome> {
        self.consumption_repo().create(entry).await
    }

    pub async fn get_consumption(&self, id: i32) -> Result<Option<consumption::Model>> {
        self.consumption_repo().get(id).await
    }

    pub async fn get_consumption_with_food(
        &self,
        id: i32,
    ) -> Result<Option<(consumption::Model, String)>> {
        self.consumption_repo().get_with_food(id).await
    }

    pub async fn list_consumption(
        &self,
        user_id: i32,
        date: Option<&str>,
        meal_type: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<(consumption::Model, String)>> {
        self.consumption_repo()
            .list(user_id, date, meal_type, limit, offset)
            .await
    }

    pub async fn update_consumption(
        &self,
        id: i32,
        patch: EntryPatch,
    ) -> Result<Option<consumption::Model>> {
        self.consumption_repo().update(id, patch).await
    }

    pub async fn delete_consumption(&self, id: i32) -> Result<Option<consumption::Model>> {
        self.consumption_repo().delete(id).await
    }

    // ========== Audit trail ==========

    pub async fn record_profile_change(
        &self,
        target_user_id: i32,
        changed_by_user_id: i32,
        changed_by_role: &str,
        old: &User,
        new: &User,
    ) -> Result<bool> {
        self.audit_repo()
            .record_profile_change(target_user_id, changed_by_user_id, changed_by_role, old, new)
            .await
    }

    pub async fn count_profile_changes(&self, user_id: i32) -> Result<u64> {
        self.audit_repo().count_for_user(user_id).await
    }

    // ========== Analytics ==========

    pub async fn food_nutrition(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<food_items::Model>> {
        self.analytics_repo().food_nutrition(limit, offset).await
    }

    pub async fn top_foods(&self, limit: u64) -> Result<Vec<food_items::Model>> {
        self.analytics_repo().top_foods(limit).await
    }

    pub async fn user_progress(&self, user_id: i32, since: &str) -> Result<Vec<DailySummaryRow>> {
        self.analytics_repo().user_progress(user_id, since).await
    }

    pub async fn daily_health_score(
        &self,
        user_id: i32,
        since: &str,
    ) -> Result<Vec<DailyScoreRow>> {
        self.analytics_repo()
            .daily_health_score(user_id, since)
            .await
    }

    pub async fn overall_health_score(&self, user_id: i32) -> Result<Option<OverallScoreRow>> {
        self.analytics_repo().overall_health_score(user_id).await
    }

    pub async fn meal_distribution(
        &self,
        user_id: i32,
        since: &str,
    ) -> Result<Vec<MealDistributionRow>> {
        self.analytics_repo().meal_distribution(user_id, since).await
    }

    pub async fn popular_foods(
        &self,
        user_id: Option<i32>,
        limit: u64,
    ) -> Result<Vec<PopularFoodRow>> {
        self.analytics_repo().popular_foods(user_id, limit).await
    }

    pub async fn user_rollup(&self, user_id: i32) -> Result<UserRollupRow> {
        self.analytics_repo().user_rollup(user_id).await
    }
}
