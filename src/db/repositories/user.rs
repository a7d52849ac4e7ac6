use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{prelude::*, users};

/// User data returned from the repository (without the password hash).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub user_id: i32,
    pub username: String,
    pub role: String,
    pub dietary_goal: String,
    pub target_calories: i32,
    pub height_value: Option<f64>,
    pub height_unit: Option<String>,
    pub weight_value: Option<f64>,
    pub weight_unit: Option<String>,
    pub created_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            user_id: model.id,
            username: model.username,
            role: model.role,
            dietary_goal: model.dietary_goal,
            target_calories: model.target_calories,
            height_value: model.height_value,
            height_unit: model.height_unit,
            weight_value: model.weight_value,
            weight_unit: model.weight_unit,
            created_at: model.created_at,
        }
    }
}

/// Full set of profile fields written by a profile mutation. The caller
/// merges old + incoming values and recomputes target_calories first, so
/// the statement shape never varies with the patch contents.
#[derive(Debug, Clone)]
pub struct ProfileWrite {
    pub role: String,
    pub dietary_goal: String,
    pub target_calories: i32,
    pub height_value: Option<f64>,
    pub height_unit: Option<String>,
    pub weight_value: Option<f64>,
    pub weight_unit: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.get_by_username(username).await?.is_some())
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        let users = Users::find()
            .order_by_asc(users::Column::Username)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(users.into_iter().map(User::from).collect())
    }

    /// Verify credentials and return the user on success.
    ///
    /// Accounts without a stored hash can never log in. Argon2 verification
    /// is CPU-heavy and runs on a blocking task.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };
        let Some(password_hash) = user.password_hash.clone() else {
            return Ok(None);
        };

        let password = password.to_string();
        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    /// Self-service signup: role "user", goal "maintain", target 2000 until
    /// the profile is completed.
    pub async fn create_account(
        &self,
        username: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<User> {
        let password = password.to_string();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(Some(password_hash)),
            role: Set("user".to_string()),
            dietary_goal: Set("maintain".to_string()),
            target_calories: Set(2000),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Admin-created account with a full body profile and no credentials;
    /// the bootstrap backfill later assigns the demo password.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_managed(
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
        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(None),
            role: Set(role.to_string()),
            dietary_goal: Set(dietary_goal.to_string()),
            target_calories: Set(target_calories),
            height_value: Set(Some(height_value)),
            height_unit: Set(Some(height_unit.to_string())),
            weight_value: Set(Some(weight_value)),
            weight_unit: Set(Some(weight_unit.to_string())),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Write the merged profile row. Always writes every profile column so
    /// the statement is identical regardless of which fields were patched.
    pub async fn apply_profile(&self, user_id: i32, write: ProfileWrite) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.role = Set(write.role);
        active.dietary_goal = Set(write.dietary_goal);
        active.target_calories = Set(write.target_calories);
        active.height_value = Set(write.height_value);
        active.height_unit = Set(write.height_unit);
        active.weight_value = Set(write.weight_value);
        active.weight_unit = Set(write.weight_unit);

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update user profile")?;

        Ok(Some(User::from(model)))
    }

    /// Delete a user; consumption entries cascade. Returns the deleted row.
    pub async fn delete(&self, user_id: i32) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for delete")?
        else {
            return Ok(None);
        };

        let deleted = User::from(user.clone());
        user.delete(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(Some(deleted))
    }

    /// Guarantee at least one admin account exists and that password-less
    /// rows get a usable hash. Idempotent; callers treat failures as
    /// non-fatal.
    pub async fn ensure_admin_bootstrap(&self, config: &SecurityConfig) -> Result<()> {
        let admin = Users::find()
            .filter(users::Column::Role.eq("admin"))
            .order_by_asc(users::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query admin account")?;

        let admin_hash = {
            let password = config.admin_bootstrap_password.clone();
            let cfg = config.clone();
            task::spawn_blocking(move || hash_password(&password, Some(&cfg)))
                .await
                .context("Password hashing task panicked")??
        };

        match admin {
            None => {
                let active = users::ActiveModel {
                    username: Set("admin".to_string()),
                    password_hash: Set(Some(admin_hash)),
                    role: Set("admin".to_string()),
                    dietary_goal: Set("maintain".to_string()),
                    target_calories: Set(2000),
                    created_at: Set(chrono::Utc::now().to_rfc3339()),
                    ..Default::default()
                };
                active
                    .insert(&self.conn)
                    .await
                    .context("Failed to seed admin account")?;
                tracing::info!("Seeded default admin account");
            }
            Some(admin) if admin.password_hash.is_none() => {
                let mut active: users::ActiveModel = admin.into();
                active.password_hash = Set(Some(admin_hash));
                active
                    .update(&self.conn)
                    .await
                    .context("Failed to backfill admin password")?;
            }
            Some(_) => {}
        }

        // Demo/admin-created accounts without credentials get the demo
        // password so they stay usable.
        let orphaned = Users::find()
            .filter(users::Column::PasswordHash.is_null())
            .filter(users::Column::Username.ne("admin"))
            .all(&self.conn)
            .await
            .context("Failed to query password-less accounts")?;

        if !orphaned.is_empty() {
            let demo_hash = {
                let password = config.demo_user_password.clone();
                let cfg = config.clone();
                task::spawn_blocking(move || hash_password(&password, Some(&cfg)))
                    .await
                    .context("Password hashing task panicked")??
            };

            for user in orphaned {
                let mut active: users::ActiveModel = user.into();
                active.password_hash = Set(Some(demo_hash.clone()));
                active
                    .update(&self.conn)
                    .await
                    .context("Failed to backfill demo password")?;
            }
        }

        Ok(())
    }
}

/// Hash a password using Argon2id with optional custom params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
