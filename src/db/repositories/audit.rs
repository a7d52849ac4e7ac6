use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use serde_json::{Map, Value, json};

use crate::entities::{prelude::*, profile_changes};

use super::user::User;

/// Profile fields tracked by the audit trail.
const TRACKED_FIELDS: [&str; 6] = [
    "height_value",
    "height_unit",
    "weight_value",
    "weight_unit",
    "dietary_goal",
    "target_calories",
];

pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Diff the tracked fields and append one change record when anything
    /// actually differs. Returns whether a record was written.
    pub async fn record_profile_change(
        &self,
        target_user_id: i32,
        changed_by_user_id: i32,
        changed_by_role: &str,
        old: &User,
        new: &User,
    ) -> Result<bool> {
        let old_fields = tracked_values(old);
        let new_fields = tracked_values(new);

        let mut changed = Map::new();
        for field in TRACKED_FIELDS {
            let from = &old_fields[field];
            let to = &new_fields[field];
            if from != to {
                changed.insert(field.to_string(), json!({ "from": from, "to": to }));
            }
        }

        if changed.is_empty() {
            return Ok(false);
        }

        let active = profile_changes::ActiveModel {
            user_id: Set(target_user_id),
            changed_by_user_id: Set(changed_by_user_id),
            changed_by_role: Set(changed_by_role.to_string()),
            changed_fields: Set(Value::Object(changed).to_string()),
            changed_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert profile change record")?;

        Ok(true)
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        let count = ProfileChanges::find()
            .filter(profile_changes::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count profile change records")?;

        Ok(count)
    }
}

fn tracked_values(user: &User) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("height_value".into(), json!(user.height_value));
    map.insert("height_unit".into(), json!(user.height_unit));
    map.insert("weight_value".into(), json!(user.weight_value));
    map.insert("weight_unit".into(), json!(user.weight_unit));
    map.insert("dietary_goal".into(), json!(user.dietary_goal));
    map.insert("target_calories".into(), json!(user.target_calories));
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            user_id: 1,
            username: "erin".to_string(),
            role: "user".to_string(),
            dietary_goal: "maintain".to_string(),
            target_calories: 2560,
            height_value: Some(170.0),
            height_unit: Some("cm".to_string()),
            weight_value: Some(70.0),
            weight_unit: Some("kg".to_string()),
            created_at: "2026-03-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_tracked_values_cover_all_fields() {
        let values = tracked_values(&sample_user());
        for field in TRACKED_FIELDS {
            assert!(values.contains_key(field), "missing {field}");
        }
    }

    #[test]
    fn test_identical_users_produce_no_diff() {
        let a = tracked_values(&sample_user());
        let b = tracked_values(&sample_user());
        assert_eq!(a, b);
    }
}
