use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id password hash. Admin-created accounts start without one
    /// until the bootstrap backfill assigns the demo password.
    pub password_hash: Option<String>,

    /// "user" or "admin"
    pub role: String,

    pub dietary_goal: String,

    pub target_calories: i32,

    pub height_value: Option<f64>,

    pub height_unit: Option<String>,

    pub weight_value: Option<f64>,

    pub weight_unit: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::consumption::Entity")]
    Consumption,
}

impl Related<super::consumption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consumption.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
