use sea_orm::entity::prelude::*;

/// Append-only audit trail of profile mutations. Rows are never updated.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profile_changes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// User whose profile changed.
    pub user_id: i32,

    /// User who performed the change (self or an admin).
    pub changed_by_user_id: i32,

    pub changed_by_role: String,

    /// JSON object: field name -> {"from": old, "to": new}.
    pub changed_fields: String,

    pub changed_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
