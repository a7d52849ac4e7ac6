use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "consumption")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    pub food_id: i32,

    /// Entry date as "YYYY-MM-DD" (lexicographic order == date order).
    pub date: String,

    pub portion_size: f64,

    /// Nutrition snapshot: food item fields scaled by portion_size at write
    /// time. Later edits to the food item do not touch these.
    pub calories: f64,

    pub protein: f64,

    pub carbs: f64,

    pub fat: f64,

    pub fiber: f64,

    pub sugars: f64,

    pub health_score: f64,

    pub meal_type: Option<String>,

    pub created_at: String,
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
    #[sea_orm(
        belongs_to = "super::food_items::Entity",
        from = "Column::FoodId",
        to = "super::food_items::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    FoodItems,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::food_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
