pub use super::consumption::Entity as Consumption;
pub use super::food_items::Entity as FoodItems;
pub use super::profile_changes::Entity as ProfileChanges;
pub use super::users::Entity as Users;
