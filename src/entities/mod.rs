pub mod prelude;

pub mod consumption;
pub mod food_items;
pub mod profile_changes;
pub mod users;
