pub mod favorite;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod shopping_cart;
pub mod subscription;
pub mod user;
