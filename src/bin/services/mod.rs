pub mod recipes;
pub mod shopping_list;
pub mod short_link;
pub mod user_lists;
