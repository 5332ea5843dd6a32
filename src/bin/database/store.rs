//! Persistence seam of the recipe core.
//!
//! Components never talk to diesel directly: they receive something that
//! implements [`Store`] (or only [`ShortCodeLookup`] when an existence check
//! is all they need). [`PgStore`](super::pg_store::PgStore) is the Postgres
//! implementation.

use diesel::r2d2::PoolError;
use thiserror::Error;

use crate::{
    database::models::{recipe::Recipe, user::User},
    services::{recipes::NewRecipe, shopping_list::AggregatedLine, short_link::ShortCode},
};

/// Name of the unique constraint on `recipes.short_code`.
pub const SHORT_CODE_CONSTRAINT: &str = "recipes_short_code_key";

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("Unique constraint violated: {constraint}")]
    ConstraintViolation { constraint: String },

    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    #[error("Check constraint violated: {constraint}")]
    CheckViolation { constraint: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] PoolError),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match error {
            Error::DatabaseError(kind, info) => {
                let constraint = info.constraint_name().unwrap_or_default().to_owned();

                match kind {
                    DatabaseErrorKind::UniqueViolation => Self::ConstraintViolation { constraint },
                    DatabaseErrorKind::ForeignKeyViolation => {
                        Self::ForeignKeyViolation { constraint }
                    }
                    DatabaseErrorKind::CheckViolation => Self::CheckViolation { constraint },
                    _ => Self::Database(Error::DatabaseError(kind, info)),
                }
            }
            error => Self::Database(error),
        }
    }
}

pub trait ShortCodeLookup {
    fn exists_short_code(&self, code: &str) -> Result<bool, StoreError>;
}

pub trait Store: ShortCodeLookup {
    /// Totals of every ingredient needed by the recipes in the user's cart,
    /// grouped by (name, measurement unit) and ordered by name then unit.
    fn sum_amounts_by_ingredient_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<AggregatedLine>, StoreError>;

    /// Inserts the recipe and its ingredient lines atomically.
    ///
    /// A short code already taken surfaces as
    /// [`StoreError::ConstraintViolation`] on [`SHORT_CODE_CONSTRAINT`].
    fn insert_recipe(&self, recipe: &NewRecipe, short_code: &ShortCode)
        -> Result<Recipe, StoreError>;

    fn find_recipe(&self, recipe_id: i32) -> Result<Option<Recipe>, StoreError>;

    fn find_recipe_by_short_code(&self, code: &ShortCode) -> Result<Option<Recipe>, StoreError>;

    fn find_user(&self, user_id: i32) -> Result<Option<User>, StoreError>;

    /// Returns `false` when the recipe was already in the cart.
    fn add_to_cart(&self, user_id: i32, recipe_id: i32) -> Result<bool, StoreError>;

    /// Returns `false` when there was nothing to remove.
    fn remove_from_cart(&self, user_id: i32, recipe_id: i32) -> Result<bool, StoreError>;

    fn add_favorite(&self, user_id: i32, recipe_id: i32) -> Result<bool, StoreError>;

    fn remove_favorite(&self, user_id: i32, recipe_id: i32) -> Result<bool, StoreError>;

    fn subscribe(&self, user_id: i32, author_id: i32) -> Result<bool, StoreError>;

    fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<bool, StoreError>;
}
