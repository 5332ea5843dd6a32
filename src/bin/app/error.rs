use diesel::r2d2::PoolError;
use thiserror::Error;

use crate::{
    app::config::ConfigError,
    database::store::StoreError,
    services::{
        recipes::RecipeError, short_link::ShortCodeError, user_lists::UserListError,
    },
};

/// Anything that can stop a command of the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unable to create the connection pool: {0}")]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    ShortCode(#[from] ShortCodeError),

    #[error(transparent)]
    Recipe(#[from] RecipeError),

    #[error(transparent)]
    UserList(#[from] UserListError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
