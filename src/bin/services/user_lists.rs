use std::fmt;

use thiserror::Error;
use tracing::{info, trace_span};

use crate::database::{
    models::{recipe::Recipe, user::User},
    store::{Store, StoreError},
};

/// Per-user recipe collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserList {
    ShoppingCart,
    Favorites,
}

impl fmt::Display for UserList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShoppingCart => f.write_str("shopping cart"),
            Self::Favorites => f.write_str("favorites"),
        }
    }
}

#[derive(Debug, Error)]
pub enum UserListError {
    #[error("Recipe {recipe_id} is already in the {list}")]
    AlreadyPresent { list: UserList, recipe_id: i32 },

    #[error("Recipe {recipe_id} is not in the {list}")]
    NotPresent { list: UserList, recipe_id: i32 },

    #[error("Users cannot subscribe to themselves")]
    SelfSubscription,

    #[error("Already subscribed to author {0}")]
    AlreadySubscribed(i32),

    #[error("Not subscribed to author {0}")]
    NotSubscribed(i32),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn add_recipe<S>(
    store: &S,
    list: UserList,
    user_id: i32,
    recipe_id: i32,
) -> Result<Recipe, UserListError>
where
    S: Store + ?Sized,
{
    let span = trace_span!("adding recipe", %list, user_id, recipe_id);
    let _guard = span.enter();

    let recipe = store
        .find_recipe(recipe_id)?
        .ok_or_else(|| StoreError::NotFound(format!("recipe {recipe_id}")))?;

    let created = match list {
        UserList::ShoppingCart => store.add_to_cart(user_id, recipe_id)?,
        UserList::Favorites => store.add_favorite(user_id, recipe_id)?,
    };
    if !created {
        return Err(UserListError::AlreadyPresent { list, recipe_id });
    }

    info!("Added '{}' to the {list}", recipe.name);

    Ok(recipe)
}

pub fn remove_recipe<S>(
    store: &S,
    list: UserList,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), UserListError>
where
    S: Store + ?Sized,
{
    let span = trace_span!("removing recipe", %list, user_id, recipe_id);
    let _guard = span.enter();

    let deleted = match list {
        UserList::ShoppingCart => store.remove_from_cart(user_id, recipe_id)?,
        UserList::Favorites => store.remove_favorite(user_id, recipe_id)?,
    };
    if !deleted {
        return Err(UserListError::NotPresent { list, recipe_id });
    }

    info!("Removed recipe {recipe_id} from the {list}");

    Ok(())
}

pub fn subscribe<S>(store: &S, user_id: i32, author_id: i32) -> Result<User, UserListError>
where
    S: Store + ?Sized,
{
    let span = trace_span!("subscribing", user_id, author_id);
    let _guard = span.enter();

    if user_id == author_id {
        return Err(UserListError::SelfSubscription);
    }

    let author = store
        .find_user(author_id)?
        .ok_or_else(|| StoreError::NotFound(format!("user {author_id}")))?;

    if !store.subscribe(user_id, author_id)? {
        return Err(UserListError::AlreadySubscribed(author_id));
    }

    info!("Subscribed to {}", author.username);

    Ok(author)
}

pub fn unsubscribe<S>(store: &S, user_id: i32, author_id: i32) -> Result<(), UserListError>
where
    S: Store + ?Sized,
{
    let span = trace_span!("unsubscribing", user_id, author_id);
    let _guard = span.enter();

    if !store.unsubscribe(user_id, author_id)? {
        return Err(UserListError::NotSubscribed(author_id));
    }

    info!("Unsubscribed from author {author_id}");

    Ok(())
}
