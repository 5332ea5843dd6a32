//! In-memory [`Store`] for tests.
//!
//! Mirrors the constraints of the SQL schema (unique keys, foreign keys,
//! amount and cooking time checks) so services see the same failures they
//! would get from Postgres.

use std::{
    collections::{BTreeSet, HashSet},
    sync::{Mutex, MutexGuard},
};

use crate::{
    database::{
        models::{
            ingredient::Ingredient, recipe::Recipe, recipe_ingredient::RecipeIngredient,
            user::User,
        },
        store::{ShortCodeLookup, Store, StoreError, SHORT_CODE_CONSTRAINT},
    },
    services::{
        recipes::NewRecipe,
        shopping_list::{AggregatedLine, ShoppingList},
        short_link::ShortCode,
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    ingredients: Vec<Ingredient>,
    recipes: Vec<Recipe>,
    recipe_ingredients: Vec<RecipeIngredient>,
    shopping_carts: BTreeSet<(i32, i32)>,
    favorites: BTreeSet<(i32, i32)>,
    subscriptions: BTreeSet<(i32, i32)>,
    // Committed codes the existence check does not see yet
    hidden_short_codes: HashSet<String>,
    rejected_short_codes: usize,
}

impl Tables {
    fn has_user(&self, user_id: i32) -> bool {
        self.users.iter().any(|user| user.id == user_id)
    }

    fn has_recipe(&self, recipe_id: i32) -> bool {
        self.recipes.iter().any(|recipe| recipe.id == recipe_id)
    }

    fn check_user_and_recipe(&self, user_id: i32, recipe_id: i32) -> Result<(), StoreError> {
        if !self.has_user(user_id) {
            return Err(foreign_key("user_id_fkey"));
        }
        if !self.has_recipe(recipe_id) {
            return Err(foreign_key("recipe_id_fkey"));
        }

        Ok(())
    }
}

fn foreign_key(constraint: &str) -> StoreError {
    StoreError::ForeignKeyViolation {
        constraint: constraint.to_owned(),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn add_user(&self, username: &str) -> User {
        let mut tables = self.tables();
        let user = User::new(
            tables.users.len() as i32 + 1,
            format!("{username}@example.com"),
            username.to_owned(),
            username.to_owned(),
            String::new(),
        );
        tables.users.push(user.clone());

        user
    }

    pub fn add_ingredient(&self, name: &str, measurement_unit: &str) -> Ingredient {
        let mut tables = self.tables();
        let ingredient = Ingredient::new(
            tables.ingredients.len() as i32 + 1,
            name.to_owned(),
            measurement_unit.to_owned(),
        );
        tables.ingredients.push(ingredient.clone());

        ingredient
    }

    /// Makes `exists_short_code` miss `code`, as if another transaction had
    /// committed it after the check.
    pub fn hide_short_code(&self, code: &str) {
        self.tables().hidden_short_codes.insert(code.to_owned());
    }

    /// Inserts refused because the short code was already used.
    pub fn rejected_short_codes(&self) -> usize {
        self.tables().rejected_short_codes
    }

    pub fn recipe_count(&self) -> usize {
        self.tables().recipes.len()
    }

    pub fn ingredient_lines(&self, recipe_id: i32) -> Vec<(i32, i32)> {
        self.tables()
            .recipe_ingredients
            .iter()
            .filter(|line| line.recipe_id == recipe_id)
            .map(|line| (line.ingredient_id, line.amount))
            .collect()
    }
}

impl ShortCodeLookup for MemoryStore {
    fn exists_short_code(&self, code: &str) -> Result<bool, StoreError> {
        let tables = self.tables();

        Ok(!tables.hidden_short_codes.contains(code)
            && tables.recipes.iter().any(|recipe| recipe.short_code == code))
    }
}

impl Store for MemoryStore {
    fn sum_amounts_by_ingredient_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<AggregatedLine>, StoreError> {
        let tables = self.tables();
        let mut list = ShoppingList::new();

        tables
            .shopping_carts
            .iter()
            .filter(|(cart_user, _)| *cart_user == user_id)
            .flat_map(|(_, recipe_id)| {
                tables
                    .recipe_ingredients
                    .iter()
                    .filter(move |line| line.recipe_id == *recipe_id)
            })
            .for_each(|line| {
                if let Some(ingredient) = tables
                    .ingredients
                    .iter()
                    .find(|ingredient| ingredient.id == line.ingredient_id)
                {
                    list.add_amount(
                        &ingredient.name,
                        &ingredient.measurement_unit,
                        i64::from(line.amount),
                    );
                }
            });

        Ok(list.into_lines())
    }

    fn insert_recipe(
        &self,
        recipe: &NewRecipe,
        short_code: &ShortCode,
    ) -> Result<Recipe, StoreError> {
        let mut tables = self.tables();

        if !tables.has_user(recipe.author_id) {
            return Err(foreign_key("recipes_author_id_fkey"));
        }
        if !(1..=1440).contains(&recipe.cooking_time) {
            return Err(StoreError::CheckViolation {
                constraint: "recipes_cooking_time_check".to_owned(),
            });
        }
        if tables
            .recipes
            .iter()
            .any(|existing| existing.short_code == short_code.as_str())
        {
            tables.rejected_short_codes += 1;
            return Err(StoreError::ConstraintViolation {
                constraint: SHORT_CODE_CONSTRAINT.to_owned(),
            });
        }

        let mut seen = HashSet::new();
        for line in &recipe.ingredients {
            if !tables
                .ingredients
                .iter()
                .any(|ingredient| ingredient.id == line.ingredient_id)
            {
                return Err(foreign_key("recipe_ingredients_ingredient_id_fkey"));
            }
            if line.amount < 1 {
                return Err(StoreError::CheckViolation {
                    constraint: "recipe_ingredients_amount_check".to_owned(),
                });
            }
            if !seen.insert(line.ingredient_id) {
                return Err(StoreError::ConstraintViolation {
                    constraint: "recipe_ingredients_pkey".to_owned(),
                });
            }
        }

        let created = Recipe::new(
            tables.recipes.iter().map(|r| r.id).max().unwrap_or_default() + 1,
            recipe.author_id,
            recipe.name.clone(),
            recipe.text.clone(),
            recipe.cooking_time,
            short_code.to_string(),
        );
        tables.recipes.push(created.clone());
        tables.recipe_ingredients.extend(
            recipe
                .ingredients
                .iter()
                .map(|line| RecipeIngredient::new(created.id, line.ingredient_id, line.amount)),
        );

        Ok(created)
    }

    fn find_recipe(&self, recipe_id: i32) -> Result<Option<Recipe>, StoreError> {
        Ok(self
            .tables()
            .recipes
            .iter()
            .find(|recipe| recipe.id == recipe_id)
            .cloned())
    }

    fn find_recipe_by_short_code(&self, code: &ShortCode) -> Result<Option<Recipe>, StoreError> {
        Ok(self
            .tables()
            .recipes
            .iter()
            .find(|recipe| recipe.short_code == code.as_str())
            .cloned())
    }

    fn find_user(&self, user_id: i32) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|user| user.id == user_id)
            .cloned())
    }

    fn add_to_cart(&self, user_id: i32, recipe_id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        tables.check_user_and_recipe(user_id, recipe_id)?;

        Ok(tables.shopping_carts.insert((user_id, recipe_id)))
    }

    fn remove_from_cart(&self, user_id: i32, recipe_id: i32) -> Result<bool, StoreError> {
        Ok(self.tables().shopping_carts.remove(&(user_id, recipe_id)))
    }

    fn add_favorite(&self, user_id: i32, recipe_id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        tables.check_user_and_recipe(user_id, recipe_id)?;

        Ok(tables.favorites.insert((user_id, recipe_id)))
    }

    fn remove_favorite(&self, user_id: i32, recipe_id: i32) -> Result<bool, StoreError> {
        Ok(self.tables().favorites.remove(&(user_id, recipe_id)))
    }

    fn subscribe(&self, user_id: i32, author_id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        if !tables.has_user(user_id) || !tables.has_user(author_id) {
            return Err(foreign_key("subscriptions_user_id_fkey"));
        }
        if user_id == author_id {
            return Err(StoreError::CheckViolation {
                constraint: "no_self_subscription".to_owned(),
            });
        }

        Ok(tables.subscriptions.insert((user_id, author_id)))
    }

    fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<bool, StoreError> {
        Ok(self.tables().subscriptions.remove(&(user_id, author_id)))
    }
}
