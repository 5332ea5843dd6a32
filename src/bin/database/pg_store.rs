use diesel::{
    delete, insert_into,
    r2d2::{ConnectionManager, PooledConnection},
    PgConnection,
};
use lombok::AllArgsConstructor;
use tracing::{trace, trace_span};

use crate::{
    database::{
        connection::PgPool,
        models::{
            favorite::Favorite, recipe::NewRecipeRow, recipe::Recipe,
            recipe_ingredient::RecipeIngredient, shopping_cart::CartEntry,
            subscription::Subscription, user::User,
        },
        store::{ShortCodeLookup, Store, StoreError},
    },
    services::{recipes::NewRecipe, shopping_list::AggregatedLine, short_link::ShortCode},
};

#[derive(AllArgsConstructor)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    fn connection(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, StoreError> {
        Ok(self.pool.get()?)
    }
}

impl ShortCodeLookup for PgStore {
    fn exists_short_code(&self, code: &str) -> Result<bool, StoreError> {
        use crate::database::schema::recipes;
        use diesel::dsl::exists;
        use diesel::prelude::*;

        let mut connection = self.connection()?;

        let taken = diesel::select(exists(recipes::table.filter(recipes::short_code.eq(code))))
            .get_result::<bool>(&mut connection)?;

        Ok(taken)
    }
}

impl Store for PgStore {
    fn sum_amounts_by_ingredient_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<AggregatedLine>, StoreError> {
        use crate::database::schema::{ingredients, recipe_ingredients, shopping_carts};
        use diesel::dsl::sum;
        use diesel::prelude::*;

        let span = trace_span!("summing cart ingredients", user_id);
        let _guard = span.enter();

        let mut connection = self.connection()?;

        let rows: Vec<(String, String, Option<i64>)> = shopping_carts::table
            .inner_join(
                recipe_ingredients::table
                    .on(recipe_ingredients::recipe_id.eq(shopping_carts::recipe_id)),
            )
            .inner_join(
                ingredients::table.on(ingredients::id.eq(recipe_ingredients::ingredient_id)),
            )
            .filter(shopping_carts::user_id.eq(user_id))
            .group_by((ingredients::name, ingredients::measurement_unit))
            .select((
                ingredients::name,
                ingredients::measurement_unit,
                sum(recipe_ingredients::amount),
            ))
            .order_by((ingredients::name.asc(), ingredients::measurement_unit.asc()))
            .load(&mut connection)?;

        trace!("Loaded {} grouped rows", rows.len());

        Ok(rows
            .into_iter()
            .map(|(name, measurement_unit, total)| {
                AggregatedLine::new(name, measurement_unit, total.unwrap_or_default())
            })
            .collect())
    }

    fn insert_recipe(
        &self,
        recipe: &NewRecipe,
        short_code: &ShortCode,
    ) -> Result<Recipe, StoreError> {
        use crate::database::schema::{recipe_ingredients, recipes};
        use diesel::prelude::*;

        let span = trace_span!("inserting recipe", %short_code);
        let _guard = span.enter();

        let mut connection = self.connection()?;

        let row = NewRecipeRow {
            author_id: recipe.author_id,
            name: &recipe.name,
            text: &recipe.text,
            cooking_time: recipe.cooking_time,
            short_code: short_code.as_str(),
        };

        // Nests as a savepoint when the caller already opened a transaction
        let created = connection.transaction(|connection| {
            let created = insert_into(recipes::table)
                .values(&row)
                .returning(Recipe::as_returning())
                .get_result::<Recipe>(connection)?;

            let lines: Vec<_> = recipe
                .ingredients
                .iter()
                .map(|line| RecipeIngredient::new(created.id, line.ingredient_id, line.amount))
                .collect();

            insert_into(recipe_ingredients::table)
                .values(&lines)
                .execute(connection)?;

            QueryResult::Ok(created)
        })?;

        Ok(created)
    }

    fn find_recipe(&self, recipe_id: i32) -> Result<Option<Recipe>, StoreError> {
        use crate::database::schema::recipes;
        use diesel::prelude::*;

        let mut connection = self.connection()?;

        let recipe = recipes::table
            .find(recipe_id)
            .select(Recipe::as_select())
            .first(&mut connection)
            .optional()?;

        Ok(recipe)
    }

    fn find_recipe_by_short_code(&self, code: &ShortCode) -> Result<Option<Recipe>, StoreError> {
        use crate::database::schema::recipes;
        use diesel::prelude::*;

        let mut connection = self.connection()?;

        let recipe = recipes::table
            .filter(recipes::short_code.eq(code.as_str()))
            .select(Recipe::as_select())
            .first(&mut connection)
            .optional()?;

        Ok(recipe)
    }

    fn find_user(&self, user_id: i32) -> Result<Option<User>, StoreError> {
        use crate::database::schema::users;
        use diesel::prelude::*;

        let mut connection = self.connection()?;

        let user = users::table
            .find(user_id)
            .select(User::as_select())
            .first(&mut connection)
            .optional()?;

        Ok(user)
    }

    fn add_to_cart(&self, user_id: i32, recipe_id: i32) -> Result<bool, StoreError> {
        use crate::database::schema::shopping_carts;
        use diesel::prelude::*;

        let mut connection = self.connection()?;

        let inserted = insert_into(shopping_carts::table)
            .values(CartEntry::new(user_id, recipe_id))
            .on_conflict_do_nothing()
            .execute(&mut connection)?;

        Ok(inserted > 0)
    }

    fn remove_from_cart(&self, user_id: i32, recipe_id: i32) -> Result<bool, StoreError> {
        use crate::database::schema::shopping_carts;
        use diesel::prelude::*;

        let mut connection = self.connection()?;

        let deleted = delete(shopping_carts::table.find((user_id, recipe_id)))
            .execute(&mut connection)?;

        Ok(deleted > 0)
    }

    fn add_favorite(&self, user_id: i32, recipe_id: i32) -> Result<bool, StoreError> {
        use crate::database::schema::favorites;
        use diesel::prelude::*;

        let mut connection = self.connection()?;

        let inserted = insert_into(favorites::table)
            .values(Favorite::new(user_id, recipe_id))
            .on_conflict_do_nothing()
            .execute(&mut connection)?;

        Ok(inserted > 0)
    }

    fn remove_favorite(&self, user_id: i32, recipe_id: i32) -> Result<bool, StoreError> {
        use crate::database::schema::favorites;
        use diesel::prelude::*;

        let mut connection = self.connection()?;

        let deleted =
            delete(favorites::table.find((user_id, recipe_id))).execute(&mut connection)?;

        Ok(deleted > 0)
    }

    fn subscribe(&self, user_id: i32, author_id: i32) -> Result<bool, StoreError> {
        use crate::database::schema::subscriptions;
        use diesel::prelude::*;

        let mut connection = self.connection()?;

        let inserted = insert_into(subscriptions::table)
            .values(Subscription::new(user_id, author_id))
            .on_conflict_do_nothing()
            .execute(&mut connection)?;

        Ok(inserted > 0)
    }

    fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<bool, StoreError> {
        use crate::database::schema::subscriptions;
        use diesel::prelude::*;

        let mut connection = self.connection()?;

        let deleted = delete(subscriptions::table.find((user_id, author_id)))
            .execute(&mut connection)?;

        Ok(deleted > 0)
    }
}
