use std::str::FromStr;

use itertools::Itertools;
use lombok::AllArgsConstructor;
use rand::{rngs::ThreadRng, Rng};
use thiserror::Error;
use tracing::{info, trace_span, warn};

use crate::{
    database::{
        models::recipe::Recipe,
        store::{Store, StoreError, SHORT_CODE_CONSTRAINT},
    },
    services::short_link::ShortCodeGenerator,
};

pub const MIN_INGREDIENT_AMOUNT: i32 = 1;
/// Minutes.
pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 1440;
pub const MAX_LENGTH_RECIPE_NAME: usize = 256;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("A recipe needs at least one ingredient")]
    NoIngredients,

    #[error("Ingredient {0} is listed more than once")]
    DuplicateIngredient(i32),

    #[error("Amount {amount} of ingredient {ingredient_id} is below {min}", min = MIN_INGREDIENT_AMOUNT)]
    AmountTooSmall { ingredient_id: i32, amount: i32 },

    #[error("Cooking time {0} is outside {min}..={max} minutes", min = MIN_COOKING_TIME, max = MAX_COOKING_TIME)]
    CookingTimeOutOfRange(i32),

    #[error("Recipe name must be 1 to {max} characters", max = MAX_LENGTH_RECIPE_NAME)]
    InvalidName,

    #[error("Recipe text is empty")]
    EmptyText,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(AllArgsConstructor, Debug, Clone, PartialEq, Eq)]
pub struct IngredientAmount {
    pub ingredient_id: i32,
    pub amount: i32,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Expected <ingredient id>:<amount>, got '{0}'")]
pub struct IngredientAmountParseError(String);

/// Parses `<ingredient id>:<amount>`, e.g. `12:200`.
impl FromStr for IngredientAmount {
    type Err = IngredientAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || IngredientAmountParseError(s.to_owned());

        let (ingredient_id, amount) = s.split_once(':').ok_or_else(error)?;

        Ok(Self {
            ingredient_id: ingredient_id.trim().parse().map_err(|_| error())?,
            amount: amount.trim().parse().map_err(|_| error())?,
        })
    }
}

#[derive(AllArgsConstructor, Debug, Clone)]
pub struct NewRecipe {
    pub author_id: i32,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmount>,
}

impl NewRecipe {
    pub fn validate(&self) -> Result<(), RecipeError> {
        let name_length = self.name.trim().chars().count();
        if name_length == 0 || self.name.chars().count() > MAX_LENGTH_RECIPE_NAME {
            return Err(RecipeError::InvalidName);
        }
        if self.text.trim().is_empty() {
            return Err(RecipeError::EmptyText);
        }
        if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&self.cooking_time) {
            return Err(RecipeError::CookingTimeOutOfRange(self.cooking_time));
        }
        if self.ingredients.is_empty() {
            return Err(RecipeError::NoIngredients);
        }
        if let Some(ingredient_id) = self
            .ingredients
            .iter()
            .map(|line| line.ingredient_id)
            .duplicates()
            .next()
        {
            return Err(RecipeError::DuplicateIngredient(ingredient_id));
        }
        if let Some(line) = self
            .ingredients
            .iter()
            .find(|line| line.amount < MIN_INGREDIENT_AMOUNT)
        {
            return Err(RecipeError::AmountTooSmall {
                ingredient_id: line.ingredient_id,
                amount: line.amount,
            });
        }

        Ok(())
    }
}

/// Persists new recipes under a freshly drawn short code.
pub struct RecipePublisher<R = ThreadRng> {
    generator: ShortCodeGenerator<R>,
}

impl<R: Rng> RecipePublisher<R> {
    pub fn new(generator: ShortCodeGenerator<R>) -> Self {
        Self { generator }
    }

    /// Validates, draws a code and inserts. When the insert loses the code
    /// to a concurrent writer, a new code is drawn and the insert retried;
    /// any other failure is returned as is.
    pub fn publish<S>(&mut self, store: &S, recipe: &NewRecipe) -> Result<Recipe, RecipeError>
    where
        S: Store + ?Sized,
    {
        let span = trace_span!(
            "publishing recipe",
            author_id = recipe.author_id,
            code_length = self.generator.length()
        );
        let _guard = span.enter();

        recipe.validate()?;

        loop {
            let short_code = self.generator.generate_unique(store)?;

            match store.insert_recipe(recipe, &short_code) {
                Ok(created) => {
                    info!(recipe_id = created.id, %short_code, "Published recipe");
                    return Ok(created);
                }
                Err(StoreError::ConstraintViolation { constraint })
                    if constraint == SHORT_CODE_CONSTRAINT =>
                {
                    warn!(%short_code, "Short code was taken before the insert, drawing another");
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
}
