use std::{fs, io::Write, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::{info, trace_span};

use crate::{
    app::{config::Config, error::AppError},
    database::store::{Store, StoreError},
    services::{
        recipes::{IngredientAmount, NewRecipe, RecipePublisher},
        shopping_list::{
            render, render_json, ShoppingListAggregator, SHOPPING_LIST_CONTENT_TYPE,
            SHOPPING_LIST_FILE_NAME,
        },
        short_link::{resolve_short_link, short_link_url, ShortCode, ShortCodeGenerator},
        user_lists::{self, UserList},
    },
};

#[derive(Parser, Debug)]
#[command(name = "foodgram")]
#[command(version, about = "Recipe backend core: shopping lists, publishing and short links")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Aggregated shopping list of everything in a user's cart
    ShoppingList {
        #[arg(long)]
        user: i32,

        /// File to write; a directory gets `shopping_list.txt` inside it
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Emit the aggregated lines as JSON
        #[arg(long)]
        json: bool,
    },

    /// Publish a recipe under a fresh short code
    Publish {
        #[arg(long)]
        author: i32,

        #[arg(long)]
        name: String,

        #[arg(long)]
        text: String,

        /// Minutes
        #[arg(long)]
        cooking_time: i32,

        /// `<ingredient id>:<amount>`, repeat for each ingredient
        #[arg(long = "ingredient", required = true)]
        ingredients: Vec<IngredientAmount>,
    },

    /// Print the short link of a recipe
    ShortLink {
        #[arg(long)]
        recipe: i32,
    },

    /// Print the recipe a short code points to
    Resolve { code: ShortCode },

    /// Shopping cart membership
    #[command(subcommand)]
    Cart(ListAction),

    /// Favorite recipes
    #[command(subcommand)]
    Favorite(ListAction),

    Subscribe(SubscriptionArgs),

    Unsubscribe(SubscriptionArgs),
}

#[derive(Subcommand, Debug)]
pub enum ListAction {
    Add(ListArgs),
    Remove(ListArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub user: i32,

    #[arg(long)]
    pub recipe: i32,
}

#[derive(Args, Debug)]
pub struct SubscriptionArgs {
    #[arg(long)]
    pub user: i32,

    #[arg(long)]
    pub author: i32,
}

impl Cli {
    pub fn execute<S>(self, store: &S, config: &Config, out: &mut impl Write) -> Result<(), AppError>
    where
        S: Store + ?Sized,
    {
        let span = trace_span!("executing command");
        let _guard = span.enter();

        match self.command {
            Commands::ShoppingList { user, output, json } => {
                let lines = ShoppingListAggregator::new(store).collect(user)?;
                let report = if json {
                    render_json(&lines)?
                } else {
                    render(&lines)
                };

                match output {
                    Some(path) => {
                        let path = if path.is_dir() {
                            path.join(SHOPPING_LIST_FILE_NAME)
                        } else {
                            path
                        };
                        fs::write(&path, &report)?;
                        info!(
                            content_type = SHOPPING_LIST_CONTENT_TYPE,
                            "Wrote {} lines to {}",
                            lines.len(),
                            path.display()
                        );
                        writeln!(out, "{}", path.display())?;
                    }
                    None => writeln!(out, "{report}")?,
                }
            }

            Commands::Publish {
                author,
                name,
                text,
                cooking_time,
                ingredients,
            } => {
                let generator = ShortCodeGenerator::with_length(config.short_code_length)?;
                let recipe = NewRecipe::new(author, name, text, cooking_time, ingredients);

                let created = RecipePublisher::new(generator).publish(store, &recipe)?;

                writeln!(out, "{}", site_link(config, &created.path()))?;
                writeln!(out, "{}", site_link(config, &created.short_link_path()))?;
            }

            Commands::ShortLink { recipe } => {
                let recipe = store
                    .find_recipe(recipe)?
                    .ok_or_else(|| StoreError::NotFound(format!("recipe {recipe}")))?;

                writeln!(out, "{}", short_link_url(&config.site_url, &recipe.short_code))?;
            }

            Commands::Resolve { code } => {
                let recipe = resolve_short_link(store, &code)?;

                writeln!(out, "{}", site_link(config, &recipe.path()))?;
            }

            Commands::Cart(action) => action.execute(store, UserList::ShoppingCart, out)?,

            Commands::Favorite(action) => action.execute(store, UserList::Favorites, out)?,

            Commands::Subscribe(SubscriptionArgs { user, author }) => {
                let author = user_lists::subscribe(store, user, author)?;
                writeln!(out, "Subscribed to {}", author.username)?;
            }

            Commands::Unsubscribe(SubscriptionArgs { user, author }) => {
                crate::services::user_lists::unsubscribe(store, user, author)?;
                writeln!(out, "Unsubscribed from author {author}")?;
            }
        }

        Ok(())
    }
}

impl ListAction {
    fn execute<S>(self, store: &S, list: UserList, out: &mut impl Write) -> Result<(), AppError>
    where
        S: Store + ?Sized,
    {
        match self {
            Self::Add(ListArgs { user, recipe }) => {
                let recipe = user_lists::add_recipe(store, list, user, recipe)?;
                writeln!(out, "Added '{}' to the {list}", recipe.name)?;
            }
            Self::Remove(ListArgs { user, recipe }) => {
                crate::services::user_lists::remove_recipe(store, list, user, recipe)?;
                writeln!(out, "Removed recipe {recipe} from the {list}")?;
            }
        }

        Ok(())
    }
}

fn site_link(config: &Config, path: &str) -> String {
    format!("{}{path}", config.site_url.trim_end_matches('/'))
}
