use diesel::prelude::*;
use lombok::AllArgsConstructor;

use crate::services::short_link::short_link_path;

#[derive(Queryable, Selectable, Identifiable, AllArgsConstructor, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::database::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: i32,
    pub author_id: i32,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub short_code: String,
}

pub fn recipe_path(recipe_id: i32) -> String {
    format!("/recipes/{recipe_id}/")
}

impl Recipe {
    pub fn path(&self) -> String {
        recipe_path(self.id)
    }

    pub fn short_link_path(&self) -> String {
        short_link_path(&self.short_code)
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct NewRecipeRow<'a> {
    pub author_id: i32,
    pub name: &'a str,
    pub text: &'a str,
    pub cooking_time: i32,
    pub short_code: &'a str,
}
