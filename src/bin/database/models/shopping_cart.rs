use diesel::prelude::*;
use lombok::AllArgsConstructor;

#[derive(Queryable, Selectable, Insertable, AllArgsConstructor, Debug, PartialEq, Eq, Hash, Clone)]
#[diesel(table_name = crate::database::schema::shopping_carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
// Recipe queued for the user's shopping list
pub struct CartEntry {
    pub user_id: i32,
    pub recipe_id: i32,
}
