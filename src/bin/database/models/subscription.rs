use diesel::prelude::*;
use lombok::AllArgsConstructor;

#[derive(Queryable, Selectable, Insertable, AllArgsConstructor, Debug, PartialEq, Eq, Hash, Clone)]
#[diesel(table_name = crate::database::schema::subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Subscription {
    pub user_id: i32,
    pub author_id: i32,
}
