use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use tracing::{trace, trace_span};

use crate::app::config::Config;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub fn establish_pooled_connection(config: &Config) -> Result<PgPool, PoolError> {
    let span = trace_span!("establishing pooled connection");
    let _guard = span.enter();

    trace!("Creating manager");
    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

    trace!("Creating pool");
    Pool::builder()
        .max_size(config.pool_size)
        .build(manager)
}
