pub mod accounts;
pub mod devices;

use sqlx::PgPool;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}
