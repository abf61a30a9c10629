use std::ops::Deref;

use sqlx::PgPool;

/// A handle to the Postgres pool backing the application. Query and command
/// structs own one of these and dereference it to run statements.
#[derive(Clone)]
pub struct PostgresConnection(PgPool);

impl PostgresConnection {
    pub fn new(pool: PgPool) -> Self {
        Self(pool)
    }
}

impl Deref for PostgresConnection {
    type Target = PgPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
