mod access;
pub use access::{Access, AccessTarget, authorize, check_access};

mod database;
pub use database::DbConnection;

pub mod entity;

mod error;
pub use error::{DatabaseError, DatabaseResult};

mod repo;
pub use repo::{CrudRepository, ResourceType, ResourceTyped};

pub mod stats;

use sqlx::{PgPool, Postgres, Transaction};

#[derive(Debug, Clone)]
pub struct ModelManager {
    database: DbConnection,
}

impl ModelManager {
    pub fn new(conn: DbConnection) -> Self {
        Self { database: conn }
    }

    pub fn executor(&self) -> &PgPool {
        self.database.pool()
    }

    /// Opens a transaction; dropping it without `commit` rolls everything back.
    pub async fn begin(&self) -> DatabaseResult<Transaction<'static, Postgres>> {
        let tx = self.database.pool().begin().await?;
        Ok(tx)
    }
}
