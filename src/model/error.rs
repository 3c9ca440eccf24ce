use thiserror::Error;

pub type DatabaseResult<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("sqlx migrate error: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("sqlx error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

impl DatabaseError {
    /// The statement broke a unique constraint.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::SqlxError(sqlx::Error::Database(e)) if e.is_unique_violation())
    }
}
