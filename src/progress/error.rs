use thiserror::Error;

use crate::model::{DatabaseError, ResourceType};

pub type ProgressResult<T> = std::result::Result<T, ProgressError>;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("{0:?} not found")]
    NotFound(ResourceType),
    #[error("user is already enrolled in this level")]
    AlreadyEnrolled,
    #[error("user is not enrolled in this level")]
    NotEnrolled,
    #[error("video has no progress entry for this enrollment")]
    VideoNotAccessible,
    #[error("final exam is locked until every video is completed")]
    FinalExamLocked,
    #[error("access to this enrollment is forbidden")]
    Forbidden,
    #[error("unknown exam kind: {0}")]
    UnknownExamKind(String),
    #[error("storage error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for ProgressError {
    fn from(value: sqlx::Error) -> Self {
        Self::Database(DatabaseError::SqlxError(value))
    }
}
