//! Repository-layer error type, mapped onto `common::AppError` at the
//! service boundary.

use common::AppError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("corrupt stored record: {0}")]
    Corrupt(String),
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => AppError::NotFound(msg),
            DbError::Sqlx(e) => AppError::Internal(e.to_string()),
            DbError::Corrupt(msg) => AppError::Internal(msg),
        }
    }
}
