use thiserror::Error;

/// Failure reported by the users store. Its text is what clients see in the envelope.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
