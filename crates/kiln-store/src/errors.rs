use thiserror::Error;

/// Represents an error from the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("store is full: {0}")]
    Full(String),

    #[error("stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("invalid value: {0}")]
    Invalid(String),

    #[error("an I/O error occurred")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
