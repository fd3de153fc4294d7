use std::fmt;

use mnemos_core::CoreError;

#[derive(Debug)]
pub enum StoreError {
    /// A referenced pattern id is not in the store.
    NotFound(String),
    /// A pattern payload or stored row failed validation.
    Validation(String),
    /// A threshold, rate, weight or dimension outside its admissible range.
    InvalidParameter(String),
    Storage(rusqlite::Error),
    Config(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "pattern not found: {id}"),
            StoreError::Validation(msg) => write!(f, "validation error: {msg}"),
            StoreError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            StoreError::Storage(e) => write!(f, "SQLite error: {e}"),
            StoreError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Storage(e)
    }
}

impl From<CoreError> for StoreError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidParameter(msg) => StoreError::InvalidParameter(msg),
            CoreError::Validation(msg) => StoreError::Validation(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
