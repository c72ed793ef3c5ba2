use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Store error: {0}")]
    Store(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid value for field '{field}': {source}")]
    InvalidField {
        field: String,
        #[source]
        source: Box<HistoryError>,
    },

    #[error("Entity not found in '{table}': {id}")]
    EntityNotFound { table: String, id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type HistoryResult<T> = Result<T, HistoryError>;
