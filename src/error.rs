//! Application error types.

use thiserror::Error;

/// Application-level errors for catalog-migrate.
#[derive(Error, Debug)]
pub enum AppError {
    // MongoDB errors
    #[error("MongoDB error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("BSON conversion error: {0}")]
    Bson(String),

    #[error("Bulk update on '{collection}' failed: {message}")]
    BulkWrite { collection: String, message: String },

    // Document errors
    #[error("Malformed document {id} in '{collection}': {reason}")]
    MalformedDocument {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("Required field '{field}' missing in '{collection}'")]
    MissingField { collection: String, field: String },

    // Migration errors
    #[error("Unknown migration step: {0}")]
    UnknownStep(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a [`AppError::MalformedDocument`] from any displayable id.
    pub fn malformed(
        collection: &str,
        id: impl std::fmt::Display,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::MalformedDocument {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Builds a [`AppError::MissingField`].
    pub fn missing_field(collection: &str, field: &str) -> Self {
        Self::MissingField {
            collection: collection.to_string(),
            field: field.to_string(),
        }
    }
}

impl From<bson::extjson::de::Error> for AppError {
    fn from(err: bson::extjson::de::Error) -> Self {
        Self::Bson(err.to_string())
    }
}
