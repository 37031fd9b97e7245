//! Error types for the almacen backend.

use thiserror::Error;

/// Result type alias using almacen's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for almacen operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Material not found
    #[error("Material no encontrado: {0}")]
    MaterialNotFound(String),

    /// Catalog entry not found
    #[error("Catálogo no encontrado: {0}")]
    CatalogNotFound(i32),

    /// Attached file not found
    #[error("Archivo no encontrado: {0}")]
    FileNotFound(i32),

    /// Invalid input (caller's fault)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Blob storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
