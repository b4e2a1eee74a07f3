//! Error types for the database tool

use formforge::{ConnectionError, FormError, SchemaError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbToolError {
    #[error("Database URL not provided. Use --database-url or set FORMFORGE__DATABASE__URL or DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("Failed to connect: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Invalid form configuration: {0}")]
    Schema(#[from] SchemaError),

    #[error("Database error: {0}")]
    Database(#[from] FormError),

    #[error("Failed to set up table \"{table}\": {source}")]
    Setup { table: String, source: FormError },

    #[error("Health check failed: {0}")]
    HealthCheck(String),
}

pub type Result<T> = std::result::Result<T, DbToolError>;
