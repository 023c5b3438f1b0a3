//! CLI error types

use thiserror::Error;

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] conductor_types::ConductorError),

    #[error("Seed error: {0}")]
    Seed(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
