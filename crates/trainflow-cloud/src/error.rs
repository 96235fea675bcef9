//! Provisioning engine error types

use thiserror::Error;

/// Provisioning engine errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("{count} {kind} entries are named '{name}'; names must be unique")]
    AmbiguousResource {
        kind: String,
        name: String,
        count: usize,
    },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("No environment matches '{query}'. Available: {available:?}")]
    NoEnvironmentMatch {
        query: String,
        available: Vec<String>,
    },

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
