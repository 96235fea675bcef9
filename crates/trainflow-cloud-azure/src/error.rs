//! Azure provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("az CLI not found. Please install: https://aka.ms/install-azure-cli")]
    AzNotFound,

    #[error("No active az account. Please run: az login")]
    NotLoggedIn,

    #[error("az command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("{count} {kind} entries are named '{name}'; expected at most one")]
    Ambiguous {
        kind: &'static str,
        name: String,
        count: usize,
    },

    #[error("Dataset '{0}' was registered but cannot be resolved by name")]
    DatasetInconsistent(String),

    #[error("Dataset definition has no registration name: {0}")]
    DefinitionMissingName(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cloud error: {0}")]
    CloudError(#[from] trainflow_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, AzureError>;
