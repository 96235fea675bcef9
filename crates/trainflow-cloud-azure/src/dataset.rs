//! Dataset definition files
//!
//! Declarative descriptions handed to `az ml dataset register`. The default
//! definition points at the public MNIST blobs so a first walkthrough works
//! without any data preparation.

use crate::error::{AzureError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source files for the generated default definition
const MNIST_PATHS: &[&str] = &[
    "https://azureopendatastorage.blob.core.windows.net/mnist/train-images-idx3-ubyte.gz",
    "https://azureopendatastorage.blob.core.windows.net/mnist/train-labels-idx1-ubyte.gz",
    "https://azureopendatastorage.blob.core.windows.net/mnist/t10k-images-idx3-ubyte.gz",
    "https://azureopendatastorage.blob.core.windows.net/mnist/t10k-labels-idx1-ubyte.gz",
];

/// Declarative dataset description
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDefinition {
    /// "File" or "Tabular"
    pub dataset_type: String,

    pub parameters: DatasetParameters,

    pub registration: DatasetRegistration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetParameters {
    /// Source locations (local paths or URLs)
    pub path: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRegistration {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DatasetDefinition {
    /// Registration name, required to resolve the dataset after registering
    pub fn registration_name(&self) -> &str {
        &self.registration.name
    }
}

/// Generate the default file-dataset definition for `name`
pub fn default_definition(name: &str) -> DatasetDefinition {
    DatasetDefinition {
        dataset_type: "File".to_string(),
        parameters: DatasetParameters {
            path: MNIST_PATHS.iter().map(|p| p.to_string()).collect(),
        },
        registration: DatasetRegistration {
            name: name.to_string(),
            description: Some("MNIST handwritten digits (public blobs)".to_string()),
        },
    }
}

/// Read a definition file
pub async fn read_definition(path: &Path) -> Result<DatasetDefinition> {
    let content = tokio::fs::read_to_string(path).await?;
    let definition: DatasetDefinition = serde_json::from_str(&content)?;

    if definition.registration.name.trim().is_empty() {
        return Err(AzureError::DefinitionMissingName(
            path.display().to_string(),
        ));
    }

    Ok(definition)
}

/// Write a definition file
pub async fn write_definition(path: &Path, definition: &DatasetDefinition) -> Result<()> {
    let content = serde_json::to_string_pretty(definition)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_definition() {
        let definition = default_definition("mnist");
        assert_eq!(definition.dataset_type, "File");
        assert_eq!(definition.registration_name(), "mnist");
        assert_eq!(definition.parameters.path.len(), 4);
        assert!(definition.parameters.path[0].starts_with("https://"));
    }

    #[test]
    fn test_definition_serializes_camel_case() {
        let definition = default_definition("mnist");
        let json = serde_json::to_string_pretty(&definition).unwrap();
        assert!(json.contains("\"datasetType\""));
        assert!(json.contains("\"registration\""));
    }

    #[tokio::test]
    async fn test_definition_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mnist-dataset.json");

        let definition = default_definition("mnist");
        write_definition(&path, &definition).await.unwrap();

        let loaded = read_definition(&path).await.unwrap();
        assert_eq!(loaded.registration_name(), "mnist");
        assert_eq!(loaded.parameters.path, definition.parameters.path);
    }

    #[tokio::test]
    async fn test_definition_without_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");

        tokio::fs::write(
            &path,
            r#"{"datasetType": "File", "parameters": {"path": []}, "registration": {"name": ""}}"#,
        )
        .await
        .unwrap();

        let err = read_definition(&path).await.unwrap_err();
        assert!(matches!(err, AzureError::DefinitionMissingName(_)));
    }
}
