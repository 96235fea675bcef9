//! Azure ML provider for trainflow
//!
//! Wraps the `az` CLI (with its `ml` extension) and implements the
//! provisioning chain as [`trainflow_cloud::ProvisionStep`]s:
//! resource group, workspace, compute target, dataset, environment.

pub mod azcli;
pub mod dataset;
pub mod error;
pub mod provider;

pub use azcli::{AzCli, CreateComputeConfig, SubmitConfig};
pub use dataset::{DatasetDefinition, default_definition};
pub use error::{AzureError, Result};
pub use provider::{
    ComputeTargetStep, DatasetSelector, DatasetStep, EnvironmentStep, ResourceGroupStep,
    WorkspaceStep,
};
