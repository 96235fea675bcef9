//! az CLI wrapper
//!
//! Wraps the az CLI commands (core and `ml` extension) used by the
//! walkthrough. Every query asks for `--output json` and parses the result
//! with serde; a non-zero exit is surfaced with the exact invocation that
//! failed.

use crate::error::{AzureError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// az CLI wrapper
pub struct AzCli {
    subscription: Option<String>,
}

impl AzCli {
    pub fn new(subscription: Option<String>) -> Self {
        Self { subscription }
    }

    /// Check that az is installed and an account is active
    pub async fn check_auth(&self) -> Result<AccountInfo> {
        // Check if az exists
        let which = Command::new("which").arg("az").output().await?;

        if !which.status.success() {
            return Err(AzureError::AzNotFound);
        }

        match self.run_command(&["account", "show"]).await {
            Ok(output) => {
                let account: AccountInfo = serde_json::from_str(&output)?;
                Ok(account)
            }
            Err(AzureError::CommandFailed { .. }) => Err(AzureError::NotLoggedIn),
            Err(e) => Err(e),
        }
    }

    /// Run an az command and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("az");
        cmd.args(args);
        cmd.arg("--output").arg("json");
        if let Some(ref subscription) = self.subscription {
            cmd.arg("--subscription").arg(subscription);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: az {}", args.join(" "));

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AzureError::CommandFailed {
                command: format!("az {}", args.join(" ")),
                stderr: stderr.to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Parse a JSON list, treating empty output as an empty list
    fn parse_list<T: serde::de::DeserializeOwned>(output: &str) -> Result<Vec<T>> {
        if output.trim().is_empty() || output.trim() == "[]" {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(output)?)
    }

    /// List all resource groups
    pub async fn list_groups(&self) -> Result<Vec<ResourceGroupInfo>> {
        let output = self.run_command(&["group", "list"]).await?;
        Self::parse_list(&output)
    }

    /// Get resource group by name
    pub async fn get_group(&self, name: &str) -> Result<Option<ResourceGroupInfo>> {
        let groups = self.list_groups().await?;
        find_unique("resource group", name, groups, |g| g.name.as_str())
    }

    /// Create a resource group
    pub async fn create_group(&self, name: &str, location: &str) -> Result<ResourceGroupInfo> {
        let output = self
            .run_command(&["group", "create", "--name", name, "--location", location])
            .await?;

        let group: ResourceGroupInfo = serde_json::from_str(&output)?;
        Ok(group)
    }

    /// List workspaces in a resource group
    pub async fn list_workspaces(&self, resource_group: &str) -> Result<Vec<WorkspaceInfo>> {
        let output = self
            .run_command(&["ml", "workspace", "list", "--resource-group", resource_group])
            .await?;
        Self::parse_list(&output)
    }

    /// Get workspace by name
    pub async fn get_workspace(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Option<WorkspaceInfo>> {
        let workspaces = self.list_workspaces(resource_group).await?;
        find_unique("workspace", name, workspaces, |w| w.name.as_str())
    }

    /// Create a workspace
    pub async fn create_workspace(&self, resource_group: &str, name: &str) -> Result<WorkspaceInfo> {
        let output = self
            .run_command(&[
                "ml",
                "workspace",
                "create",
                "--workspace-name",
                name,
                "--resource-group",
                resource_group,
            ])
            .await?;

        let workspace: WorkspaceInfo = serde_json::from_str(&output)?;
        Ok(workspace)
    }

    /// List compute targets in a workspace
    pub async fn list_compute_targets(
        &self,
        resource_group: &str,
        workspace: &str,
    ) -> Result<Vec<ComputeTargetInfo>> {
        let output = self
            .run_command(&[
                "ml",
                "computetarget",
                "list",
                "--resource-group",
                resource_group,
                "--workspace-name",
                workspace,
            ])
            .await?;
        Self::parse_list(&output)
    }

    /// Get compute target by name
    pub async fn get_compute_target(
        &self,
        resource_group: &str,
        workspace: &str,
        name: &str,
    ) -> Result<Option<ComputeTargetInfo>> {
        let targets = self.list_compute_targets(resource_group, workspace).await?;
        find_unique("compute target", name, targets, |t| t.name.as_str())
    }

    /// Create an AmlCompute cluster
    pub async fn create_compute_target(
        &self,
        resource_group: &str,
        workspace: &str,
        config: &CreateComputeConfig,
    ) -> Result<ComputeTargetInfo> {
        // Store string conversions to extend their lifetime
        let min_nodes_str = config.min_nodes.to_string();
        let max_nodes_str = config.max_nodes.to_string();
        let idle_str = config.idle_seconds_before_scaledown.map(|s| s.to_string());

        let mut args = vec![
            "ml",
            "computetarget",
            "create",
            "amlcompute",
            "--name",
            config.name.as_str(),
            "--resource-group",
            resource_group,
            "--workspace-name",
            workspace,
            "--vm-size",
            config.vm_size.as_str(),
            "--min-nodes",
            min_nodes_str.as_str(),
            "--max-nodes",
            max_nodes_str.as_str(),
        ];

        if let Some(ref idle) = idle_str {
            args.push("--idle-seconds-before-scaledown");
            args.push(idle.as_str());
        }

        let output = self.run_command(&args).await?;

        let target: ComputeTargetInfo = serde_json::from_str(&output)?;
        Ok(target)
    }

    /// List registered datasets in a workspace
    pub async fn list_datasets(
        &self,
        resource_group: &str,
        workspace: &str,
    ) -> Result<Vec<DatasetInfo>> {
        let output = self
            .run_command(&[
                "ml",
                "dataset",
                "list",
                "--resource-group",
                resource_group,
                "--workspace-name",
                workspace,
            ])
            .await?;
        Self::parse_list(&output)
    }

    /// Get dataset by registration name
    pub async fn get_dataset(
        &self,
        resource_group: &str,
        workspace: &str,
        name: &str,
    ) -> Result<Option<DatasetInfo>> {
        let datasets = self.list_datasets(resource_group, workspace).await?;
        find_unique("dataset", name, datasets, |d| d.name.as_str())
    }

    /// Register a dataset from a definition file
    ///
    /// Registration and resolution are separate calls; callers re-resolve
    /// the dataset by name afterwards to obtain its identifier.
    pub async fn register_dataset(
        &self,
        resource_group: &str,
        workspace: &str,
        definition_file: &Path,
    ) -> Result<()> {
        let file = definition_file.display().to_string();

        self.run_command(&[
            "ml",
            "dataset",
            "register",
            "--file",
            file.as_str(),
            "--resource-group",
            resource_group,
            "--workspace-name",
            workspace,
            "--skip-validation",
        ])
        .await?;

        Ok(())
    }

    /// List environments registered in a workspace
    pub async fn list_environments(
        &self,
        resource_group: &str,
        workspace: &str,
    ) -> Result<Vec<EnvironmentInfo>> {
        let output = self
            .run_command(&[
                "ml",
                "environment",
                "list",
                "--resource-group",
                resource_group,
                "--workspace-name",
                workspace,
            ])
            .await?;
        Self::parse_list(&output)
    }

    /// Submit a training run from a persisted run configuration
    pub async fn submit_run(&self, config: &SubmitConfig) -> Result<RunInfo> {
        let runconfig = config.runconfig_file.display().to_string();

        let output = self
            .run_command(&[
                "ml",
                "run",
                "submit-script",
                "--experiment-name",
                config.experiment.as_str(),
                "--resource-group",
                config.resource_group.as_str(),
                "--workspace-name",
                config.workspace.as_str(),
                "--run-configuration-file",
                runconfig.as_str(),
                config.script.as_str(),
            ])
            .await?;

        let run: RunInfo = serde_json::from_str(&output)?;
        Ok(run)
    }
}

/// Exact-name lookup over a listing.
///
/// Zero matches is `None`; more than one is an error rather than an
/// arbitrary first-match pick.
fn find_unique<T>(
    kind: &'static str,
    name: &str,
    items: Vec<T>,
    item_name: impl Fn(&T) -> &str,
) -> Result<Option<T>> {
    let mut matches: Vec<T> = items
        .into_iter()
        .filter(|item| item_name(item) == name)
        .collect();

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        count => Err(AzureError::Ambiguous {
            kind,
            name: name.to_string(),
            count,
        }),
    }
}

/// Active account from `az account show`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: String,
    pub name: String,
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: Option<String>,
}

/// Resource group from `az group list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGroupInfo {
    pub id: Option<String>,
    pub name: String,
    pub location: String,
}

/// Workspace from `az ml workspace list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    #[serde(rename = "workspaceName", alias = "name")]
    pub name: String,

    #[serde(rename = "resourceGroup", default)]
    pub resource_group: Option<String>,

    #[serde(default)]
    pub id: Option<String>,
}

/// Compute target from `az ml computetarget list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeTargetInfo {
    pub name: String,

    #[serde(rename = "computeType", default)]
    pub compute_type: Option<String>,

    #[serde(rename = "provisioningState", default)]
    pub provisioning_state: Option<String>,

    #[serde(rename = "vmSize", default)]
    pub vm_size: Option<String>,
}

impl ComputeTargetInfo {
    /// Check if provisioning has finished
    pub fn is_ready(&self) -> bool {
        self.provisioning_state.as_deref() == Some("Succeeded")
    }
}

/// Registered dataset from `az ml dataset list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub version: Option<u32>,
}

/// Environment from `az ml environment list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub name: String,

    #[serde(default)]
    pub version: Option<String>,
}

/// Submitted run from `az ml run submit-script`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    #[serde(rename = "runId")]
    pub run_id: String,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(rename = "webPortalUrl", default)]
    pub web_portal_url: Option<String>,
}

/// Configuration for creating an AmlCompute cluster
#[derive(Debug, Clone)]
pub struct CreateComputeConfig {
    pub name: String,
    pub vm_size: String,
    pub min_nodes: u32,
    pub max_nodes: u32,
    pub idle_seconds_before_scaledown: Option<u32>,
}

/// Parameters for submitting a run
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    pub resource_group: String,
    pub workspace: String,
    pub experiment: String,
    pub runconfig_file: std::path::PathBuf,
    pub script: String,
}
