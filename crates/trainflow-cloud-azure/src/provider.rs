//! Azure ML provisioning steps
//!
//! One [`ProvisionStep`] per link of the chain. Steps only know how to
//! discover and create their resource; ordering, confirmation and halting
//! live in the trainflow-cloud gate.

use crate::azcli::{AzCli, CreateComputeConfig};
use crate::dataset;
use crate::error::AzureError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use trainflow_cloud::{
    CloudError, EnvironmentQuery, ProvisionContext, ProvisionStep, select_environment,
};

type Result<T> = trainflow_cloud::Result<T>;

fn to_cloud(e: AzureError) -> CloudError {
    match e {
        AzureError::Ambiguous { kind, name, count } => CloudError::AmbiguousResource {
            kind: kind.to_string(),
            name,
            count,
        },
        AzureError::AzNotFound | AzureError::NotLoggedIn => {
            CloudError::AuthenticationFailed(e.to_string())
        }
        other => CloudError::ApiError(other.to_string()),
    }
}

fn require<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str> {
    field
        .as_deref()
        .ok_or_else(|| CloudError::InvalidConfig(format!("context field '{name}' is unresolved")))
}

/// Resource group step
pub struct ResourceGroupStep {
    az: Arc<AzCli>,
    name: String,
    location: String,
}

impl ResourceGroupStep {
    pub fn new(az: Arc<AzCli>, name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            az,
            name: name.into(),
            location: location.into(),
        }
    }
}

#[async_trait]
impl ProvisionStep for ResourceGroupStep {
    fn name(&self) -> &str {
        "resource-group"
    }

    fn missing_prerequisites(&self, _ctx: &ProvisionContext) -> Vec<&'static str> {
        Vec::new()
    }

    async fn discover(&self, ctx: &ProvisionContext) -> Result<Option<ProvisionContext>> {
        match self.az.get_group(&self.name).await.map_err(to_cloud)? {
            Some(group) => Ok(Some(ctx.clone().with_resource_group(group.name))),
            None => Ok(None),
        }
    }

    fn creation_prompt(&self, _ctx: &ProvisionContext) -> Option<String> {
        Some(format!(
            "リソースグループ '{}' が見つかりません。{} に作成しますか？",
            self.name, self.location
        ))
    }

    async fn create(&self, ctx: &ProvisionContext) -> Result<ProvisionContext> {
        let group = self
            .az
            .create_group(&self.name, &self.location)
            .await
            .map_err(to_cloud)?;
        Ok(ctx.clone().with_resource_group(group.name))
    }
}

/// Workspace step
pub struct WorkspaceStep {
    az: Arc<AzCli>,
    name: String,
}

impl WorkspaceStep {
    pub fn new(az: Arc<AzCli>, name: impl Into<String>) -> Self {
        Self {
            az,
            name: name.into(),
        }
    }
}

#[async_trait]
impl ProvisionStep for WorkspaceStep {
    fn name(&self) -> &str {
        "workspace"
    }

    fn missing_prerequisites(&self, ctx: &ProvisionContext) -> Vec<&'static str> {
        ctx.missing(&["resource-group"])
    }

    async fn discover(&self, ctx: &ProvisionContext) -> Result<Option<ProvisionContext>> {
        let resource_group = require(&ctx.resource_group, "resource-group")?;

        match self
            .az
            .get_workspace(resource_group, &self.name)
            .await
            .map_err(to_cloud)?
        {
            Some(workspace) => Ok(Some(ctx.clone().with_workspace(workspace.name))),
            None => Ok(None),
        }
    }

    fn creation_prompt(&self, ctx: &ProvisionContext) -> Option<String> {
        let resource_group = ctx.resource_group.as_deref().unwrap_or("?");
        Some(format!(
            "ワークスペース '{}' が見つかりません。リソースグループ '{}' に作成しますか？",
            self.name, resource_group
        ))
    }

    async fn create(&self, ctx: &ProvisionContext) -> Result<ProvisionContext> {
        let resource_group = require(&ctx.resource_group, "resource-group")?;

        let workspace = self
            .az
            .create_workspace(resource_group, &self.name)
            .await
            .map_err(to_cloud)?;
        Ok(ctx.clone().with_workspace(workspace.name))
    }
}

/// Compute target step (AmlCompute)
pub struct ComputeTargetStep {
    az: Arc<AzCli>,
    name: String,
    vm_size: String,
    max_nodes: u32,
}

impl ComputeTargetStep {
    pub fn new(
        az: Arc<AzCli>,
        name: impl Into<String>,
        vm_size: impl Into<String>,
        max_nodes: u32,
    ) -> Self {
        Self {
            az,
            name: name.into(),
            vm_size: vm_size.into(),
            max_nodes,
        }
    }
}

#[async_trait]
impl ProvisionStep for ComputeTargetStep {
    fn name(&self) -> &str {
        "compute-target"
    }

    fn missing_prerequisites(&self, ctx: &ProvisionContext) -> Vec<&'static str> {
        ctx.missing(&["resource-group", "workspace"])
    }

    async fn discover(&self, ctx: &ProvisionContext) -> Result<Option<ProvisionContext>> {
        let resource_group = require(&ctx.resource_group, "resource-group")?;
        let workspace = require(&ctx.workspace, "workspace")?;

        match self
            .az
            .get_compute_target(resource_group, workspace, &self.name)
            .await
            .map_err(to_cloud)?
        {
            Some(target) => Ok(Some(ctx.clone().with_compute_target(target.name))),
            None => Ok(None),
        }
    }

    fn creation_prompt(&self, _ctx: &ProvisionContext) -> Option<String> {
        Some(format!(
            "コンピュートターゲット '{}' が見つかりません。作成しますか？ (VM: {}, 0〜{} ノード)",
            self.name, self.vm_size, self.max_nodes
        ))
    }

    async fn create(&self, ctx: &ProvisionContext) -> Result<ProvisionContext> {
        let resource_group = require(&ctx.resource_group, "resource-group")?;
        let workspace = require(&ctx.workspace, "workspace")?;

        let config = CreateComputeConfig {
            name: self.name.clone(),
            vm_size: self.vm_size.clone(),
            min_nodes: 0,
            max_nodes: self.max_nodes,
            idle_seconds_before_scaledown: Some(1800),
        };

        let target = self
            .az
            .create_compute_target(resource_group, workspace, &config)
            .await
            .map_err(to_cloud)?;
        Ok(ctx.clone().with_compute_target(target.name))
    }
}

/// How the user selected a dataset
#[derive(Debug, Clone)]
pub enum DatasetSelector {
    /// Registered dataset ID, adopted as-is
    Id(String),

    /// Registration name; if absent, a generated default definition is
    /// offered for registration under this name
    Name(String),

    /// Definition file; if the named dataset is absent it is registered
    /// from this file
    File(PathBuf),
}

/// Dataset step
pub struct DatasetStep {
    az: Arc<AzCli>,
    selector: DatasetSelector,
}

impl DatasetStep {
    pub fn new(az: Arc<AzCli>, selector: DatasetSelector) -> Self {
        Self { az, selector }
    }

    async fn resolve_registered(
        &self,
        ctx: &ProvisionContext,
        name: &str,
    ) -> Result<Option<ProvisionContext>> {
        let resource_group = require(&ctx.resource_group, "resource-group")?;
        let workspace = require(&ctx.workspace, "workspace")?;

        match self
            .az
            .get_dataset(resource_group, workspace, name)
            .await
            .map_err(to_cloud)?
        {
            Some(dataset) => Ok(Some(ctx.clone().with_dataset_id(dataset.id))),
            None => Ok(None),
        }
    }

    /// Register, then re-resolve by name. Registration and resolution are
    /// not atomic; a missing dataset after a successful registration is a
    /// fatal inconsistency, never retried.
    async fn register_and_resolve(
        &self,
        ctx: &ProvisionContext,
        name: &str,
        definition_file: &std::path::Path,
    ) -> Result<ProvisionContext> {
        let resource_group = require(&ctx.resource_group, "resource-group")?;
        let workspace = require(&ctx.workspace, "workspace")?;

        self.az
            .register_dataset(resource_group, workspace, definition_file)
            .await
            .map_err(to_cloud)?;

        match self.resolve_registered(ctx, name).await? {
            Some(resolved) => Ok(resolved),
            None => Err(to_cloud(AzureError::DatasetInconsistent(name.to_string()))),
        }
    }
}

#[async_trait]
impl ProvisionStep for DatasetStep {
    fn name(&self) -> &str {
        "dataset"
    }

    fn missing_prerequisites(&self, ctx: &ProvisionContext) -> Vec<&'static str> {
        ctx.missing(&["resource-group", "workspace"])
    }

    async fn discover(&self, ctx: &ProvisionContext) -> Result<Option<ProvisionContext>> {
        match &self.selector {
            DatasetSelector::Id(id) => {
                tracing::debug!(dataset_id = %id, "adopting dataset by id");
                Ok(Some(ctx.clone().with_dataset_id(id)))
            }
            DatasetSelector::Name(name) => self.resolve_registered(ctx, name).await,
            DatasetSelector::File(path) => {
                let definition = dataset::read_definition(path).await.map_err(to_cloud)?;
                self.resolve_registered(ctx, definition.registration_name())
                    .await
            }
        }
    }

    fn creation_prompt(&self, _ctx: &ProvisionContext) -> Option<String> {
        match &self.selector {
            DatasetSelector::Id(_) => None,
            DatasetSelector::Name(name) => Some(format!(
                "データセット '{}' が未登録です。デフォルト定義 (MNIST) で登録しますか？",
                name
            )),
            DatasetSelector::File(path) => Some(format!(
                "定義ファイル {} からデータセットを登録しますか？",
                path.display()
            )),
        }
    }

    async fn create(&self, ctx: &ProvisionContext) -> Result<ProvisionContext> {
        match &self.selector {
            DatasetSelector::Id(_) => {
                unreachable!("dataset ids are adopted during discovery")
            }
            DatasetSelector::Name(name) => {
                let definition = dataset::default_definition(name);
                let file = std::env::temp_dir().join(format!("trainflow-{name}-dataset.json"));
                dataset::write_definition(&file, &definition)
                    .await
                    .map_err(to_cloud)?;

                self.register_and_resolve(ctx, name, &file).await
            }
            DatasetSelector::File(path) => {
                let definition = dataset::read_definition(path).await.map_err(to_cloud)?;
                self.register_and_resolve(ctx, definition.registration_name(), path)
                    .await
            }
        }
    }
}

/// Environment step (discovery-only)
pub struct EnvironmentStep {
    az: Arc<AzCli>,
    query: EnvironmentQuery,
}

impl EnvironmentStep {
    pub fn new(az: Arc<AzCli>, query: EnvironmentQuery) -> Self {
        Self { az, query }
    }
}

#[async_trait]
impl ProvisionStep for EnvironmentStep {
    fn name(&self) -> &str {
        "environment"
    }

    fn missing_prerequisites(&self, ctx: &ProvisionContext) -> Vec<&'static str> {
        ctx.missing(&["resource-group", "workspace"])
    }

    async fn discover(&self, ctx: &ProvisionContext) -> Result<Option<ProvisionContext>> {
        let resource_group = require(&ctx.resource_group, "resource-group")?;
        let workspace = require(&ctx.workspace, "workspace")?;

        let environments = self
            .az
            .list_environments(resource_group, workspace)
            .await
            .map_err(to_cloud)?;
        let names: Vec<String> = environments.into_iter().map(|e| e.name).collect();

        // Zero matches carries the candidate list up as a typed error
        let selected = select_environment(&self.query, &names)?;
        Ok(Some(ctx.clone().with_environment(selected)))
    }

    fn creation_prompt(&self, _ctx: &ProvisionContext) -> Option<String> {
        None
    }

    async fn create(&self, _ctx: &ProvisionContext) -> Result<ProvisionContext> {
        unreachable!("environments are never created by the walkthrough")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn az() -> Arc<AzCli> {
        Arc::new(AzCli::new(None))
    }

    #[test]
    fn test_step_preconditions() {
        let ctx = ProvisionContext::new();

        let workspace = WorkspaceStep::new(az(), "ml-ws");
        assert_eq!(
            workspace.missing_prerequisites(&ctx),
            vec!["resource-group"]
        );

        let compute = ComputeTargetStep::new(az(), "cpu1", "STANDARD_DS2_V2", 4);
        assert_eq!(
            compute.missing_prerequisites(&ctx),
            vec!["resource-group", "workspace"]
        );

        let resolved = ctx.with_resource_group("ml-rg").with_workspace("ml-ws");
        assert!(compute.missing_prerequisites(&resolved).is_empty());
    }

    #[test]
    fn test_dataset_by_id_has_no_creation_prompt() {
        let step = DatasetStep::new(az(), DatasetSelector::Id("ds-123".to_string()));
        assert!(step.creation_prompt(&ProvisionContext::new()).is_none());
    }

    #[test]
    fn test_dataset_by_name_offers_default_definition() {
        let step = DatasetStep::new(az(), DatasetSelector::Name("mnist".to_string()));
        let prompt = step.creation_prompt(&ProvisionContext::new()).unwrap();
        assert!(prompt.contains("mnist"));
        assert!(prompt.contains("MNIST"));
    }

    #[test]
    fn test_environment_step_is_discovery_only() {
        let step = EnvironmentStep::new(az(), EnvironmentQuery::Fuzzy("TF".to_string()));
        assert!(step.creation_prompt(&ProvisionContext::new()).is_none());
    }

    #[tokio::test]
    async fn test_dataset_by_id_is_adopted_without_provider_calls() {
        let step = DatasetStep::new(az(), DatasetSelector::Id("ds-123".to_string()));
        let ctx = ProvisionContext::new()
            .with_resource_group("ml-rg")
            .with_workspace("ml-ws");

        let resolved = step.discover(&ctx).await.unwrap().unwrap();
        assert_eq!(resolved.dataset_id.as_deref(), Some("ds-123"));
    }
}
