//! Accumulated identifiers threaded through the walkthrough
//!
//! The context is the only state shared between steps. Steps receive it by
//! reference and return an updated copy; nothing is mutated in place, so a
//! halted run can always report exactly what had been resolved so far.

use serde::{Deserialize, Serialize};

/// Identifiers resolved by the steps that have run so far.
///
/// A field is `Some` once the resource it names has been discovered or
/// created. Sub-resource fields are only meaningful while their parent
/// fields are set; the step gate enforces that ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionContext {
    /// Subscription ID, when pinned explicitly (otherwise the CLI default)
    pub subscription: Option<String>,

    /// Resource group name
    pub resource_group: Option<String>,

    /// Workspace name
    pub workspace: Option<String>,

    /// Compute target name
    pub compute_target: Option<String>,

    /// Registered dataset ID
    pub dataset_id: Option<String>,

    /// Resolved environment name
    pub environment: Option<String>,

    /// Experiment name for submission
    pub experiment: Option<String>,
}

impl ProvisionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscription(mut self, id: impl Into<String>) -> Self {
        self.subscription = Some(id.into());
        self
    }

    pub fn with_resource_group(mut self, name: impl Into<String>) -> Self {
        self.resource_group = Some(name.into());
        self
    }

    pub fn with_workspace(mut self, name: impl Into<String>) -> Self {
        self.workspace = Some(name.into());
        self
    }

    pub fn with_compute_target(mut self, name: impl Into<String>) -> Self {
        self.compute_target = Some(name.into());
        self
    }

    pub fn with_dataset_id(mut self, id: impl Into<String>) -> Self {
        self.dataset_id = Some(id.into());
        self
    }

    pub fn with_environment(mut self, name: impl Into<String>) -> Self {
        self.environment = Some(name.into());
        self
    }

    pub fn with_experiment(mut self, name: impl Into<String>) -> Self {
        self.experiment = Some(name.into());
        self
    }

    /// Names of the given fields that are still unresolved.
    ///
    /// Used by steps to express their preconditions; the returned names are
    /// the ones shown in the halt message.
    pub fn missing(&self, required: &[&'static str]) -> Vec<&'static str> {
        required
            .iter()
            .filter(|field| !self.is_set(field))
            .copied()
            .collect()
    }

    fn is_set(&self, field: &str) -> bool {
        match field {
            "subscription" => self.subscription.is_some(),
            "resource-group" => self.resource_group.is_some(),
            "workspace" => self.workspace.is_some(),
            "compute-target" => self.compute_target.is_some(),
            "dataset-id" => self.dataset_id.is_some(),
            "environment" => self.environment.is_some(),
            "experiment" => self.experiment.is_some(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_returns_updated_copy() {
        let ctx = ProvisionContext::new();
        let updated = ctx.clone().with_resource_group("ml-rg");

        assert_eq!(ctx.resource_group, None);
        assert_eq!(updated.resource_group, Some("ml-rg".to_string()));
    }

    #[test]
    fn test_missing_reports_unresolved_fields() {
        let ctx = ProvisionContext::new().with_resource_group("ml-rg");

        let missing = ctx.missing(&["resource-group", "workspace", "compute-target"]);
        assert_eq!(missing, vec!["workspace", "compute-target"]);
    }

    #[test]
    fn test_missing_empty_when_all_set() {
        let ctx = ProvisionContext::new()
            .with_resource_group("ml-rg")
            .with_workspace("ml-ws");

        assert!(ctx.missing(&["resource-group", "workspace"]).is_empty());
    }
}
