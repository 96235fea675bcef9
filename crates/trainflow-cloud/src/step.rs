//! Step gate for the provisioning walkthrough
//!
//! Every step goes through the same gate, in a fixed order: precondition
//! check, discovery, confirmation, creation. A missing precondition returns
//! before discovery runs, so a gated-out step has no side effects at all.

use crate::confirm::Confirm;
use crate::context::ProvisionContext;
use crate::error::Result;
use async_trait::async_trait;

/// A single link in the provisioning chain.
///
/// Implementations describe one resource: how to recognize it, and
/// (optionally) how to create it. The gate in [`run_step`] owns the control
/// flow; steps never prompt or halt on their own.
#[async_trait]
pub trait ProvisionStep: Send + Sync {
    /// Step name shown in narratives and halt messages.
    fn name(&self) -> &str;

    /// Names of the context fields this step needs before it can run.
    ///
    /// An empty list means the precondition is met. Non-empty halts the run
    /// before discovery is attempted.
    fn missing_prerequisites(&self, ctx: &ProvisionContext) -> Vec<&'static str>;

    /// Look up the resource with the provider.
    ///
    /// `Some` adopts the discovered identifiers into the returned context;
    /// downstream steps cannot tell a discovered resource from a freshly
    /// created one.
    async fn discover(&self, ctx: &ProvisionContext) -> Result<Option<ProvisionContext>>;

    /// Prompt shown before creation.
    ///
    /// `None` marks a discovery-only step; an absent resource then halts the
    /// run instead of offering creation.
    fn creation_prompt(&self, ctx: &ProvisionContext) -> Option<String>;

    /// Create the resource. Only called after a confirmed prompt.
    async fn create(&self, ctx: &ProvisionContext) -> Result<ProvisionContext>;
}

/// Why the walkthrough stopped early.
///
/// Halts are user-guided outcomes, not failures: the caller prints guidance
/// and exits normally. Provider failures travel as errors instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// Required identifiers from earlier steps are missing.
    MissingPrerequisite(Vec<&'static str>),

    /// The user declined the creation prompt.
    Declined,

    /// The resource does not exist and the step cannot create it.
    NotFound,
}

/// Result of driving a single step through the gate.
#[derive(Debug)]
pub enum StepOutcome {
    /// The resource already existed; its identifiers were adopted.
    Found(ProvisionContext),

    /// The resource was created after a confirmed prompt.
    Created(ProvisionContext),

    /// The step halted the run.
    Halt(HaltReason),
}

/// Result of driving the full step sequence.
#[derive(Debug)]
pub enum WalkOutcome {
    /// Every step resolved; the context carries all identifiers.
    Completed(ProvisionContext),

    /// A step halted the run. `ctx` holds what had been resolved so far.
    Halted {
        step: String,
        reason: HaltReason,
        ctx: ProvisionContext,
    },
}

/// Drive one step through the gate.
pub async fn run_step(
    step: &dyn ProvisionStep,
    ctx: &ProvisionContext,
    confirm: &dyn Confirm,
) -> Result<StepOutcome> {
    let missing = step.missing_prerequisites(ctx);
    if !missing.is_empty() {
        return Ok(StepOutcome::Halt(HaltReason::MissingPrerequisite(missing)));
    }

    if let Some(found) = step.discover(ctx).await? {
        tracing::debug!(step = step.name(), "resource already exists");
        return Ok(StepOutcome::Found(found));
    }

    let Some(prompt) = step.creation_prompt(ctx) else {
        return Ok(StepOutcome::Halt(HaltReason::NotFound));
    };

    if !confirm.confirm(&prompt)? {
        return Ok(StepOutcome::Halt(HaltReason::Declined));
    }

    let created = step.create(ctx).await?;
    tracing::debug!(step = step.name(), "resource created");
    Ok(StepOutcome::Created(created))
}

/// Drive the full sequence, threading the context from step to step.
///
/// Steps run strictly in order; a halt stops the sequence and leaves every
/// resource created so far in place.
pub async fn run_steps(
    steps: &[Box<dyn ProvisionStep>],
    ctx: ProvisionContext,
    confirm: &dyn Confirm,
) -> Result<WalkOutcome> {
    let mut ctx = ctx;

    for step in steps {
        match run_step(step.as_ref(), &ctx, confirm).await? {
            StepOutcome::Found(next) | StepOutcome::Created(next) => ctx = next,
            StepOutcome::Halt(reason) => {
                return Ok(WalkOutcome::Halted {
                    step: step.name().to_string(),
                    reason,
                    ctx,
                });
            }
        }
    }

    Ok(WalkOutcome::Completed(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::{AssumeYes, DenyAll};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Step stub with observable discovery/creation counters.
    struct StubStep {
        required: Vec<&'static str>,
        exists: bool,
        creatable: bool,
        discover_calls: AtomicUsize,
        create_calls: AtomicUsize,
    }

    impl StubStep {
        fn new(exists: bool) -> Self {
            Self {
                required: Vec::new(),
                exists,
                creatable: true,
                discover_calls: AtomicUsize::new(0),
                create_calls: AtomicUsize::new(0),
            }
        }

        fn requiring(mut self, fields: Vec<&'static str>) -> Self {
            self.required = fields;
            self
        }

        fn discovery_only(mut self) -> Self {
            self.creatable = false;
            self
        }
    }

    #[async_trait]
    impl ProvisionStep for StubStep {
        fn name(&self) -> &str {
            "stub"
        }

        fn missing_prerequisites(&self, ctx: &ProvisionContext) -> Vec<&'static str> {
            ctx.missing(&self.required)
        }

        async fn discover(&self, ctx: &ProvisionContext) -> Result<Option<ProvisionContext>> {
            self.discover_calls.fetch_add(1, Ordering::SeqCst);
            if self.exists {
                Ok(Some(ctx.clone().with_compute_target("discovered")))
            } else {
                Ok(None)
            }
        }

        fn creation_prompt(&self, _ctx: &ProvisionContext) -> Option<String> {
            self.creatable.then(|| "Create stub?".to_string())
        }

        async fn create(&self, ctx: &ProvisionContext) -> Result<ProvisionContext> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(ctx.clone().with_compute_target("created"))
        }
    }

    #[tokio::test]
    async fn test_missing_prerequisite_halts_without_side_effects() {
        let step = StubStep::new(false).requiring(vec!["resource-group"]);
        let outcome = run_step(&step, &ProvisionContext::new(), &AssumeYes)
            .await
            .unwrap();

        match outcome {
            StepOutcome::Halt(HaltReason::MissingPrerequisite(missing)) => {
                assert_eq!(missing, vec!["resource-group"]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(step.discover_calls.load(Ordering::SeqCst), 0);
        assert_eq!(step.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_existing_resource_is_adopted_without_creation() {
        let step = StubStep::new(true);
        let outcome = run_step(&step, &ProvisionContext::new(), &DenyAll)
            .await
            .unwrap();

        match outcome {
            StepOutcome::Found(ctx) => {
                assert_eq!(ctx.compute_target.as_deref(), Some("discovered"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(step.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirmed_creation() {
        let step = StubStep::new(false);
        let outcome = run_step(&step, &ProvisionContext::new(), &AssumeYes)
            .await
            .unwrap();

        match outcome {
            StepOutcome::Created(ctx) => {
                assert_eq!(ctx.compute_target.as_deref(), Some("created"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(step.discover_calls.load(Ordering::SeqCst), 1);
        assert_eq!(step.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_declined_creation_halts() {
        let step = StubStep::new(false);
        let outcome = run_step(&step, &ProvisionContext::new(), &DenyAll)
            .await
            .unwrap();

        assert!(matches!(outcome, StepOutcome::Halt(HaltReason::Declined)));
        assert_eq!(step.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_discovery_only_step_halts_when_absent() {
        let step = StubStep::new(false).discovery_only();
        let outcome = run_step(&step, &ProvisionContext::new(), &AssumeYes)
            .await
            .unwrap();

        assert!(matches!(outcome, StepOutcome::Halt(HaltReason::NotFound)));
    }

    #[tokio::test]
    async fn test_sequence_threads_context_and_stops_at_halt() {
        let steps: Vec<Box<dyn ProvisionStep>> = vec![
            Box::new(StubStep::new(true)),
            Box::new(StubStep::new(false)),
            Box::new(StubStep::new(true)),
        ];

        let outcome = run_steps(&steps, ProvisionContext::new(), &DenyAll)
            .await
            .unwrap();

        match outcome {
            WalkOutcome::Halted { step, reason, ctx } => {
                assert_eq!(step, "stub");
                assert_eq!(reason, HaltReason::Declined);
                // First step resolved before the halt
                assert_eq!(ctx.compute_target.as_deref(), Some("discovered"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sequence_completes_when_all_resolve() {
        let steps: Vec<Box<dyn ProvisionStep>> = vec![
            Box::new(StubStep::new(true)),
            Box::new(StubStep::new(false)),
        ];

        let outcome = run_steps(&steps, ProvisionContext::new(), &AssumeYes)
            .await
            .unwrap();

        match outcome {
            WalkOutcome::Completed(ctx) => {
                assert_eq!(ctx.compute_target.as_deref(), Some("created"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rerun_over_existing_resources_is_idempotent() {
        // Two runs over an already-provisioned chain: both resolve by
        // discovery, creation is never attempted.
        for _ in 0..2 {
            let step = StubStep::new(true);
            let outcome = run_step(&step, &ProvisionContext::new(), &DenyAll)
                .await
                .unwrap();

            assert!(matches!(outcome, StepOutcome::Found(_)));
            assert_eq!(step.create_calls.load(Ordering::SeqCst), 0);
        }
    }
}
