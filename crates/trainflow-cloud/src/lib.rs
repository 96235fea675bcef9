//! Step-gated provisioning engine
//!
//! Models a provisioning walkthrough as a fixed, ordered sequence of steps.
//! Each step discovers an existing resource or, after explicit confirmation,
//! creates it. A missing prerequisite or a declined confirmation halts the
//! whole run; resources created by earlier steps are left in place and are
//! idempotent to reuse on the next run.

pub mod confirm;
pub mod context;
pub mod error;
pub mod select;
pub mod step;

pub use confirm::{AssumeYes, Confirm, DenyAll};
pub use context::ProvisionContext;
pub use error::{CloudError, Result};
pub use select::{EnvironmentQuery, select_environment};
pub use step::{HaltReason, ProvisionStep, StepOutcome, WalkOutcome, run_step, run_steps};
