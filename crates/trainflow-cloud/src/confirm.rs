//! Confirmation capability for the step gate
//!
//! The gate never reads the terminal directly; every creation prompt goes
//! through this trait so the walkthrough can run under tests, `--yes`, or
//! an interactive prompt supplied by the binary.

/// Yes/no confirmation seam.
pub trait Confirm: Send + Sync {
    /// Present `prompt` and return whether the user agreed.
    fn confirm(&self, prompt: &str) -> std::io::Result<bool>;
}

/// Answers yes to everything (`--yes`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> std::io::Result<bool> {
        Ok(true)
    }
}

/// Answers no to everything.
pub struct DenyAll;

impl Confirm for DenyAll {
    fn confirm(&self, _prompt: &str) -> std::io::Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assume_yes() {
        assert!(AssumeYes.confirm("create?").unwrap());
    }

    #[test]
    fn test_deny_all() {
        assert!(!DenyAll.confirm("create?").unwrap());
    }
}
