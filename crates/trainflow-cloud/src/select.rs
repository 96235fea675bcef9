//! Environment selection
//!
//! Environments are looked up, never created: either an exact name match or
//! a substring match that picks the lexicographically greatest candidate.
//! Curated environment names carry their version as a trailing sortable
//! token, so the greatest match is the newest version.

use crate::error::{CloudError, Result};

/// How the user asked for an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentQuery {
    /// Exact, case-sensitive name.
    Exact(String),

    /// Substring match; the lexicographically greatest match wins.
    Fuzzy(String),
}

impl EnvironmentQuery {
    pub fn as_str(&self) -> &str {
        match self {
            EnvironmentQuery::Exact(s) | EnvironmentQuery::Fuzzy(s) => s,
        }
    }
}

/// Resolve `query` against the available environment names.
///
/// Zero matches is an error carrying the full candidate list, so the caller
/// can show the user what exists.
pub fn select_environment(query: &EnvironmentQuery, available: &[String]) -> Result<String> {
    let selected = match query {
        EnvironmentQuery::Exact(name) => available.iter().find(|candidate| *candidate == name),
        EnvironmentQuery::Fuzzy(fragment) => available
            .iter()
            .filter(|candidate| candidate.contains(fragment.as_str()))
            .max(),
    };

    selected
        .cloned()
        .ok_or_else(|| CloudError::NoEnvironmentMatch {
            query: query.as_str().to_string(),
            available: available.to_vec(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fuzzy_picks_lexicographically_greatest() {
        let available = candidates(&["Env-1.0", "Env-2.0", "Env-1.5"]);
        let selected =
            select_environment(&EnvironmentQuery::Fuzzy("Env".to_string()), &available).unwrap();
        assert_eq!(selected, "Env-2.0");
    }

    #[test]
    fn test_fuzzy_ignores_non_matching_candidates() {
        let available = candidates(&["TF-2.4", "PyTorch-1.9", "TF-2.7"]);
        let selected =
            select_environment(&EnvironmentQuery::Fuzzy("TF".to_string()), &available).unwrap();
        assert_eq!(selected, "TF-2.7");
    }

    #[test]
    fn test_exact_match() {
        let available = candidates(&["TF-2.4", "TF-2.7"]);
        let selected =
            select_environment(&EnvironmentQuery::Exact("TF-2.4".to_string()), &available).unwrap();
        assert_eq!(selected, "TF-2.4");
    }

    #[test]
    fn test_exact_is_case_sensitive() {
        let available = candidates(&["TF-2.4"]);
        let result = select_environment(&EnvironmentQuery::Exact("tf-2.4".to_string()), &available);
        assert!(matches!(result, Err(CloudError::NoEnvironmentMatch { .. })));
    }

    #[test]
    fn test_no_match_carries_candidate_list() {
        let available = candidates(&["TF-2.4", "PyTorch-1.9"]);
        let err = select_environment(&EnvironmentQuery::Fuzzy("Sklearn".to_string()), &available)
            .unwrap_err();

        match err {
            CloudError::NoEnvironmentMatch { query, available } => {
                assert_eq!(query, "Sklearn");
                assert_eq!(available.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
