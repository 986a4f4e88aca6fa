//! Issue selector backed by an explicit list of keys.

use async_trait::async_trait;
use updater::{BuildLog, IssueKey, IssueKeySet, IssueSelector, IssueSite, RunContext};

/// Selects exactly the configured keys.
///
/// Each key is expanded against the run environment (so `$JIRA_ISSUE` works)
/// and trimmed; keys that end up empty are dropped.
#[derive(Debug, Clone)]
pub struct ExplicitIssueSelector {
    keys: Vec<String>,
}

impl ExplicitIssueSelector {
    /// Creates a selector for `keys`.
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl IssueSelector for ExplicitIssueSelector {
    async fn find_issue_keys(
        &self,
        run: &RunContext,
        _site: &dyn IssueSite,
        _log: &dyn BuildLog,
    ) -> IssueKeySet {
        self.keys
            .iter()
            .filter_map(|raw| IssueKey::new(run.environment().expand(raw).trim()))
            .collect()
    }
}
