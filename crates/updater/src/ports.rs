//! Port traits at the boundary between the step and its host.
//!
//! The orchestrator in [`crate::step`] only ever talks to these traits.
//! Infrastructure crates (`jira`, `cli`) provide the implementations; tests use
//! in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{FieldUpdate, IssueKey, IssueKeySet, RemoteError, RunContext, SiteName};

/// Line-oriented, plain-text build log.
///
/// Lines are written as-is; implementations add no formatting of their own.
pub trait BuildLog: Send + Sync {
    /// Appends one line to the log.
    fn line(&self, line: &str);
}

/// An authenticated handle to the remote tracker's API.
#[async_trait]
pub trait IssueSession: Send + Sync {
    /// Applies `updates` to the issue identified by `issue`.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteError`] carrying the HTTP status when the tracker
    /// rejected the call, or no status when the call never got a response.
    async fn apply_field_updates(
        &self,
        issue: &IssueKey,
        updates: &[FieldUpdate],
    ) -> Result<(), RemoteError>;
}

/// A configured remote tracker instance.
pub trait IssueSite: Send + Sync {
    /// Display name used in log lines.
    fn name(&self) -> &SiteName;

    /// Opens a session, or returns `None` when remote access is unavailable.
    fn session(&self) -> Option<Arc<dyn IssueSession>>;
}

/// Strategy that decides which issues a build execution pertains to.
#[async_trait]
pub trait IssueSelector: Send + Sync {
    /// Returns the issue keys relevant to `run`.
    ///
    /// Strategies report their own problems to `log` and return what they
    /// could find; an empty set is a valid answer.
    async fn find_issue_keys(
        &self,
        run: &RunContext,
        site: &dyn IssueSite,
        log: &dyn BuildLog,
    ) -> IssueKeySet;
}
