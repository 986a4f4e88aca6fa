//! Shared value types for a field update step execution.
//!
//! [`RunContext`] is what the host hands the step; [`StepReport`] is what the
//! step hands back. Neither outlives a single execution.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BuildEnvironment, FieldUpdate, IssueKey, IssueSite, RemoteErrorKind, RunId};

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Terminal result of the build run the step executes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunResult {
    /// Nothing has failed the run (yet).
    #[default]
    Success,
    /// The run has been marked failed.
    Failure,
}

/// Whether per-issue failures escalate to a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueFailurePolicy {
    /// Per-issue failures are logged and otherwise ignored.
    #[default]
    Tolerate,
    /// After every issue has been attempted, any failure marks the run failed.
    FailRun,
}

/// Host-supplied context for one step execution.
pub struct RunContext {
    id: RunId,
    environment: BuildEnvironment,
    site: Option<Arc<dyn IssueSite>>,
    result: RunResult,
}

impl RunContext {
    /// Creates a context for a fresh run with a random [`RunId`].
    pub fn new(environment: BuildEnvironment, site: Option<Arc<dyn IssueSite>>) -> Self {
        Self {
            id: RunId::new_random(),
            environment,
            site,
            result: RunResult::Success,
        }
    }

    /// Identifier of this run.
    pub fn id(&self) -> RunId {
        self.id
    }

    /// Variables visible to the run.
    pub fn environment(&self) -> &BuildEnvironment {
        &self.environment
    }

    /// The tracker site configured for the run, if any.
    pub fn site(&self) -> Option<Arc<dyn IssueSite>> {
        self.site.clone()
    }

    /// Current terminal result.
    pub fn result(&self) -> RunResult {
        self.result
    }

    /// Marks the run failed. There is no way back to success.
    pub fn mark_failed(&mut self) {
        self.result = RunResult::Failure;
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What happened to one issue in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IssueStatus {
    /// The update was accepted.
    Updated,
    /// The update was rejected or never reached the tracker.
    Failed {
        /// Classification of the failure.
        kind: RemoteErrorKind,
        /// Description reported by the session.
        message: String,
    },
}

/// Outcome of a single submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueOutcome {
    /// The issue the update was submitted to.
    pub issue: IssueKey,
    /// Result of the submission.
    #[serde(flatten)]
    pub status: IssueStatus,
}

/// Summary of one step execution that did not abort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// The run this report belongs to.
    pub run_id: RunId,
    /// When the step started.
    pub started_at: Timestamp,
    /// When the step finished.
    pub finished_at: Timestamp,
    /// The update submitted to every issue; `None` if the step never got that far.
    pub update: Option<FieldUpdate>,
    /// One entry per attempted issue, in submission order.
    pub outcomes: Vec<IssueOutcome>,
}

impl StepReport {
    /// Number of issues that accepted the update.
    pub fn updated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == IssueStatus::Updated)
            .count()
    }

    /// Number of issues whose update failed.
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.updated_count()
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
