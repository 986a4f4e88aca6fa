//! Error types for the field update step.
//!
//! [`StepError`] covers conditions that abort the step itself. [`RemoteError`]
//! is the per-issue failure returned by an [`crate::IssueSession`]; the
//! orchestrator classifies it with [`RemoteError::kind`] and never lets it
//! escape the batch loop.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Remote (per-issue) errors
// ---------------------------------------------------------------------------

/// Classification of a failed submission, derived from the remote status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// HTTP 404: the issue does not exist or is not visible.
    NotFound,
    /// HTTP 403: the account may not edit the issue.
    Forbidden,
    /// HTTP 401: the credentials were rejected.
    Unauthorized,
    /// Any other status, or no status at all (transport failure).
    Other,
}

impl RemoteErrorKind {
    /// Maps an optional HTTP status code onto a classification.
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(404) => Self::NotFound,
            Some(403) => Self::Forbidden,
            Some(401) => Self::Unauthorized,
            _ => Self::Other,
        }
    }
}

/// A failed call against the remote tracker.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct RemoteError {
    /// HTTP status returned by the tracker; `None` when no response arrived.
    pub status: Option<u16>,
    /// Human-readable description of the failure.
    pub message: String,
}

impl RemoteError {
    /// Creates an error for a response that carried `status`.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates an error for a call that produced no response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> RemoteErrorKind {
        RemoteErrorKind::from_status(self.status)
    }
}

// ---------------------------------------------------------------------------
// Step-level errors
// ---------------------------------------------------------------------------

/// Errors that abort a step execution before any issue is touched.
///
/// Connectivity problems (no site, no session) are deliberately not here: they
/// mark the run failed and return normally.
#[derive(Debug, Error)]
pub enum StepError {
    /// The step was configured without an issue selection strategy.
    #[error("[Jira][IssueFieldUpdateStep] No issue selector found!")]
    NoIssueSelector,
}
