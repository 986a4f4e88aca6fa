//! Core domain for updating custom fields on tracker issues from a build.
//!
//! This crate contains the orchestration logic, the newtype identifiers and
//! value types it works with, and the port traits it calls out through.
//! Infrastructure crates implement the traits defined here; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; the `jira` and `cli` crates define *how* to
//! supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`IssueKey`, `SiteName`, `RunId`) |
//! | [`fields`] | Field id normalization and validation, `FieldValue`, `FieldUpdate` |
//! | [`environment`] | Build environment snapshot and variable expansion |
//! | [`types`] | Run context, run result, failure policy, step report |
//! | [`errors`] | Step-level and per-issue remote error types |
//! | [`ports`] | `IssueSelector`, `IssueSite`, `IssueSession`, `BuildLog` |
//! | [`step`] | The `FieldUpdateStep` orchestrator |

pub mod environment;
pub mod errors;
pub mod fields;
pub mod identifiers;
pub mod ports;
pub mod step;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use environment::BuildEnvironment;
pub use errors::{RemoteError, RemoteErrorKind, StepError};
pub use fields::{
    normalize_field_id, validate_field_id, FieldId, FieldIdValidation, FieldUpdate, FieldValue,
    CUSTOM_FIELD_PREFIX,
};
pub use identifiers::{IssueKey, IssueKeySet, RunId, SiteName};
pub use ports::{BuildLog, IssueSelector, IssueSession, IssueSite};
pub use step::{parse_flag, FieldUpdateStep};
pub use types::{
    IssueFailurePolicy, IssueOutcome, IssueStatus, RunContext, RunResult, StepReport, Timestamp,
};
