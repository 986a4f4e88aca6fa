//! Jira infrastructure adapter.
//!
//! Implements the tracker-facing traits defined in the [`updater`] crate
//! (`IssueSite`, `IssueSession`) over the Jira REST API (v2) using `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. URL handling,
//! authentication headers, payload encoding, and translation of HTTP answers
//! into [`updater::RemoteError`] live here; the [`updater`] crate never sees
//! them.

pub mod session;
pub mod site;

pub use session::JiraSession;
pub use site::{Credentials, JiraSite, SiteConfig, SiteConfigError, DEFAULT_TIMEOUT};
