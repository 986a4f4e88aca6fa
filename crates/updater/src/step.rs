//! The field update step: resolve issues, build one update, apply it to each.
//!
//! [`FieldUpdateStep::perform`] is the only entry point. It distinguishes three
//! failure classes:
//!
//! | Condition | Effect |
//! |-----------|--------|
//! | no selector configured | `Err(StepError::NoIssueSelector)` |
//! | no site, or site has no session | run marked failed, `Ok` with an empty report |
//! | a single issue rejects the update | logged, recorded, batch continues |
//!
//! Submissions are strictly sequential: each one is awaited before the next
//! starts.

use std::sync::Arc;

use tracing::{info, info_span, instrument, warn, Instrument};

use crate::{
    normalize_field_id, BuildEnvironment, BuildLog, FieldUpdate, IssueFailurePolicy, IssueKey,
    IssueOutcome, IssueSelector, IssueSession, IssueStatus, RemoteErrorKind, RunContext,
    StepError, StepReport, Timestamp,
};

const LOG_PREFIX: &str = "[Jira][IssueFieldUpdateStep]";

/// Parses a boolean-as-string setting: `"true"` in any letter case is `true`,
/// everything else is `false`.
pub fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Configured step that writes one custom field on every selected issue.
pub struct FieldUpdateStep {
    selector: Option<Arc<dyn IssueSelector>>,
    field_id: String,
    field_value: String,
    field_type_multiple: bool,
    failure_policy: IssueFailurePolicy,
}

impl FieldUpdateStep {
    /// Creates a step.
    ///
    /// `field_type_multiple` is the raw boolean-as-string setting; see
    /// [`parse_flag`].
    pub fn new(
        selector: Option<Arc<dyn IssueSelector>>,
        field_id: impl Into<String>,
        field_value: impl Into<String>,
        field_type_multiple: &str,
    ) -> Self {
        Self {
            selector,
            field_id: field_id.into(),
            field_value: field_value.into(),
            field_type_multiple: parse_flag(field_type_multiple),
            failure_policy: IssueFailurePolicy::default(),
        }
    }

    /// Sets how per-issue failures affect the run result.
    pub fn with_failure_policy(mut self, policy: IssueFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Expands and trims the value template and builds the update payload.
    pub fn prepare_update(&self, environment: &BuildEnvironment) -> FieldUpdate {
        let expanded = environment.expand(&self.field_value).trim().to_string();
        FieldUpdate::from_expanded(
            normalize_field_id(&self.field_id),
            expanded,
            self.field_type_multiple,
        )
    }

    /// Runs the step against `run`, writing progress to `log`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::NoIssueSelector`] when the step has no selector.
    /// Every other problem is reported through `log` and the run result.
    #[instrument(name = "field_update_step", skip_all, fields(run_id = %run.id(), field_id = %self.field_id))]
    pub async fn perform(
        &self,
        run: &mut RunContext,
        log: &dyn BuildLog,
    ) -> Result<StepReport, StepError> {
        let started_at = Timestamp::now();

        let Some(selector) = self.selector.as_deref() else {
            let err = StepError::NoIssueSelector;
            log.line(&err.to_string());
            return Err(err);
        };

        let Some(site) = run.site() else {
            log.line("[Jira] No Jira site is configured for this project. This must be a project configuration error");
            warn!("no site configured; marking run failed");
            run.mark_failed();
            return Ok(Self::report(run, started_at, None, Vec::new()));
        };

        let Some(session) = site.session() else {
            log.line(&format!("[Jira] Remote access to {} is not enabled.", site.name()));
            warn!(site = %site.name(), "no session available; marking run failed");
            run.mark_failed();
            return Ok(Self::report(run, started_at, None, Vec::new()));
        };

        let issues = selector.find_issue_keys(run, site.as_ref(), log).await;
        if issues.is_empty() {
            log.line(&format!("{LOG_PREFIX} Issue list is empty!"));
            info!("no issues selected; nothing to do");
            return Ok(Self::report(run, started_at, None, Vec::new()));
        }

        let update = self.prepare_update(run.environment());
        let updates = std::slice::from_ref(&update);
        info!(issues = issues.len(), value = ?update.value, "applying field update");

        let mut outcomes = Vec::with_capacity(issues.len());
        for issue in &issues {
            let span = info_span!("submit_issue", issue = %issue);
            let outcome = Self::submit(session.as_ref(), issue, updates, log)
                .instrument(span)
                .await;
            outcomes.push(outcome);
        }

        let report = Self::report(run, started_at, Some(update), outcomes);
        let failed = report.failed_count();
        info!(updated = report.updated_count(), failed, "field update step finished");

        if failed > 0 && self.failure_policy == IssueFailurePolicy::FailRun {
            log.line(&format!(
                "{LOG_PREFIX} {failed} of {} issue updates failed; marking the build failed",
                report.outcomes.len()
            ));
            run.mark_failed();
        }

        Ok(report)
    }

    /// Submits `updates` to one issue. Never fails: errors become an outcome.
    async fn submit(
        session: &dyn IssueSession,
        issue: &IssueKey,
        updates: &[FieldUpdate],
        log: &dyn BuildLog,
    ) -> IssueOutcome {
        let status = match session.apply_field_updates(issue, updates).await {
            Ok(()) => IssueStatus::Updated,
            Err(err) => {
                let kind = err.kind();
                match kind {
                    RemoteErrorKind::NotFound => {
                        log.line(&format!("{issue} - Jira issue not found"));
                    }
                    RemoteErrorKind::Forbidden => log.line(&format!(
                        "{issue} - Jira user does not have permission to update this issue"
                    )),
                    RemoteErrorKind::Unauthorized => {
                        log.line(&format!("{issue} - Jira authentication problem"));
                    }
                    RemoteErrorKind::Other => {}
                }
                log.line(&format!("[Jira] Failed to update issue {issue}"));
                log.line(&err.message);
                warn!(status = ?err.status, ?kind, error = %err, "issue update failed");
                IssueStatus::Failed {
                    kind,
                    message: err.message,
                }
            }
        };
        IssueOutcome {
            issue: issue.clone(),
            status,
        }
    }

    fn report(
        run: &RunContext,
        started_at: Timestamp,
        update: Option<FieldUpdate>,
        outcomes: Vec<IssueOutcome>,
    ) -> StepReport {
        StepReport {
            run_id: run.id(),
            started_at,
            finished_at: Timestamp::now(),
            update,
            outcomes,
        }
    }
}
