//! jira-field-update CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: flags with environment fallbacks, validated into
//!    a [`config::Config`].
//! 2. **Wire observability**: `tracing-subscriber` on stderr, plus an
//!    OpenTelemetry OTLP exporter when a collector endpoint is configured.
//! 3. **Construct infrastructure**: a [`jira::JiraSite`] for the configured URL
//!    and an [`selector::ExplicitIssueSelector`] for the configured keys, injected
//!    into [`updater::FieldUpdateStep`].
//! 4. **Map the outcome to an exit code**: `0` success, `1` run failed,
//!    `2` fatal error.

mod build_log;
mod config;
mod observability;
mod selector;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use jira::JiraSite;
use tracing::{info, warn};
use updater::{
    BuildEnvironment, BuildLog, FieldUpdateStep, IssueSelector, IssueSite, RunContext, RunResult,
    StepReport,
};

use crate::build_log::WriterBuildLog;
use crate::config::{Cli, Config};
use crate::selector::ExplicitIssueSelector;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _telemetry = observability::init(cli.log_format);
    let log = WriterBuildLog::stdout();

    let result = run(cli, &log).await;
    if let Err(e) = &result {
        eprintln!("error: {e:#}");
    }
    ExitCode::from(exit_status(&result))
}

/// Maps the outcome of [`run`] to the process exit status: `0` success,
/// `1` run failed, `2` fatal error.
fn exit_status(result: &anyhow::Result<RunResult>) -> u8 {
    match result {
        Ok(RunResult::Success) => 0,
        Ok(RunResult::Failure) => 1,
        Err(_) => 2,
    }
}

/// Executes one step for the parsed arguments, writing the build log to `log`.
///
/// # Errors
///
/// Fails only for an invalid configuration or a step with no issue source.
/// A report that cannot be written is logged and does not change the result.
async fn run(cli: Cli, log: &dyn BuildLog) -> anyhow::Result<RunResult> {
    let config = Config::from_cli(cli).context("invalid configuration")?;

    let site = config
        .site
        .map(|c| Arc::new(JiraSite::new(c)) as Arc<dyn IssueSite>);
    let selector = config
        .issue_keys
        .map(|keys| Arc::new(ExplicitIssueSelector::new(keys)) as Arc<dyn IssueSelector>);

    let step = FieldUpdateStep::new(
        selector,
        config.field_id,
        config.field_value,
        &config.field_type_multiple,
    )
    .with_failure_policy(config.failure_policy);

    let mut run = RunContext::new(BuildEnvironment::from_process(), site);
    info!(run_id = %run.id(), "starting field update step");

    let report = step.perform(&mut run, log).await?;

    if let Some(path) = &config.report {
        if let Err(e) = write_report(path, &report) {
            warn!(error = %format!("{e:#}"), "step report not written");
        }
    }

    info!(run_id = %run.id(), result = ?run.result(), "field update step complete");
    Ok(run.result())
}

fn write_report(path: &Path, report: &StepReport) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(report).context("failed to serialise step report")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write step report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("jira-field-update").chain(args.iter().copied()))
            .unwrap()
    }

    async fn accepting_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rest/api/2/issue/A-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn exit_status_follows_run_outcome() {
        assert_eq!(exit_status(&Ok(RunResult::Success)), 0);
        assert_eq!(exit_status(&Ok(RunResult::Failure)), 1);
        assert_eq!(exit_status(&Err(anyhow::anyhow!("no selector"))), 2);
    }

    #[tokio::test]
    async fn accepted_update_exits_zero() {
        let server = accepting_server().await;
        let log = WriterBuildLog::new(Vec::new());

        let result = run(
            cli(&[
                "--field-id",
                "10042",
                "--field-value",
                "done",
                "--issue",
                "A-1",
                "--jira-url",
                &server.uri(),
            ]),
            &log,
        )
        .await;

        assert_eq!(exit_status(&result), 0);
    }

    #[tokio::test]
    async fn disabled_remote_access_exits_one() {
        let log = WriterBuildLog::new(Vec::new());

        let result = run(
            cli(&[
                "--field-id",
                "10042",
                "--issue",
                "A-1",
                "--jira-url",
                "https://jira.example.com",
                "--remote-access",
                "false",
            ]),
            &log,
        )
        .await;

        assert_eq!(exit_status(&result), 1);
        let written = String::from_utf8(log.into_inner()).unwrap();
        assert!(written.contains("Remote access to jira.example.com is not enabled."));
    }

    #[tokio::test]
    async fn missing_issue_source_exits_two() {
        let log = WriterBuildLog::new(Vec::new());

        let result = run(
            cli(&["--field-id", "10042", "--jira-url", "https://jira.example.com"]),
            &log,
        )
        .await;

        assert_eq!(exit_status(&result), 2);
    }

    #[tokio::test]
    async fn invalid_configuration_exits_two() {
        let log = WriterBuildLog::new(Vec::new());

        let result = run(cli(&["--field-id", "summary", "--issue", "A-1"]), &log).await;

        assert_eq!(exit_status(&result), 2);
    }

    #[tokio::test]
    async fn unwritable_report_keeps_run_result() {
        let server = accepting_server().await;
        let log = WriterBuildLog::new(Vec::new());

        let result = run(
            cli(&[
                "--field-id",
                "10042",
                "--issue",
                "A-1",
                "--jira-url",
                &server.uri(),
                "--report",
                "/nonexistent-dir/report.json",
            ]),
            &log,
        )
        .await;

        assert_eq!(exit_status(&result), 0);
    }
}
