//! Command-line / environment configuration.
//!
//! Every flag has an environment-variable fallback so the binary can be dropped
//! into a pipeline step without a wrapper script. [`Cli`] is the raw parse;
//! [`Config::from_cli`] validates it. An invalid configuration never starts a
//! run.

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use jira::{Credentials, SiteConfig, SiteConfigError, DEFAULT_TIMEOUT};
use thiserror::Error;
use tracing::warn;
use updater::{validate_field_id, FieldIdValidation, IssueFailurePolicy, CUSTOM_FIELD_PREFIX};

/// Output format for diagnostics written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Update a custom field on the Jira issues of a build.
#[derive(Debug, Parser)]
#[command(name = "jira-field-update", version, about)]
pub struct Cli {
    /// Base URL of the Jira instance. Without it the run fails as unconfigured.
    #[arg(long, env = "JIRA_URL")]
    pub jira_url: Option<String>,

    /// User name for basic authentication.
    #[arg(long, env = "JIRA_USER")]
    pub jira_user: Option<String>,

    /// Password or API token for basic authentication.
    #[arg(long, env = "JIRA_PASSWORD", hide_env_values = true)]
    pub jira_password: Option<String>,

    /// Personal access token; takes precedence over basic authentication.
    #[arg(long, env = "JIRA_TOKEN", hide_env_values = true)]
    pub jira_token: Option<String>,

    /// Whether remote access to the site is enabled.
    #[arg(
        long,
        env = "JIRA_REMOTE_ACCESS",
        default_value = "true",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub remote_access: bool,

    /// Per-request timeout in seconds (at least 1).
    #[arg(
        long,
        env = "JIRA_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Issue key to update (repeatable).
    #[arg(long = "issue", value_name = "KEY")]
    pub issue: Vec<String>,

    /// Comma-separated issue keys to update.
    #[arg(long = "issues", env = "JIRA_ISSUES", value_delimiter = ',', value_name = "KEYS")]
    pub issues: Option<Vec<String>>,

    /// Custom field number (the `customfield_` prefix is optional).
    #[arg(long, env = "JIRA_FIELD_ID")]
    pub field_id: String,

    /// Field value; `$VAR` and `${VAR}` are expanded from the environment.
    #[arg(long, env = "JIRA_FIELD_VALUE", default_value = "")]
    pub field_value: String,

    /// `"true"` if the field is list-typed.
    #[arg(long, env = "JIRA_FIELD_TYPE_MULTIPLE", default_value = "false")]
    pub field_type_multiple: String,

    /// Fail the run if any issue could not be updated. Accepts `1`/`0`,
    /// `yes`/`no`, `true`/`false`; the bare flag means `true`.
    #[arg(
        long,
        env = "JIRA_FAIL_ON_ISSUE_ERROR",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub fail_on_issue_error: bool,

    /// Diagnostics format on stderr.
    #[arg(long, env = "JIRA_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Write the step report as JSON to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

/// Configuration problems detected before a run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The site URL is unusable.
    #[error(transparent)]
    Site(#[from] SiteConfigError),

    /// The field id can never name a custom field.
    #[error("Invalid field id '{id}': {message}")]
    FieldId {
        /// The configured id.
        id: String,
        /// Validation message.
        message: String,
    },

    /// Only one half of a user/password pair was given.
    #[error("Basic authentication needs both JIRA_USER and JIRA_PASSWORD")]
    IncompleteCredentials,
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// The Jira site; `None` when no URL was configured.
    pub site: Option<SiteConfig>,
    /// Explicit issue keys; `None` when no issue source was configured at all.
    pub issue_keys: Option<Vec<String>>,
    /// Raw field id.
    pub field_id: String,
    /// Field value template.
    pub field_value: String,
    /// Boolean-as-string multiplicity flag.
    pub field_type_multiple: String,
    /// How per-issue failures affect the run.
    pub failure_policy: IssueFailurePolicy,
    /// Where to write the JSON report.
    pub report: Option<PathBuf>,
}

impl Config {
    /// Validates the parsed arguments.
    ///
    /// A blank field id is logged as a warning and accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unusable URL, a non-numeric field id, or
    /// half a set of basic credentials.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let bare_id = cli
            .field_id
            .strip_prefix(CUSTOM_FIELD_PREFIX)
            .unwrap_or(&cli.field_id);
        match validate_field_id(bare_id) {
            FieldIdValidation::Ok => {}
            FieldIdValidation::Warning(message) => warn!(field_id = %cli.field_id, "{message}"),
            FieldIdValidation::Error(message) => {
                return Err(ConfigError::FieldId {
                    id: cli.field_id,
                    message,
                })
            }
        }

        let credentials = match (cli.jira_token, cli.jira_user, cli.jira_password) {
            (Some(token), _, _) => Some(Credentials::Bearer { token }),
            (None, Some(username), Some(password)) => {
                Some(Credentials::Basic { username, password })
            }
            (None, None, None) => None,
            (None, _, _) => return Err(ConfigError::IncompleteCredentials),
        };

        let site = cli
            .jira_url
            .as_deref()
            .map(SiteConfig::new)
            .transpose()?
            .map(|site| {
                site.with_credentials(credentials)
                    .with_timeout(Duration::from_secs(cli.timeout_secs))
                    .with_remote_access(cli.remote_access)
            });

        let issue_keys = match (cli.issue.is_empty(), cli.issues) {
            (true, None) => None,
            (_, listed) => Some(cli.issue.into_iter().chain(listed.unwrap_or_default()).collect()),
        };

        let failure_policy = if cli.fail_on_issue_error {
            IssueFailurePolicy::FailRun
        } else {
            IssueFailurePolicy::Tolerate
        };

        Ok(Self {
            site,
            issue_keys,
            field_id: cli.field_id,
            field_value: cli.field_value,
            field_type_multiple: cli.field_type_multiple,
            failure_policy,
            report: cli.report,
        })
    }
}
