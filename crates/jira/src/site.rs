//! Jira site configuration and the [`IssueSite`] implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;
use tracing::warn;
use updater::{IssueSession, IssueSite, SiteName};

use crate::JiraSession;

/// Request timeout used when the caller does not configure one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Problems found while building a [`SiteConfig`].
#[derive(Debug, Error)]
pub enum SiteConfigError {
    /// The URL could not be parsed.
    #[error("Invalid Jira URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The URL parsed but is not an `http` or `https` URL with a host.
    #[error("Jira URL '{url}' must be an http or https URL with a host")]
    UnsupportedUrl {
        /// The rejected URL.
        url: String,
    },
}

/// Credentials sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP basic authentication (user name plus password or API token).
    Basic {
        /// Account name or e-mail address.
        username: String,
        /// Password or API token.
        password: String,
    },
    /// Bearer token authentication (personal access token).
    Bearer {
        /// The token.
        token: String,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// Everything needed to open a session against one Jira instance.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    name: SiteName,
    url: Url,
    credentials: Option<Credentials>,
    timeout: Duration,
    remote_access_enabled: bool,
}

impl SiteConfig {
    /// Parses and checks `url`, using the host name as the site name.
    ///
    /// # Errors
    ///
    /// Returns [`SiteConfigError`] if `url` is not an absolute `http`/`https`
    /// URL with a host.
    pub fn new(url: &str) -> Result<Self, SiteConfigError> {
        let parsed = Url::parse(url).map_err(|e| SiteConfigError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SiteConfigError::UnsupportedUrl {
                url: url.to_string(),
            });
        }
        let name = parsed
            .host_str()
            .and_then(SiteName::new)
            .ok_or_else(|| SiteConfigError::UnsupportedUrl {
                url: url.to_string(),
            })?;

        Ok(Self {
            name,
            url: parsed,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            remote_access_enabled: true,
        })
    }

    /// Sets the credentials sent with each request.
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables remote access; a disabled site never opens a session.
    pub fn with_remote_access(mut self, enabled: bool) -> Self {
        self.remote_access_enabled = enabled;
        self
    }

    /// Display name (the URL's host).
    pub fn name(&self) -> &SiteName {
        &self.name
    }

    /// Base URL of the instance.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Configured credentials, if any.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether sessions may be opened.
    pub fn remote_access_enabled(&self) -> bool {
        self.remote_access_enabled
    }
}

/// A configured Jira instance.
#[derive(Debug, Clone)]
pub struct JiraSite {
    config: SiteConfig,
}

impl JiraSite {
    /// Wraps a validated configuration.
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }
}

impl IssueSite for JiraSite {
    fn name(&self) -> &SiteName {
        self.config.name()
    }

    fn session(&self) -> Option<Arc<dyn IssueSession>> {
        if !self.config.remote_access_enabled() {
            return None;
        }
        match JiraSession::connect(&self.config) {
            Ok(session) => Some(Arc::new(session)),
            Err(e) => {
                warn!(site = %self.config.name(), error = %e, "could not build Jira HTTP client");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_takes_name_from_host() {
        let config = SiteConfig::new("https://jira.example.com/jira").unwrap();
        assert_eq!(config.name().as_str(), "jira.example.com");
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert!(config.remote_access_enabled());
    }

    #[test]
    fn config_rejects_unparseable_and_non_http_urls() {
        assert!(matches!(
            SiteConfig::new("not a url"),
            Err(SiteConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            SiteConfig::new("ftp://jira.example.com"),
            Err(SiteConfigError::UnsupportedUrl { .. })
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let basic = Credentials::Basic {
            username: "ci-bot".into(),
            password: "hunter2".into(),
        };
        let bearer = Credentials::Bearer {
            token: "s3cr3t".into(),
        };
        let rendered = format!("{basic:?} {bearer:?}");
        assert!(rendered.contains("ci-bot"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("s3cr3t"));
    }

    #[test]
    fn disabled_remote_access_yields_no_session() {
        let site = JiraSite::new(
            SiteConfig::new("https://jira.example.com")
                .unwrap()
                .with_remote_access(false),
        );
        assert!(site.session().is_none());
    }

    #[test]
    fn enabled_site_opens_a_session() {
        let site = JiraSite::new(SiteConfig::new("https://jira.example.com").unwrap());
        assert!(site.session().is_some());
    }
}
