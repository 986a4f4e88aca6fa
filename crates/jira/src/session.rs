//! REST session against one Jira instance.
//!
//! Field updates go through the issue edit endpoint:
//!
//! ```text
//! PUT {base}/rest/api/2/issue/{key}
//! {"fields": {"customfield_10042": "value"}}
//! ```
//!
//! Any 2xx answer is success. Anything else becomes a [`RemoteError`] carrying
//! the status code, so the step can classify it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use updater::{FieldUpdate, FieldValue, IssueKey, IssueSession, RemoteError};

use crate::{Credentials, SiteConfig};

/// Request body of the issue edit endpoint.
#[derive(Debug, Serialize)]
struct EditIssueRequest<'a> {
    fields: BTreeMap<&'a str, &'a FieldValue>,
}

/// Error body Jira returns alongside 4xx/5xx answers.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: BTreeMap<String, String>,
}

/// Authenticated HTTP session against a Jira instance.
#[derive(Debug, Clone)]
pub struct JiraSession {
    client: Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl JiraSession {
    /// Builds the HTTP client for `config`.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] if the TLS backend cannot be
    /// initialised.
    pub fn connect(config: &SiteConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("jira-field-update/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.url().clone(),
            credentials: config.credentials().cloned(),
        })
    }

    fn issue_url(&self, issue: &IssueKey) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::transport(format!("Jira URL {} cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(["rest", "api", "2", "issue", issue.as_str()]);
        Ok(url)
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(Credentials::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            Some(Credentials::Bearer { token }) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl IssueSession for JiraSession {
    #[instrument(skip_all, fields(issue = %issue))]
    async fn apply_field_updates(
        &self,
        issue: &IssueKey,
        updates: &[FieldUpdate],
    ) -> Result<(), RemoteError> {
        let url = self.issue_url(issue)?;
        let body = EditIssueRequest {
            fields: updates
                .iter()
                .map(|u| (u.field_id.as_str(), &u.value))
                .collect(),
        };
        debug!(%url, fields = updates.len(), "sending issue edit request");

        let response = self
            .authenticate(self.client.put(url))
            .json(&body)
            .send()
            .await
            .map_err(|e| match e.status() {
                Some(status) => RemoteError::with_status(status.as_u16(), e.to_string()),
                None => RemoteError::transport(format!("Request to Jira failed: {e}")),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "issue updated");
            return Ok(());
        }

        // Body text is only used for the message; a failed read leaves it empty.
        let text = response.text().await.unwrap_or_default();
        Err(RemoteError::with_status(
            status.as_u16(),
            describe_error(status, &text),
        ))
    }
}

/// Builds a readable message from a Jira error response.
fn describe_error(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<JiraErrorBody>(body)
        .ok()
        .map(|parsed| {
            parsed
                .error_messages
                .into_iter()
                .chain(parsed.errors.into_iter().map(|(field, msg)| format!("{field}: {msg}")))
                .collect::<Vec<_>>()
                .join("; ")
        })
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    if detail.is_empty() {
        format!("Jira returned {status}")
    } else {
        format!("Jira returned {status}: {detail}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use updater::{normalize_field_id, RemoteErrorKind};
    use wiremock::matchers::{basic_auth, bearer_token, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn key(k: &str) -> IssueKey {
        IssueKey::new(k).unwrap()
    }

    fn scalar(id: &str, value: &str) -> FieldUpdate {
        FieldUpdate::from_expanded(normalize_field_id(id), value.to_string(), false)
    }

    fn session_for(server: &MockServer, credentials: Option<Credentials>) -> JiraSession {
        let config = SiteConfig::new(&server.uri())
            .unwrap()
            .with_credentials(credentials);
        JiraSession::connect(&config).unwrap()
    }

    #[tokio::test]
    async fn puts_scalar_field_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rest/api/2/issue/PROJ-1"))
            .and(basic_auth("ci-bot", "api-token"))
            .and(body_json(json!({"fields": {"customfield_10042": "1.4.0"}})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(
            &server,
            Some(Credentials::Basic {
                username: "ci-bot".into(),
                password: "api-token".into(),
            }),
        );

        session
            .apply_field_updates(&key("PROJ-1"), &[scalar("10042", "1.4.0")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn puts_list_field_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rest/api/2/issue/PROJ-2"))
            .and(bearer_token("pat"))
            .and(body_json(json!({"fields": {"customfield_7": ["nightly"]}})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server, Some(Credentials::Bearer { token: "pat".into() }));
        let update = FieldUpdate::from_expanded(normalize_field_id("7"), "nightly".into(), true);

        session
            .apply_field_updates(&key("PROJ-2"), &[update])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn keeps_base_path_of_site_url() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/jira/rest/api/2/issue/PROJ-3"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let config = SiteConfig::new(&format!("{}/jira/", server.uri())).unwrap();
        let session = JiraSession::connect(&config).unwrap();

        session
            .apply_field_updates(&key("PROJ-3"), &[scalar("1", "v")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn not_found_carries_status_and_jira_message() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "errorMessages": ["Issue Does Not Exist"],
                "errors": {}
            })))
            .mount(&server)
            .await;

        let err = session_for(&server, None)
            .apply_field_updates(&key("NOPE-1"), &[scalar("1", "v")])
            .await
            .unwrap_err();

        assert_eq!(err.status, Some(404));
        assert_eq!(err.kind(), RemoteErrorKind::NotFound);
        assert_eq!(err.message, "Jira returned 404 Not Found: Issue Does Not Exist");
    }

    #[tokio::test]
    async fn field_errors_are_listed_in_message() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errorMessages": [],
                "errors": {"customfield_1": "Field cannot be set."}
            })))
            .mount(&server)
            .await;

        let err = session_for(&server, None)
            .apply_field_updates(&key("PROJ-1"), &[scalar("1", "v")])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), RemoteErrorKind::Other);
        assert_eq!(
            err.message,
            "Jira returned 400 Bad Request: customfield_1: Field cannot be set."
        );
    }

    #[tokio::test]
    async fn non_json_error_body_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized (*)"))
            .mount(&server)
            .await;

        let err = session_for(&server, None)
            .apply_field_updates(&key("PROJ-1"), &[scalar("1", "v")])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), RemoteErrorKind::Unauthorized);
        assert_eq!(err.message, "Jira returned 401 Unauthorized: Unauthorized (*)");
    }

    #[tokio::test]
    async fn unreachable_host_has_no_status() {
        let config = SiteConfig::new("http://127.0.0.1:1").unwrap();
        let session = JiraSession::connect(&config).unwrap();

        let err = session
            .apply_field_updates(&key("PROJ-1"), &[scalar("1", "v")])
            .await
            .unwrap_err();

        assert_eq!(err.status, None);
        assert_eq!(err.kind(), RemoteErrorKind::Other);
        assert!(err.message.starts_with("Request to Jira failed"));
    }

    #[test]
    fn empty_error_body_falls_back_to_status() {
        assert_eq!(
            describe_error(StatusCode::FORBIDDEN, "   "),
            "Jira returned 403 Forbidden"
        );
    }
}
