//! HTTP member directory and audit webhook.
//!
//! Routes, relative to the configured base URL:
//!
//! | Call | Request |
//! |---|---|
//! | resolve | `GET members/{subject}` (404 means not a member) |
//! | grant | `PUT members/{subject}/roles/{role_id}` |
//! | revoke | `DELETE members/{subject}/roles/{role_id}` |
//! | notify | `POST members/{subject}/messages` |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tenure_adapters::{
    AdapterError, AuditEvent, AuditSink, MemberHandle, MembershipResolver, Notifier, Reminder,
    Result, RoleAuthority, TracingAuditSink,
};
use tenure_core::{GroupDefinition, GroupId, SubjectId};
use tracing::debug;

use crate::config::DirectoryConfig;

/// Member record returned by `GET members/{subject}`.
#[derive(Debug, Deserialize)]
struct MemberRecord {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

/// Body of `POST members/{subject}/messages`.
#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    title: &'a str,
    description: String,
    footer: &'a str,
    color: &'a str,
    expires_at: String,
    time_left: String,
    contact: &'a str,
    text: String,
}

impl<'a> MessageBody<'a> {
    fn from_reminder(reminder: &'a Reminder) -> Self {
        Self {
            title: reminder.title(),
            description: reminder.description(),
            footer: reminder.footer(),
            color: &reminder.color,
            expires_at: reminder.expires_display(),
            time_left: reminder.time_left_display(),
            contact: &reminder.contact,
            text: reminder.to_text(),
        }
    }
}

/// Member directory over HTTP with bearer-token auth.
#[derive(Clone)]
pub struct HttpDirectory {
    base_url: Url,
    token: String,
    client: Client,
}

impl HttpDirectory {
    pub fn new(config: &DirectoryConfig, token: String) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AdapterError::Other(format!("invalid directory url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AdapterError::Other(format!(
                "directory url cannot be a base: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AdapterError::Other(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            token,
            client,
        })
    }

    /// `{base}/members/{subject}/{rest...}` with every segment escaped.
    fn member_url(&self, subject_id: &SubjectId, rest: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AdapterError::Other("directory url cannot be a base".into()))?
            .pop_if_empty()
            .push("members")
            .push(subject_id.as_str())
            .extend(rest);
        Ok(url)
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        debug!("directory request: {} {}", method, url);

        let mut req = self.client.request(method, url).bearer_auth(&self.token);
        if let Some(b) = body {
            req = req.json(b);
        }

        req.send()
            .await
            .map_err(|e| AdapterError::Transport(format!("request failed: {}", e)))
    }

    /// Map a non-success response to an error.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let detail = format!("directory returned {}: {}", status, text.trim());
        Err(if status == StatusCode::NOT_FOUND {
            AdapterError::NotFound(detail)
        } else if status.is_client_error() {
            AdapterError::Rejected(detail)
        } else {
            AdapterError::Transport(detail)
        })
    }

    async fn role_call(
        &self,
        method: Method,
        member: &MemberHandle,
        group: &GroupDefinition,
    ) -> Result<()> {
        let url = self.member_url(&member.subject_id, &["roles", group.role_id.as_str()])?;
        let resp = self.send::<()>(method, url, None).await?;
        Self::check(resp).await.map(|_| ())
    }
}

#[async_trait]
impl MembershipResolver for HttpDirectory {
    async fn resolve(&self, subject_id: &SubjectId) -> Result<Option<MemberHandle>> {
        let url = self.member_url(subject_id, &[])?;
        let resp = self.send::<()>(Method::GET, url, None).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let record: MemberRecord = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| AdapterError::Transport(format!("failed to parse member: {}", e)))?;

        let name = record
            .display_name
            .or(record.username)
            .unwrap_or_else(|| subject_id.to_string());
        Ok(Some(MemberHandle::new(subject_id.clone(), name)))
    }
}

#[async_trait]
impl RoleAuthority for HttpDirectory {
    async fn grant(
        &self,
        member: &MemberHandle,
        _group_id: &GroupId,
        group: &GroupDefinition,
    ) -> Result<()> {
        self.role_call(Method::PUT, member, group).await
    }

    async fn revoke(
        &self,
        member: &MemberHandle,
        _group_id: &GroupId,
        group: &GroupDefinition,
    ) -> Result<()> {
        self.role_call(Method::DELETE, member, group).await
    }
}

#[async_trait]
impl Notifier for HttpDirectory {
    async fn notify(&self, member: &MemberHandle, reminder: &Reminder) -> Result<()> {
        let url = self.member_url(&member.subject_id, &["messages"])?;
        let body = MessageBody::from_reminder(reminder);
        let resp = self.send(Method::POST, url, Some(&body)).await?;
        Self::check(resp).await.map(|_| ())
    }
}

/// Audit sink that logs every event and posts it to a webhook.
///
/// Delivery failures are logged and otherwise ignored.
pub struct WebhookAuditSink {
    url: String,
    client: Client,
}

#[derive(Serialize)]
struct WebhookBody {
    content: String,
}

impl WebhookAuditSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Other(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl AuditSink for WebhookAuditSink {
    async fn record(&self, event: &AuditEvent) {
        TracingAuditSink.record(event).await;

        let body = WebhookBody {
            content: event.to_string(),
        };
        match self.client.post(&self.url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "audit webhook rejected event")
            }
            Err(e) => tracing::warn!(error = %e, "audit webhook unreachable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn directory(server: &Server) -> HttpDirectory {
        let config = DirectoryConfig {
            base_url: format!("{}/api/", server.url()),
            token_env: "UNUSED".into(),
            timeout_secs: 5,
        };
        HttpDirectory::new(&config, "t0ken".into()).unwrap()
    }

    fn gold() -> GroupDefinition {
        GroupDefinition::new("Gold", "role-1")
    }

    #[tokio::test]
    async fn test_resolve_member() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/members/42")
            .match_header("authorization", "Bearer t0ken")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"display_name":"alice#0001"}"#)
            .create_async()
            .await;

        let member = directory(&server)
            .resolve(&"42".into())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(member.display_name, "alice#0001");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_not_found_is_none() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/members/42")
            .with_status(404)
            .create_async()
            .await;

        assert!(directory(&server).resolve(&"42".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_server_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/members/42")
            .with_status(503)
            .create_async()
            .await;

        let err = directory(&server).resolve(&"42".into()).await.unwrap_err();
        assert!(matches!(err, AdapterError::Transport(_)));
    }

    #[tokio::test]
    async fn test_grant_and_revoke_routes() {
        let mut server = Server::new_async().await;
        let put = server
            .mock("PUT", "/api/members/42/roles/role-1")
            .with_status(204)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/members/42/roles/role-1")
            .with_status(403)
            .with_body("missing permissions")
            .create_async()
            .await;

        let dir = directory(&server);
        let member = MemberHandle::new("42".into(), "alice");

        dir.grant(&member, &"gold".into(), &gold()).await.unwrap();
        let err = dir.revoke(&member, &"gold".into(), &gold()).await.unwrap_err();
        assert!(matches!(err, AdapterError::Rejected(_)));

        put.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_notify_posts_rendered_reminder() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/members/42/messages")
            .match_body(Matcher::PartialJsonString(
                r#"{"title":"Membership Expiring Soon","time_left":"23 hours"}"#.into(),
            ))
            .with_status(201)
            .create_async()
            .await;

        let reminder = Reminder {
            group_id: "gold".into(),
            display_name: "Gold".into(),
            color: "#FFD700".into(),
            contact: "support".into(),
            expires_at: 0,
            hours_left: 23,
        };
        directory(&server)
            .notify(&MemberHandle::new("42".into(), "alice"), &reminder)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_subject_is_escaped() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/members/a%2Fb")
            .with_status(404)
            .create_async()
            .await;

        assert!(directory(&server).resolve(&"a/b".into()).await.unwrap().is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_webhook_posts_content() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_body(Matcher::Json(serde_json::json!({
                "content": "Removed Gold role from alice (expired)."
            })))
            .with_status(204)
            .create_async()
            .await;

        let sink =
            WebhookAuditSink::new(format!("{}/hook", server.url()), Duration::from_secs(5))
                .unwrap();
        sink.record(&AuditEvent::Revoked {
            member: "alice".into(),
            group: "Gold".into(),
        })
        .await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_webhook_failure_is_swallowed() {
        let sink = WebhookAuditSink::new("http://127.0.0.1:9/hook", Duration::from_secs(1)).unwrap();
        sink.record(&AuditEvent::Revoked {
            member: "alice".into(),
            group: "Gold".into(),
        })
        .await;
    }
}
