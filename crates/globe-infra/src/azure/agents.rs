//! AI Foundry Agents REST client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use globe_core::ports::{
    AgentDefinition, AgentError, AgentInfo, AgentMessage, AgentRun, AgentService,
};

use super::credential::{AI_SCOPE, TokenSource};
use super::{ServiceError, retry_after};

/// Page size for list calls.
const PAGE_LIMIT: u32 = 100;

/// Where the agent service lives.
#[derive(Debug, Clone)]
pub struct AgentServiceConfig {
    /// Account endpoint, or a project endpoint that already ends in
    /// `/api/projects/{name}`.
    pub endpoint: String,
    pub project: Option<String>,
    pub api_version: String,
}

impl AgentServiceConfig {
    pub fn new(endpoint: impl Into<String>, project: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            project,
            api_version: "v1".to_string(),
        }
    }

    /// The project-scoped base URL all agent calls are made against.
    pub fn project_endpoint(&self) -> String {
        let endpoint = self.endpoint.trim_end_matches('/');
        if endpoint.contains("/api/projects/") {
            return endpoint.to_string();
        }
        match &self.project {
            Some(project) => format!("{endpoint}/api/projects/{project}"),
            None => endpoint.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListPage<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Vec<WireContent>,
    #[serde(default)]
    created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<WireText>,
}

#[derive(Debug, Deserialize)]
struct WireText {
    value: String,
}

impl From<WireMessage> for AgentMessage {
    fn from(message: WireMessage) -> Self {
        let text = message
            .content
            .into_iter()
            .filter(|c| c.kind == "text")
            .filter_map(|c| c.text)
            .map(|t| t.value)
            .last();

        Self {
            role: message.role,
            text,
            created_at: message
                .created_at
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

/// Agent service client over the REST API.
pub struct AzureAgentClient {
    config: AgentServiceConfig,
    base: String,
    tokens: Arc<dyn TokenSource>,
    http: reqwest::Client,
}

impl AzureAgentClient {
    pub fn new(config: AgentServiceConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self::with_client(config, tokens, reqwest::Client::new())
    }

    pub fn with_client(
        config: AgentServiceConfig,
        tokens: Arc<dyn TokenSource>,
        http: reqwest::Client,
    ) -> Self {
        let base = config.project_endpoint();
        Self {
            config,
            base,
            tokens,
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, AgentError> {
        let token = self
            .tokens
            .token(AI_SCOPE)
            .await
            .map_err(|e| AgentError::Auth(e.to_string()))?;

        Ok(self
            .http
            .request(method, format!("{}{path}", self.base))
            .bearer_auth(token)
            .query(&[("api-version", self.config.api_version.as_str())]))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AgentError> {
        let response = request
            .send()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;
        let response = check(response).await?;
        response
            .json()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))
    }

    /// Follow `after` cursors until the service reports no more pages.
    async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, AgentError> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;
        let limit = PAGE_LIMIT.to_string();

        loop {
            let mut request = self
                .request(Method::GET, path)
                .await?
                .query(&[("limit", limit.as_str())]);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor.as_str())]);
            }

            let page: ListPage<T> = self.send(request).await?;
            items.extend(page.data);
            match page.last_id {
                Some(last) if page.has_more => after = Some(last),
                _ => return Ok(items),
            }
        }
    }
}

async fn check(response: Response) -> Result<Response, AgentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = retry_after(response.headers());
    let body = response.text().await.unwrap_or_default();
    let error = ServiceError::parse(&body);
    Err(AgentError::Http {
        status: status.as_u16(),
        code: error.code,
        message: error.message,
        retry_after,
    })
}

#[async_trait]
impl AgentService for AzureAgentClient {
    async fn get_agent(&self, agent_id: &str) -> Result<AgentInfo, AgentError> {
        let request = self
            .request(Method::GET, &format!("/assistants/{agent_id}"))
            .await?;
        self.send(request).await
    }

    async fn create_agent(&self, definition: &AgentDefinition) -> Result<AgentInfo, AgentError> {
        let request = self
            .request(Method::POST, "/assistants")
            .await?
            .json(definition);
        self.send(request).await
    }

    async fn list_agents(&self) -> Result<Vec<AgentInfo>, AgentError> {
        self.list_all("/assistants").await
    }

    async fn get_thread(&self, thread_id: &str) -> Result<(), AgentError> {
        let request = self
            .request(Method::GET, &format!("/threads/{thread_id}"))
            .await?;
        let _: Created = self.send(request).await?;
        Ok(())
    }

    async fn create_thread(&self) -> Result<String, AgentError> {
        let request = self
            .request(Method::POST, "/threads")
            .await?
            .json(&json!({}));
        let thread: Created = self.send(request).await?;
        Ok(thread.id)
    }

    async fn post_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), AgentError> {
        let request = self
            .request(Method::POST, &format!("/threads/{thread_id}/messages"))
            .await?
            .json(&json!({ "role": role, "content": content }));
        let _: Created = self.send(request).await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<AgentRun, AgentError> {
        let request = self
            .request(Method::POST, &format!("/threads/{thread_id}/runs"))
            .await?
            .json(&json!({ "assistant_id": agent_id }));
        self.send(request).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<AgentRun, AgentError> {
        let request = self
            .request(Method::GET, &format!("/threads/{thread_id}/runs/{run_id}"))
            .await?;
        self.send(request).await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<AgentMessage>, AgentError> {
        let messages: Vec<WireMessage> = self
            .list_all(&format!("/threads/{thread_id}/messages"))
            .await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use globe_core::ports::RunStatus;

    use super::*;
    use crate::azure::credential::CredentialError;

    struct FixedToken;

    #[async_trait]
    impl TokenSource for FixedToken {
        async fn token(&self, _scope: &str) -> Result<String, CredentialError> {
            Ok("test-token".into())
        }
    }

    fn client(server: &MockServer) -> AzureAgentClient {
        AzureAgentClient::new(
            AgentServiceConfig::new(server.uri(), Some("globe".into())),
            Arc::new(FixedToken),
        )
    }

    #[test]
    fn project_endpoint_is_appended_once() {
        let account = AgentServiceConfig::new("https://acct.services.ai.azure.com/", Some("p1".into()));
        assert_eq!(
            account.project_endpoint(),
            "https://acct.services.ai.azure.com/api/projects/p1"
        );

        let scoped = AgentServiceConfig::new(
            "https://acct.services.ai.azure.com/api/projects/p2",
            Some("p1".into()),
        );
        assert_eq!(
            scoped.project_endpoint(),
            "https://acct.services.ai.azure.com/api/projects/p2"
        );
    }

    #[tokio::test]
    async fn create_run_sends_agent_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/projects/globe/threads/thread_1/runs"))
            .and(query_param("api-version", "v1"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(json!({ "assistant_id": "asst_1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "run_1",
                "object": "thread.run",
                "status": "queued"
            })))
            .mount(&server)
            .await;

        let run = client(&server)
            .create_run("thread_1", "asst_1")
            .await
            .unwrap();
        assert_eq!(run.id, "run_1");
        assert_eq!(run.status, RunStatus::Queued);
    }

    #[tokio::test]
    async fn messages_carry_text_and_rfc3339_timestamps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/globe/threads/thread_1/messages"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [
                    {
                        "id": "msg_2",
                        "role": "assistant",
                        "created_at": 1740823260,
                        "content": [{ "type": "text", "text": { "value": "Hello!", "annotations": [] } }]
                    },
                    {
                        "id": "msg_1",
                        "role": "user",
                        "created_at": 1740823200,
                        "content": [{ "type": "text", "text": { "value": "Hi", "annotations": [] } }]
                    }
                ],
                "has_more": false,
                "last_id": "msg_1"
            })))
            .mount(&server)
            .await;

        let messages = client(&server).list_messages("thread_1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text.as_deref(), Some("Hello!"));
        assert_eq!(messages[0].created_at.as_deref(), Some("2025-03-01T10:01:00Z"));
        assert!(messages[0].is_agent_authored());
        assert!(!messages[1].is_agent_authored());
    }

    #[tokio::test]
    async fn rate_limited_response_keeps_code_and_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/projects/globe/threads"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", "17")
                    .set_body_json(json!({
                        "error": {
                            "code": "rate_limit_exceeded",
                            "message": "Rate limit is exceeded."
                        }
                    })),
            )
            .mount(&server)
            .await;

        match client(&server).create_thread().await.unwrap_err() {
            AgentError::Http {
                status,
                code,
                retry_after,
                ..
            } => {
                assert_eq!(status, 429);
                assert_eq!(code.as_deref(), Some("rate_limit_exceeded"));
                assert_eq!(retry_after, Some(17));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn agent_listing_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/globe/assistants"))
            .and(query_param("after", "asst_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "asst_2", "name": "Second", "created_at": 1740823200 }],
                "has_more": false,
                "last_id": "asst_2"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/projects/globe/assistants"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "asst_1", "name": "The Globe Assistant" }],
                "has_more": true,
                "last_id": "asst_1"
            })))
            .mount(&server)
            .await;

        let agents = client(&server).list_agents().await.unwrap();
        let ids: Vec<_> = agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["asst_1", "asst_2"]);
    }
}
