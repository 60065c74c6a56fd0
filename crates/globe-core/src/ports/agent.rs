//! Conversational-agent service port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Hosted agent service - agents, threads, messages and runs.
#[async_trait]
pub trait AgentService: Send + Sync {
    /// Fetch an agent; errors if the id is unknown to the service.
    async fn get_agent(&self, agent_id: &str) -> Result<AgentInfo, AgentError>;

    async fn create_agent(&self, definition: &AgentDefinition) -> Result<AgentInfo, AgentError>;

    async fn list_agents(&self) -> Result<Vec<AgentInfo>, AgentError>;

    /// Look up a thread; errors if it does not exist.
    async fn get_thread(&self, thread_id: &str) -> Result<(), AgentError>;

    /// Create an empty thread and return its id.
    async fn create_thread(&self) -> Result<String, AgentError>;

    async fn post_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<(), AgentError>;

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<AgentRun, AgentError>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<AgentRun, AgentError>;

    /// Every message in the thread, in whatever order the service returns.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<AgentMessage>, AgentError>;
}

/// What to create an agent from.
#[derive(Debug, Clone, Serialize)]
pub struct AgentDefinition {
    pub model: String,
    pub name: String,
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// A message read back from a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentMessage {
    pub role: String,
    pub text: Option<String>,
    /// RFC 3339 UTC timestamp, when the service supplied one.
    pub created_at: Option<String>,
}

impl AgentMessage {
    /// Whether the message was written by the agent rather than the user.
    ///
    /// Services spell the role differently (`assistant`, `agent`,
    /// `MessageRole.AGENT`), so this matches on substrings.
    pub fn is_agent_authored(&self) -> bool {
        let role = self.role.to_lowercase();
        role.contains("assistant") || role.contains("agent")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether polling should stop.
    pub fn is_terminal(self) -> bool {
        !matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling
        )
    }
}

/// Structured error attached to a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentRun {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// Agent service errors.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Agent service authentication failed: {0}")]
    Auth(String),

    #[error("Agent service request failed: {0}")]
    Transport(String),

    #[error("Agent service returned {status}: {message}")]
    Http {
        status: u16,
        code: Option<String>,
        message: String,
        /// Seconds from a `Retry-After` response header.
        retry_after: Option<u64>,
    },

    #[error("Agent run failed ({}): {message}", .code.as_deref().unwrap_or("unknown"))]
    RunFailed {
        code: Option<String>,
        message: String,
    },

    #[error("Agent run ended with status {0:?}")]
    RunEnded(RunStatus),

    #[error("Agent run did not finish within {0} seconds")]
    Timeout(u64),
}
