//! Chat-agent bridge.
//!
//! Relays one user message to a hosted agent: makes sure an agent exists,
//! creates or reuses a conversation thread, replays recent history into new
//! threads, runs the agent and picks its reply out of the thread.

mod rate_limit;
mod selection;


use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::ports::{AgentDefinition, AgentError, AgentService, RunError, RunStatus, SecretStore};

pub use rate_limit::{DEFAULT_RETRY_AFTER_SECS, RATE_LIMIT_CODE, retry_after_hint};
pub use selection::{SelectionReason, select_reply};

/// Secret-store name under which the agent id is persisted.
pub const AGENT_ID_SECRET: &str = "azure-agent-id";

/// How many prior turns are replayed into a new thread.
pub const HISTORY_LIMIT: usize = 10;

/// Reply text when the agent produced nothing readable.
pub const NO_REPLY: &str = "(no assistant response)";

/// Chat bridge errors.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("{message}")]
    RateLimited { retry_after: u64, message: String },

    #[error("{0}")]
    Misconfigured(String),

    #[error(transparent)]
    Agent(AgentError),
}

/// How the bridge finds or creates its agent.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Agent id supplied by configuration, tried before the secret store.
    pub agent_id: Option<String>,
    /// Model deployment used when a new agent must be created.
    pub model: Option<String>,
    pub name: String,
    pub instructions: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            agent_id: None,
            model: None,
            name: "The Globe Assistant".to_string(),
            instructions: "You are The Globe's helpful assistant.".to_string(),
        }
    }
}

/// Run polling bounds.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_polls: 120,
        }
    }
}

/// One prior turn of the conversation, as the client remembers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryTurn>,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: String,
}

/// Outcome of agent resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentResolution {
    pub agent_id: String,
    /// Whether a new agent had to be created.
    pub created: bool,
}

/// Find a usable agent, creating one if needed.
///
/// The configured id is tried first, then the secret store. A candidate the
/// service does not recognise is discarded. A newly created agent's id is
/// written back to the secret store; failing to persist it is only logged.
pub async fn ensure_agent(
    agents: &dyn AgentService,
    secrets: Option<&dyn SecretStore>,
    settings: &AgentSettings,
) -> Result<AgentResolution, ChatError> {
    let mut candidate = settings.agent_id.clone();
    if candidate.is_none() {
        if let Some(store) = secrets {
            candidate = match store.get_secret(AGENT_ID_SECRET).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not read agent id from secret store");
                    None
                }
            };
        }
    }

    if let Some(agent_id) = candidate {
        match agents.get_agent(&agent_id).await {
            Ok(_) => {
                tracing::info!(agent_id = %agent_id, "Using existing agent");
                return Ok(AgentResolution {
                    agent_id,
                    created: false,
                });
            }
            Err(e) => {
                tracing::info!(agent_id = %agent_id, error = %e, "Stored agent id is not valid; creating a new agent");
            }
        }
    }

    let model = settings.model.clone().ok_or_else(|| {
        ChatError::Misconfigured(
            "AZURE_MODEL (deployment name) is required to create an agent".to_string(),
        )
    })?;

    tracing::info!(model = %model, "Creating new agent");
    let agent = agents
        .create_agent(&AgentDefinition {
            model,
            name: settings.name.clone(),
            instructions: settings.instructions.clone(),
        })
        .await?;
    tracing::info!(agent_id = %agent.id, "Created agent");

    if let Some(store) = secrets {
        if let Err(e) = store.set_secret(AGENT_ID_SECRET, &agent.id).await {
            tracing::warn!(error = %e, "Failed to persist agent id to secret store");
        }
    }

    Ok(AgentResolution {
        agent_id: agent.id,
        created: true,
    })
}

/// The chat bridge. The agent is resolved once and remembered; threads are
/// resolved per request.
pub struct ChatService {
    agents: Arc<dyn AgentService>,
    secrets: Option<Arc<dyn SecretStore>>,
    settings: AgentSettings,
    poll: PollSettings,
    /// Resolved agent id. Held across resolution so concurrent first
    /// requests create at most one agent.
    agent_id: Mutex<Option<String>>,
}

impl ChatService {
    pub fn new(
        agents: Arc<dyn AgentService>,
        secrets: Option<Arc<dyn SecretStore>>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            agents,
            secrets,
            settings,
            poll: PollSettings::default(),
            agent_id: Mutex::new(None),
        }
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Relay one message and return the agent's reply.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let agent_id = self.agent_id().await?;

        let (thread_id, fresh) = self
            .resolve_thread(request.conversation_id.as_deref())
            .await?;
        tracing::info!(agent_id = %agent_id, thread_id = %thread_id, fresh, "Posting message to agent");

        if fresh {
            self.replay_history(&thread_id, &request.history).await?;
        }

        self.agents
            .post_message(&thread_id, "user", &request.message)
            .await?;

        let run = match self.agents.create_run(&thread_id, &agent_id).await {
            Ok(run) => run,
            Err(e) => {
                if matches!(e, AgentError::Http { status: 404, .. }) {
                    tracing::warn!(agent_id = %agent_id, "Agent rejected by the service; it will be resolved again");
                    self.forget_agent(&agent_id).await;
                }
                return Err(e.into());
            }
        };
        tracing::info!(run_id = %run.id, status = ?run.status, "Run created");
        self.wait_for_run(&thread_id, run.id, run.status, run.last_error)
            .await?;

        let messages = self.agents.list_messages(&thread_id).await?;
        let reply = select_reply(&messages);
        tracing::debug!(
            message_count = messages.len(),
            history_len = request.history.len(),
            reason = ?reply.map(|(_, reason)| reason),
            "Selected agent reply"
        );

        let response = reply
            .and_then(|(message, _)| message.text.clone())
            .unwrap_or_else(|| NO_REPLY.to_string());

        Ok(ChatReply {
            response,
            conversation_id: thread_id,
        })
    }

    /// The remembered agent id, resolving it on first use.
    async fn agent_id(&self) -> Result<String, ChatError> {
        let mut cached = self.agent_id.lock().await;
        if let Some(agent_id) = cached.as_ref() {
            return Ok(agent_id.clone());
        }
        let resolved = ensure_agent(
            self.agents.as_ref(),
            self.secrets.as_deref(),
            &self.settings,
        )
        .await?;
        *cached = Some(resolved.agent_id.clone());
        Ok(resolved.agent_id)
    }

    async fn forget_agent(&self, agent_id: &str) {
        let mut cached = self.agent_id.lock().await;
        if cached.as_deref() == Some(agent_id) {
            *cached = None;
        }
    }

    /// Reuse the given thread if the service still knows it, otherwise start
    /// a new one. Returns the thread id and whether it was newly created.
    async fn resolve_thread(
        &self,
        conversation_id: Option<&str>,
    ) -> Result<(String, bool), ChatError> {
        if let Some(thread_id) = conversation_id {
            match self.agents.get_thread(thread_id).await {
                Ok(()) => return Ok((thread_id.to_string(), false)),
                Err(e) => {
                    tracing::warn!(thread_id, error = %e, "Conversation not found; starting a new thread");
                }
            }
        }

        let thread_id = self.agents.create_thread().await?;
        Ok((thread_id, true))
    }

    async fn replay_history(
        &self,
        thread_id: &str,
        history: &[HistoryTurn],
    ) -> Result<(), ChatError> {
        let start = history.len().saturating_sub(HISTORY_LIMIT);
        for turn in &history[start..] {
            if turn.content.is_empty() {
                continue;
            }
            self.agents
                .post_message(thread_id, &turn.role, &turn.content)
                .await?;
        }
        Ok(())
    }

    async fn wait_for_run(
        &self,
        thread_id: &str,
        run_id: String,
        mut status: RunStatus,
        mut last_error: Option<RunError>,
    ) -> Result<(), ChatError> {
        let mut polls = 0;
        while !status.is_terminal() {
            if polls >= self.poll.max_polls {
                let waited = self.poll.interval * self.poll.max_polls;
                return Err(AgentError::Timeout(waited.as_secs()).into());
            }
            tokio::time::sleep(self.poll.interval).await;
            let run = self.agents.get_run(thread_id, &run_id).await?;
            status = run.status;
            last_error = run.last_error;
            polls += 1;
        }

        match status {
            RunStatus::Completed => Ok(()),
            RunStatus::Failed => {
                let error = last_error.unwrap_or(RunError {
                    code: None,
                    message: "run failed without an error payload".to_string(),
                });
                tracing::error!(run_id = %run_id, code = ?error.code, message = %error.message, "Agent run failed");
                Err(AgentError::RunFailed {
                    code: error.code,
                    message: error.message,
                }
                .into())
            }
            other => Err(AgentError::RunEnded(other).into()),
        }
    }
}
