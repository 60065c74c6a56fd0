//! Translation of agent-service failures into chat errors.

use std::sync::LazyLock;

use regex::Regex;

use super::ChatError;
use crate::ports::AgentError;

/// Error code the agent service uses for throttled runs.
pub const RATE_LIMIT_CODE: &str = "rate_limit_exceeded";

/// Retry hint used when the service gives none.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

static SECONDS_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*second").expect("seconds hint pattern is valid"));

/// Parse a "try again in N seconds" hint out of free text.
pub fn retry_after_hint(text: &str) -> Option<u64> {
    SECONDS_HINT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn mentions_rate_limit(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains(RATE_LIMIT_CODE) || lower.contains("rate limit")
}

fn rate_limited(retry_after: Option<u64>, message: &str) -> ChatError {
    let retry_after = retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    let message = if message.is_empty() {
        format!("Rate limit exceeded. Try again in {retry_after} seconds.")
    } else {
        message.to_string()
    };
    ChatError::RateLimited {
        retry_after,
        message,
    }
}

fn classify(err: &AgentError) -> Option<ChatError> {
    match err {
        AgentError::RunFailed {
            code: Some(code),
            message,
        } if code == RATE_LIMIT_CODE => Some(rate_limited(retry_after_hint(message), message)),
        AgentError::Http {
            status,
            code,
            message,
            retry_after,
        } if *status == 429 || code.as_deref() == Some(RATE_LIMIT_CODE) => Some(rate_limited(
            retry_after.or_else(|| retry_after_hint(message)),
            message,
        )),
        _ => {
            let text = err.to_string();
            mentions_rate_limit(&text).then(|| rate_limited(retry_after_hint(&text), ""))
        }
    }
}

impl From<AgentError> for ChatError {
    fn from(err: AgentError) -> Self {
        classify(&err).unwrap_or(ChatError::Agent(err))
    }
}
