//! Picking the agent's reply out of a thread listing.
//!
//! The agent service does not document the order in which it lists thread
//! messages. Timestamps are used whenever any agent message carries one;
//! without them the order is guessed from the first message in the listing.

use crate::ports::AgentMessage;

/// How a reply was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// Newest by timestamp.
    Timestamp,
    /// No timestamps; the listing starts with an agent message, so it is
    /// assumed to be newest-first.
    NewestFirst,
    /// No timestamps; assumed oldest-first.
    OldestFirst,
}

/// Select the most recent agent-authored message.
///
/// Timestamps are RFC 3339 UTC strings, which order correctly as plain
/// strings. Returns `None` when the thread holds no agent message.
pub fn select_reply(messages: &[AgentMessage]) -> Option<(&AgentMessage, SelectionReason)> {
    let authored: Vec<&AgentMessage> = messages
        .iter()
        .filter(|m| m.is_agent_authored())
        .collect();

    let newest_first = listed_newest_first(messages);

    if authored.iter().any(|m| m.created_at.is_some()) {
        let stamp = |m: &AgentMessage| m.created_at.clone().unwrap_or_default();
        let latest = authored.iter().map(|m| stamp(*m)).max()?;
        let mut tied = authored.iter().copied().filter(|m| stamp(*m) == latest);
        // Replies posted within the same second share a timestamp; the
        // listing position decides between them.
        let newest = if newest_first { tied.next() } else { tied.last() }?;
        return Some((newest, SelectionReason::Timestamp));
    }

    if newest_first {
        authored
            .first()
            .map(|m| (*m, SelectionReason::NewestFirst))
    } else {
        authored
            .last()
            .map(|m| (*m, SelectionReason::OldestFirst))
    }
}

/// Direction of the listing: from the outermost timestamps when they differ,
/// otherwise from whether it opens with an agent message.
fn listed_newest_first(messages: &[AgentMessage]) -> bool {
    let first = messages.iter().find_map(|m| m.created_at.as_deref());
    let last = messages.iter().rev().find_map(|m| m.created_at.as_deref());
    match (first, last) {
        (Some(first), Some(last)) if first != last => first > last,
        _ => messages.first().is_some_and(AgentMessage::is_agent_authored),
    }
}
