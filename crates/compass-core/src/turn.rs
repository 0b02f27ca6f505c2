//! Turns and per-conversation state.
//!
//! History is append-only: turns are immutable once created and the router only
//! ever pushes new ones. The reference document is written by the ingestion
//! collaborator (or the repl's `/doc` command); the routing core reads it and
//! never clears it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::route::RouteLabel;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    System,
}

/// One message in a conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub origin: Origin,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::System,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Minimal memory carried across turns: chronological history, an optional
/// ingested document, and the last resolved route.
///
/// Owned by the surrounding application and handed to the router by reference;
/// the router appends the computed turn pair before returning control and never
/// persists the state itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    history: Vec<Turn>,
    reference_document: Option<String>,
    last_route: Option<RouteLabel>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn. The only way history grows; it is never reordered or
    /// mutated in place.
    pub fn push(&mut self, turn: Turn) {
        self.history.push(turn);
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn latest(&self) -> Option<&Turn> {
        self.history.last()
    }

    pub fn last_origin(&self) -> Option<Origin> {
        self.history.last().map(|t| t.origin)
    }

    pub fn reference_document(&self) -> Option<&str> {
        self.reference_document.as_deref()
    }

    /// Called by the document-ingestion collaborator once a document has been
    /// parsed. Lifecycle is owned there, not here.
    pub fn set_reference_document(&mut self, text: impl Into<String>) {
        self.reference_document = Some(text.into());
    }

    pub fn last_route(&self) -> Option<RouteLabel> {
        self.last_route
    }

    pub(crate) fn set_last_route(&mut self, route: RouteLabel) {
        self.last_route = Some(route);
    }

    /// Compact transcript of the most recent `max_turns` turns, used as
    /// classifier context. Empty string when the history is empty.
    pub fn context_summary(&self, max_turns: usize) -> String {
        let start = self.history.len().saturating_sub(max_turns);
        self.history[start..]
            .iter()
            .map(|t| {
                let who = match t.origin {
                    Origin::User => "user",
                    Origin::System => "assistant",
                };
                format!("{}: {}", who, t.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_append_only_and_ordered() {
        let mut state = ConversationState::new();
        state.push(Turn::user("first"));
        state.push(Turn::system("second"));
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.history()[0].text, "first");
        assert_eq!(state.last_origin(), Some(Origin::System));
    }

    #[test]
    fn context_summary_keeps_only_recent_turns() {
        let mut state = ConversationState::new();
        for i in 0..5 {
            state.push(Turn::user(format!("msg {}", i)));
        }
        let summary = state.context_summary(2);
        assert!(summary.contains("msg 3"));
        assert!(summary.contains("msg 4"));
        assert!(!summary.contains("msg 2"));
    }

    #[test]
    fn context_summary_empty_history() {
        let state = ConversationState::new();
        assert_eq!(state.context_summary(6), "");
    }
}
