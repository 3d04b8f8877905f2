//! Chat transcript — append-only conversation history between the user and the coach.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Greeting that opens every new conversation after a questionnaire submission.
pub const GREETING: &str = "Thank you for completing the questionnaire! I'm your AI talent agent, \
    and I'm here to help with your career questions. I've analyzed your profile information \
    and I'm ready to provide personalized advice. What would you like to know about your \
    career development?";

/// Shown in place of a reply when the inference call fails.
pub const ERROR_REPLY: &str =
    "I'm sorry, I encountered an error processing your message. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content.into(), false)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content.into(), false)
    }

    /// Assistant message standing in for a failed reply.
    pub fn assistant_error() -> Self {
        Self::new(ChatRole::Assistant, ERROR_REPLY.to_string(), true)
    }

    fn new(role: ChatRole, content: String, is_error: bool) -> Self {
        Self {
            role,
            content,
            is_error,
            created_at: Utc::now(),
        }
    }
}

/// Ordered chat history. Messages are only ever appended; rendering order is
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    /// Transcript for a fresh questionnaire cycle: a single assistant greeting.
    pub fn seeded() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    /// Rebuilds a transcript from history supplied by the client, keeping its order.
    pub fn from_history(history: Vec<ChatMessage>) -> Self {
        Self { messages: history }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}
