//! UI-agnostic chat state types
//!
//! These are shared by the controller and whatever front end renders them
//! (the terminal UI, tests) and don't depend on any UI framework.

use serde::{Deserialize, Serialize};

/// A message in the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Who a chat message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Ai,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "Ви",
            ChatRole::Ai => "AI Друг",
        }
    }
}
