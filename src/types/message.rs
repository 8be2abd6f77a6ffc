//! Conversation messages.

use serde::{Deserialize, Serialize};

use super::content::ContentPart;
use super::tools::ToolResult;

/// Who a message is from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions to the model.
    System,
    /// The end user.
    User,
    /// The model.
    Assistant,
    /// Tool results fed back to the model.
    Tool,
}

/// Message body: plain text or structured parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// Structured content parts.
    Parts(Vec<ContentPart>),
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced this turn.
    pub role: Role,
    /// What it says.
    pub content: MessageContent,
}

impl Message {
    /// Message with an explicit role and content.
    pub fn new(role: Role, content: MessageContent) -> Self {
        Self { role, content }
    }

    /// System instruction.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, MessageContent::Text(text.into()))
    }

    /// User text message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, MessageContent::Text(text.into()))
    }

    /// Assistant text message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, MessageContent::Text(text.into()))
    }

    /// Assistant message with structured parts, e.g. text plus tool calls.
    pub fn assistant_parts(parts: Vec<ContentPart>) -> Self {
        Self::new(Role::Assistant, MessageContent::Parts(parts))
    }

    /// Tool message carrying the results of executed tool calls.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        let parts = results
            .into_iter()
            .map(|r| ContentPart::tool_result(r.call_id, r.name, r.output))
            .collect();
        Self::new(Role::Tool, MessageContent::Parts(parts))
    }

    /// First text in this message: the whole body for text content, the
    /// first `Text` part otherwise.
    pub fn content_text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(parts) => parts.iter().find_map(|p| p.as_text()),
        }
    }
}
