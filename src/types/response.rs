//! The uniform response a backend returns for one model call.

use serde::{Deserialize, Serialize};

use super::common::{FinishReason, ResponseMetadata, Warning};
use super::content::ContentPart;
use super::tools::ToolCall;
use super::usage::Usage;

/// One complete model response, already mapped to the uniform vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Ordered content parts.
    pub content: Vec<ContentPart>,
    /// Why generation stopped.
    pub finish_reason: FinishReason,
    /// Token usage for this call, when the provider reported it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Response metadata.
    #[serde(default)]
    pub metadata: ResponseMetadata,
    /// Non-fatal problems the backend wants surfaced.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl ModelResponse {
    /// Response with content and a finish reason.
    pub fn new(content: Vec<ContentPart>, finish_reason: FinishReason) -> Self {
        Self {
            content,
            finish_reason,
            usage: None,
            metadata: ResponseMetadata::default(),
            warnings: Vec::new(),
        }
    }

    /// Plain text response that stopped naturally.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(vec![ContentPart::text(text)], FinishReason::Stop)
    }

    /// Attach usage.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: ResponseMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach warnings.
    pub fn with_warnings(mut self, warnings: Vec<Warning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// First `Text` part, which is what a step reports as its text.
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|p| p.as_text())
    }

    /// All reasoning parts concatenated.
    pub fn reasoning_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|p| match p {
                ContentPart::Reasoning { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Tool calls in content order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|p| match p {
                ContentPart::ToolCall { id, name, input } => {
                    Some(ToolCall::new(id.clone(), name.clone(), input.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Whether the response contains any tool call.
    pub fn has_tool_calls(&self) -> bool {
        self.content.iter().any(|p| p.is_tool_call())
    }
}
