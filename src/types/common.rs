//! Common response-level types shared across the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why the model stopped generating.
///
/// Backends map their provider-specific stop markers onto this enum before
/// handing a response to the orchestrator; only [`FinishReason::ToolCalls`]
/// continues the agentic loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of generation.
    Stop,
    /// The output token limit was reached.
    Length,
    /// The model requested one or more tool invocations.
    ToolCalls,
    /// Content was withheld by the provider's safety filter.
    ContentFilter,
    /// A provider-specific reason with no uniform mapping.
    Other(String),
    /// The backend did not report a reason.
    Unknown,
}

impl FinishReason {
    /// Whether this reason keeps the step loop going.
    pub fn is_tool_calls(&self) -> bool {
        matches!(self, Self::ToolCalls)
    }
}

impl Default for FinishReason {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Metadata attached to a model response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Provider-assigned response id.
    pub id: Option<String>,
    /// Model that produced the response.
    pub model_id: Option<String>,
    /// When the response was created.
    pub timestamp: Option<DateTime<Utc>>,
    /// Provider name.
    pub provider: Option<String>,
}

impl ResponseMetadata {
    /// Metadata stamped with the current time.
    pub fn new(provider: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            id: None,
            model_id: Some(model_id.into()),
            timestamp: Some(Utc::now()),
            provider: Some(provider.into()),
        }
    }

    /// Set the provider-assigned response id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Non-fatal problem reported by a backend while handling a request, for
/// example a generation parameter the provider does not support. Warnings
/// ride on responses and stream-start events; they never fail the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Warning {
    /// A requested setting was ignored or approximated.
    UnsupportedSetting {
        /// The setting in question, e.g. `"seed"`.
        setting: String,
        /// Optional explanation from the backend.
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    /// A declared tool cannot be used by this backend.
    UnsupportedTool {
        /// Name of the affected tool.
        #[serde(rename = "toolName")]
        tool_name: String,
        /// Optional explanation from the backend.
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    /// Anything else worth surfacing.
    Other {
        /// Free-form description.
        message: String,
    },
}

impl Warning {
    /// Warning for an ignored or approximated setting.
    pub fn unsupported_setting(setting: impl Into<String>) -> Self {
        Self::UnsupportedSetting {
            setting: setting.into(),
            details: None,
        }
    }

    /// Warning for a tool the backend cannot use.
    pub fn unsupported_tool(tool_name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::UnsupportedTool {
            tool_name: tool_name.into(),
            details: Some(details.into()),
        }
    }

    /// Free-form warning.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}
