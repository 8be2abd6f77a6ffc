//! Content parts, the units a message or model response is made of.

use serde::{Deserialize, Serialize};

/// One piece of message or response content.
///
/// Serialized with a `type` tag and kebab-case variant names so a response
/// body reads like the wire formats it is adapted from, e.g.
/// `{"type": "tool-call", "toolCallId": "call_1", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPart {
    /// Visible model text.
    Text {
        /// The text itself.
        text: String,
    },
    /// Hidden reasoning text, when the provider exposes it.
    Reasoning {
        /// The reasoning text.
        text: String,
    },
    /// A tool invocation requested by the model.
    ToolCall {
        /// Provider-assigned call id, echoed back on the result.
        #[serde(rename = "toolCallId")]
        id: String,
        /// Name of the tool to invoke.
        #[serde(rename = "toolName")]
        name: String,
        /// Raw JSON text of the arguments, exactly as the model produced it.
        input: String,
    },
    /// The outcome of a tool invocation, fed back to the model.
    ToolResult {
        /// Id of the call this result answers.
        #[serde(rename = "toolCallId")]
        call_id: String,
        /// Name of the tool that ran.
        #[serde(rename = "toolName")]
        name: String,
        /// Tool output, or an error description when execution failed.
        output: serde_json::Value,
    },
    /// Binary or remote file content.
    File {
        /// MIME type, e.g. `"image/png"`.
        #[serde(rename = "mediaType")]
        media_type: String,
        /// Where the bytes live.
        source: FileSource,
    },
}

/// Location of file content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FileSource {
    /// Fetchable URL.
    Url {
        /// The URL.
        url: String,
    },
    /// Inline base64 payload.
    Base64 {
        /// Encoded bytes.
        data: String,
    },
}

impl ContentPart {
    /// Text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Reasoning part.
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning { text: text.into() }
    }

    /// Tool call part. `input` is the raw JSON argument text.
    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self::ToolCall {
            id: id.into(),
            name: name.into(),
            input: input.into(),
        }
    }

    /// Tool result part.
    pub fn tool_result(
        call_id: impl Into<String>,
        name: impl Into<String>,
        output: serde_json::Value,
    ) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            name: name.into(),
            output,
        }
    }

    /// File part referencing a URL.
    pub fn file_url(media_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self::File {
            media_type: media_type.into(),
            source: FileSource::Url { url: url.into() },
        }
    }

    /// File part with inline base64 data.
    pub fn file_base64(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::File {
            media_type: media_type.into(),
            source: FileSource::Base64 { data: data.into() },
        }
    }

    /// The text of a `Text` part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Whether this is a `Text` part.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    /// Whether this is a `ToolCall` part.
    pub fn is_tool_call(&self) -> bool {
        matches!(self, Self::ToolCall { .. })
    }
}
