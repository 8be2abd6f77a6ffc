//! Streaming event vocabularies.
//!
//! Two layers: [`ModelStreamEvent`] is what a backend emits, coarse and
//! provider-shaped; [`StreamPart`] is what callers receive from the bridge,
//! with tool calls tracked from start to completion. The bridge in
//! [`crate::streaming`] translates between them.

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use super::common::{FinishReason, ResponseMetadata, Warning};
use super::tools::{ToolCall, ToolResult};
use super::usage::Usage;
use crate::error::OrchestratorError;

/// The stream a backend returns from a streaming call.
pub type ModelStream = Pin<Box<dyn Stream<Item = Result<ModelStreamEvent, OrchestratorError>> + Send>>;

/// One event from a backend stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ModelStreamEvent {
    /// First event: response metadata and any warnings.
    StreamStart {
        /// Response metadata known at stream open.
        #[serde(default)]
        metadata: ResponseMetadata,
        /// Non-fatal problems the backend wants surfaced.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<Warning>,
    },
    /// Incremental visible text.
    TextDelta {
        /// The text fragment.
        delta: String,
    },
    /// Incremental reasoning text.
    ReasoningDelta {
        /// The reasoning fragment.
        delta: String,
    },
    /// Incremental tool call. The first delta for an id opens the call;
    /// `name` and `input_delta` may arrive across several events.
    ToolCallDelta {
        /// Provider-assigned call id.
        #[serde(rename = "toolCallId")]
        id: String,
        /// Tool name, when this fragment carries it.
        #[serde(rename = "toolName", skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        /// Argument text fragment, when this fragment carries one.
        #[serde(rename = "inputDelta", skip_serializing_if = "Option::is_none")]
        input_delta: Option<String>,
    },
    /// A tool result produced on the provider side.
    ToolResult {
        /// The completed result.
        result: ToolResult,
    },
    /// Cumulative usage so far. Later updates replace earlier ones.
    UsageUpdate {
        /// Usage reported by the provider.
        usage: Usage,
    },
    /// Final event: finish reason and final usage.
    StreamEnd {
        /// Why generation stopped.
        #[serde(rename = "finishReason")]
        finish_reason: FinishReason,
        /// Final usage, when reported.
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
    /// In-band provider error. The stream may still complete afterwards.
    Error {
        /// Provider's description of the problem.
        message: String,
    },
    /// Provider event with no uniform mapping. Dropped by the bridge.
    Raw {
        /// Provider's event name.
        #[serde(rename = "eventType")]
        event_type: String,
        /// Raw payload.
        data: serde_json::Value,
    },
}

/// One part delivered to the caller during streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamPart {
    /// Incremental visible text.
    TextDelta {
        /// The text fragment.
        delta: String,
    },
    /// Incremental reasoning text.
    ReasoningDelta {
        /// The reasoning fragment.
        delta: String,
    },
    /// A new tool call opened.
    ToolCallStart {
        /// Provider-assigned call id.
        #[serde(rename = "toolCallId")]
        id: String,
        /// Tool name as known so far; may still be empty if the provider
        /// sends it in a later fragment.
        #[serde(rename = "toolName")]
        name: String,
    },
    /// Argument text grew for an open tool call.
    ToolCallDelta {
        /// Id of the open call.
        #[serde(rename = "toolCallId")]
        id: String,
        /// The argument fragment.
        #[serde(rename = "inputDelta")]
        input_delta: String,
    },
    /// An open tool call finalized with its full arguments.
    ToolCallComplete {
        /// The assembled call.
        #[serde(rename = "toolCall")]
        tool_call: ToolCall,
    },
    /// A provider-side tool result arrived.
    ToolResult {
        /// The result.
        #[serde(rename = "toolResult")]
        tool_result: ToolResult,
    },
    /// The streamed step finished.
    StepFinish {
        /// Why generation stopped.
        #[serde(rename = "finishReason")]
        finish_reason: FinishReason,
        /// Usage for the step.
        usage: Usage,
    },
    /// The stream is done; always the last non-error part.
    Finish {
        /// Why generation stopped.
        #[serde(rename = "finishReason")]
        finish_reason: FinishReason,
        /// Usage across the whole stream.
        #[serde(rename = "totalUsage")]
        total_usage: Usage,
    },
    /// An in-band error was relayed.
    Error {
        /// Description of the problem.
        message: String,
    },
}

impl StreamPart {
    /// Whether this part reports an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Whether this is the final part of a stream.
    pub fn is_finish(&self) -> bool {
        matches!(self, Self::Finish { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_serde_shapes() {
        let event = ModelStreamEvent::ToolCallDelta {
            id: "call_1".into(),
            name: Some("search".into()),
            input_delta: Some("{\"q\"".into()),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "tool-call-delta",
                "toolCallId": "call_1",
                "toolName": "search",
                "inputDelta": "{\"q\"",
            })
        );

        let end = ModelStreamEvent::StreamEnd {
            finish_reason: FinishReason::Stop,
            usage: None,
        };
        let value = serde_json::to_value(&end).unwrap();
        assert_eq!(value["type"], "stream-end");
        assert_eq!(value["finishReason"], "stop");
    }

    #[test]
    fn part_serde_shapes() {
        let part = StreamPart::ToolCallComplete {
            tool_call: ToolCall::new("call_1", "search", "{}"),
        };
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["type"], "tool-call-complete");
        assert_eq!(value["toolCall"]["id"], "call_1");

        let part = StreamPart::Finish {
            finish_reason: FinishReason::Stop,
            total_usage: Usage::with_tokens(1, 2),
        };
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["totalUsage"]["totalTokens"], 3);
        assert!(part.is_finish());
        assert!(!part.is_error());
    }
}
