//! Stream state accumulation and event translation.

use std::collections::HashMap;

use crate::orchestrator::StepResult;
use crate::types::{
    FinishReason, ModelStreamEvent, ResponseMetadata, StreamPart, ToolCall, ToolResult, Usage,
    Warning,
};

/// An in-flight tool call being assembled from deltas.
#[derive(Debug, Clone, Default)]
struct ToolCallBuilder {
    name: String,
    arguments: String,
}

/// Accumulates one streaming step while translating backend events into
/// caller-facing [`StreamPart`]s.
///
/// Translation and accumulation are a single operation, so by the time a
/// part reaches a callback the getters already reflect it. In-flight tool
/// calls are keyed by id; arrival order is kept separately so finalization
/// at stream end is deterministic.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    reasoning: String,
    builders: HashMap<String, ToolCallBuilder>,
    builder_order: Vec<String>,
    tool_calls: Vec<ToolCall>,
    tool_results: Vec<ToolResult>,
    usage: Option<Usage>,
    finish_reason: Option<FinishReason>,
    metadata: Option<ResponseMetadata>,
    warnings: Vec<Warning>,
    error: Option<String>,
    finished: bool,
}

impl StreamAccumulator {
    /// Fresh accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one backend event into the state and return the caller-facing
    /// parts it maps to, in delivery order. Structural events
    /// (stream-start, usage updates, raw) map to no parts.
    pub fn absorb(&mut self, event: ModelStreamEvent) -> Vec<StreamPart> {
        match event {
            ModelStreamEvent::StreamStart { metadata, warnings } => {
                self.metadata = Some(metadata);
                self.warnings.extend(warnings);
                Vec::new()
            }
            ModelStreamEvent::TextDelta { delta } => {
                self.text.push_str(&delta);
                vec![StreamPart::TextDelta { delta }]
            }
            ModelStreamEvent::ReasoningDelta { delta } => {
                self.reasoning.push_str(&delta);
                vec![StreamPart::ReasoningDelta { delta }]
            }
            ModelStreamEvent::ToolCallDelta {
                id,
                name,
                input_delta,
            } => {
                let mut parts = Vec::new();
                let opened = !self.builders.contains_key(&id);
                if opened {
                    self.builder_order.push(id.clone());
                }
                let builder = self.builders.entry(id.clone()).or_default();
                if let Some(name) = name {
                    builder.name = name;
                }
                if opened {
                    parts.push(StreamPart::ToolCallStart {
                        id: id.clone(),
                        name: builder.name.clone(),
                    });
                }
                if let Some(delta) = input_delta {
                    builder.arguments.push_str(&delta);
                    parts.push(StreamPart::ToolCallDelta {
                        id,
                        input_delta: delta,
                    });
                }
                parts
            }
            ModelStreamEvent::ToolResult { result } => {
                self.tool_results.push(result.clone());
                vec![StreamPart::ToolResult {
                    tool_result: result,
                }]
            }
            ModelStreamEvent::UsageUpdate { usage } => {
                // Updates are cumulative; replace, never sum.
                self.usage = Some(usage);
                Vec::new()
            }
            ModelStreamEvent::StreamEnd {
                finish_reason,
                usage,
            } => {
                let mut parts = Vec::new();
                for id in std::mem::take(&mut self.builder_order) {
                    if let Some(builder) = self.builders.remove(&id) {
                        let call = ToolCall::new(id, builder.name, builder.arguments);
                        self.tool_calls.push(call.clone());
                        parts.push(StreamPart::ToolCallComplete { tool_call: call });
                    }
                }
                if let Some(usage) = usage {
                    self.usage = Some(usage);
                }
                self.finish_reason = Some(finish_reason.clone());
                self.finished = true;
                let usage = self.usage.clone().unwrap_or_default();
                parts.push(StreamPart::StepFinish {
                    finish_reason: finish_reason.clone(),
                    usage: usage.clone(),
                });
                parts.push(StreamPart::Finish {
                    finish_reason,
                    total_usage: usage,
                });
                parts
            }
            ModelStreamEvent::Error { message } => {
                self.error = Some(message.clone());
                vec![StreamPart::Error { message }]
            }
            ModelStreamEvent::Raw { .. } => Vec::new(),
        }
    }

    /// Record a failure that interrupted the stream.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Accumulated visible text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Accumulated reasoning text.
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// Tool calls finalized so far, in arrival order.
    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    /// Provider-side tool results seen so far.
    pub fn tool_results(&self) -> &[ToolResult] {
        &self.tool_results
    }

    /// Latest usage reported by the backend.
    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }

    /// Finish reason, once the stream ended.
    pub fn finish_reason(&self) -> Option<&FinishReason> {
        self.finish_reason.as_ref()
    }

    /// Metadata from the stream-start event.
    pub fn metadata(&self) -> Option<&ResponseMetadata> {
        self.metadata.as_ref()
    }

    /// Warnings collected from the backend.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Latest error, in-band or stream-level.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the backend signalled stream end.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Snapshot of the step as accumulated so far.
    pub fn step_snapshot(&self) -> StepResult {
        StepResult {
            text: self.text.clone(),
            reasoning: self.reasoning.clone(),
            tool_calls: self.tool_calls.clone(),
            tool_results: self.tool_results.clone(),
            finish_reason: self
                .finish_reason
                .clone()
                .unwrap_or(FinishReason::Unknown),
            usage: self.usage.clone().unwrap_or_default(),
            metadata: self.metadata.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_deltas_concatenate() {
        let mut acc = StreamAccumulator::new();
        let parts = acc.absorb(ModelStreamEvent::TextDelta { delta: "Hel".into() });
        assert_eq!(parts, vec![StreamPart::TextDelta { delta: "Hel".into() }]);
        assert_eq!(acc.text(), "Hel");

        acc.absorb(ModelStreamEvent::TextDelta { delta: "lo".into() });
        assert_eq!(acc.text(), "Hello");
        assert!(!acc.is_finished());
    }

    #[test]
    fn stream_start_is_structural() {
        let mut acc = StreamAccumulator::new();
        let parts = acc.absorb(ModelStreamEvent::StreamStart {
            metadata: ResponseMetadata::new("mock", "m-1"),
            warnings: vec![Warning::unsupported_setting("seed")],
        });
        assert!(parts.is_empty());
        assert_eq!(acc.metadata().unwrap().provider.as_deref(), Some("mock"));
        assert_eq!(acc.warnings().len(), 1);
    }

    #[test]
    fn tool_calls_assemble_across_deltas_in_arrival_order() {
        let mut acc = StreamAccumulator::new();

        let parts = acc.absorb(ModelStreamEvent::ToolCallDelta {
            id: "a".into(),
            name: Some("search".into()),
            input_delta: Some("{\"q\":".into()),
        });
        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[0], StreamPart::ToolCallStart { id, name }
            if id == "a" && name == "search"));
        assert!(matches!(&parts[1], StreamPart::ToolCallDelta { id, .. } if id == "a"));

        // Second call opens while the first is still in flight.
        acc.absorb(ModelStreamEvent::ToolCallDelta {
            id: "b".into(),
            name: Some("fetch".into()),
            input_delta: Some("{}".into()),
        });
        let parts = acc.absorb(ModelStreamEvent::ToolCallDelta {
            id: "a".into(),
            name: None,
            input_delta: Some("\"rust\"}".into()),
        });
        // Known id: delta only, no second start.
        assert_eq!(parts.len(), 1);

        let parts = acc.absorb(ModelStreamEvent::StreamEnd {
            finish_reason: FinishReason::ToolCalls,
            usage: None,
        });
        // Completions in arrival order, then step-finish and finish.
        assert_eq!(parts.len(), 4);
        assert!(matches!(&parts[0], StreamPart::ToolCallComplete { tool_call }
            if tool_call.id == "a" && tool_call.arguments == "{\"q\":\"rust\"}"));
        assert!(matches!(&parts[1], StreamPart::ToolCallComplete { tool_call }
            if tool_call.id == "b" && tool_call.name == "fetch"));
        assert!(matches!(&parts[2], StreamPart::StepFinish { .. }));
        assert!(matches!(&parts[3], StreamPart::Finish { .. }));

        assert_eq!(acc.tool_calls().len(), 2);
        assert_eq!(acc.tool_calls()[0].id, "a");
        assert!(acc.is_finished());
        assert_eq!(acc.finish_reason(), Some(&FinishReason::ToolCalls));
    }

    #[test]
    fn usage_updates_replace_and_stream_end_overrides() {
        let mut acc = StreamAccumulator::new();
        assert!(acc.absorb(ModelStreamEvent::UsageUpdate {
            usage: Usage::with_tokens(1, 1),
        })
        .is_empty());
        acc.absorb(ModelStreamEvent::UsageUpdate {
            usage: Usage::with_tokens(3, 4),
        });
        assert_eq!(acc.usage().unwrap().total_tokens, Some(7));

        let parts = acc.absorb(ModelStreamEvent::StreamEnd {
            finish_reason: FinishReason::Stop,
            usage: Some(Usage::with_tokens(10, 10)),
        });
        assert!(matches!(&parts[0], StreamPart::StepFinish { usage, .. }
            if usage.total_tokens == Some(20)));
        assert!(matches!(&parts[1], StreamPart::Finish { total_usage, .. }
            if total_usage.total_tokens == Some(20)));
    }

    #[test]
    fn stream_end_without_usage_keeps_running_usage() {
        let mut acc = StreamAccumulator::new();
        acc.absorb(ModelStreamEvent::UsageUpdate {
            usage: Usage::with_tokens(2, 3),
        });
        acc.absorb(ModelStreamEvent::StreamEnd {
            finish_reason: FinishReason::Stop,
            usage: None,
        });
        assert_eq!(acc.usage().unwrap().total_tokens, Some(5));
    }

    #[test]
    fn error_events_are_recorded_and_forwarded() {
        let mut acc = StreamAccumulator::new();
        let parts = acc.absorb(ModelStreamEvent::Error {
            message: "provider hiccup".into(),
        });
        assert_eq!(parts.len(), 1);
        assert!(parts[0].is_error());
        assert_eq!(acc.error(), Some("provider hiccup"));
        // An error event alone does not finish the stream.
        assert!(!acc.is_finished());
    }

    #[test]
    fn raw_events_are_dropped() {
        let mut acc = StreamAccumulator::new();
        let parts = acc.absorb(ModelStreamEvent::Raw {
            event_type: "ping".into(),
            data: serde_json::json!({}),
        });
        assert!(parts.is_empty());
    }

    #[test]
    fn snapshot_reflects_accumulated_state() {
        let mut acc = StreamAccumulator::new();
        acc.absorb(ModelStreamEvent::TextDelta { delta: "hi".into() });
        let snapshot = acc.step_snapshot();
        assert_eq!(snapshot.text, "hi");
        assert_eq!(snapshot.finish_reason, FinishReason::Unknown);

        acc.absorb(ModelStreamEvent::StreamEnd {
            finish_reason: FinishReason::Stop,
            usage: Some(Usage::with_tokens(1, 2)),
        });
        let snapshot = acc.step_snapshot();
        assert_eq!(snapshot.finish_reason, FinishReason::Stop);
        assert_eq!(snapshot.usage.total_tokens, Some(3));
    }
}
