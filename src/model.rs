//! The backend model contract.
//!
//! A backend implements [`LanguageModel`] and nothing else; the
//! orchestrator, streaming bridge, and retry layer are written purely
//! against this trait. Per-backend wire formats, transport, and
//! authentication all live behind it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::OrchestratorError;
use crate::types::{ContentPart, ModelRequest, ModelResponse, ModelStream, ModelStreamEvent};

/// A provider-agnostic text generation backend.
///
/// `generate` performs one full model round-trip; `stream` opens one
/// streaming call. Backends without native streaming can rely on the default
/// `stream`, which replays a `generate` response as a synthesized stream.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name, e.g. `"openai"`.
    fn provider(&self) -> &str;

    /// Provider-scoped model identifier, e.g. `"gpt-4.1"`.
    fn model_id(&self) -> &str;

    /// One full request/response round-trip.
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, OrchestratorError>;

    /// One streaming call. The default implementation calls `generate` and
    /// replays the response as stream-start, one delta per content part,
    /// and stream-end.
    async fn stream(&self, request: ModelRequest) -> Result<ModelStream, OrchestratorError> {
        let response = self.generate(request).await?;
        let stream = async_stream::stream! {
            yield Ok(ModelStreamEvent::StreamStart {
                metadata: response.metadata.clone(),
                warnings: response.warnings.clone(),
            });
            for part in &response.content {
                match part {
                    ContentPart::Text { text } => {
                        yield Ok(ModelStreamEvent::TextDelta { delta: text.clone() });
                    }
                    ContentPart::Reasoning { text } => {
                        yield Ok(ModelStreamEvent::ReasoningDelta { delta: text.clone() });
                    }
                    ContentPart::ToolCall { id, name, input } => {
                        yield Ok(ModelStreamEvent::ToolCallDelta {
                            id: id.clone(),
                            name: Some(name.clone()),
                            input_delta: Some(input.clone()),
                        });
                    }
                    ContentPart::ToolResult { call_id, name, output } => {
                        yield Ok(ModelStreamEvent::ToolResult {
                            result: crate::types::ToolResult::new(
                                call_id.clone(),
                                name.clone(),
                                output.clone(),
                            ),
                        });
                    }
                    // Files have no delta representation.
                    ContentPart::File { .. } => {}
                }
            }
            yield Ok(ModelStreamEvent::StreamEnd {
                finish_reason: response.finish_reason.clone(),
                usage: response.usage.clone(),
            });
        };
        Ok(Box::pin(stream))
    }
}

/// Shared handle to a backend. The stream bridge clones it into its task, so
/// the implementation structurally outlives every in-flight request.
pub type SharedModel = Arc<dyn LanguageModel>;

static_assertions::assert_obj_safe!(LanguageModel);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FinishReason, Message, ResponseMetadata, Usage};
    use futures_util::StreamExt;

    struct GenerateOnly;

    #[async_trait]
    impl LanguageModel for GenerateOnly {
        fn provider(&self) -> &str {
            "mock"
        }

        fn model_id(&self) -> &str {
            "generate-only-1"
        }

        async fn generate(
            &self,
            _request: ModelRequest,
        ) -> Result<ModelResponse, OrchestratorError> {
            Ok(ModelResponse::new(
                vec![
                    ContentPart::reasoning("thinking"),
                    ContentPart::text("hello"),
                    ContentPart::tool_call("call_1", "search", r#"{"q":"x"}"#),
                ],
                FinishReason::ToolCalls,
            )
            .with_usage(Usage::with_tokens(5, 7))
            .with_metadata(ResponseMetadata::new("mock", "generate-only-1")))
        }
    }

    #[tokio::test]
    async fn default_stream_replays_generate() {
        let model = GenerateOnly;
        let request = ModelRequest::new(vec![Message::user("hi")]);
        let stream = model.stream(request).await.unwrap();
        let events: Vec<_> = stream.map(|e| e.unwrap()).collect().await;

        assert_eq!(events.len(), 5);
        assert!(matches!(&events[0], ModelStreamEvent::StreamStart { metadata, .. }
            if metadata.provider.as_deref() == Some("mock")));
        assert!(matches!(&events[1], ModelStreamEvent::ReasoningDelta { delta } if delta == "thinking"));
        assert!(matches!(&events[2], ModelStreamEvent::TextDelta { delta } if delta == "hello"));
        assert!(matches!(&events[3], ModelStreamEvent::ToolCallDelta { id, name, input_delta }
            if id == "call_1"
                && name.as_deref() == Some("search")
                && input_delta.as_deref() == Some(r#"{"q":"x"}"#)));
        assert!(matches!(&events[4], ModelStreamEvent::StreamEnd { finish_reason, usage }
            if *finish_reason == FinishReason::ToolCalls
                && usage.as_ref().unwrap().total_tokens == Some(12)));
    }

    #[tokio::test]
    async fn default_stream_propagates_generate_failure() {
        struct Failing;

        #[async_trait]
        impl LanguageModel for Failing {
            fn provider(&self) -> &str {
                "mock"
            }

            fn model_id(&self) -> &str {
                "failing-1"
            }

            async fn generate(
                &self,
                _request: ModelRequest,
            ) -> Result<ModelResponse, OrchestratorError> {
                Err(OrchestratorError::model_with_status("boom", 500))
            }
        }

        let err = Failing
            .stream(ModelRequest::new(vec![Message::user("hi")]))
            .await
            .err()
            .expect("stream open should fail");
        assert!(matches!(
            err,
            OrchestratorError::Model {
                status_code: Some(500),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn trait_object_is_usable_through_arc() {
        let model: SharedModel = Arc::new(GenerateOnly);
        let response = model
            .generate(ModelRequest::new(vec![Message::user("hi")]))
            .await
            .unwrap();
        assert_eq!(response.text(), Some("hello"));
        assert_eq!(model.provider(), "mock");
    }
}
