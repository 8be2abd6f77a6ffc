//! The streaming bridge.
//!
//! [`stream`] opens exactly one backend streaming call on a spawned task and
//! relays it through caller callbacks, returning a [`StreamTextResult`]
//! handle immediately. The handle shares the accumulator with the bridge
//! task, so its getters are live: they may be called at any moment and
//! reflect everything delivered so far. Streaming is single-step; tool
//! calls are surfaced to the caller, never executed here.

mod accumulator;

pub use accumulator::StreamAccumulator;

use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::context::RequestContext;
use crate::error::OrchestratorError;
use crate::model::SharedModel;
use crate::orchestrator::{GenerateOptions, StepResult, build_conversation};
use crate::types::{
    FinishReason, ModelRequest, ResponseMetadata, StreamPart, ToolCall, ToolResult, Usage, Warning,
};

/// Callbacks for stream consumption. Each is optional and runs on the
/// bridge task, so keep them fast.
#[derive(Clone, Default)]
pub struct StreamCallbacks {
    /// Every translated part, in emission order.
    pub on_part: Option<Arc<dyn Fn(&StreamPart) + Send + Sync>>,
    /// In-band provider errors and stream failures.
    pub on_error: Option<Arc<dyn Fn(&OrchestratorError) + Send + Sync>>,
    /// Fires exactly once when the bridge terminates, for any reason.
    pub on_complete: Option<Arc<dyn Fn(&StepResult) + Send + Sync>>,
}

impl StreamCallbacks {
    /// No callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the part callback.
    pub fn on_part(mut self, f: impl Fn(&StreamPart) + Send + Sync + 'static) -> Self {
        self.on_part = Some(Arc::new(f));
        self
    }

    /// Set the error callback.
    pub fn on_error(mut self, f: impl Fn(&OrchestratorError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Set the completion callback.
    pub fn on_complete(mut self, f: impl Fn(&StepResult) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(f));
        self
    }
}

/// Live handle over a streaming request.
///
/// Clones share the same underlying stream state. Getters lock the shared
/// accumulator briefly; they never block on the backend.
#[derive(Debug, Clone)]
pub struct StreamTextResult {
    state: Arc<Mutex<StreamAccumulator>>,
    finished: CancellationToken,
    context: RequestContext,
}

impl StreamTextResult {
    /// Id of the underlying request.
    pub fn request_id(&self) -> String {
        self.context.id().to_string()
    }

    /// Visible text accumulated so far.
    pub fn text(&self) -> String {
        self.state.lock().unwrap().text().to_string()
    }

    /// Reasoning text accumulated so far.
    pub fn reasoning(&self) -> String {
        self.state.lock().unwrap().reasoning().to_string()
    }

    /// Tool calls finalized so far, in arrival order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.state.lock().unwrap().tool_calls().to_vec()
    }

    /// Provider-side tool results seen so far.
    pub fn tool_results(&self) -> Vec<ToolResult> {
        self.state.lock().unwrap().tool_results().to_vec()
    }

    /// Latest usage reported by the backend.
    pub fn usage(&self) -> Option<Usage> {
        self.state.lock().unwrap().usage().cloned()
    }

    /// Finish reason, once the stream ended.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.state.lock().unwrap().finish_reason().cloned()
    }

    /// Metadata from the stream-start event.
    pub fn metadata(&self) -> Option<ResponseMetadata> {
        self.state.lock().unwrap().metadata().cloned()
    }

    /// Warnings collected from the backend.
    pub fn warnings(&self) -> Vec<Warning> {
        self.state.lock().unwrap().warnings().to_vec()
    }

    /// Latest error, when one occurred.
    pub fn error(&self) -> Option<String> {
        self.state.lock().unwrap().error().map(str::to_string)
    }

    /// Whether the bridge has terminated.
    pub fn is_complete(&self) -> bool {
        self.finished.is_cancelled()
    }

    /// Wait for the bridge to terminate. `on_complete` has already fired
    /// when this resolves.
    pub async fn done(&self) {
        self.finished.cancelled().await;
    }

    /// Snapshot of the step as accumulated so far.
    pub fn final_step(&self) -> StepResult {
        self.state.lock().unwrap().step_snapshot()
    }

    /// Cancel the underlying request. The bridge stops consuming and
    /// reports [`OrchestratorError::Cancelled`] through `on_error`.
    pub fn cancel(&self) {
        self.context.cancel();
    }
}

/// Start a streaming request.
///
/// Validates the options like [`generate`](crate::orchestrator::generate),
/// then spawns the bridge task and returns the live handle immediately.
/// Failures after this point, including failing to open the backend stream,
/// are reported through `on_error` and the handle's `error()` getter; there
/// is no retry inside the bridge.
pub fn stream(
    model: SharedModel,
    options: GenerateOptions,
    callbacks: StreamCallbacks,
) -> Result<StreamTextResult, OrchestratorError> {
    let conversation = build_conversation(&options)?;
    let request = ModelRequest {
        messages: conversation,
        tools: options.tools.definitions(),
        tool_choice: options.tool_choice.clone(),
        params: options.params.clone(),
    };

    let state = Arc::new(Mutex::new(StreamAccumulator::new()));
    let finished = CancellationToken::new();
    let handle = StreamTextResult {
        state: Arc::clone(&state),
        finished: finished.clone(),
        context: options.context.clone(),
    };

    let context = options.context;
    tokio::spawn(async move {
        run_bridge(model, request, context, state, callbacks).await;
        finished.cancel();
    });

    Ok(handle)
}

async fn run_bridge(
    model: SharedModel,
    request: ModelRequest,
    context: RequestContext,
    state: Arc<Mutex<StreamAccumulator>>,
    callbacks: StreamCallbacks,
) {
    tracing::debug!(
        request_id = %context.id(),
        provider = model.provider(),
        model = model.model_id(),
        "stream bridge started"
    );

    match model.stream(request).await {
        Ok(mut events) => loop {
            tokio::select! {
                _ = context.done() => {
                    let err = OrchestratorError::Cancelled;
                    state.lock().unwrap().record_error(err.to_string());
                    if let Some(cb) = &callbacks.on_error {
                        cb(&err);
                    }
                    break;
                }
                item = events.next() => {
                    match item {
                        None => break,
                        Some(Ok(event)) => {
                            // Fold before notifying, so getters already
                            // reflect a part when its callback runs.
                            let parts = state.lock().unwrap().absorb(event);
                            for part in &parts {
                                if let StreamPart::Error { message } = part {
                                    if let Some(cb) = &callbacks.on_error {
                                        cb(&OrchestratorError::model(message.clone()));
                                    }
                                }
                                if let Some(cb) = &callbacks.on_part {
                                    cb(part);
                                }
                            }
                            if state.lock().unwrap().is_finished() {
                                break;
                            }
                        }
                        Some(Err(err)) => {
                            state.lock().unwrap().record_error(err.to_string());
                            if let Some(cb) = &callbacks.on_error {
                                cb(&err);
                            }
                            break;
                        }
                    }
                }
            }
        },
        Err(err) => {
            state.lock().unwrap().record_error(err.to_string());
            if let Some(cb) = &callbacks.on_error {
                cb(&err);
            }
        }
    }

    let step = state.lock().unwrap().step_snapshot();
    if let Some(cb) = &callbacks.on_complete {
        cb(&step);
    }
    tracing::debug!(
        request_id = %context.id(),
        finish = ?step.finish_reason,
        "stream bridge finished"
    );
}
