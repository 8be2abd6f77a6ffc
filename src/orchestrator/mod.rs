//! The multi-step request orchestrator.
//!
//! [`generate`] drives the agentic loop: call the model, execute any tools
//! it requested, feed the results back, and repeat until the model stops or
//! `max_steps` is reached. Each round-trip is recorded as a [`StepResult`];
//! the final [`GenerateTextResult`] carries the last step's content plus
//! usage summed across all steps.

use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::OrchestratorError;
use crate::model::LanguageModel;
use crate::retry::{RetryPolicy, execute_with_retry};
use crate::tools::{self, ToolSet};
use crate::types::{
    ContentPart, FinishReason, GenerationParams, Message, ModelRequest, ResponseMetadata,
    ToolCall, ToolChoice, ToolResult, Usage,
};

/// Callback invoked after each completed step.
pub type StepCallback = Arc<dyn Fn(&StepResult) + Send + Sync>;

/// Options for [`generate`] and [`stream`](crate::streaming::stream).
#[derive(Clone)]
pub struct GenerateOptions {
    /// Plain text prompt. Exactly one of `prompt` and `messages` must be
    /// set.
    pub prompt: Option<String>,
    /// Explicit conversation history. Exactly one of `prompt` and
    /// `messages` must be set.
    pub messages: Option<Vec<Message>>,
    /// System instruction, prepended to the conversation.
    pub system: Option<String>,
    /// Tools the model may call.
    pub tools: ToolSet,
    /// How the model may use the tools.
    pub tool_choice: ToolChoice,
    /// Generation parameters passed through to the backend.
    pub params: GenerationParams,
    /// Upper bound on model round-trips. Defaults to 1, which disables the
    /// agentic loop.
    pub max_steps: usize,
    /// Retry policy wrapped around every model call.
    pub retry: RetryPolicy,
    /// Request identity, cancellation, and deadline.
    pub context: RequestContext,
    /// Invoked after each step, before the next model call.
    pub on_step_finish: Option<StepCallback>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            prompt: None,
            messages: None,
            system: None,
            tools: ToolSet::new(),
            tool_choice: ToolChoice::default(),
            params: GenerationParams::default(),
            max_steps: 1,
            retry: RetryPolicy::new(),
            context: RequestContext::new(),
            on_step_finish: None,
        }
    }
}

impl GenerateOptions {
    /// Options for a single text prompt.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    /// Options for an explicit conversation history.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Some(messages),
            ..Self::default()
        }
    }

    /// Set the system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the tools.
    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    /// Set the tool choice.
    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }

    /// Set the generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Set the step bound.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the request context.
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Set the per-step callback.
    pub fn on_step_finish(mut self, f: impl Fn(&StepResult) + Send + Sync + 'static) -> Self {
        self.on_step_finish = Some(Arc::new(f));
        self
    }
}

/// One completed model round-trip. Immutable once recorded.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// First text part of the step's response, empty if none.
    pub text: String,
    /// Concatenated reasoning parts.
    pub reasoning: String,
    /// Tool calls the model issued this step.
    pub tool_calls: Vec<ToolCall>,
    /// Results of the calls that were executed.
    pub tool_results: Vec<ToolResult>,
    /// Why this step's generation stopped.
    pub finish_reason: FinishReason,
    /// Usage for this step alone, empty when the backend reported none.
    pub usage: Usage,
    /// Metadata of this step's response.
    pub metadata: ResponseMetadata,
}

impl StepResult {
    /// Sum usage across steps with [`Usage::merge`].
    pub fn sum_usage(steps: &[StepResult]) -> Usage {
        steps
            .iter()
            .fold(Usage::new(), |acc, step| acc.merge(&step.usage))
    }
}

/// Final result of [`generate`].
#[derive(Debug, Clone)]
pub struct GenerateTextResult {
    /// Text of the final step.
    pub text: String,
    /// Reasoning of the final step.
    pub reasoning: String,
    /// Full content of the final step's response.
    pub content: Vec<ContentPart>,
    /// Every completed step, in order.
    pub steps: Vec<StepResult>,
    /// Finish reason of the final step.
    pub finish_reason: FinishReason,
    /// Usage summed across all steps.
    pub usage: Usage,
    /// Metadata of the final step.
    pub metadata: ResponseMetadata,
}

impl GenerateTextResult {
    fn empty() -> Self {
        Self {
            text: String::new(),
            reasoning: String::new(),
            content: Vec::new(),
            steps: Vec::new(),
            finish_reason: FinishReason::Unknown,
            usage: Usage::new(),
            metadata: ResponseMetadata::default(),
        }
    }
}

/// Seed the conversation from the options, enforcing the prompt/messages
/// exclusivity rule. Runs before any backend call.
pub(crate) fn build_conversation(
    options: &GenerateOptions,
) -> Result<Vec<Message>, OrchestratorError> {
    let mut conversation = Vec::new();
    if let Some(system) = &options.system {
        conversation.push(Message::system(system.clone()));
    }
    match (&options.prompt, &options.messages) {
        (Some(prompt), None) => conversation.push(Message::user(prompt.clone())),
        (None, Some(messages)) => conversation.extend(messages.iter().cloned()),
        (Some(_), Some(_)) => {
            return Err(OrchestratorError::invalid_prompt(
                "prompt and messages are mutually exclusive",
            ));
        }
        (None, None) => {
            return Err(OrchestratorError::invalid_prompt(
                "either prompt or messages is required",
            ));
        }
    }
    Ok(conversation)
}

/// Run the agentic loop against `model`.
///
/// Returns after the first step whose finish reason is not
/// [`FinishReason::ToolCalls`], or after `max_steps` round-trips, whichever
/// comes first. Hitting the bound while the model still wants tools is not
/// an error: the partial result is returned with `finish_reason =
/// ToolCalls`. Backend failures that survive the retry policy discard all
/// accumulated steps; cancellation is observed at step boundaries only.
pub async fn generate(
    model: &dyn LanguageModel,
    options: GenerateOptions,
) -> Result<GenerateTextResult, OrchestratorError> {
    let mut conversation = build_conversation(&options)?;
    let definitions = options.tools.definitions();

    let mut steps: Vec<StepResult> = Vec::new();
    let mut last_content: Vec<ContentPart> = Vec::new();

    for step_index in 0..options.max_steps {
        if options.context.is_done() {
            tracing::debug!(
                request_id = %options.context.id(),
                step = step_index,
                "request done before step, stopping"
            );
            return Err(OrchestratorError::Cancelled);
        }

        let request = ModelRequest {
            messages: conversation.clone(),
            tools: definitions.clone(),
            tool_choice: options.tool_choice.clone(),
            params: options.params.clone(),
        };
        tracing::debug!(
            request_id = %options.context.id(),
            step = step_index,
            provider = model.provider(),
            model = model.model_id(),
            messages = request.messages.len(),
            "starting step"
        );

        let response = execute_with_retry(&options.retry, || {
            let request = request.clone();
            async move { model.generate(request).await }
        })
        .await?;

        let text = response.text().unwrap_or_default().to_string();
        let reasoning = response.reasoning_text();
        let tool_calls = response.tool_calls();
        let finish_reason = response.finish_reason.clone();
        let usage = response.usage.clone().unwrap_or_default();
        let metadata = response.metadata.clone();
        last_content = response.content;

        if finish_reason.is_tool_calls() {
            let tool_results =
                tools::execute_calls(&options.tools, &tool_calls, &options.context).await;

            // Feed the exchange back for the next round-trip.
            let mut assistant_parts = Vec::with_capacity(tool_calls.len() + 1);
            if !text.is_empty() {
                assistant_parts.push(ContentPart::text(text.clone()));
            }
            for call in &tool_calls {
                assistant_parts.push(ContentPart::tool_call(
                    call.id.clone(),
                    call.name.clone(),
                    call.arguments.clone(),
                ));
            }
            conversation.push(Message::assistant_parts(assistant_parts));
            if !tool_results.is_empty() {
                conversation.push(Message::tool_results(tool_results.clone()));
            }

            let step = StepResult {
                text,
                reasoning,
                tool_calls,
                tool_results,
                finish_reason,
                usage,
                metadata,
            };
            if let Some(cb) = &options.on_step_finish {
                cb(&step);
            }
            steps.push(step);
            continue;
        }

        let step = StepResult {
            text,
            reasoning,
            tool_calls,
            tool_results: Vec::new(),
            finish_reason,
            usage,
            metadata,
        };
        if let Some(cb) = &options.on_step_finish {
            cb(&step);
        }
        steps.push(step);
        break;
    }

    let total_usage = StepResult::sum_usage(&steps);
    let Some(last) = steps.last().cloned() else {
        return Ok(GenerateTextResult::empty());
    };
    tracing::debug!(
        request_id = %options.context.id(),
        steps = steps.len(),
        finish = ?last.finish_reason,
        "generation finished"
    );
    Ok(GenerateTextResult {
        text: last.text,
        reasoning: last.reasoning,
        content: last_content,
        steps,
        finish_reason: last.finish_reason,
        usage: total_usage,
        metadata: last.metadata,
    })
}
