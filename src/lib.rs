//! Conductor: a provider-agnostic orchestration engine for LLM text
//! generation.
//!
//! One uniform "generate text" or "stream text" request runs against any
//! backend that implements [`LanguageModel`], optionally letting the model
//! invoke caller-supplied tools across multiple reasoning steps. Around
//! every model call sits the same policy layer: status-classified retries
//! with exponential backoff, cooperative cancellation and deadlines, and
//! token usage accounting summed across steps.
//!
//! # Generating text
//!
//! ```rust,ignore
//! use conductor::prelude::*;
//!
//! let model = my_backend(); // anything implementing LanguageModel
//! let result = generate(&model, GenerateOptions::from_prompt("Say hi")).await?;
//! println!("{}", result.text);
//! ```
//!
//! # Tool calling
//!
//! Register tools with a JSON schema and a handler; raise `max_steps` to
//! let the model call them and read the results:
//!
//! ```rust,ignore
//! let mut tools = ToolSet::new();
//! tools.register(
//!     Tool::new("add", "Add two numbers", schema),
//!     Arc::new(AddTool),
//! );
//! let options = GenerateOptions::from_prompt("What is 2+3?")
//!     .with_tools(tools)
//!     .with_max_steps(4);
//! let result = generate(&model, options).await?;
//! ```
//!
//! # Streaming
//!
//! [`stream`] opens one streaming call on a background task and returns a
//! live [`StreamTextResult`] handle; parts arrive through callbacks while
//! the handle's getters stay queryable at any point:
//!
//! ```rust,ignore
//! let handle = stream(model, options, StreamCallbacks::new()
//!     .on_part(|part| println!("{part:?}")))?;
//! handle.done().await;
//! println!("{}", handle.text());
//! ```

#![deny(unsafe_code)]

pub mod context;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod retry;
pub mod streaming;
pub mod tools;
pub mod types;

pub use context::RequestContext;
pub use error::{ErrorCategory, OrchestratorError};
pub use model::{LanguageModel, SharedModel};
pub use orchestrator::{GenerateOptions, GenerateTextResult, StepResult, generate};
pub use retry::{RetryPolicy, execute_with_retry};
pub use streaming::{StreamCallbacks, StreamTextResult, stream};
pub use tools::{ToolContext, ToolHandler, ToolSet};

/// Common imports for working with the engine.
pub mod prelude {
    pub use crate::context::RequestContext;
    pub use crate::error::{ErrorCategory, OrchestratorError};
    pub use crate::model::{LanguageModel, SharedModel};
    pub use crate::orchestrator::{GenerateOptions, GenerateTextResult, StepResult, generate};
    pub use crate::retry::RetryPolicy;
    pub use crate::streaming::{StreamCallbacks, StreamTextResult, stream};
    pub use crate::tools::{ToolContext, ToolHandler, ToolSet};
    pub use crate::types::{
        ContentPart, FinishReason, GenerationParams, Message, MessageContent, ModelRequest,
        ModelResponse, ModelStream, ModelStreamEvent, ResponseMetadata, Role, StreamPart, Tool,
        ToolCall, ToolChoice, ToolResult, Usage, Warning,
    };
}
