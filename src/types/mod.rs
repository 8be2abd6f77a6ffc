//! Shared value types: messages, content parts, tool declarations, usage,
//! and the request/response/stream-event vocabularies backends speak.

pub mod common;
pub mod content;
pub mod message;
pub mod request;
pub mod response;
pub mod streaming;
pub mod tools;
pub mod usage;

pub use common::{FinishReason, ResponseMetadata, Warning};
pub use content::{ContentPart, FileSource};
pub use message::{Message, MessageContent, Role};
pub use request::{GenerationParams, ModelRequest};
pub use response::ModelResponse;
pub use streaming::{ModelStream, ModelStreamEvent, StreamPart};
pub use tools::{Tool, ToolCall, ToolChoice, ToolResult};
pub use usage::Usage;
