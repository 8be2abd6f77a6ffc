//! The request handed to a backend for one model call.

use serde::{Deserialize, Serialize};

use super::message::Message;
use super::tools::{Tool, ToolChoice};

/// Generation parameters passed through to the backend unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Output token limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sequences that stop generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// Sampling seed, for providers that support it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GenerationParams {
    /// Parameters with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the nucleus sampling cutoff.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the output token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the stop sequences.
    pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.stop_sequences = Some(stop_sequences);
        self
    }

    /// Set the sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Everything a backend needs for one model call. Built fresh by the
/// orchestrator for every step; backends never see orchestration state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Conversation so far, including any tool exchange.
    pub messages: Vec<Message>,
    /// Declared tools, in registration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    /// How the model may use the tools.
    #[serde(default)]
    pub tool_choice: ToolChoice,
    /// Generation parameters.
    #[serde(default)]
    pub params: GenerationParams,
}

impl ModelRequest {
    /// Request with just a conversation.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            tool_choice: ToolChoice::default(),
            params: GenerationParams::default(),
        }
    }

    /// Attach tool declarations.
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let request = ModelRequest::new(vec![Message::user("hi")])
            .with_tool_choice(ToolChoice::Required)
            .with_params(GenerationParams::new().with_temperature(0.2).with_seed(42));

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.tool_choice, ToolChoice::Required);
        assert_eq!(request.params.temperature, Some(0.2));
        assert_eq!(request.params.seed, Some(42));
    }

    #[test]
    fn params_skip_unset_fields() {
        let json = serde_json::to_value(GenerationParams::new().with_max_tokens(100)).unwrap();
        assert_eq!(json["max_tokens"], 100);
        assert!(json.get("temperature").is_none());
    }
}
