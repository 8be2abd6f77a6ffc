//! Error types for the orchestration engine.
//!
//! Every fallible operation in this crate returns [`OrchestratorError`]. The
//! taxonomy separates backend-reported failures (which may carry an HTTP
//! status) from transport failures, rate limiting, timeouts, tool problems,
//! and cancellation, so the retry layer can classify without string matching.

use std::time::Duration;

use thiserror::Error;

/// Unified error type for model calls, tool execution, and orchestration.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The request input was unusable (for example both or neither of
    /// `prompt` and `messages` were set). Raised before any backend call.
    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    /// Failure reported by the backend model, optionally carrying the HTTP
    /// status the provider returned.
    #[error("Model error: {message}")]
    Model {
        /// Human-readable failure description.
        message: String,
        /// HTTP status from the provider, when one was available.
        status_code: Option<u16>,
    },

    /// The provider rejected the call due to rate limiting (HTTP 429).
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Human-readable failure description.
        message: String,
        /// Server-provided hint for how long to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// The call timed out before the backend produced a response.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Transport-level failure without an HTTP status (connection dropped,
    /// DNS failure, broken stream).
    #[error("Network error: {0}")]
    Network(String),

    /// A tool handler failed. The tool executor converts this into an
    /// error-string result fed back to the model; it reaches the caller only
    /// when a handler is invoked outside the executor.
    #[error("Tool '{tool_name}' failed: {message}")]
    ToolExecution {
        /// Name of the tool whose handler failed.
        tool_name: String,
        /// Human-readable failure description.
        message: String,
    },

    /// Reserved. The step loop is bounded by returning a partial result, so
    /// [`generate`](crate::orchestrator::generate) never raises this.
    #[error("Exceeded maximum steps: {0}")]
    MaxStepsExceeded(usize),

    /// The request was cancelled or its deadline passed.
    #[error("Request cancelled")]
    Cancelled,
}

/// Coarse classification used by the retry layer and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller-side input problem. Never retried.
    InvalidInput,
    /// Provider rate limiting (HTTP 429).
    RateLimit,
    /// Request or transport timeout.
    Timeout,
    /// Transport failure without an HTTP status.
    Network,
    /// Provider-side failure (HTTP 5xx).
    Server,
    /// Provider rejected the request (HTTP 4xx other than 429, or a
    /// backend failure without a status).
    Client,
    /// Tool execution failure.
    Tool,
    /// Cancelled by the caller or by a deadline.
    Cancelled,
}

impl OrchestratorError {
    /// Backend failure without a status.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
            status_code: None,
        }
    }

    /// Backend failure carrying the provider's HTTP status.
    pub fn model_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Model {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Rate-limit rejection, optionally with the server's retry hint.
    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after,
        }
    }

    /// Request timeout.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Transport-level failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Invalid request input.
    pub fn invalid_prompt(message: impl Into<String>) -> Self {
        Self::InvalidPrompt(message.into())
    }

    /// Tool handler failure.
    pub fn tool_execution(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// HTTP status associated with this error, if any. Rate limiting maps to
    /// 429 and timeouts to 408 even when the provider did not attach a
    /// status; transport failures have none.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Model { status_code, .. } => *status_code,
            Self::RateLimited { .. } => Some(429),
            Self::Timeout(_) => Some(408),
            _ => None,
        }
    }

    /// Server-provided retry hint, when the provider sent one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Classify this error for retry decisions and diagnostics.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidPrompt(_) | Self::MaxStepsExceeded(_) => ErrorCategory::InvalidInput,
            Self::RateLimited { .. }
            | Self::Model {
                status_code: Some(429),
                ..
            } => ErrorCategory::RateLimit,
            Self::Model {
                status_code: Some(s),
                ..
            } if (500..=599).contains(s) => ErrorCategory::Server,
            Self::Model { .. } => ErrorCategory::Client,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Network(_) => ErrorCategory::Network,
            Self::ToolExecution { .. } => ErrorCategory::Tool,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// Whether this error belongs to a class that may be retried at all.
    /// The retry policy further gates by status code and attempt count.
    /// Backend failures without a status are not retried: there is nothing
    /// to classify them by.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Timeout(_)
                | Self::Network(_)
                | Self::Model {
                    status_code: Some(_),
                    ..
                }
        )
    }
}
