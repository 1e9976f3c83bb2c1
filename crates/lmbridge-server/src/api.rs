//! OpenAI API data models for request/response handling.
//!
//! These types match the OpenAI chat-completions wire format. Domain types
//! live in `lmbridge-core`; this module handles the API layer mapping.

use serde::{Deserialize, Serialize};

use lmbridge_core::domain::{ChatMessage, ROLE_ASSISTANT, SamplingParams};

use crate::usage;

/// Request to /v1/chat/completions.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model name to use; must match the configured model.
    pub model: String,
    /// Ordered chat messages (at least one).
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Top-p sampling parameter.
    pub top_p: Option<f32>,
    /// Top-k sampling parameter.
    pub top_k: Option<u32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Accepted for compatibility but must be false.
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Collect the optional sampling fields into domain parameters.
    #[must_use]
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            max_tokens: self.max_tokens,
        }
    }
}

/// Response from /v1/chat/completions (always non-streaming).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

impl ChatCompletionResponse {
    /// Format a finished completion.
    ///
    /// Generates a fresh time-based id, a single assistant choice with
    /// `finish_reason = "stop"`, and heuristic usage counts for the prompt
    /// and completion text.
    #[must_use]
    pub fn completed(model: &str, prompt: &str, completion: String) -> Self {
        let usage = Usage::estimate(prompt, &completion);
        Self {
            id: usage::completion_id(),
            object: "chat.completion".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: model.to_string(),
            choices: vec![ChatChoice {
                index: 0,
                message: ResponseMessage {
                    role: ROLE_ASSISTANT.to_string(),
                    content: completion,
                },
                finish_reason: "stop".to_string(),
            }],
            usage,
        }
    }
}

/// A single chat completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: String,
}

/// The assistant message inside a choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: String,
    pub content: String,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    /// Apply the characters-per-token heuristic to prompt and completion
    /// independently; the total is their sum.
    #[must_use]
    pub fn estimate(prompt: &str, completion: &str) -> Self {
        let prompt_tokens = usage::estimate_tokens(prompt);
        let completion_tokens = usage::estimate_tokens(completion);
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Response from /health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub server_running: bool,
    pub model_loaded: bool,
    pub requests_processed: u64,
    pub uptime_seconds: u64,
}

/// Response from /v1/models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<ModelInfo>,
}

impl ModelsResponse {
    /// The single-element listing for the configured model.
    #[must_use]
    pub fn single(model_name: &str, created: i64) -> Self {
        Self {
            object: "list".to_string(),
            data: vec![ModelInfo {
                id: model_name.to_string(),
                object: "model".to_string(),
                created,
                owned_by: "lmbridge".to_string(),
            }],
        }
    }
}

/// One model entry (OpenAI format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

/// Error response body: `{"error": {"message", "type", "code"}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail within an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    /// Numeric HTTP status, duplicated in the body for clients that only
    /// look at the payload.
    pub code: u16,
}

impl ErrorResponse {
    /// Create a new error response.
    #[must_use]
    pub fn new(message: impl Into<String>, error_type: impl Into<String>, code: u16) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                r#type: error_type.into(),
                code,
            },
        }
    }
}
