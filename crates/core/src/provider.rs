//! Provider trait: the abstraction over generative-model backends.
//!
//! A Provider knows how to send a prompt to a text-generation service and
//! get the generated text back. Implementations: Gemini, OpenAI-compatible
//! endpoints, and an ordered fallback chain over either.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::Message;

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gemini-2.0-flash-lite", "gpt-4o-mini")
    pub model: String,

    /// The messages to send
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Ask the provider to return a single JSON document and nothing else.
    /// Providers that cannot enforce this ignore it.
    #[serde(default)]
    pub json_mode: bool,
}

fn default_temperature() -> f32 {
    0.1
}

impl ProviderRequest {
    /// A single-prompt request with default sampling settings.
    pub fn prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::user(prompt)],
            temperature: default_temperature(),
            max_tokens: None,
            json_mode: true,
        }
    }
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Provider-specific metadata
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The generative adapter calls `complete()` without knowing which backend
/// answers it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini-v1beta-json").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_request_defaults() {
        let req = ProviderRequest::prompt("gemini-2.0-flash-lite", "hello");
        assert!((req.temperature - 0.1).abs() < f32::EPSILON);
        assert!(req.json_mode);
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].content, "hello");
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let req: ProviderRequest = serde_json::from_value(serde_json::json!({
            "model": "m",
            "messages": []
        }))
        .unwrap();
        assert!(!req.json_mode);
        assert!(req.max_tokens.is_none());
    }
}
