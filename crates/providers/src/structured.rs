//! Structured generation: prompt in, JSON value out.
//!
//! Models do not always honour "JSON only". Extraction tries, in order:
//! the whole text, the text inside a markdown code fence, the first balanced
//! `{...}` span that parses, and finally everything between the first `{` and
//! the last `}`.

use antennaflow_config::AppConfig;
use antennaflow_core::provider::ProviderRequest;
use antennaflow_core::{Error, Provider, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::strategy;

/// Sends one prompt to a provider and parses the reply as JSON.
pub struct GenerativeClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl GenerativeClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.1,
            max_tokens: None,
        }
    }

    /// Build the strategy chain described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let resolved = strategy::build_from_config(config)?;
        Ok(Self::new(Arc::new(resolved.chain), resolved.model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send `prompt` and return the JSON document found in the reply.
    pub async fn generate_structured(&self, prompt: &str) -> Result<Value> {
        let mut request = ProviderRequest::prompt(self.model.clone(), prompt);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        info!(provider = %self.provider.name(), model = %self.model, "Requesting structured output");
        let response = self.provider.complete(request).await?;
        debug!(chars = response.message.content.len(), model = %response.model, "Model replied");

        extract_json(&response.message.content)
    }
}

/// Pull a JSON object or array out of free-form model text.
pub fn extract_json(text: &str) -> Result<Value> {
    let trimmed = text.trim();

    if let Some(value) = parse_document(trimmed) {
        return Ok(value);
    }

    if let Some(inner) = strip_code_fence(trimmed) {
        if let Some(value) = parse_document(inner.trim()) {
            debug!("Extracted JSON from code fence");
            return Ok(value);
        }
    }

    if let Some(value) = first_balanced_object(trimmed) {
        debug!("Extracted JSON from balanced span");
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str(&trimmed[start..=end]) {
                debug!("Extracted JSON from outer braces");
                return Ok(value);
            }
        }
    }

    warn!(chars = text.len(), "No JSON document found in model output");
    Err(Error::UnparsableOutput {
        raw: text.to_string(),
    })
}

/// Parse `text` as JSON, accepting only objects and arrays.
fn parse_document(text: &str) -> Option<Value> {
    match serde_json::from_str(text) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

/// Contents of the first ```` ``` ```` fence, without its language tag.
fn strip_code_fence(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip the info string ("json", "JSON", ...) up to the end of the line.
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```").unwrap_or(body.len());
    Some(&body[..end])
}

/// The first `{...}` span, balanced outside string literals, that parses as
/// an object. Spans that fail to parse are skipped.
fn first_balanced_object(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        let mut end = None;

        for (i, &b) in bytes.iter().enumerate().skip(start) {
            if in_string {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }

        if let Some(end) = end {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str(&text[start..=end]) {
                return Some(value);
            }
        }
        search_from = start + 1;
    }
    None
}
