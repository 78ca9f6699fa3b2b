//! Build the ordered attempt-strategy chain from configuration.
//!
//! - `gemini`: v1beta with JSON MIME type, v1beta plain text, v1 plain text.
//! - anything else: OpenAI-compatible chat completions with JSON mode, then without.

use antennaflow_config::AppConfig;
use antennaflow_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::fallback::FallbackProvider;
use crate::gemini::{GeminiApiVersion, GeminiProvider};
use crate::openai_compat::OpenAiCompatProvider;

/// Well-known OpenAI-compatible endpoints.
pub fn default_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "together" => Some("https://api.together.xyz/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        _ => None,
    }
}

/// The resolved chain plus the model every strategy is asked for.
pub struct ResolvedChain {
    pub chain: FallbackProvider,
    pub model: String,
}

/// Assemble the strategy chain for `config.default_provider`.
///
/// Fails with a configuration error when no credential is available or the
/// provider has no known endpoint.
pub fn build_from_config(config: &AppConfig) -> Result<ResolvedChain> {
    let name = config.default_provider.trim().to_ascii_lowercase();
    let provider_config = config.providers.get(&name);

    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone())
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            Error::config(format!(
                "No API key for provider '{name}'. Set ANTENNAFLOW_API_KEY (or GOOGLE_API_KEY / OPENAI_API_KEY)"
            ))
        })?;

    let model = provider_config
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone());
    let api_url = provider_config.and_then(|p| p.api_url.clone());
    let timeout = Duration::from_secs(config.generation_timeout_secs);

    let chain = if name == "gemini" {
        let variant = |label: &str, version: GeminiApiVersion, json_mime: bool| {
            let mut provider = GeminiProvider::new(api_key.clone())
                .with_name(label)
                .with_version(version)
                .with_json_mime(json_mime);
            if let Some(url) = &api_url {
                provider = provider.with_base_url(url.clone());
            }
            Arc::new(provider)
        };
        FallbackProvider::new("gemini")
            .add(variant("gemini-v1beta-json", GeminiApiVersion::V1Beta, true), timeout)
            .add(variant("gemini-v1beta", GeminiApiVersion::V1Beta, false), timeout)
            .add(variant("gemini-v1", GeminiApiVersion::V1, false), timeout)
    } else {
        let base_url = api_url
            .or_else(|| default_base_url(&name).map(String::from))
            .ok_or_else(|| {
                Error::config(format!(
                    "Unknown provider '{name}': set providers.{name}.api_url in config.toml"
                ))
            })?;
        let variant = |json: bool| {
            let label = if json { format!("{name}-json") } else { name.clone() };
            Arc::new(
                OpenAiCompatProvider::new(label, base_url.clone(), api_key.clone())
                    .with_json_response_format(json),
            )
        };
        FallbackProvider::new(name.clone())
            .add(variant(true), timeout)
            .add(variant(false), timeout)
    };

    debug!(provider = %name, model = %model, strategies = ?chain.strategy_names(), "Built strategy chain");
    Ok(ResolvedChain { chain, model })
}
