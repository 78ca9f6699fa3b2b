//! Ordered attempt strategies with per-strategy timeouts.
//!
//! A generation request is tried against each strategy in turn. The first
//! strategy to return text wins; every failure is logged and the next one is
//! tried. When the list is exhausted the last error is returned.

use async_trait::async_trait;
use antennaflow_core::error::ProviderError;
use antennaflow_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A provider that walks an ordered list of strategies until one succeeds.
pub struct FallbackProvider {
    name: String,
    strategies: Vec<Strategy>,
}

struct Strategy {
    provider: Arc<dyn antennaflow_core::Provider>,
    timeout: Duration,
}

impl FallbackProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategies: Vec::new(),
        }
    }

    /// Append a strategy with its own timeout.
    pub fn add(mut self, provider: Arc<dyn antennaflow_core::Provider>, timeout: Duration) -> Self {
        self.strategies.push(Strategy { provider, timeout });
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Names of the strategies in attempt order.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.provider.name()).collect()
    }
}

#[async_trait]
impl antennaflow_core::Provider for FallbackProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let mut last_error =
            ProviderError::NotConfigured("No generation strategies configured".into());
        let total = self.strategies.len();

        for (i, strategy) in self.strategies.iter().enumerate() {
            let strategy_name = strategy.provider.name();
            info!(strategy = %strategy_name, attempt = i + 1, total, "Trying generation strategy");

            let outcome =
                tokio::time::timeout(strategy.timeout, strategy.provider.complete(request.clone()))
                    .await;

            match outcome {
                Ok(Ok(response)) if !response.message.content.trim().is_empty() => {
                    info!(strategy = %strategy_name, "Generation strategy succeeded");
                    return Ok(response);
                }
                Ok(Ok(_)) => {
                    warn!(strategy = %strategy_name, "Strategy returned empty text, trying next");
                    last_error =
                        ProviderError::EmptyResponse(format!("Strategy '{strategy_name}' returned no text"));
                }
                Ok(Err(e)) => {
                    warn!(strategy = %strategy_name, error = %e, "Strategy failed, trying next");
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        strategy = %strategy_name,
                        timeout_secs = strategy.timeout.as_secs_f64(),
                        "Strategy timed out, trying next"
                    );
                    last_error = ProviderError::Timeout(format!(
                        "Strategy '{}' timed out after {:.1}s",
                        strategy_name,
                        strategy.timeout.as_secs_f64()
                    ));
                }
            }
        }

        Err(last_error)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        for strategy in &self.strategies {
            if let Ok(true) = strategy.provider.health_check().await {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
