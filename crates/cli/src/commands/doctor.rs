//! `antennaflow doctor`: Diagnose configuration and provider reachability.
//!
//! Credentials are never printed: only whether one is present and its length.

use antennaflow_config::AppConfig;
use antennaflow_core::Provider;
use antennaflow_providers::build_from_config;
use std::time::Duration;

/// Environment variables that can carry the model credential, in lookup order.
const KEY_VARS: [&str; 3] = ["ANTENNAFLOW_API_KEY", "GOOGLE_API_KEY", "OPENAI_API_KEY"];

const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run(offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 AntennaFlow Doctor — System Diagnostics");
    println!("==========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ℹ️  No config file at {} (defaults in use; run `antennaflow init`)", config_path.display());
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            println!("     Provider:  {}", config.default_provider);
            println!("     Model:     {}", config.default_model);
            println!(
                "     Backend:   {}",
                if config.backend.use_real { "real" } else { "mock" }
            );
            println!("     Project:   {}", config.backend.project_name);

            if config.has_api_key() {
                let key = config.api_key.as_deref().or_else(|| {
                    config
                        .providers
                        .get(&config.default_provider)
                        .and_then(|p| p.api_key.as_deref())
                });
                println!("  ✅ Credential: {}", mask(key));
                if !offline {
                    issues += check_provider(&config).await;
                }
            } else {
                println!("  ⚠️  No credential configured — set ANTENNAFLOW_API_KEY");
                issues += 1;
            }

            if config.backend.use_real && config.backend.command.is_empty() {
                println!("  ⚠️  Real backend enabled but [backend].command is empty");
                issues += 1;
            }
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            issues += 1;
        }
    }

    println!();
    println!("  Environment:");
    for var in KEY_VARS {
        println!("    {var:<22} {}", mask(std::env::var(var).ok().as_deref()));
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Build the strategy chain and ask it whether any strategy answers.
/// Returns the number of issues found.
async fn check_provider(config: &AppConfig) -> usize {
    let resolved = match build_from_config(config) {
        Ok(resolved) => resolved,
        Err(e) => {
            println!("  ❌ Provider chain: {e}");
            return 1;
        }
    };
    println!("     Strategies: {}", resolved.chain.strategy_names().join(", "));

    match reachability(&resolved.chain).await {
        Ok(()) => {
            println!("  ✅ Provider reachable");
            0
        }
        Err(reason) => {
            println!("  ⚠️  Provider unreachable: {reason}");
            1
        }
    }
}

async fn reachability(provider: &dyn Provider) -> Result<(), String> {
    match tokio::time::timeout(REACHABILITY_TIMEOUT, provider.health_check()).await {
        Ok(Ok(true)) => Ok(()),
        Ok(Ok(false)) => Err(format!("no strategy of '{}' answered", provider.name())),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("no answer within {}s", REACHABILITY_TIMEOUT.as_secs())),
    }
}

/// "present (N chars)" or "missing". Blank values count as missing.
fn mask(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => format!("present ({} chars)", v.chars().count()),
        None => "missing".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antennaflow_core::error::ProviderError;
    use antennaflow_core::provider::{ProviderRequest, ProviderResponse};
    use antennaflow_providers::FallbackProvider;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Endpoint {
        name: &'static str,
        up: bool,
    }

    #[async_trait]
    impl Provider for Endpoint {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::Network("not used".into()))
        }

        async fn health_check(&self) -> Result<bool, ProviderError> {
            if self.up {
                Ok(true)
            } else {
                Err(ProviderError::Network("connection refused".into()))
            }
        }
    }

    fn chain(up: &[bool]) -> FallbackProvider {
        up.iter().fold(FallbackProvider::new("gemini"), |chain, &up| {
            chain.add(Arc::new(Endpoint { name: "strategy", up }), Duration::from_secs(1))
        })
    }

    #[tokio::test]
    async fn reachable_when_any_strategy_answers() {
        assert!(reachability(&chain(&[false, true])).await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_chain_names_the_provider() {
        let reason = reachability(&chain(&[false, false])).await.unwrap_err();
        assert!(reason.contains("gemini"));
    }

    #[tokio::test]
    async fn missing_credential_counts_as_issue() {
        assert_eq!(check_provider(&AppConfig::default()).await, 1);
    }

    #[test]
    fn mask_never_reveals_value() {
        let masked = mask(Some("sk-secret-123"));
        assert_eq!(masked, "present (13 chars)");
        assert!(!masked.contains("secret"));
        assert_eq!(mask(Some("   ")), "missing");
        assert_eq!(mask(None), "missing");
    }
}
