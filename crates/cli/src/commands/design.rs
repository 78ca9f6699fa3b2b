//! `antennaflow design`: Run one request through the pipeline.

use antennaflow_agent::DesignAgent;
use antennaflow_cad::{ProcessConnector, ProjectOptions, SessionMode};
use antennaflow_config::AppConfig;
use antennaflow_providers::GenerativeClient;
use std::sync::Arc;

pub async fn run(
    request: &str,
    request_id: Option<&str>,
    real_backend: bool,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables (or put it in .env):");
        eprintln!("    ANTENNAFLOW_API_KEY   (generic)");
        eprintln!("    GOOGLE_API_KEY        (Gemini)");
        eprintln!("    OPENAI_API_KEY        (OpenAI-compatible)");
        eprintln!();
        eprintln!("  Or add api_key to {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let agent = build_agent(&config, real_backend)?;
    let response = agent.run_design(request, request_id).await?;

    let output = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{output}");

    if !response.all_ok() {
        tracing::warn!("One or more tasks failed; see task_execution in the output");
    }
    Ok(())
}

/// Wire an agent from configuration. `--real-backend` forces real mode.
fn build_agent(config: &AppConfig, real_backend: bool) -> Result<DesignAgent, Box<dyn std::error::Error>> {
    let client = GenerativeClient::from_config(config)?;

    let backend = &config.backend;
    let mode = if real_backend || backend.use_real {
        SessionMode::Real
    } else {
        SessionMode::Mock
    };
    let project = ProjectOptions::new(backend.project_name.clone()).with_non_graphical(backend.non_graphical);

    let mut agent = DesignAgent::new(client).with_mode(mode).with_project(project);
    if !backend.command.is_empty() {
        agent = agent.with_connector(Arc::new(ProcessConnector::new(backend.command.clone())));
    } else if mode == SessionMode::Real {
        return Err("Real backend requested but [backend].command is not configured".into());
    }
    Ok(agent)
}
