//! End-to-end tests for the AntennaFlow design pipeline.
//!
//! These drive a request from raw text through prompt construction, a
//! scripted model reply, normalization, physics and task execution against
//! mock and recording sessions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use antennaflow_agent::{DesignAgent, WorkflowSource};
use antennaflow_cad::{
    BackendConnector, BoundarySpec, CadBackend, GeometrySpec, PortSpec, ProjectOptions,
    ReportSpec, SessionMode, SetupSpec,
};
use antennaflow_config::AppConfig;
use antennaflow_core::error::{ProviderError, SessionError};
use antennaflow_core::message::Message;
use antennaflow_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use antennaflow_core::{AntennaKind, Error, ExecutionStatus};
use antennaflow_physics::DesignParams;
use antennaflow_providers::{FallbackProvider, GenerativeClient};

// ── Mock Provider ────────────────────────────────────────────────────────

/// Returns the same scripted reply on every call.
struct ScriptedProvider {
    name: String,
    reply: Result<String, ProviderError>,
    call_count: Mutex<usize>,
}

impl ScriptedProvider {
    fn text(reply: &str) -> Self {
        Self {
            name: "e2e_mock".into(),
            reply: Ok(reply.into()),
            call_count: Mutex::new(0),
        }
    }

    fn failing(name: &str, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            reply: Err(error),
            call_count: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.call_count.lock().unwrap() += 1;
        let text = self.reply.clone()?;
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: request.model,
            metadata: serde_json::Map::new(),
        })
    }
}

fn agent_replying(reply: &str) -> DesignAgent {
    DesignAgent::new(GenerativeClient::new(Arc::new(ScriptedProvider::text(reply)), "e2e-model"))
}

// ── Recording backend ────────────────────────────────────────────────────

#[derive(Default)]
struct Behaviour {
    unsupported: Vec<&'static str>,
    fail_on: Option<&'static str>,
}

struct RecordingBackend {
    calls: Arc<Mutex<Vec<String>>>,
    behaviour: Arc<Behaviour>,
}

impl RecordingBackend {
    fn call(&mut self, op: &'static str, capability: &'static str) -> Result<(), SessionError> {
        self.calls.lock().unwrap().push(op.to_string());
        if self.behaviour.unsupported.contains(&capability) {
            return Err(SessionError::Unsupported(capability.into()));
        }
        if self.behaviour.fail_on == Some(op) {
            return Err(SessionError::Backend {
                operation: op.into(),
                reason: "solver crashed".into(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CadBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    async fn build_geometry(&mut self, _spec: &GeometrySpec) -> Result<(), SessionError> {
        self.call("build_geometry", "geometry")
    }

    async fn assign_port(&mut self, _spec: &PortSpec) -> Result<(), SessionError> {
        self.call("assign_port", "port")
    }

    async fn assign_boundary(&mut self, _spec: &BoundarySpec) -> Result<(), SessionError> {
        self.call("assign_boundary", "boundary")
    }

    async fn create_setup(&mut self, _spec: &SetupSpec) -> Result<(), SessionError> {
        self.call("create_setup", "setup")
    }

    async fn analyze(&mut self, _setup: &str) -> Result<(), SessionError> {
        self.call("analyze", "analyze")
    }

    async fn export_report(&mut self, _spec: &ReportSpec) -> Result<(), SessionError> {
        self.call("export_report", "report export")
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.calls.lock().unwrap().push("close".into());
        Ok(())
    }
}

struct RecordingConnector {
    calls: Arc<Mutex<Vec<String>>>,
    behaviour: Arc<Behaviour>,
    projects: Mutex<Vec<String>>,
}

impl RecordingConnector {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            behaviour: Arc::new(behaviour),
            projects: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BackendConnector for RecordingConnector {
    async fn connect(&self, options: &ProjectOptions) -> Result<Box<dyn CadBackend>, SessionError> {
        self.projects.lock().unwrap().push(options.project_name.clone());
        Ok(Box::new(RecordingBackend {
            calls: self.calls.clone(),
            behaviour: self.behaviour.clone(),
        }))
    }
}

struct RefusingConnector;

#[async_trait::async_trait]
impl BackendConnector for RefusingConnector {
    async fn connect(&self, _options: &ProjectOptions) -> Result<Box<dyn CadBackend>, SessionError> {
        Err(SessionError::Connect("license server unreachable".into()))
    }
}

const FULL_WORKFLOW: &str = r#"{
  "antenna_type": "dipole",
  "frequencies_hz": [2.4e9],
  "tasks": [
    {"id": 1, "action": "create_dipole", "params": {}},
    {"id": 2, "action": "assign_port", "params": {"impedance_ohm": 73}},
    {"id": 3, "action": "assign_boundary", "params": {"type": "radiation"}},
    {"id": 4, "action": "create_setup", "params": {"name": "Sweep"}},
    {"id": 5, "action": "analyze", "params": {}},
    {"id": 6, "action": "export_report", "params": {"report": "S11"}}
  ]
}"#;

// ═══════════════════════════════════════════════════════════════════════
// Mock session
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn e2e_bluetooth_dipole_mock() {
    let reply = r#"At 2.4 GHz the wavelength is about 125 mm, so a half-wave dipole is ~59 mm.
{"antenna_type": "dipole", "frequencies_hz": [2.4e9],
 "tasks": [{"id": 1, "action": "create_dipole", "params": {}}]}"#;
    let agent = agent_replying(reply);

    let response = agent
        .run_design("Design a dipole antenna for Bluetooth at 2.4 GHz", Some("bt-001"))
        .await
        .unwrap();

    assert_eq!(response.antennas.len(), 1);
    let antenna = &response.antennas[0];
    assert_eq!(antenna.kind, AntennaKind::Dipole);
    assert!((antenna.params.frequency_hz() - 2.4e9).abs() < 1.0);
    assert!((antenna.params.length_m() - 0.0594).abs() < 1e-3);
    assert_eq!(antenna.estimate.input_impedance_ohm, Some(73.0));
    assert_eq!(antenna.task_execution.status, ExecutionStatus::Ok);
    assert_eq!(antenna.task_execution.log.len(), 1);
    assert_eq!(antenna.task_execution.log[0].action, "create_dipole");

    // The serialized response keeps the documented field names.
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["request_id"], "bt-001");
    assert_eq!(json["antennas"][0]["type"], "dipole");
    assert_eq!(json["antennas"][0]["task_execution"]["status"], "ok");
    assert_eq!(json["session"]["mode"], "mock");
}

#[tokio::test]
async fn e2e_dual_band_patch_from_fenced_output() {
    let reply = "Here is the plan:\n```json\n{\"antenna_type\": \"microstrip patch\", \"frequencies_hz\": [\"2.4 GHz\", \"5.8 GHz\"], \"tasks\": [{\"id\": 1, \"action\": \"create_patch\"}, {\"id\": 2, \"action\": \"analysis_setup\"}, {\"id\": 3, \"action\": \"solve\"}]}\n```";
    let agent = agent_replying(reply);

    let response = agent
        .run_design("Design a patch antenna for 2.4 GHz and 5.8 GHz", None)
        .await
        .unwrap();

    assert_eq!(response.spec.antenna_type, AntennaKind::Patch);
    assert_eq!(response.spec.frequencies_hz, vec![2.4e9, 5.8e9]);
    assert_eq!(response.antennas.len(), 2);

    let widths: Vec<f64> = response
        .antennas
        .iter()
        .map(|a| match a.params {
            DesignParams::Patch(p) => p.width_m,
            DesignParams::Dipole(_) => panic!("expected a patch"),
        })
        .collect();
    assert!(widths[0] > widths[1], "lower band must be wider: {widths:?}");

    // One session, opened once and closed once, shared by both antennas.
    let actions: Vec<&str> = response.session.log.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions.first(), Some(&"connect"));
    assert_eq!(actions.last(), Some(&"close"));
    assert_eq!(actions.iter().filter(|a| **a == "connect").count(), 1);

    // Setup tasks were enriched with the full frequency list.
    let setup = &response.antennas[0].task_execution.log[1];
    assert!(setup.result().unwrap().contains("5800000000"), "{setup:?}");
    assert!(response.all_ok());
}

#[tokio::test]
async fn e2e_no_tasks_uses_default_workflow() {
    let agent = agent_replying(r#"[{"antenna_type": "dipole", "frequencies_hz": [433e6]}]"#);
    let response = agent.run_design("dipole for 433 MHz telemetry", None).await.unwrap();

    let antenna = &response.antennas[0];
    assert_eq!(antenna.workflow, WorkflowSource::Fallback);
    assert_eq!(antenna.task_execution.log.len(), 6);
    assert!(antenna.task_execution.log[4].result().unwrap().ends_with("(mock)"));
}

#[tokio::test]
async fn e2e_prose_only_output_is_unparsable() {
    let agent = agent_replying("I would recommend a dipole antenna.");
    let err = agent.run_design("dipole at 2.4 GHz", None).await.unwrap_err();
    match err {
        Error::UnparsableOutput { raw } => assert!(raw.contains("recommend")),
        other => panic!("Expected UnparsableOutput, got: {other:?}"),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Fallback chain
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn e2e_fallback_chain_reaches_working_strategy() {
    let broken = Arc::new(ScriptedProvider::failing(
        "gemini-v1beta-json",
        ProviderError::ModelNotFound("gemini-2.0-flash-lite".into()),
    ));
    let empty = Arc::new(ScriptedProvider::text("   "));
    let working = Arc::new(ScriptedProvider::text(FULL_WORKFLOW));

    let chain = FallbackProvider::new("chain")
        .add(broken.clone(), Duration::from_secs(5))
        .add(empty.clone(), Duration::from_secs(5))
        .add(working.clone(), Duration::from_secs(5));
    let agent = DesignAgent::new(GenerativeClient::new(Arc::new(chain), "m"));

    let response = agent.run_design("dipole at 2.4 GHz", None).await.unwrap();
    assert_eq!((broken.calls(), empty.calls(), working.calls()), (1, 1, 1));
    assert_eq!(response.antennas[0].task_execution.log.len(), 6);
}

#[tokio::test]
async fn e2e_all_strategies_failing_is_generation_error() {
    let chain = FallbackProvider::new("chain")
        .add(
            Arc::new(ScriptedProvider::failing("a", ProviderError::Network("dns".into()))),
            Duration::from_secs(5),
        )
        .add(
            Arc::new(ScriptedProvider::failing(
                "b",
                ProviderError::AuthenticationFailed("bad key".into()),
            )),
            Duration::from_secs(5),
        );
    let agent = DesignAgent::new(GenerativeClient::new(Arc::new(chain), "m"));

    assert!(matches!(
        agent.run_design("dipole", None).await,
        Err(Error::Generation(ProviderError::AuthenticationFailed(_)))
    ));
}

// ═══════════════════════════════════════════════════════════════════════
// Real session through a connector
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn e2e_real_backend_receives_every_call() {
    let connector = Arc::new(RecordingConnector::new(Behaviour::default()));
    let agent = agent_replying(FULL_WORKFLOW)
        .with_mode(SessionMode::Real)
        .with_project(ProjectOptions::new("E2E_project"))
        .with_connector(connector.clone());

    let response = agent.run_design("dipole at 2.4 GHz", None).await.unwrap();

    assert_eq!(
        connector.calls(),
        vec![
            "build_geometry",
            "assign_port",
            "assign_boundary",
            "create_setup",
            "analyze",
            "export_report",
            "close"
        ]
    );
    assert_eq!(*connector.projects.lock().unwrap(), vec!["E2E_project".to_string()]);

    let log = &response.antennas[0].task_execution.log;
    assert_eq!(log[4].result(), Some("Simulation executed: Sweep"));
    assert_eq!(response.session.mode, SessionMode::Real);
    assert!(response.all_ok());
}

#[tokio::test]
async fn e2e_unsupported_capability_is_soft() {
    let connector = Arc::new(RecordingConnector::new(Behaviour {
        unsupported: vec!["boundary", "report export"],
        fail_on: None,
    }));
    let agent = agent_replying(FULL_WORKFLOW)
        .with_mode(SessionMode::Real)
        .with_connector(connector);

    let response = agent.run_design("dipole", None).await.unwrap();
    let run = &response.antennas[0].task_execution;
    assert_eq!(run.status, ExecutionStatus::Ok);
    assert_eq!(run.log[2].result(), Some("unsupported: boundary"));
    assert_eq!(run.log[5].result(), Some("unsupported: report export"));
}

#[tokio::test]
async fn e2e_backend_failure_marks_run_but_continues() {
    let connector = Arc::new(RecordingConnector::new(Behaviour {
        unsupported: Vec::new(),
        fail_on: Some("analyze"),
    }));
    let agent = agent_replying(FULL_WORKFLOW)
        .with_mode(SessionMode::Real)
        .with_connector(connector.clone());

    let response = agent.run_design("dipole", None).await.unwrap();
    let run = &response.antennas[0].task_execution;
    assert_eq!(run.status, ExecutionStatus::Error);
    assert_eq!(run.error_count(), 1);
    assert!(run.log[4].is_error());
    // Export still ran after the failed analysis.
    assert!(connector.calls().contains(&"export_report".to_string()));
    assert!(!response.all_ok());
}

#[tokio::test]
async fn e2e_connect_failure_aborts_request() {
    let agent = agent_replying(FULL_WORKFLOW)
        .with_mode(SessionMode::Real)
        .with_connector(Arc::new(RefusingConnector));

    assert!(matches!(
        agent.run_design("dipole", None).await,
        Err(Error::Session(SessionError::Connect(_)))
    ));
}

// ═══════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn e2e_config_without_credential_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "default_provider = \"gemini\"\n").unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert!(matches!(GenerativeClient::from_config(&config), Err(Error::Config { .. })));
}

#[test]
fn e2e_config_with_credential_builds_client() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "api_key = \"file-key\"\ndefault_model = \"gemini-1.5-flash\"\n\n[backend]\nproject_name = \"FromFile\"\n",
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.backend.project_name, "FromFile");

    let client = GenerativeClient::from_config(&config).unwrap();
    assert_eq!(client.model(), "gemini-1.5-flash");
}
