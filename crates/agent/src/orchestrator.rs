//! The design pipeline: parse → prompt → generate → normalize → size → execute.
//!
//! [`DesignAgent`] holds only configuration. Each call to
//! [`DesignAgent::run_design`] owns its own session from open to close.

use antennaflow_cad::{BackendConnector, ProjectOptions, Session, SessionMode};
use antennaflow_core::{ActionClass, AntennaKind, Params, Result, Task};
use antennaflow_physics::{Antenna, DesignParams};
use antennaflow_providers::GenerativeClient;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::normalize::normalize;
use crate::parser;
use crate::response::{AntennaReport, DesignResponse, SessionSummary, WorkflowSource};

/// Default port impedance in the fallback workflow.
pub const DEFAULT_PORT_IMPEDANCE_OHM: f64 = 50.0;

pub struct DesignAgent {
    client: GenerativeClient,
    mode: SessionMode,
    project: ProjectOptions,
    connector: Option<Arc<dyn BackendConnector>>,
}

impl DesignAgent {
    /// An agent that runs tasks against the mock session.
    pub fn new(client: GenerativeClient) -> Self {
        Self {
            client,
            mode: SessionMode::Mock,
            project: ProjectOptions::default(),
            connector: None,
        }
    }

    pub fn with_mode(mut self, mode: SessionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_project(mut self, project: ProjectOptions) -> Self {
        self.project = project;
        self
    }

    /// Connector used when the mode is [`SessionMode::Real`].
    pub fn with_connector(mut self, connector: Arc<dyn BackendConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Run one design request end to end.
    ///
    /// Fails only on configuration, generation, unparsable output, or when
    /// the session cannot be opened. Task failures are reported inside the
    /// response.
    pub async fn run_design(
        &self,
        user_request: &str,
        request_id: Option<&str>,
    ) -> Result<DesignResponse> {
        let design = parser::parse(user_request);
        let prompt = parser::build_prompt(&design, request_id);
        info!(
            request_id = request_id.unwrap_or("-"),
            hint = ?design.antenna_type_hint,
            frequencies = ?design.frequencies_hz,
            "Starting design request"
        );

        let raw_output = self.client.generate_structured(&prompt).await?;
        let spec = normalize(&raw_output, &design);

        let antennas = spec
            .frequencies_hz
            .iter()
            .map(|&f| Antenna::new(spec.antenna_type, f))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut session =
            Session::open(self.mode, &self.project, self.connector.as_deref()).await?;
        let mut reports = Vec::with_capacity(antennas.len());

        for antenna in &antennas {
            let params = antenna.design_params();
            let (workflow, tasks) = if spec.tasks.is_empty() {
                (
                    WorkflowSource::Fallback,
                    default_workflow(antenna.kind(), &params, &spec.frequencies_hz),
                )
            } else {
                (
                    WorkflowSource::Generated,
                    spec.tasks
                        .iter()
                        .map(|task| enrich_task(task, &params, &spec.frequencies_hz))
                        .collect(),
                )
            };

            debug!(
                kind = %antenna.kind(),
                frequency_hz = antenna.frequency_hz(),
                tasks = tasks.len(),
                ?workflow,
                "Executing antenna workflow"
            );
            let task_execution = session.apply_tasks(&tasks).await;

            reports.push(AntennaReport {
                kind: antenna.kind(),
                params,
                estimate: antenna.quick_estimate(),
                workflow,
                task_execution,
            });
        }

        let mode = session.mode();
        let log = session.close().await;
        info!(antennas = reports.len(), mode = mode.as_str(), "Design request finished");

        Ok(DesignResponse {
            request: user_request.to_string(),
            request_id: request_id.map(String::from),
            spec,
            raw_output,
            antennas: reports,
            session: SessionSummary { mode, log },
            generated_at: Utc::now(),
        })
    }
}

/// Merge antenna data into a model task. Geometry tasks get the millimetre
/// geometry, setup tasks get the frequency list; the task's own params win.
pub fn enrich_task(task: &Task, params: &DesignParams, frequencies_hz: &[f64]) -> Task {
    match task.class() {
        Some(ActionClass::Geometry) => task.with_merged_params(&params.to_task_params()),
        Some(ActionClass::Setup) => {
            task.with_merged_params(&Params::new().with("frequencies_hz", frequencies_hz.to_vec()))
        }
        _ => task.clone(),
    }
}

/// The workflow used when the model returns no tasks.
pub fn default_workflow(kind: AntennaKind, params: &DesignParams, frequencies_hz: &[f64]) -> Vec<Task> {
    vec![
        Task::new(1, kind.create_action()).with_params(params.to_task_params()),
        Task::new(2, "assign_port")
            .with_params(Params::new().with("impedance_ohm", DEFAULT_PORT_IMPEDANCE_OHM)),
        Task::new(3, "assign_boundary").with_params(Params::new().with("type", "radiation")),
        Task::new(4, "create_setup")
            .with_params(Params::new().with("frequencies_hz", frequencies_hz.to_vec())),
        Task::new(5, "analyze"),
        Task::new(6, "export_report").with_params(Params::new().with("report", "S11")),
    ]
}
