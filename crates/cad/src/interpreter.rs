//! Task interpreter: runs an ordered task list against a [`Session`].
//!
//! Policy, per task:
//! - unknown action: recorded as a result, status untouched;
//! - invalid params or a failed backend call: recorded as an error, status
//!   becomes `error`, the remaining tasks still run;
//! - capability the backend lacks: recorded as `unsupported: <capability>`.

use antennaflow_core::error::TaskError;
use antennaflow_core::{ActionClass, Params, Task, TaskExecutionResult};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::{BoundarySpec, GeometrySpec, PortSpec, ReportSpec, SetupSpec};
use crate::session::{Descriptor, Outcome, Session};

pub const DEFAULT_PORT_IMPEDANCE_OHM: f64 = 50.0;
pub const DEFAULT_SETUP_NAME: &str = "Setup1";
pub const DEFAULT_REPORT: &str = "S11";
const DEFAULT_FEED_TARGET: &str = "feed";
const DEFAULT_BOUNDARY_TARGET: &str = "region";

/// Names produced earlier in the run, used to fill in defaults.
#[derive(Debug, Default)]
struct RunState {
    last_geometry: Option<String>,
    last_setup: Option<String>,
    ports: usize,
}

impl Session {
    /// Execute `tasks` strictly in sequence order.
    pub async fn apply_tasks(&mut self, tasks: &[Task]) -> TaskExecutionResult {
        let mut result = TaskExecutionResult::new();
        let mut state = RunState::default();

        for task in tasks {
            let Some(class) = task.class() else {
                info!(id = task.id, action = %task.action, "Unknown action, skipping");
                result.record_result(task, format!("unknown action '{}'", task.action));
                continue;
            };

            match self.run_task(class, task, &mut state).await {
                Ok(message) => {
                    debug!(id = task.id, action = %task.action, result = %message, "Task done");
                    result.record_result(task, message);
                }
                Err(e) => {
                    warn!(id = task.id, action = %task.action, error = %e, "Task failed");
                    result.record_error(task, e.to_string());
                }
            }
        }

        info!(
            tasks = tasks.len(),
            errors = result.error_count(),
            status = ?result.status,
            "Task run finished"
        );
        result
    }

    async fn run_task(
        &mut self,
        class: ActionClass,
        task: &Task,
        state: &mut RunState,
    ) -> Result<String, TaskError> {
        let params = &task.params;
        let action = task.action.trim().to_ascii_lowercase();

        match class {
            ActionClass::Geometry => {
                let topology = match action.as_str() {
                    "create_dipole" => "dipole".to_string(),
                    "create_patch" => "patch".to_string(),
                    "create_substrate" => "substrate".to_string(),
                    _ => text_param(params, "topology")?.unwrap_or_else(|| "geometry".into()),
                };
                let name =
                    text_param(params, "name")?.unwrap_or_else(|| format!("{topology}_{}", task.id));
                let spec = GeometrySpec {
                    name: name.clone(),
                    topology: topology.clone(),
                    params: params.clone(),
                };
                let descriptor = self.build_geometry(&spec).await;
                let message = settle(&descriptor, || {
                    format!("Geometry created: {name} ({topology}) {params}")
                })?;
                if descriptor.is_ok() {
                    state.last_geometry = Some(name);
                }
                Ok(message)
            }
            ActionClass::Excitation => {
                let target = text_param(params, "target")?
                    .or_else(|| state.last_geometry.clone())
                    .unwrap_or_else(|| DEFAULT_FEED_TARGET.into());
                let impedance_ohm = positive_param(params, "impedance_ohm")?
                    .unwrap_or(DEFAULT_PORT_IMPEDANCE_OHM);
                let name = match text_param(params, "port")? {
                    Some(name) => name,
                    None => format!("port{}", state.ports + 1),
                };
                let descriptor = self.assign_port(&PortSpec {
                    name: name.clone(),
                    target: target.clone(),
                    impedance_ohm,
                }).await;
                let message = settle(&descriptor, || {
                    format!("Excitation assigned: {name} on {target} ({impedance_ohm} ohm)")
                })?;
                if descriptor.is_ok() {
                    state.ports += 1;
                }
                Ok(message)
            }
            ActionClass::Boundary => {
                let target = text_param(params, "target")?
                    .or_else(|| state.last_geometry.clone())
                    .unwrap_or_else(|| DEFAULT_BOUNDARY_TARGET.into());
                let kind = if action == "assign_perfect_e" {
                    "perfect_e".to_string()
                } else {
                    text_param(params, "type")?.unwrap_or_else(|| "radiation".into())
                };
                let descriptor = self.assign_boundary(&BoundarySpec {
                    target: target.clone(),
                    kind: kind.clone(),
                }).await;
                settle(&descriptor, || format!("Boundary assigned: {kind} on {target}"))
            }
            ActionClass::Setup => {
                let name = text_param(params, "name")?.unwrap_or_else(|| DEFAULT_SETUP_NAME.into());
                let frequencies_hz = frequency_params(params)?;
                let descriptor = self.create_setup(&SetupSpec {
                    name: name.clone(),
                    frequencies_hz: frequencies_hz.clone(),
                }).await;
                let message = settle(&descriptor, || {
                    format!("Setup created: {name} at {frequencies_hz:?} Hz")
                })?;
                if descriptor.is_ok() {
                    state.last_setup = Some(name);
                }
                Ok(message)
            }
            ActionClass::Analyze => {
                let setup = text_param(params, "setup")?
                    .or_else(|| state.last_setup.clone())
                    .unwrap_or_else(|| DEFAULT_SETUP_NAME.into());
                let descriptor = self.analyze(&setup).await;
                let mode = if descriptor.built_in_backend { "" } else { " (mock)" };
                settle(&descriptor, || format!("Simulation executed: {setup}{mode}"))
            }
            ActionClass::Export => {
                let report = text_param(params, "report")?.unwrap_or_else(|| DEFAULT_REPORT.into());
                let path = text_param(params, "path")?.unwrap_or_else(|| format!("{report}.csv"));
                let descriptor = self.export_report(&ReportSpec {
                    report: report.clone(),
                    path: path.clone(),
                }).await;
                settle(&descriptor, || format!("Data exported: {report} -> {path}"))
            }
        }
    }
}

/// Turn a descriptor into the task's log message. Unsupported stays soft;
/// a failed call becomes a task error.
fn settle(descriptor: &Descriptor, success: impl FnOnce() -> String) -> Result<String, TaskError> {
    match &descriptor.outcome {
        Outcome::Ok => Ok(success()),
        Outcome::Unsupported { capability } => Ok(format!("unsupported: {capability}")),
        Outcome::Failed { message } => Err(TaskError::Backend(message.clone())),
    }
}

/// A string-ish parameter. Numbers are accepted and rendered as text.
fn text_param(params: &Params, key: &str) -> Result<Option<String>, TaskError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(invalid(key, format!("expected a string, got {other}"))),
    }
}

/// A finite, strictly positive number.
fn positive_param(params: &Params, key: &str) -> Result<Option<f64>, TaskError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => positive(key, value).map(Some),
    }
}

/// Setup frequencies from `frequencies_hz` (array or scalar) or `frequency_hz`.
fn frequency_params(params: &Params) -> Result<Vec<f64>, TaskError> {
    if let Some(value) = params.get("frequencies_hz").filter(|v| !v.is_null()) {
        return match value {
            Value::Array(items) => items
                .iter()
                .map(|item| positive("frequencies_hz", item))
                .collect(),
            scalar => Ok(vec![positive("frequencies_hz", scalar)?]),
        };
    }
    Ok(positive_param(params, "frequency_hz")?.into_iter().collect())
}

fn positive(key: &str, value: &Value) -> Result<f64, TaskError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| invalid(key, format!("expected a number, got {value}")))?;

    if number.is_finite() && number > 0.0 {
        Ok(number)
    } else {
        Err(invalid(key, format!("must be a positive finite number, got {number}")))
    }
}

fn invalid(key: &str, reason: String) -> TaskError {
    TaskError::InvalidParams {
        key: key.to_string(),
        reason,
    }
}
