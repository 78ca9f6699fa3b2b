//! The value returned for one design request.

use antennaflow_cad::{SessionLogEntry, SessionMode};
use antennaflow_core::{AntennaKind, GenerativeSpec, TaskExecutionResult};
use antennaflow_physics::{DesignParams, QuickEstimate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an antenna's task list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowSource {
    /// Tasks returned by the model, enriched with geometry.
    Generated,
    /// The built-in default workflow; the model returned no tasks.
    Fallback,
}

/// One sized antenna and what happened when its tasks ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaReport {
    #[serde(rename = "type")]
    pub kind: AntennaKind,
    pub params: DesignParams,
    pub estimate: QuickEstimate,
    pub workflow: WorkflowSource,
    pub task_execution: TaskExecutionResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub mode: SessionMode,
    pub log: Vec<SessionLogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignResponse {
    pub request: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// The normalized model output.
    pub spec: GenerativeSpec,
    /// The model output exactly as the adapter parsed it.
    pub raw_output: serde_json::Value,
    pub antennas: Vec<AntennaReport>,
    pub session: SessionSummary,
    pub generated_at: DateTime<Utc>,
}

impl DesignResponse {
    /// True when every antenna's task run finished without error.
    pub fn all_ok(&self) -> bool {
        self.antennas.iter().all(|a| a.task_execution.is_ok())
    }
}
