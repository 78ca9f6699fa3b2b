//! Parsed intent and normalized model output.

use serde::{Deserialize, Serialize};
use crate::task::Task;

/// Carrier frequency used when neither the model nor the user text names one
/// (2.4 GHz ISM band).
pub const DEFAULT_FREQUENCY_HZ: f64 = 2.4e9;

/// What the user asked for. Only antenna design is recognized today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    #[default]
    DesignAntenna,
}

/// The antenna topologies the pipeline can size and build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntennaKind {
    #[default]
    Dipole,
    Patch,
}

impl AntennaKind {
    /// Select a topology from a free-form type string.
    ///
    /// Case-insensitive substring match: anything mentioning "patch" is a
    /// patch, everything else is a dipole.
    pub fn from_type_str(s: &str) -> Self {
        if s.to_ascii_lowercase().contains("patch") {
            AntennaKind::Patch
        } else {
            AntennaKind::Dipole
        }
    }

    /// Lowercase name used in prompts, task params, and geometry names.
    pub fn as_str(&self) -> &'static str {
        match self {
            AntennaKind::Dipole => "dipole",
            AntennaKind::Patch => "patch",
        }
    }

    /// The geometry-creation action that builds this topology.
    pub fn create_action(&self) -> &'static str {
        match self {
            AntennaKind::Dipole => "create_dipole",
            AntennaKind::Patch => "create_patch",
        }
    }
}

impl std::fmt::Display for AntennaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured intent extracted locally from the raw request text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSpec {
    pub intent: Intent,

    /// The trimmed user text, verbatim.
    pub raw_text: String,

    /// Topology mentioned in the text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antenna_type_hint: Option<AntennaKind>,

    /// Unit-tagged frequencies in order of appearance, converted to hertz.
    #[serde(default)]
    pub frequencies_hz: Vec<f64>,
}

/// The model's workflow after normalization.
///
/// `frequencies_hz` is never empty and holds only positive values; `tasks`
/// may be empty, in which case the orchestrator runs its default workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerativeSpec {
    pub antenna_type: AntennaKind,
    pub frequencies_hz: Vec<f64>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
