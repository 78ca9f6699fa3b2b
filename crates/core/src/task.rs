//! The task model: ordered workflow steps over a closed action vocabulary.
//!
//! A workflow is a `Vec<Task>`. Tasks run in sequence order; `id` is only a
//! label for the execution log. Every task's `action` is classified into one
//! of six [`ActionClass`]es; anything outside the vocabulary is an unknown
//! action, which the interpreter records without failing the run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The six semantic classes of the action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    Geometry,
    Excitation,
    Boundary,
    Setup,
    Analyze,
    Export,
}

impl ActionClass {
    /// Every class, in the order a complete workflow visits them.
    pub const ALL: [ActionClass; 6] = [
        ActionClass::Geometry,
        ActionClass::Excitation,
        ActionClass::Boundary,
        ActionClass::Setup,
        ActionClass::Analyze,
        ActionClass::Export,
    ];

    /// Action strings accepted for this class.
    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            ActionClass::Geometry => &["create_substrate", "create_patch", "create_dipole", "model"],
            ActionClass::Excitation => &["assign_excitation", "assign_port"],
            ActionClass::Boundary => &["assign_boundary", "assign_perfect_e"],
            ActionClass::Setup => &["create_setup", "analysis_setup"],
            ActionClass::Analyze => &["analyze", "solve"],
            ActionClass::Export => &["export_report", "postprocess"],
        }
    }

    /// Human-readable class label.
    pub fn label(&self) -> &'static str {
        match self {
            ActionClass::Geometry => "geometry-creation",
            ActionClass::Excitation => "excitation-assignment",
            ActionClass::Boundary => "boundary-assignment",
            ActionClass::Setup => "setup-creation",
            ActionClass::Analyze => "analyze",
            ActionClass::Export => "export",
        }
    }

    /// Classify an action string. Matching ignores surrounding whitespace and
    /// ASCII case; `None` means the action is outside the vocabulary.
    pub fn classify(action: &str) -> Option<Self> {
        let normalized = action.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|class| class.actions().contains(&normalized.as_str()))
    }
}

/// Task parameters: a key-sorted mapping from string to JSON scalar.
///
/// Enrichment goes through [`Params::merged`], which never mutates either
/// side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(serde_json::Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Union of `self` and `other`. On key conflict `self` wins, so values
    /// the model supplied are never overwritten by derived ones.
    pub fn merged(&self, other: &Params) -> Params {
        let mut out = self.0.clone();
        for (key, value) in &other.0 {
            out.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Params(out)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<serde_json::Map<String, Value>> for Params {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map)
    }
}

impl std::fmt::Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}

/// One step of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub action: String,
    #[serde(default)]
    pub params: Params,
}

impl Task {
    pub fn new(id: i64, action: impl Into<String>) -> Self {
        Self {
            id,
            action: action.into(),
            params: Params::new(),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// The action's class, or `None` for an unknown action.
    pub fn class(&self) -> Option<ActionClass> {
        ActionClass::classify(&self.action)
    }

    /// A copy of this task with `extra` merged under its existing params.
    pub fn with_merged_params(&self, extra: &Params) -> Task {
        Task {
            id: self.id,
            action: self.action.clone(),
            params: self.params.merged(extra),
        }
    }
}

/// Terminal status of a task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    #[default]
    Ok,
    Error,
}

/// What happened to one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOutcome {
    Result(String),
    Error(String),
}

/// One entry of the execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: i64,
    pub action: String,
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

impl ExecutionRecord {
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, RecordOutcome::Error(_))
    }

    /// The result text, or `None` for an error entry.
    pub fn result(&self) -> Option<&str> {
        match &self.outcome {
            RecordOutcome::Result(r) => Some(r),
            RecordOutcome::Error(_) => None,
        }
    }
}

/// The ordered log of a task run plus its terminal status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskExecutionResult {
    pub status: ExecutionStatus,
    pub log: Vec<ExecutionRecord>,
}

impl TaskExecutionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_result(&mut self, task: &Task, result: impl Into<String>) {
        self.log.push(ExecutionRecord {
            id: task.id,
            action: task.action.clone(),
            outcome: RecordOutcome::Result(result.into()),
        });
    }

    /// Record a failed task. Any error flips the run status to `error`.
    pub fn record_error(&mut self, task: &Task, error: impl Into<String>) {
        self.status = ExecutionStatus::Error;
        self.log.push(ExecutionRecord {
            id: task.id,
            action: task.action.clone(),
            outcome: RecordOutcome::Error(error.into()),
        });
    }

    pub fn is_ok(&self) -> bool {
        self.status == ExecutionStatus::Ok
    }

    pub fn error_count(&self) -> usize {
        self.log.iter().filter(|r| r.is_error()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_full_vocabulary() {
        for class in ActionClass::ALL {
            for action in class.actions() {
                assert_eq!(ActionClass::classify(action), Some(class), "{action}");
            }
        }
    }

    #[test]
    fn classify_is_case_and_whitespace_tolerant() {
        assert_eq!(ActionClass::classify("  Solve "), Some(ActionClass::Analyze));
        assert_eq!(ActionClass::classify("CREATE_DIPOLE"), Some(ActionClass::Geometry));
    }

    #[test]
    fn classify_rejects_unknown_actions() {
        assert_eq!(ActionClass::classify("create_geometry"), None);
        assert_eq!(ActionClass::classify("setup_analysis"), None);
        assert_eq!(ActionClass::classify(""), None);
    }

    #[test]
    fn merge_is_left_biased_union() {
        let task_params = Params::new().with("length_mm", 10.0).with("name", "arm");
        let derived = Params::new().with("length_mm", 59.4).with("radius_mm", 0.6);

        let merged = task_params.merged(&derived);
        assert_eq!(merged.get("length_mm"), Some(&json!(10.0)));
        assert_eq!(merged.get("radius_mm"), Some(&json!(0.6)));
        assert_eq!(merged.get_str("name"), Some("arm"));
        assert_eq!(merged.len(), 3);

        // Inputs untouched
        assert_eq!(task_params.len(), 2);
        assert_eq!(derived.len(), 2);
    }

    #[test]
    fn task_merge_keeps_id_and_action() {
        let task = Task::new(7, "model").with_params(Params::new().with("topology", "dipole"));
        let merged = task.with_merged_params(&Params::new().with("length_mm", 59.4));
        assert_eq!(merged.id, 7);
        assert_eq!(merged.action, "model");
        assert!(merged.params.contains_key("topology"));
        assert!(merged.params.contains_key("length_mm"));
        assert!(!task.params.contains_key("length_mm"));
    }

    #[test]
    fn task_deserializes_without_params() {
        let task: Task = serde_json::from_value(json!({"id": 1, "action": "solve"})).unwrap();
        assert!(task.params.is_empty());
        assert_eq!(task.class(), Some(ActionClass::Analyze));
    }

    #[test]
    fn record_serializes_result_or_error_key() {
        let mut run = TaskExecutionResult::new();
        run.record_result(&Task::new(1, "analyze"), "Simulation executed");
        run.record_error(&Task::new(2, "create_setup"), "bad frequency");

        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["log"][0]["result"], "Simulation executed");
        assert!(json["log"][0].get("error").is_none());
        assert_eq!(json["log"][1]["error"], "bad frequency");
        assert_eq!(run.error_count(), 1);
    }

    #[test]
    fn empty_run_is_ok() {
        let run = TaskExecutionResult::new();
        assert!(run.is_ok());
        assert!(run.log.is_empty());
    }
}
