//! Normalize the model's JSON into a [`GenerativeSpec`].
//!
//! Nothing in here fails. Anything missing or malformed falls back to the
//! locally parsed [`DesignSpec`] or to a fixed default, with a log line.

use antennaflow_core::{AntennaKind, DEFAULT_FREQUENCY_HZ, DesignSpec, GenerativeSpec, Params, Task};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::parser::extract_frequencies;

/// Build the normalized spec from the adapter's raw JSON and the parsed intent.
pub fn normalize(raw: &Value, design: &DesignSpec) -> GenerativeSpec {
    let synthesized;
    let document = match top_level_object(raw) {
        Some(document) => document,
        None => {
            warn!("Model output has no usable object, using default spec");
            synthesized = default_document(design);
            &synthesized
        }
    };

    let antenna_type = resolve_kind(document, design);
    let frequencies_hz = resolve_frequencies(document, design);
    let tasks = document.get("tasks").map(parse_tasks).unwrap_or_default();
    let notes = document
        .get("notes")
        .and_then(Value::as_str)
        .map(String::from);

    debug!(
        antenna_type = %antenna_type,
        frequencies = ?frequencies_hz,
        tasks = tasks.len(),
        "Normalized model output"
    );

    GenerativeSpec {
        antenna_type,
        frequencies_hz,
        tasks,
        notes,
    }
}

/// The object to read from: the value itself, or the first element of a
/// top-level array when that element is an object.
fn top_level_object(raw: &Value) -> Option<&Map<String, Value>> {
    match raw {
        Value::Object(map) => Some(map),
        Value::Array(items) => {
            if items.len() > 1 {
                debug!(count = items.len(), "Model returned several specs, using the first");
            }
            items.first().and_then(Value::as_object)
        }
        _ => None,
    }
}

/// Minimal stand-in document: hint-derived type, default frequency, no tasks.
fn default_document(design: &DesignSpec) -> Map<String, Value> {
    let mut document = Map::new();
    if let Some(kind) = design.antenna_type_hint {
        document.insert("antenna_type".into(), Value::from(kind.as_str()));
    }
    document.insert("frequencies_hz".into(), Value::from(vec![DEFAULT_FREQUENCY_HZ]));
    document.insert("tasks".into(), Value::Array(Vec::new()));
    document
}

/// Model field (non-empty string), then the parser hint, then dipole.
fn resolve_kind(document: &Map<String, Value>, design: &DesignSpec) -> AntennaKind {
    if let Some(kind) = document
        .get("antenna_type")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return AntennaKind::from_type_str(kind);
    }
    design.antenna_type_hint.unwrap_or_default()
}

/// Model frequencies, then the parser's, then the default. Only finite,
/// strictly positive values survive.
fn resolve_frequencies(document: &Map<String, Value>, design: &DesignSpec) -> Vec<f64> {
    let from_model: Vec<f64> = ["frequencies_hz", "frequency_hz"]
        .iter()
        .filter_map(|key| document.get(*key))
        .map(frequency_values)
        .find(|values| !values.is_empty())
        .unwrap_or_default();
    if !from_model.is_empty() {
        return from_model;
    }

    let from_text: Vec<f64> = design
        .frequencies_hz
        .iter()
        .copied()
        .filter(|f| is_valid_frequency(*f))
        .collect();
    if !from_text.is_empty() {
        debug!("Model gave no usable frequency, using parsed request frequencies");
        return from_text;
    }

    debug!(default_hz = DEFAULT_FREQUENCY_HZ, "No frequency anywhere, using default");
    vec![DEFAULT_FREQUENCY_HZ]
}

/// A number, a numeric or unit-tagged string, or an array of those.
fn frequency_values(value: &Value) -> Vec<f64> {
    let values: Vec<f64> = match value {
        Value::Array(items) => items.iter().flat_map(scalar_frequencies).collect(),
        other => scalar_frequencies(other),
    };
    let (valid, dropped): (Vec<f64>, Vec<f64>) =
        values.into_iter().partition(|f| is_valid_frequency(*f));
    if !dropped.is_empty() {
        warn!(?dropped, "Dropped non-positive or non-finite frequencies");
    }
    valid
}

fn scalar_frequencies(value: &Value) -> Vec<f64> {
    match value {
        Value::Number(n) => n.as_f64().into_iter().collect(),
        Value::String(s) => {
            let tagged = extract_frequencies(s);
            if tagged.is_empty() {
                s.trim().parse::<f64>().ok().into_iter().collect()
            } else {
                tagged
            }
        }
        _ => Vec::new(),
    }
}

fn is_valid_frequency(f: f64) -> bool {
    f.is_finite() && f > 0.0
}

/// Tasks from the model's `tasks` value. Non-object entries are skipped.
/// A missing or non-integer id becomes the 1-based position, or the next id
/// above every id in use when the position is already taken.
fn parse_tasks(value: &Value) -> Vec<Task> {
    let Some(items) = value.as_array() else {
        warn!("'tasks' is not an array, ignoring it");
        return Vec::new();
    };

    let mut used: BTreeSet<i64> = items
        .iter()
        .filter_map(|item| item.get("id").and_then(task_id))
        .collect();

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let Some(object) = item.as_object() else {
                warn!(position = index + 1, "Skipping non-object task");
                return None;
            };
            let id = match object.get("id").and_then(task_id) {
                Some(id) => id,
                None => {
                    let position = index as i64 + 1;
                    let id = if used.contains(&position) {
                        used.last().map_or(position, |max| max + 1)
                    } else {
                        position
                    };
                    used.insert(id);
                    id
                }
            };
            let action = object
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let params = match object.get("params") {
                Some(Value::Object(map)) => Params::from(map.clone()),
                None | Some(Value::Null) => Params::new(),
                Some(_) => {
                    warn!(id, "Task params are not an object, ignoring them");
                    Params::new()
                }
            };
            Some(Task::new(id, action).with_params(params))
        })
        .collect()
}

fn task_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
