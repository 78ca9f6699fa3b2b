//! Local intent parsing and prompt construction.
//!
//! Nothing here talks to a model: the parser pulls unit-tagged frequencies
//! and a topology hint out of the request, and [`build_prompt`] renders the
//! deterministic instruction document sent to the generative provider.

use antennaflow_core::{ActionClass, AntennaKind, DesignSpec, Intent};
use regex_lite::Regex;
use std::sync::LazyLock;

/// `<number><optional whitespace><unit>`, unit word-bounded on the right.
static FREQUENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(ghz|mhz|khz|hz)\b").expect("frequency pattern is valid")
});

/// Every unit-tagged frequency in `text`, in order of appearance, in hertz.
/// Duplicates are kept.
pub fn extract_frequencies(text: &str) -> Vec<f64> {
    FREQUENCY_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let value: f64 = caps.get(1)?.as_str().parse().ok()?;
            let scale = match caps.get(2)?.as_str().to_ascii_lowercase().as_str() {
                "ghz" => 1e9,
                "mhz" => 1e6,
                "khz" => 1e3,
                _ => 1.0,
            };
            Some(value * scale)
        })
        .collect()
}

/// Topology mentioned in `text`. "patch"/"microstrip" is checked after
/// "dipole", so a request naming both is a patch.
pub fn antenna_type_hint(text: &str) -> Option<AntennaKind> {
    let lower = text.to_lowercase();
    let mut hint = None;
    if lower.contains("dipole") {
        hint = Some(AntennaKind::Dipole);
    }
    if lower.contains("patch") || lower.contains("microstrip") {
        hint = Some(AntennaKind::Patch);
    }
    hint
}

/// Parse a raw request into a [`DesignSpec`].
pub fn parse(text: &str) -> DesignSpec {
    let raw_text = text.trim().to_string();
    DesignSpec {
        intent: Intent::DesignAntenna,
        antenna_type_hint: antenna_type_hint(&raw_text),
        frequencies_hz: extract_frequencies(&raw_text),
        raw_text,
    }
}

/// Render the instruction document for the generative model.
///
/// Deterministic: the same spec and request id always give the same text.
pub fn build_prompt(spec: &DesignSpec, request_id: Option<&str>) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(id) = request_id.map(str::trim).filter(|id| !id.is_empty()) {
        lines.push(format!("Request-ID: {id}"));
    }

    lines.push("You are an expert RF and antenna engineer.".into());
    lines.push(String::new());
    lines.push("Work in two steps:".into());
    lines.push(
        "  1) Reason briefly (one or two sentences) about the physics: wavelength, resonant length or width, substrate.".into(),
    );
    lines.push("  2) Output one final JSON object and nothing else.".into());
    lines.push(String::new());
    lines.push("The JSON object MUST contain these keys:".into());
    lines.push("  - \"antenna_type\": string (\"dipole\" or \"patch\")".into());
    lines.push("  - \"frequencies_hz\": array of numbers".into());
    lines.push(
        "  - \"tasks\": ordered array of task objects { \"id\": <int>, \"action\": <string>, \"params\": <object> }".into(),
    );
    lines.push("  - \"notes\": optional string".into());
    lines.push(String::new());
    lines.push("Each task \"action\" MUST be one of the following, grouped by step:".into());
    for class in ActionClass::ALL {
        lines.push(format!("  - {}: {}", class.label(), class.actions().join(", ")));
    }
    lines.push(String::new());
    lines.push("Units: all geometry in millimetres (mm); all frequencies in hertz (Hz).".into());

    let hints = parsed_hints(spec);
    if !hints.is_empty() {
        lines.push(format!("Parsed hints: {}", hints.join("; ")));
    }

    lines.push(String::new());
    lines.push(format!("User request: {}", spec.raw_text));
    lines.push(String::new());
    lines.push("Return ONLY the JSON object (no markdown, no code fences).".into());

    lines.join("\n")
}

fn parsed_hints(spec: &DesignSpec) -> Vec<String> {
    let mut hints = Vec::new();
    if let Some(kind) = spec.antenna_type_hint {
        hints.push(format!("antenna_type={kind}"));
    }
    if !spec.frequencies_hz.is_empty() {
        let list: Vec<String> = spec.frequencies_hz.iter().map(|f| format!("{f:e}")).collect();
        hints.push(format!("frequencies_hz=[{}]", list.join(", ")));
    }
    hints
}
