//! Reference material properties.
//!
//! Lookup data only; the design pipeline does not consume it directly.

use serde::Serialize;

/// Bulk electromagnetic properties of a material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Material {
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conductivity_s_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps_r: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss_tan: Option<f64>,
}

/// The table, keyed by lowercase identifier.
pub const MATERIALS: &[(&str, Material)] = &[
    (
        "copper",
        Material {
            name: "Copper",
            conductivity_s_m: Some(5.8e7),
            eps_r: None,
            loss_tan: None,
        },
    ),
    (
        "aluminum",
        Material {
            name: "Aluminum",
            conductivity_s_m: Some(3.5e7),
            eps_r: None,
            loss_tan: None,
        },
    ),
    (
        "fr4",
        Material {
            name: "FR4",
            conductivity_s_m: None,
            eps_r: Some(4.4),
            loss_tan: Some(0.02),
        },
    ),
];

/// Case-insensitive lookup by identifier.
pub fn lookup(key: &str) -> Option<&'static Material> {
    let key = key.trim().to_ascii_lowercase();
    MATERIALS.iter().find(|(k, _)| *k == key).map(|(_, m)| m)
}
