//! Closed-form antenna models.
//!
//! [`Antenna`] is a closed union over the supported topologies. The only
//! place a topology string turns into a variant is [`Antenna::new`]; after
//! that, callers go through `design_params` and `quick_estimate`.

use antennaflow_core::error::PhysicsError;
use antennaflow_core::{AntennaKind, Params};
use serde::{Deserialize, Serialize};

use crate::constants::{wavelength_m, C};

/// Metres to millimetres.
const MM_PER_M: f64 = 1000.0;

fn check_frequency(frequency_hz: f64) -> Result<f64, PhysicsError> {
    if frequency_hz.is_finite() && frequency_hz > 0.0 {
        Ok(frequency_hz)
    } else {
        Err(PhysicsError::NonPositiveFrequency(frequency_hz))
    }
}

// ── Dipole ──────────────────────────────────────────────────────────────────

/// Half-wave dipole with an end-effect length correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dipole {
    frequency_hz: f64,
    correction: f64,
}

/// Dipole geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DipoleParams {
    pub frequency_hz: f64,
    pub wavelength_m: f64,
    pub length_m: f64,
    pub radius_m: f64,
    pub correction: f64,
}

impl Dipole {
    /// Physical arms come out slightly shorter than λ/2 because of end effects.
    pub const END_EFFECT_CORRECTION: f64 = 0.95;

    /// Thin-wire radius as a fraction of wavelength (sets the feed gap scale).
    pub const RADIUS_FRACTION: f64 = 0.005;

    /// Canonical half-wave dipole input impedance, ohms.
    pub const INPUT_IMPEDANCE_OHM: f64 = 73.0;

    /// Idealized free-space directive gain, dBi.
    pub const GAIN_DBI: f64 = 2.15;

    pub fn new(frequency_hz: f64) -> Result<Self, PhysicsError> {
        Ok(Self {
            frequency_hz: check_frequency(frequency_hz)?,
            correction: Self::END_EFFECT_CORRECTION,
        })
    }

    /// Override the end-effect correction. Must lie in (0, 1].
    pub fn with_correction(mut self, correction: f64) -> Result<Self, PhysicsError> {
        if !(correction > 0.0 && correction <= 1.0) {
            return Err(PhysicsError::InvalidCorrection(correction));
        }
        self.correction = correction;
        Ok(self)
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn design_params(&self) -> DipoleParams {
        let wavelength = wavelength_m(self.frequency_hz);
        DipoleParams {
            frequency_hz: self.frequency_hz,
            wavelength_m: wavelength,
            length_m: wavelength / 2.0 * self.correction,
            radius_m: wavelength * Self::RADIUS_FRACTION,
            correction: self.correction,
        }
    }

    pub fn quick_estimate(&self) -> QuickEstimate {
        QuickEstimate {
            resonant_frequency_hz: self.frequency_hz,
            input_impedance_ohm: Some(Self::INPUT_IMPEDANCE_OHM),
            gain_dbi: Some(Self::GAIN_DBI),
            bandwidth_pct: None,
        }
    }
}

// ── Patch ───────────────────────────────────────────────────────────────────

/// Rectangular microstrip patch on a dielectric substrate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patch {
    frequency_hz: f64,
    eps_r: f64,
}

/// Patch geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchParams {
    pub frequency_hz: f64,
    pub eps_r: f64,
    pub width_m: f64,
    pub length_m: f64,
}

impl Patch {
    /// FR4 substrate.
    pub const DEFAULT_EPS_R: f64 = 4.4;

    /// Fixed fringing-field shortening of length relative to width.
    pub const FRINGING_FACTOR: f64 = 0.95;

    /// Typical fractional bandwidth of a thin patch, percent.
    pub const BANDWIDTH_PCT: f64 = 2.0;

    pub fn new(frequency_hz: f64) -> Result<Self, PhysicsError> {
        Ok(Self {
            frequency_hz: check_frequency(frequency_hz)?,
            eps_r: Self::DEFAULT_EPS_R,
        })
    }

    /// Use a different substrate permittivity. Must be finite and >= 1.
    pub fn with_eps_r(mut self, eps_r: f64) -> Result<Self, PhysicsError> {
        if !(eps_r.is_finite() && eps_r >= 1.0) {
            return Err(PhysicsError::InvalidPermittivity(eps_r));
        }
        self.eps_r = eps_r;
        Ok(self)
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn design_params(&self) -> PatchParams {
        // TM10 width
        let width = C / (2.0 * self.frequency_hz) * (2.0 / (1.0 + self.eps_r)).sqrt();
        PatchParams {
            frequency_hz: self.frequency_hz,
            eps_r: self.eps_r,
            width_m: width,
            length_m: width * Self::FRINGING_FACTOR,
        }
    }

    pub fn quick_estimate(&self) -> QuickEstimate {
        QuickEstimate {
            resonant_frequency_hz: self.frequency_hz,
            input_impedance_ohm: None,
            gain_dbi: None,
            bandwidth_pct: Some(Self::BANDWIDTH_PCT),
        }
    }
}

// ── Union ───────────────────────────────────────────────────────────────────

/// Symbolic performance estimate. Not computed from a field solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuickEstimate {
    pub resonant_frequency_hz: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_impedance_ohm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain_dbi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth_pct: Option<f64>,
}

/// Geometry of any supported antenna.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DesignParams {
    Dipole(DipoleParams),
    Patch(PatchParams),
}

impl DesignParams {
    pub fn frequency_hz(&self) -> f64 {
        match self {
            DesignParams::Dipole(p) => p.frequency_hz,
            DesignParams::Patch(p) => p.frequency_hz,
        }
    }

    pub fn length_m(&self) -> f64 {
        match self {
            DesignParams::Dipole(p) => p.length_m,
            DesignParams::Patch(p) => p.length_m,
        }
    }

    /// Geometry as task parameters: lengths in millimetres, frequency in hertz.
    pub fn to_task_params(&self) -> Params {
        match self {
            DesignParams::Dipole(p) => Params::new()
                .with("topology", AntennaKind::Dipole.as_str())
                .with("frequency_hz", p.frequency_hz)
                .with("wavelength_mm", p.wavelength_m * MM_PER_M)
                .with("length_mm", p.length_m * MM_PER_M)
                .with("radius_mm", p.radius_m * MM_PER_M)
                .with("correction", p.correction),
            DesignParams::Patch(p) => Params::new()
                .with("topology", AntennaKind::Patch.as_str())
                .with("frequency_hz", p.frequency_hz)
                .with("eps_r", p.eps_r)
                .with("width_mm", p.width_m * MM_PER_M)
                .with("length_mm", p.length_m * MM_PER_M),
        }
    }
}

/// A sized antenna of one of the supported topologies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Antenna {
    Dipole(Dipole),
    Patch(Patch),
}

impl Antenna {
    /// Instantiate the default model of `kind` at `frequency_hz`.
    pub fn new(kind: AntennaKind, frequency_hz: f64) -> Result<Self, PhysicsError> {
        Ok(match kind {
            AntennaKind::Dipole => Antenna::Dipole(Dipole::new(frequency_hz)?),
            AntennaKind::Patch => Antenna::Patch(Patch::new(frequency_hz)?),
        })
    }

    pub fn kind(&self) -> AntennaKind {
        match self {
            Antenna::Dipole(_) => AntennaKind::Dipole,
            Antenna::Patch(_) => AntennaKind::Patch,
        }
    }

    pub fn frequency_hz(&self) -> f64 {
        match self {
            Antenna::Dipole(d) => d.frequency_hz(),
            Antenna::Patch(p) => p.frequency_hz(),
        }
    }

    pub fn design_params(&self) -> DesignParams {
        match self {
            Antenna::Dipole(d) => DesignParams::Dipole(d.design_params()),
            Antenna::Patch(p) => DesignParams::Patch(p.design_params()),
        }
    }

    pub fn quick_estimate(&self) -> QuickEstimate {
        match self {
            Antenna::Dipole(d) => d.quick_estimate(),
            Antenna::Patch(p) => p.quick_estimate(),
        }
    }
}
