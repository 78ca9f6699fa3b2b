//! Free-space constants (SI units).

/// Speed of light in vacuum, m/s (exact).
pub const C: f64 = 299_792_458.0;

/// Permeability of free space, H/m (classical 4π×10⁻⁷ value).
pub const MU0: f64 = 4.0e-7 * std::f64::consts::PI;

/// Permittivity of free space, F/m. Derived from `MU0` and `C`.
pub const EPS0: f64 = 1.0 / (MU0 * C * C);

/// Wave impedance of free space, ohms. Derived from `MU0` and `C`.
pub const ETA0: f64 = MU0 * C;

/// Free-space wavelength in metres for a frequency in hertz.
///
/// Callers must pass a positive frequency; antenna constructors enforce this.
pub fn wavelength_m(frequency_hz: f64) -> f64 {
    C / frequency_hz
}
