//! Physics for AntennaFlow: SI constants, a reference materials table, and
//! first-order closed-form antenna sizing.
//!
//! These are textbook approximations, not field solutions. They give the CAD
//! backend a sensible starting geometry; a solver refines it.

pub mod antenna;
pub mod constants;
pub mod materials;

pub use antenna::{Antenna, DesignParams, Dipole, DipoleParams, Patch, PatchParams, QuickEstimate};
pub use materials::{Material, lookup};
