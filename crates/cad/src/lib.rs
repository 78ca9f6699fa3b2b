//! CAD/EM session layer for AntennaFlow.
//!
//! A [`Session`] runs design tasks either against a real backend (through a
//! [`BackendConnector`]) or against a deterministic mock that only records
//! what would have happened. [`Session::apply_tasks`] interprets a task list
//! with one uniform result/log shape for both.

pub mod backend;
pub mod interpreter;
pub mod process;
pub mod session;

pub use backend::{
    BackendConnector, BoundarySpec, CadBackend, GeometrySpec, PortSpec, ProjectOptions,
    ReportSpec, SetupSpec,
};
pub use process::{ProcessBackend, ProcessConnector};
pub use session::{Descriptor, Outcome, Session, SessionLogEntry, SessionMode};
