//! # AntennaFlow Core
//!
//! Domain types, traits, and error definitions for the AntennaFlow antenna
//! design pipeline. Every other crate depends inward on this one.
//!
//! ## What lives here
//!
//! - The `Provider` trait (the generative-model boundary)
//! - Parsed intent (`DesignSpec`) and normalized model output (`GenerativeSpec`)
//! - The task model: `Task`, `Params`, the closed `ActionClass` vocabulary,
//!   and the uniform `TaskExecutionResult` log
//! - The error taxonomy shared by the whole workspace

pub mod error;
pub mod message;
pub mod provider;
pub mod spec;
pub mod task;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use spec::{AntennaKind, DesignSpec, GenerativeSpec, Intent, DEFAULT_FREQUENCY_HZ};
pub use task::{
    ActionClass, ExecutionRecord, ExecutionStatus, Params, RecordOutcome, Task, TaskExecutionResult,
};
