//! The AntennaFlow design agent.
//!
//! One request flows through a fixed pipeline:
//!
//! 1. **Parse** the request locally (frequencies, topology hint)
//! 2. **Prompt** the generative model with a deterministic instruction document
//! 3. **Normalize** whatever JSON comes back into a [`GenerativeSpec`](antennaflow_core::GenerativeSpec)
//! 4. **Size** one antenna per resolved frequency
//! 5. **Execute** each antenna's tasks against a single CAD session
//!
//! Only configuration, generation, unparsable output, and session-open
//! failures abort a request. Everything else is recorded in the response.

pub mod normalize;
pub mod orchestrator;
pub mod parser;
pub mod response;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use normalize::normalize;
pub use orchestrator::{DesignAgent, default_workflow, enrich_task};
pub use parser::{antenna_type_hint, build_prompt, extract_frequencies, parse};
pub use response::{AntennaReport, DesignResponse, SessionSummary, WorkflowSource};
