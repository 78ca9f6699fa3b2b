//! Generative model providers for AntennaFlow.
//!
//! All providers implement the `antennaflow_core::Provider` trait. The
//! strategy builder turns configuration into an ordered fallback chain of
//! API shapes, and [`GenerativeClient`] sits on top of that chain to turn a
//! prompt into parsed JSON.

pub mod fallback;
pub mod gemini;
mod http;
pub mod openai_compat;
pub mod strategy;
pub mod structured;

pub use fallback::FallbackProvider;
pub use gemini::{GeminiApiVersion, GeminiProvider};
pub use openai_compat::OpenAiCompatProvider;
pub use strategy::{ResolvedChain, build_from_config};
pub use structured::{GenerativeClient, extract_json};
