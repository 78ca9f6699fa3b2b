//! Error types for the AntennaFlow domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all AntennaFlow operations.
///
/// Only four kinds abort a design request: configuration, generation,
/// unparsable model output, and session acquisition. Everything else is
/// recovered or recorded closer to where it happens.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Generative model errors ---
    #[error("Generation failed: {0}")]
    Generation(#[from] ProviderError),

    #[error("No parsable structured output in model response: {raw}")]
    UnparsableOutput { raw: String },

    // --- Physics errors ---
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    // --- Session errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for configuration errors.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),
}

/// Domain errors raised when constructing an antenna model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("Frequency must be a positive finite number of hertz, got {0}")]
    NonPositiveFrequency(f64),

    #[error("End-effect correction must be in (0, 1], got {0}")]
    InvalidCorrection(f64),

    #[error("Relative permittivity must be a finite value >= 1, got {0}")]
    InvalidPermittivity(f64),
}

/// Errors from a CAD/EM backend or from opening a session against it.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Failed to open backend session: {0}")]
    Connect(String),

    #[error("Real backend requested but no connector is configured")]
    NoConnector,

    #[error("Backend does not support {0}")]
    Unsupported(String),

    #[error("Backend call '{operation}' failed: {reason}")]
    Backend { operation: String, reason: String },

    #[error("Backend I/O error: {0}")]
    Io(String),
}

/// Errors raised while processing a single task. These never abort a run;
/// the interpreter records them and marks the run as `error`.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    #[error("Invalid parameter '{key}': {reason}")]
    InvalidParams { key: String, reason: String },

    #[error("{0}")]
    Backend(String),
}
