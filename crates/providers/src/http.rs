//! HTTP helpers shared by the REST providers.

use antennaflow_core::error::ProviderError;
use std::time::Duration;

/// Upper bound on a single HTTP exchange. The fallback chain applies its own,
/// usually shorter, per-strategy timeout on top.
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

pub(crate) fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Map a non-success status to a provider error.
pub(crate) fn status_error(status: u16, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: 5,
        },
        401 | 403 => ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        404 => ProviderError::ModelNotFound(body),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}
