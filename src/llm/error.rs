//! Error types for LLM gateway operations
//!
//! Only terminal failures appear here. Malformed replies from the provider
//! are downgraded to an unstructured answer by the gateway, never surfaced
//! as errors.

use thiserror::Error;

/// Errors that terminate a gateway call
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No API key was configured; the request is never sent
    #[error("LLM API key is not configured")]
    Configuration,

    /// The provider answered with a non-retryable HTTP error status
    #[error("LLM API error (status {status}): {body}")]
    Upstream {
        /// HTTP status code from the provider
        status: u16,
        /// Raw response body from the provider
        body: String,
    },

    /// Transport failure or retry exhaustion
    #[error("LLM service unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
