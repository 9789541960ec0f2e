//! Client error types.

use meterview_core::MeterviewError;

/// Errors that can occur when calling the metering or identity service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Response was missing a required field or had an invalid value.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Request argument the service cannot address, such as a meter name
    /// that would escape its URL path segment.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Convert into the core taxonomy, naming the service that failed.
    #[must_use]
    pub fn into_core(self, service: &str) -> MeterviewError {
        match self {
            Self::MalformedResponse(msg) => MeterviewError::MalformedResponse(msg),
            Self::InvalidRequest(msg) => MeterviewError::MalformedInput(msg),
            other => MeterviewError::backend(service, other.to_string()),
        }
    }
}

impl From<MeterviewError> for ClientError {
    fn from(err: MeterviewError) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}
