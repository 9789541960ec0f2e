//! Error types for meterview.

/// Result type for meterview operations.
pub type Result<T> = std::result::Result<T, MeterviewError>;

/// Errors that can occur while fetching and shaping metering data.
#[derive(Debug, thiserror::Error)]
pub enum MeterviewError {
    /// The metering or identity service is unreachable or returned an error.
    #[error("backend unavailable: {service} - {message}")]
    BackendUnavailable {
        /// The service that failed.
        service: String,
        /// Error message.
        message: String,
    },

    /// Caller-supplied input could not be parsed (dates, categories, ...).
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A service response lacked a required field or had an invalid value.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// No statistic was returned for a scoped query.
    #[error("no statistic for meter {meter}")]
    EmptyStatistic {
        /// The meter that was queried.
        meter: String,
    },
}

impl MeterviewError {
    /// Build a `BackendUnavailable` error.
    pub fn backend(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Whether this error comes from an external service rather than from input.
    #[must_use]
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable { .. } | Self::MalformedResponse(_)
        )
    }
}
