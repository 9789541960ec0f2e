//! Application state.

use std::sync::Arc;

use meterview_client::{ClientOptions, IdentityApi, IdentityClient, MeteringApi, MeteringClient};
use meterview_core::MeterviewError;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: ServiceConfig,

    /// Metering client (optional).
    pub metering: Option<Arc<dyn MeteringApi>>,

    /// Identity client for name lookups (optional).
    pub identity: Option<Arc<dyn IdentityApi>>,
}

impl AppState {
    /// Create a new application state, building clients for the configured
    /// backends.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        let options = ClientOptions {
            timeout_seconds: config.backend_timeout_seconds,
            insecure: config.insecure,
        };
        let token = config.auth_token.clone().unwrap_or_default();

        if config.insecure {
            tracing::warn!("TLS certificate verification disabled for backend requests");
        }

        // Create metering client if configured
        let metering = config.metering_url.as_ref().and_then(|url| {
            match MeteringClient::new(url, token.clone(), options.clone()) {
                Ok(client) => {
                    tracing::info!(metering_url = %url, "Metering backend enabled");
                    Some(Arc::new(client) as Arc<dyn MeteringApi>)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create metering client");
                    None
                }
            }
        });

        if metering.is_none() {
            tracing::warn!("Metering not configured - usage endpoints will return empty results");
        }

        // Create identity client if configured
        let identity = config.identity_url.as_ref().and_then(|url| {
            match IdentityClient::new(url, token.clone(), options.clone()) {
                Ok(client) => {
                    tracing::info!(identity_url = %url, "Identity backend enabled");
                    Some(Arc::new(client) as Arc<dyn IdentityApi>)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create identity client");
                    None
                }
            }
        });

        if identity.is_none() {
            tracing::warn!("Identity not configured - raw user and project ids will be shown");
        }

        Self::with_backends(config, metering, identity)
    }

    /// Create a state around already-built backends.
    #[must_use]
    pub fn with_backends(
        config: ServiceConfig,
        metering: Option<Arc<dyn MeteringApi>>,
        identity: Option<Arc<dyn IdentityApi>>,
    ) -> Self {
        Self {
            config,
            metering,
            identity,
        }
    }

    /// The metering backend, or `BackendUnavailable` when none is configured.
    pub fn metering(&self) -> Result<&dyn MeteringApi, MeterviewError> {
        self.metering
            .as_deref()
            .ok_or_else(|| MeterviewError::backend("metering", "not configured"))
    }

    /// The identity backend, if configured.
    #[must_use]
    pub fn identity(&self) -> Option<&dyn IdentityApi> {
        self.identity.as_deref()
    }
}
