//! Service configuration.

use serde::Deserialize;
use std::path::Path;

use meterview_core::Averaging;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Metering service endpoint (optional).
    pub metering_url: Option<String>,

    /// Identity service endpoint (optional).
    pub identity_url: Option<String>,

    /// Token sent to both services (optional).
    pub auth_token: Option<String>,

    /// Skip TLS certificate verification towards the backends.
    pub insecure: bool,

    /// Timeout for each backend request in seconds.
    pub backend_timeout_seconds: u64,

    /// Maximum statistic lookups in flight per usage table.
    pub statistics_concurrency: usize,

    /// How bucket means are computed in the sample export.
    pub averaging: Averaging,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// OpenStack secrets file structure.
#[derive(Debug, Deserialize)]
struct OpenStackSecrets {
    metering_url: String,
    #[serde(default)]
    identity_url: Option<String>,
    auth_token: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        // Try to load OpenStack secrets from file first, then fall back to env vars
        let (metering_url, identity_url, auth_token) = load_openstack_secrets();

        let truncate = env_flag("SERIES_TRUNCATE_AVERAGE");

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            metering_url,
            identity_url,
            auth_token,
            insecure: env_flag("OPENSTACK_SSL_NO_VERIFY"),
            backend_timeout_seconds: env_parse("BACKEND_TIMEOUT_SECONDS").unwrap_or(30),
            statistics_concurrency: env_parse("STATISTICS_CONCURRENCY")
                .filter(|n| *n > 0)
                .unwrap_or(8),
            averaging: if truncate {
                Averaging::Truncate
            } else {
                Averaging::Float
            },
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(4 * 1024 * 1024), // 4MB, SVG charts
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS").unwrap_or(60),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Load OpenStack endpoints and token from file or environment.
fn load_openstack_secrets() -> (Option<String>, Option<String>, Option<String>) {
    // Try multiple paths for the secrets file
    let secret_paths = [
        ".secrets/openstack.json",
        "meterview/.secrets/openstack.json",
        "../.secrets/openstack.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<OpenStackSecrets>(path) {
            tracing::info!(path = %path, "Loaded OpenStack secrets from file");
            return (
                Some(secrets.metering_url),
                secrets.identity_url,
                Some(secrets.auth_token),
            );
        }
    }

    // Fall back to environment variables
    tracing::debug!("OpenStack secrets file not found, using environment variables");
    (
        std::env::var("METERING_URL").ok(),
        std::env::var("IDENTITY_URL").ok(),
        std::env::var("AUTH_TOKEN").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<T, std::io::Error> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            metering_url: None,
            identity_url: None,
            auth_token: None,
            insecure: false,
            backend_timeout_seconds: 30,
            statistics_concurrency: 8,
            averaging: Averaging::Float,
            cors_origins: vec!["*".into()],
            max_body_bytes: 4 * 1024 * 1024,
            request_timeout_seconds: 60,
        }
    }
}
