//! Shared HTTP plumbing for the service clients.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use meterview_core::Query;

use crate::error::ClientError;

/// Header carrying the identity token.
pub(crate) const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// Skip TLS certificate verification (default: false).
    pub insecure: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            insecure: false,
        }
    }
}

pub(crate) fn build_http_client(options: &ClientOptions) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(Duration::from_secs(options.timeout_seconds))
        .danger_accept_invalid_certs(options.insecure)
        .build()
        .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))
}

pub(crate) fn normalize_base_url(base_url: impl Into<String>) -> Result<String, ClientError> {
    let base_url = base_url.into().trim().trim_end_matches('/').to_string();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ClientError::Configuration(format!(
            "base URL must be http(s): {base_url:?}"
        )));
    }
    Ok(base_url)
}

/// Encode clauses as repeated `q.field` / `q.op` / `q.value` parameters.
pub(crate) fn query_params(query: &Query) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(query.clauses().len() * 3);
    for clause in query {
        params.push(("q.field", clause.field.clone()));
        params.push(("q.op", clause.op.as_str().to_string()));
        params.push(("q.value", clause.value.clone()));
    }
    params
}

/// Handle API response and convert errors.
pub(crate) async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();

    if status.is_success() {
        let body = response.bytes().await?;
        return serde_json::from_slice(&body)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()));
    }

    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| error_message(&body))
        .unwrap_or_else(|| format!("HTTP {status}"));

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Pull a message out of either service's error body.
fn error_message(body: &serde_json::Value) -> Option<String> {
    // Ceilometer: {"error_message": {"faultstring": ...}} or {"error_message": "..."}
    // Keystone:   {"error": {"message": ...}}
    let candidates = [
        body.pointer("/error_message/faultstring"),
        body.get("error_message"),
        body.pointer("/error/message"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(ToString::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meterview_core::QueryOp;
    use serde_json::json;

    #[test]
    fn trims_trailing_slash() {
        assert_eq!(
            normalize_base_url("http://localhost:8777/").unwrap(),
            "http://localhost:8777"
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            normalize_base_url("localhost:8777"),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn encodes_clauses_in_order() {
        let query = Query::new()
            .equals("resource", "vm-1")
            .clause("timestamp", QueryOp::Ge, "2013-07-01 00:00:00");
        let params = query_params(&query);
        assert_eq!(
            params,
            vec![
                ("q.field", "resource".to_string()),
                ("q.op", "eq".to_string()),
                ("q.value", "vm-1".to_string()),
                ("q.field", "timestamp".to_string()),
                ("q.op", "ge".to_string()),
                ("q.value", "2013-07-01 00:00:00".to_string()),
            ]
        );
    }

    #[test]
    fn extracts_error_messages() {
        assert_eq!(
            error_message(&json!({"error_message": {"faultstring": "Unknown meter"}})),
            Some("Unknown meter".to_string())
        );
        assert_eq!(
            error_message(&json!({"error": {"message": "The request you have made requires authentication.", "code": 401}})),
            Some("The request you have made requires authentication.".to_string())
        );
        assert_eq!(error_message(&json!({"unexpected": true})), None);
    }
}
