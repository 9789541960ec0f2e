//! Identity (Keystone v3) client implementation.

use async_trait::async_trait;
use reqwest::Client;

use crate::api::{IdentityApi, IdentityRecord};
use crate::error::ClientError;
use crate::http::{build_http_client, handle_response, normalize_base_url, ClientOptions, AUTH_TOKEN_HEADER};
use crate::wire::{convert_all, ProjectsResponse, UsersResponse};

/// Identity API client.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    token: String,
}

impl IdentityClient {
    /// Create a new identity client.
    ///
    /// `token` needs admin scope to list every project.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(&options)?,
            base_url: normalize_base_url(base_url)?,
            token: token.into(),
        })
    }

    /// The endpoint this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(url = %url, "Identity request");

        let response = self
            .client
            .get(&url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .send()
            .await?;

        handle_response(response).await
    }
}

#[async_trait]
impl IdentityApi for IdentityClient {
    async fn users(&self) -> Result<Vec<IdentityRecord>, ClientError> {
        let body: UsersResponse = self.get("/v3/users").await?;
        convert_all(body.users)
    }

    async fn projects(&self) -> Result<Vec<IdentityRecord>, ClientError> {
        let body: ProjectsResponse = self.get("/v3/projects").await?;
        convert_all(body.projects)
    }
}
