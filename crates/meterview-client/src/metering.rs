//! Metering (Ceilometer v2) client implementation.

use async_trait::async_trait;
use reqwest::{Client, Url};

use meterview_core::{Meter, Query, Resource, Sample, Statistic};

use crate::api::MeteringApi;
use crate::error::ClientError;
use crate::http::{
    build_http_client, handle_response, normalize_base_url, query_params, ClientOptions,
    AUTH_TOKEN_HEADER,
};
use crate::wire::{convert_all, WireMeter, WireResource, WireSample, WireStatistic};

/// Metering API client.
#[derive(Debug, Clone)]
pub struct MeteringClient {
    client: Client,
    base_url: String,
    token: String,
}

impl MeteringClient {
    /// Create a new metering client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Metering endpoint (e.g., `"http://controller:8777"`)
    /// * `token` - Identity token sent as `X-Auth-Token`
    /// * `options` - Timeout and TLS settings
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

    /// The endpoint URL for `segments`, each percent-encoded as one path
    /// segment under the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid metering URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::Configuration(format!("metering URL has no path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_list<W: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &Query,
    ) -> Result<Vec<W>, ClientError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(url = %url, clauses = query.clauses().len(), "Metering request");

        let response = self
            .client
            .get(url)
            .header(AUTH_TOKEN_HEADER, &self.token)
            .query(&query_params(query))
            .send()
            .await?;

        handle_response(response).await
    }
}

/// Meter names are a single path segment: no separators, no dot segments.
fn meter_segment(meter: &str) -> Result<&str, ClientError> {
    let dot_segment = meter == "." || meter == "..";
    if meter.is_empty() || dot_segment || meter.contains(['/', '\\', '?', '#']) {
        return Err(ClientError::InvalidRequest(format!("invalid meter name: {meter:?}")));
    }
    Ok(meter)
}

#[async_trait]
impl MeteringApi for MeteringClient {
    async fn meters(&self, query: &Query) -> Result<Vec<Meter>, ClientError> {
        let wire: Vec<WireMeter> = self.get_list(&["v2", "meters"], query).await?;
        convert_all(wire)
    }

    async fn samples(&self, meter: &str, query: &Query) -> Result<Vec<Sample>, ClientError> {
        let segments = ["v2", "meters", meter_segment(meter)?];
        let wire: Vec<WireSample> = self.get_list(&segments, query).await?;
        convert_all(wire)
    }

    async fn statistics(&self, meter: &str, query: &Query) -> Result<Vec<Statistic>, ClientError> {
        let segments = ["v2", "meters", meter_segment(meter)?, "statistics"];
        let wire: Vec<WireStatistic> = self.get_list(&segments, query).await?;
        convert_all(wire)
    }

    async fn resources(&self, query: &Query) -> Result<Vec<Resource>, ClientError> {
        let wire: Vec<WireResource> = self.get_list(&["v2", "resources"], query).await?;
        convert_all(wire)
    }
}
