//! Upstream random integer provider
//!
//! [`RandomSource`] is the seam between the orchestrator and the network.
//! [`RandomOrgClient`] implements it against a JSON-RPC 2.0 `generateIntegers`
//! endpoint, one POST per batch, and classifies every failure into an
//! [`ExternalApiError`].

use std::time::Duration;

use async_trait::async_trait;
use randstat_core::types::{BatchRequest, BatchSuccess, VALUE_MAX, VALUE_MIN};
use serde::{Deserialize, Serialize};

use crate::config::{Credential, ServerConfig};
use crate::error::ExternalApiError;

/// Source of random integer batches
#[async_trait]
pub trait RandomSource: Send + Sync {
    /// Fetch `batch.length` integers in `[VALUE_MIN, VALUE_MAX]`.
    async fn fetch(
        &self,
        credential: &Credential,
        batch: &BatchRequest,
    ) -> Result<Vec<i64>, ExternalApiError>;
}

/// JSON-RPC request body
#[derive(Debug, Serialize)]
struct GenerateIntegersRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: GenerateIntegersParams<'a>,
    id: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateIntegersParams<'a> {
    api_key: &'a str,
    n: usize,
    min: i64,
    max: i64,
    replacement: bool,
    base: u32,
}

impl<'a> GenerateIntegersRequest<'a> {
    fn new(credential: &'a Credential, batch: &BatchRequest) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "generateIntegers",
            params: GenerateIntegersParams {
                api_key: credential.expose(),
                n: batch.length,
                min: VALUE_MIN,
                max: VALUE_MAX,
                replacement: true,
                base: 10,
            },
            id: batch.correlation_id,
        }
    }
}

/// JSON-RPC response body; exactly one of `result` / `error` is expected
#[derive(Debug, Deserialize)]
struct GenerateIntegersResponse {
    result: Option<RpcResult>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcResult {
    random: RandomData,
}

#[derive(Debug, Deserialize)]
struct RandomData {
    data: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// HTTP client for the provider's JSON-RPC endpoint
#[derive(Debug, Clone)]
pub struct RandomOrgClient {
    http: reqwest::Client,
    url: String,
}

impl RandomOrgClient {
    /// Create a client posting to `url`, with `timeout` applied per call
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Create a client from the server configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.upstream_url.clone(), config.upstream_timeout())
    }

    /// Endpoint this client posts to
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn classify_send_error(err: reqwest::Error) -> ExternalApiError {
    if err.is_timeout() {
        ExternalApiError::Timeout {
            detail: err.to_string(),
        }
    } else {
        ExternalApiError::transport(err.to_string())
    }
}

fn extract_values(
    body: &[u8],
    batch: &BatchRequest,
) -> Result<Vec<i64>, ExternalApiError> {
    let response: GenerateIntegersResponse = serde_json::from_slice(body)
        .map_err(|e| ExternalApiError::malformed(format!("invalid JSON-RPC body: {}", e)))?;

    if let Some(error) = response.error {
        return Err(ExternalApiError::UpstreamStatus {
            status: 200,
            detail: format!("JSON-RPC error {}: {}", error.code, error.message),
        });
    }

    let data = response
        .result
        .ok_or_else(|| ExternalApiError::malformed("response has neither result nor error"))?
        .random
        .data;

    if data.len() != batch.length {
        return Err(ExternalApiError::malformed(format!(
            "expected {} values, got {}",
            batch.length,
            data.len()
        )));
    }

    let batch = BatchSuccess::new(batch.index, data);
    if !batch.is_in_domain() {
        return Err(ExternalApiError::malformed(format!(
            "batch {} has values outside [{}, {}]",
            batch.index, VALUE_MIN, VALUE_MAX
        )));
    }

    Ok(batch.values)
}

#[async_trait]
impl RandomSource for RandomOrgClient {
    async fn fetch(
        &self,
        credential: &Credential,
        batch: &BatchRequest,
    ) -> Result<Vec<i64>, ExternalApiError> {
        let payload = GenerateIntegersRequest::new(credential, batch);

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExternalApiError::UpstreamStatus {
                status: status.as_u16(),
                detail: format!("provider responded with {}", status),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                classify_send_error(e)
            } else {
                ExternalApiError::malformed(format!("failed to read body: {}", e))
            }
        })?;

        extract_values(&body, batch)
    }
}
