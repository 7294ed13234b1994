//! HTTP seam between adapters and the network.

use crate::error::{GenerationFailure, LlmError, Result};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self(e.to_string())
    }
}

/// Sends one JSON POST. Implementations must not retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// No request timeout is configured; deadlines belong to the caller.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| LlmError::ProviderUnavailable {
                provider: "http".to_string(),
                dependency: format!("reqwest client with rustls TLS ({e})"),
            })?;
        Ok(Self { http })
    }

    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = self.http.post(&request.url).json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Send `request` once and decode a successful body as JSON.
pub(crate) async fn send_json(
    transport: &dyn HttpTransport,
    provider: &str,
    request: HttpRequest,
) -> Result<serde_json::Value> {
    let response = transport.post_json(request).await.map_err(|e| {
        LlmError::generation(provider, GenerationFailure::Transport, e.to_string())
    })?;

    if !(200..300).contains(&response.status) {
        tracing::warn!(provider, status = response.status, "vendor call failed");
        return Err(LlmError::generation(
            provider,
            GenerationFailure::from_status(response.status),
            format!("status={} body={}", response.status, response.body),
        ));
    }

    serde_json::from_str(&response.body).map_err(|e| {
        LlmError::generation(
            provider,
            GenerationFailure::ResponseFormat,
            format!("json error={e} body={}", response.body),
        )
    })
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
