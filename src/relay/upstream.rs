//! HTTP client for the upstream chat-completions API.

use axum::http::header;
use tracing::debug;

use crate::error::RelayError;
use crate::relay::payload::OutboundPayload;

/// One upstream endpoint plus a pooled HTTP client.
///
/// No timeout is configured: a call waits until upstream answers or the
/// connection fails. There are no retries.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
}

impl UpstreamClient {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Send the payload and return the upstream response once its status is
    /// known to be a success. The body is not read on success, so a streaming
    /// caller can forward it incrementally.
    pub async fn dispatch(
        &self,
        api_key: &str,
        payload: &OutboundPayload,
    ) -> Result<reqwest::Response, RelayError> {
        let mut request = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .json(payload);
        if payload.stream {
            request = request.header(header::ACCEPT, "text/event-stream");
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %self.url, "Upstream responded");

        if !status.is_success() {
            let body = response.text().await?;
            return Err(RelayError::UpstreamFailure { status, body });
        }
        Ok(response)
    }
}
