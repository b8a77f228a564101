//! HTTPS client for the hosted Responses-style completion endpoint

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::clients::traits::{CompletionRequest, CompletionService, UpstreamResponse};
use crate::config::UpstreamConfig;
use crate::error::LensError;

#[derive(Clone, Debug)]
pub struct ResponsesClient {
    endpoint: String,
    timeout_ms: u64,
    client: Client,
}

impl ResponsesClient {
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build reqwest client with timeout")?;

        Ok(Self {
            endpoint: config.url(),
            timeout_ms: config.timeout_ms,
            client,
        })
    }
}

#[async_trait]
impl CompletionService for ResponsesClient {
    async fn complete(
        &self,
        credential: &str,
        request: &CompletionRequest<'_>,
    ) -> Result<UpstreamResponse, LensError> {
        debug!(
            "Sending completion request (model={}, input_chars={})",
            request.model,
            request.input.len()
        );

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LensError::UpstreamUnreachable {
                        message: format!("upstream timed out after {}ms", self.timeout_ms),
                    }
                } else {
                    LensError::from(e)
                }
            })?;

        let status = res.status().as_u16();
        let text = res.text().await.map_err(|e| LensError::UpstreamUnreachable {
            message: format!("Failed to read upstream response body: {}", e),
        })?;

        if status >= 400 {
            warn!("Upstream returned status {}", status);
            let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
            return Ok(UpstreamResponse { status, body });
        }

        let body: Value =
            serde_json::from_str(&text).map_err(|e| LensError::UpstreamUnreachable {
                message: format!("Malformed upstream response: {}", e),
            })?;

        Ok(UpstreamResponse { status, body })
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
