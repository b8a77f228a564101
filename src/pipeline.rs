//! The lens query pipeline shared by every lens
//!
//! `Received -> Validated -> Dispatched -> AwaitingUpstream -> Normalized | Failed`.
//! One attempt per request; failures surface immediately.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::http::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::clients::{CompletionRequest, CompletionService, ResponsesClient};
use crate::config::Config;
use crate::error::{LensError, Result};
use crate::lenses::LensSpec;
use crate::normalizer::{LensResult, UpstreamReply, normalize};

/// Raw inbound call as seen by the pipeline
#[derive(Debug, Clone)]
pub struct InboundCall {
    pub method: Method,
    pub body: Bytes,
}

impl InboundCall {
    pub fn post(body: impl Into<Bytes>) -> Self {
        Self {
            method: Method::POST,
            body: body.into(),
        }
    }
}

/// Validated request. `input` is kept exactly as sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LensRequest {
    pub input: String,
}

#[derive(Deserialize)]
struct RawRequest {
    #[serde(default)]
    input: Option<Value>,
}

impl LensRequest {
    pub fn parse(body: &[u8]) -> Result<Self> {
        let raw: RawRequest = serde_json::from_slice(body).map_err(|e| {
            debug!("Rejecting unparseable request body: {}", e);
            LensError::InvalidInput
        })?;
        match raw.input {
            Some(Value::String(input)) => Self::new(input),
            _ => Err(LensError::InvalidInput),
        }
    }

    pub fn new(input: impl Into<String>) -> Result<Self> {
        let input = input.into();
        if input.trim().is_empty() {
            return Err(LensError::InvalidInput);
        }
        Ok(Self { input })
    }
}

#[derive(Clone)]
pub struct LensPipeline {
    client: Arc<dyn CompletionService>,
    credential: Option<String>,
}

impl LensPipeline {
    pub fn new(client: Arc<dyn CompletionService>, credential: Option<String>) -> Self {
        Self {
            client,
            credential: credential.filter(|c| !c.trim().is_empty()),
        }
    }

    /// Pipeline backed by the real HTTPS client and the configured credential
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = ResponsesClient::new(&config.upstream)?;
        Ok(Self::new(Arc::new(client), config.runtime.api_key.clone()))
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    /// Full pipeline for one inbound HTTP call
    pub async fn run(&self, lens: &LensSpec, call: InboundCall) -> Result<LensResult> {
        if call.method != Method::POST {
            debug!(lens = %lens.name, method = %call.method, "rejecting non-POST call");
            return Err(LensError::MethodNotAllowed);
        }
        let request = LensRequest::parse(&call.body)?;
        self.dispatch(lens, &request).await
    }

    /// Pipeline for an input string that did not arrive as an HTTP body
    pub async fn query(&self, lens: &LensSpec, input: &str) -> Result<LensResult> {
        let request = LensRequest::new(input)?;
        self.dispatch(lens, &request).await
    }

    async fn dispatch(&self, lens: &LensSpec, request: &LensRequest) -> Result<LensResult> {
        let span = info_span!("lens_query", lens = %lens.name, model = %lens.model);
        async move {
            let credential = self
                .credential
                .as_deref()
                .ok_or(LensError::MissingCredential)
                .inspect_err(|_| warn!("No upstream credential configured"))?;

            let outbound = CompletionRequest {
                model: &lens.model,
                instructions: &lens.instructions,
                input: &request.input,
                temperature: lens.temperature,
                max_output_tokens: lens.max_output_tokens,
            };

            let started = Instant::now();
            debug!("dispatching to {}", self.client.endpoint());
            let outcome = match self.client.complete(credential, &outbound).await {
                Ok(response) => normalize(UpstreamReply::classify(response.status, response.body)),
                Err(e) => Err(e),
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match &outcome {
                Ok(result) => info!(elapsed_ms, chars = result.as_str().len(), "normalized"),
                Err(e) => warn!(elapsed_ms, kind = e.kind(), "failed: {}", e),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}
