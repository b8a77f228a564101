use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::LensError;

/// Outbound body for the completion service. The user's input is its own field
/// and is never spliced into `instructions`.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub instructions: &'a str,
    pub input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Raw reply: HTTP status plus the decoded body. Error bodies that are not JSON
/// arrive as `Value::String`.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// One attempt, no retries. Transport failures map to `UpstreamUnreachable`.
    async fn complete(
        &self,
        credential: &str,
        request: &CompletionRequest<'_>,
    ) -> Result<UpstreamResponse, LensError>;

    /// Where requests go, for diagnostics only
    fn endpoint(&self) -> &str;
}
