use async_trait::async_trait;
use thiserror::Error;

use super::types::ChatMessage;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("api error (status {status}): {body}")]
    Api { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "openai")
    fn name(&self) -> &str;

    /// check if the provider is healthy/reachable
    async fn health_check(&self) -> Result<bool, LlmError>;

    /// chat completion (non-streaming)
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// generate embeddings for a batch of inputs
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}
