pub mod error;
pub mod gemini;
pub mod json;

pub use error::LlmError;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

/// One prompt-in/JSON-out call.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub instruction: String,
    /// Ask the service to ground its answer on a live web search.
    pub web_search: bool,
    /// Declared output shape, as a JSON schema.
    pub response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    pub text: Option<String>,
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// Citation chunk attached to a grounded answer. Only chunks carrying `web`
/// are usable as sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebReference {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError>;
}

#[cfg(test)]
pub(crate) mod fake;
