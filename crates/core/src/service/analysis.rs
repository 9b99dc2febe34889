use crate::domain::analysis::{normalize_symbol, AnalysisResult, GroundingSource, TimeHorizon};
use crate::domain::contract::AnalysisPayload;
use crate::llm::{json, GroundingChunk, LlmClient, LlmError};
use crate::prompt::AnalysisRequestBuilder;
use serde_json::Value;
use std::sync::Arc;

/// One upstream call per `analyze`; retries are the caller's business.
#[derive(Clone)]
pub struct AnalysisClient {
    llm: Arc<dyn LlmClient>,
}

impl AnalysisClient {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn analyze(
        &self,
        symbol: &str,
        horizon: TimeHorizon,
    ) -> Result<AnalysisResult, LlmError> {
        // Blank input still goes upstream as an empty ticker; interactive
        // callers filter it out before getting here.
        let symbol = normalize_symbol(symbol).unwrap_or_default();
        let request = AnalysisRequestBuilder::build(&symbol, horizon);

        tracing::debug!(%symbol, %horizon, provider = ?self.llm.provider(), "requesting analysis");
        let response = self.llm.generate(request.into_generate_request()).await?;

        let text = response
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;
        let value = json::extract_where(&text, Value::is_object)?;
        let payload = AnalysisPayload::from_value(&value, &text)?;

        Ok(AnalysisResult {
            symbol,
            company_name: payload.company_name,
            signal: payload.signal,
            is_strong: payload.is_strong,
            price: payload.price,
            change: payload.change,
            reasoning: payload.reasoning,
            technical_analysis: payload.technical_analysis,
            sentiment: payload.sentiment,
            sources: sources_from_chunks(&response.grounding_chunks),
            timestamp: chrono::Local::now(),
            horizon,
        })
    }
}

/// Web citations in upstream order. Chunks without a web reference are skipped.
pub fn sources_from_chunks(chunks: &[GroundingChunk]) -> Vec<GroundingSource> {
    chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .map(|web| GroundingSource {
            title: web.title.clone().unwrap_or_default(),
            uri: web.uri.clone().unwrap_or_default(),
        })
        .collect()
}
