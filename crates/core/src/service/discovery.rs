use crate::domain::analysis::TimeHorizon;
use crate::domain::contract::candidates_from_value;
use crate::domain::discovery::DiscoveryCandidate;
use crate::llm::{json, LlmClient, LlmError};
use crate::prompt::{DiscoveryRequestBuilder, DISCOVERY_CANDIDATES};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct DiscoveryClient {
    llm: Arc<dyn LlmClient>,
}

impl DiscoveryClient {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Candidate count and completeness are not enforced beyond a non-empty array.
    pub async fn discover(
        &self,
        horizon: TimeHorizon,
    ) -> Result<Vec<DiscoveryCandidate>, LlmError> {
        tracing::debug!(%horizon, provider = ?self.llm.provider(), "requesting discovery scan");
        let response = self
            .llm
            .generate(DiscoveryRequestBuilder::generate_request(horizon))
            .await?;

        let text = response
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;
        let value = json::extract_where(&text, holds_candidates)?;
        let candidates = candidates_from_value(&value, &text)?;

        if candidates.len() != DISCOVERY_CANDIDATES {
            tracing::info!(
                %horizon,
                expected = DISCOVERY_CANDIDATES,
                got = candidates.len(),
                "discovery returned an unexpected number of candidates"
            );
        }
        Ok(candidates)
    }
}

fn holds_candidates(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().any(Value::is_object))
}
