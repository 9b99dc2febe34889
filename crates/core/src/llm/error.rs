use crate::llm::Provider;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Transport, auth, rate-limit or service failure.
    #[error("LLM error (provider={provider:?}, stage={stage}): {detail}")]
    Upstream {
        provider: Provider,
        stage: &'static str,
        detail: String,
        raw_output: Option<String>,
    },

    /// The text could not be coerced into the declared JSON shape.
    #[error("malformed model response: {detail}")]
    MalformedResponse { detail: String, raw_output: String },

    #[error("model returned no text")]
    EmptyResponse,
}

impl LlmError {
    pub fn malformed(detail: impl Into<String>, raw_output: &str) -> Self {
        LlmError::MalformedResponse {
            detail: detail.into(),
            raw_output: raw_output.to_string(),
        }
    }

    /// Message shown to the user by interactive flows.
    pub fn user_message(&self) -> &'static str {
        match self {
            LlmError::Upstream { .. } => {
                "The analysis service is unavailable right now. Please try again shortly."
            }
            LlmError::MalformedResponse { .. } => {
                "The analysis service returned an unreadable answer. Check the ticker and try again."
            }
            LlmError::EmptyResponse => {
                "The analysis service returned no answer for this request."
            }
        }
    }

    pub fn raw_output(&self) -> Option<&str> {
        match self {
            LlmError::Upstream { raw_output, .. } => raw_output.as_deref(),
            LlmError::MalformedResponse { raw_output, .. } => Some(raw_output),
            LlmError::EmptyResponse => None,
        }
    }
}
