use crate::config::Settings;
use crate::llm::{GenerateRequest, GenerateResponse, GroundingChunk, LlmClient, LlmError, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_gemini_api_key()?.to_string();
        let base_url = settings
            .gemini_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = settings
            .gemini_model
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout_secs = settings.gemini_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn upstream(stage: &'static str, detail: String, raw_output: Option<String>) -> LlmError {
        LlmError::Upstream {
            provider: Provider::Gemini,
            stage,
            detail,
            raw_output,
        }
    }

    fn build_body(request: GenerateRequest) -> GenerateContentRequest {
        let tools = if request.web_search {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        // The service rejects a JSON mime type combined with search tools, so a
        // grounded request carries its shape in the instruction text only.
        let generation_config = match request.response_schema {
            Some(schema) if !request.web_search => Some(GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            }),
            _ => None,
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart {
                    text: request.instruction,
                }],
            }],
            tools,
            generation_config,
        }
    }

    async fn generate_content(
        &self,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| Self::upstream("auth", format!("invalid API key header: {e}"), None))?;
        headers.insert("x-goog-api-key", key);

        let res = self
            .http
            .post(self.url())
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| Self::upstream("transport", format!("request failed: {e}"), None))?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            Self::upstream("transport", format!("failed to read response body: {e}"), None)
        })?;
        if !status.is_success() {
            return Err(Self::upstream("http", format!("status={status}"), Some(text)));
        }

        serde_json::from_str::<GenerateContentResponse>(&text).map_err(|e| {
            Self::upstream(
                "decode",
                format!("failed to decode generateContent response: {e}"),
                Some(text),
            )
        })
    }

    /// Concatenated non-thought text parts of the first candidate.
    fn response_text(res: &GenerateContentResponse) -> Option<String> {
        let candidate = res.candidates.first()?;
        let content = candidate.content.as_ref()?;

        let mut out = String::new();
        for part in &content.parts {
            if part.thought.unwrap_or(false) {
                continue;
            }
            let Some(text) = part.text.as_deref() else {
                continue;
            };
            out.push_str(text);
        }

        if out.trim().is_empty() {
            None
        } else {
            Some(out)
        }
    }

    fn grounding_chunks(res: &GenerateContentResponse) -> Vec<GroundingChunk> {
        res.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| m.grounding_chunks.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let body = Self::build_body(request);
        let res = self.generate_content(&body).await?;

        if let Some(reason) = res.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            if reason != "STOP" {
                tracing::warn!(model = %self.model, finish_reason = reason, "Gemini candidate did not finish normally");
            }
        }

        Ok(GenerateResponse {
            text: Self::response_text(&res),
            grounding_chunks: Self::grounding_chunks(&res),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Clone, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn grounded_request_carries_search_tool_but_no_schema() {
        let body = GeminiClient::build_body(GenerateRequest {
            instruction: "analyze".to_string(),
            web_search: true,
            response_schema: Some(json!({"type": "OBJECT"})),
        });
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["tools"], json!([{"google_search": {}}]));
        assert!(value.get("generationConfig").is_none());
        assert_eq!(value["contents"][0]["parts"][0]["text"], "analyze");
    }

    #[test]
    fn ungrounded_request_declares_json_schema() {
        let body = GeminiClient::build_body(GenerateRequest {
            instruction: "analyze".to_string(),
            web_search: false,
            response_schema: Some(json!({"type": "OBJECT"})),
        });
        let value = serde_json::to_value(&body).unwrap();

        assert!(value.get("tools").is_none());
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(value["generationConfig"]["responseSchema"], json!({"type": "OBJECT"}));
    }

    #[test]
    fn parses_text_and_grounding_chunks() {
        let raw = json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "{\"signal\":"},
                    {"text": "\"BUY\"}"}
                ]},
                "finishReason": "STOP",
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://example.com/a", "title": "A"}},
                    {"retrievedContext": {"uri": "gs://x"}}
                ]}
            }]
        });
        let res: GenerateContentResponse = serde_json::from_value(raw).unwrap();

        assert_eq!(
            GeminiClient::response_text(&res).as_deref(),
            Some("{\"signal\":\"BUY\"}")
        );
        let chunks = GeminiClient::grounding_chunks(&res);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].web.as_ref().unwrap().title.as_deref(), Some("A"));
        assert!(chunks[1].web.is_none());
    }

    #[test]
    fn missing_candidates_yield_no_text() {
        let res: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(GeminiClient::response_text(&res).is_none());
        assert!(GeminiClient::grounding_chunks(&res).is_empty());
    }
}
