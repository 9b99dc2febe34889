use crate::domain::analysis::Signal;
use crate::domain::discovery::DiscoveryCandidate;
use crate::llm::LlmError;
use serde_json::{Map, Value};

/// Fields the model supplies for a single-ticker analysis. Everything else on
/// `AnalysisResult` is stamped by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPayload {
    pub company_name: String,
    pub signal: Signal,
    pub is_strong: bool,
    pub price: String,
    pub change: String,
    pub reasoning: String,
    pub technical_analysis: String,
    pub sentiment: String,
}

pub const ANALYSIS_REQUIRED_FIELDS: [&str; 4] = ["companyName", "signal", "price", "reasoning"];

impl AnalysisPayload {
    pub fn from_value(value: &Value, raw_output: &str) -> Result<Self, LlmError> {
        let obj = value
            .as_object()
            .ok_or_else(|| LlmError::malformed("analysis payload is not a JSON object", raw_output))?;

        for key in ANALYSIS_REQUIRED_FIELDS {
            if text_field(obj, key).is_none() {
                return Err(LlmError::malformed(
                    format!("analysis payload is missing `{key}`"),
                    raw_output,
                ));
            }
        }

        let raw_signal = text_field(obj, "signal").unwrap_or_default();
        let (signal, strong_in_label) = parse_signal(&raw_signal);
        let is_strong = strong_in_label || flag_field(obj, "isStrong").unwrap_or(false);

        Ok(Self {
            company_name: text_field(obj, "companyName").unwrap_or_default(),
            signal,
            is_strong,
            price: text_field(obj, "price").unwrap_or_default(),
            change: text_field(obj, "change").unwrap_or_default(),
            reasoning: text_field(obj, "reasoning").unwrap_or_default(),
            technical_analysis: text_field(obj, "technicalAnalysis").unwrap_or_default(),
            sentiment: text_field(obj, "sentiment").unwrap_or_default(),
        })
    }
}

/// Converts a scan response into candidates. The array must be non-empty;
/// object entries pass through with missing fields left empty.
pub fn candidates_from_value(
    value: &Value,
    raw_output: &str,
) -> Result<Vec<DiscoveryCandidate>, LlmError> {
    let items = value
        .as_array()
        .ok_or_else(|| LlmError::malformed("discovery payload is not a JSON array", raw_output))?;

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            tracing::warn!(index, "dropping non-object discovery entry");
            continue;
        };
        out.push(DiscoveryCandidate {
            symbol: text_field(obj, "symbol").unwrap_or_default(),
            company_name: text_field(obj, "companyName").unwrap_or_default(),
            brief_reasoning: text_field(obj, "briefReasoning").unwrap_or_default(),
            potential_reason: text_field(obj, "potentialReason").unwrap_or_default(),
        });
    }

    if out.is_empty() {
        return Err(LlmError::malformed(
            "discovery payload contains no candidates",
            raw_output,
        ));
    }
    Ok(out)
}

/// Reads a display string. Numbers and booleans are stringified; null,
/// arrays and objects count as absent.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flag_field(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    match obj.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Case-insensitive signal label. "STRONG BUY" style labels also set the
/// strength flag; anything unrecognised is NEUTRAL.
fn parse_signal(raw: &str) -> (Signal, bool) {
    let normalized = raw.trim().to_ascii_uppercase().replace(['_', '-'], " ");
    let (strong, base) = match normalized.strip_prefix("STRONG ") {
        Some(rest) => (true, rest.trim()),
        None => (false, normalized.as_str()),
    };

    match base {
        "BUY" => (Signal::Buy, strong),
        "SELL" => (Signal::Sell, strong),
        "HOLD" => (Signal::Hold, false),
        _ => (Signal::Neutral, false),
    }
}
