use crate::domain::analysis::TimeHorizon;
use crate::llm::GenerateRequest;
use crate::prompt::JSON_ONLY_RULES;
use serde_json::json;

/// Instruction plus the declared output shape for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub instruction_text: String,
    pub expected_fields: serde_json::Value,
}

impl AnalysisRequest {
    pub fn into_generate_request(self) -> GenerateRequest {
        GenerateRequest {
            instruction: self.instruction_text,
            web_search: true,
            response_schema: Some(self.expected_fields),
        }
    }
}

pub struct AnalysisRequestBuilder;

impl AnalysisRequestBuilder {
    /// `symbol` is expected to be normalized already.
    pub fn build(symbol: &str, horizon: TimeHorizon) -> AnalysisRequest {
        let mut lines = vec![
            format!("Analyze the stock with ticker \"{symbol}\", {}", horizon_focus(horizon)),
            "Use Google Search now to find:".to_string(),
            "1. The current price and the most recent change.".to_string(),
            "2. Recent news affecting the company.".to_string(),
            "3. Technical analysis (trend, supports and resistances, momentum).".to_string(),
            "4. Market sentiment and fundamentals.".to_string(),
            String::new(),
            "Decide whether now is the moment to BUY, SELL or HOLD.".to_string(),
            "Set isStrong to true only for a high-conviction BUY or SELL.".to_string(),
            caution(horizon).to_string(),
            String::new(),
            "Output schema:".to_string(),
            "{".to_string(),
            "  \"companyName\": \"full company name\",".to_string(),
            "  \"signal\": \"BUY\" | \"SELL\" | \"HOLD\",".to_string(),
            "  \"isStrong\": false,".to_string(),
            "  \"price\": \"current price with currency, e.g. $184.12\",".to_string(),
            "  \"change\": \"recent percentage change, e.g. +2.3%\",".to_string(),
            "  \"reasoning\": \"detailed explanation of the decision, at least 3-4 sentences\",".to_string(),
            "  \"technicalAnalysis\": \"technical details\",".to_string(),
            "  \"sentiment\": \"Bullish, Bearish or Neutral with a short description\"".to_string(),
            "}".to_string(),
            "Rules:".to_string(),
        ];
        lines.extend(JSON_ONLY_RULES.iter().map(|r| format!("- {r}")));

        AnalysisRequest {
            instruction_text: lines.join("\n"),
            expected_fields: expected_fields(),
        }
    }
}

fn horizon_focus(horizon: TimeHorizon) -> &'static str {
    match horizon {
        TimeHorizon::Intraday => {
            "focusing on INTRADAY trading. Look at price action over the last few hours, \
             short-timeframe momentum indicators (e.g. 5m/15m RSI, VWAP), current volatility \
             and news from the last hour."
        }
        TimeHorizon::Short => {
            "focusing on the SHORT term. Look at this week's movement and current momentum, \
             as a swing trader would."
        }
        TimeHorizon::MediumLong => {
            "focusing on the MEDIUM-LONG term (6-24 months). Look for fundamental value, \
             sustainable growth and macroeconomic trends."
        }
    }
}

fn caution(horizon: TimeHorizon) -> &'static str {
    match horizon {
        TimeHorizon::Intraday => {
            "Be extremely cautious: intraday moves are volatile and a wrong call is costly."
        }
        TimeHorizon::Short => "Be critical and prudent.",
        TimeHorizon::MediumLong => {
            "Be very critical and prudent, especially for a long-horizon call."
        }
    }
}

fn expected_fields() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "companyName": {"type": "STRING"},
            "signal": {"type": "STRING", "enum": ["BUY", "SELL", "HOLD"]},
            "isStrong": {"type": "BOOLEAN"},
            "price": {"type": "STRING"},
            "change": {"type": "STRING"},
            "reasoning": {"type": "STRING"},
            "technicalAnalysis": {"type": "STRING"},
            "sentiment": {"type": "STRING"}
        },
        "required": ["companyName", "signal", "price", "reasoning"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::ANALYSIS_REQUIRED_FIELDS;

    #[test]
    fn instruction_names_symbol_and_demands_json_only() {
        let req = AnalysisRequestBuilder::build("AAPL", TimeHorizon::Short);
        assert!(req.instruction_text.contains("\"AAPL\""));
        assert!(req.instruction_text.contains("SHORT term"));
        assert!(req.instruction_text.contains("Return ONLY valid JSON"));
        assert!(req.instruction_text.contains("live web search"));
    }

    #[test]
    fn horizons_change_wording_only() {
        let intraday = AnalysisRequestBuilder::build("NVDA", TimeHorizon::Intraday);
        let long = AnalysisRequestBuilder::build("NVDA", TimeHorizon::MediumLong);

        assert!(intraday.instruction_text.contains("last hour"));
        assert!(intraday.instruction_text.contains("extremely cautious"));
        assert!(long.instruction_text.contains("6-24 months"));
        assert!(long.instruction_text.contains("long-horizon"));
        assert_ne!(intraday.instruction_text, long.instruction_text);
        assert_eq!(intraday.expected_fields, long.expected_fields);
    }

    #[test]
    fn schema_requires_the_fields_the_contract_checks() {
        let req = AnalysisRequestBuilder::build("AAPL", TimeHorizon::Short);
        let required: Vec<&str> = req.expected_fields["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, ANALYSIS_REQUIRED_FIELDS);

        let generate = req.into_generate_request();
        assert!(generate.web_search);
        assert!(generate.response_schema.is_some());
    }
}
