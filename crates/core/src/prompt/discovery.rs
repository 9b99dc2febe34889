use crate::domain::analysis::TimeHorizon;
use crate::llm::GenerateRequest;
use crate::prompt::JSON_ONLY_RULES;

/// Number of candidates a scan asks for. Not enforced on the response.
pub const DISCOVERY_CANDIDATES: usize = 4;

pub struct DiscoveryRequestBuilder;

impl DiscoveryRequestBuilder {
    pub fn build(horizon: TimeHorizon) -> String {
        let mut lines = vec![format!(
            "Use Google Search to identify the {DISCOVERY_CANDIDATES} best current investment opportunities \
             in the global stock market for a {} horizon.",
            horizon_label(horizon)
        )];
        lines.push(
            "Analyze today's news, sector trends (e.g. AI, Energy, Tech) and recent analyst recommendations."
                .to_string(),
        );
        if horizon == TimeHorizon::Intraday {
            lines.push(
                "Focus on names showing elevated volatility or abnormal trading volume in the current session."
                    .to_string(),
            );
        }
        lines.extend([
            String::new(),
            format!("Return EXCLUSIVELY a JSON array of exactly {DISCOVERY_CANDIDATES} objects with:"),
            "- symbol: the exact ticker (e.g. NVDA, ENI.MI)".to_string(),
            "- companyName: the company name".to_string(),
            "- briefReasoning: why it is interesting, at most 15 words".to_string(),
            "- potentialReason: a short category such as \"Growth\", \"Value\", \"Momentum\", \"Volatility\" or \"Recovery\"".to_string(),
            "Rules:".to_string(),
        ]);
        lines.extend(JSON_ONLY_RULES.iter().map(|r| format!("- {r}")));
        lines.join("\n")
    }

    pub fn generate_request(horizon: TimeHorizon) -> GenerateRequest {
        GenerateRequest {
            instruction: Self::build(horizon),
            web_search: true,
            response_schema: None,
        }
    }
}

fn horizon_label(horizon: TimeHorizon) -> &'static str {
    match horizon {
        TimeHorizon::Intraday => "same-day (intraday)",
        TimeHorizon::Short => "short-term",
        TimeHorizon::MediumLong => "medium-to-long-term",
    }
}
