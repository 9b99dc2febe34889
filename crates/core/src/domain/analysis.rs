use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
    Neutral,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
            Signal::Neutral => "NEUTRAL",
        }
    }

    /// BUY and SELL are the only signals that can be flagged strong.
    pub fn is_directional(self) -> bool {
        matches!(self, Signal::Buy | Signal::Sell)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time frame an analysis or discovery request is framed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeHorizon {
    Intraday,
    Short,
    MediumLong,
}

impl TimeHorizon {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeHorizon::Intraday => "INTRADAY",
            TimeHorizon::Short => "SHORT",
            TimeHorizon::MediumLong => "MEDIUM_LONG",
        }
    }
}

impl fmt::Display for TimeHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub symbol: String,
    pub company_name: String,
    pub signal: Signal,
    #[serde(default)]
    pub is_strong: bool,
    pub price: String,
    pub change: String,
    pub reasoning: String,
    pub technical_analysis: String,
    pub sentiment: String,
    pub sources: Vec<GroundingSource>,
    pub timestamp: DateTime<Local>,
    pub horizon: TimeHorizon,
}

/// Trims and upper-cases a user supplied ticker. Returns `None` for blank input.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_symbol_trims_and_uppercases() {
        assert_eq!(normalize_symbol("  aapl \n").as_deref(), Some("AAPL"));
        assert_eq!(normalize_symbol("eni.mi").as_deref(), Some("ENI.MI"));
        assert_eq!(normalize_symbol("   "), None);
    }

    #[test]
    fn horizon_serializes_as_wire_names() {
        let json = serde_json::to_string(&TimeHorizon::MediumLong).unwrap();
        assert_eq!(json, "\"MEDIUM_LONG\"");
        let back: TimeHorizon = serde_json::from_str("\"INTRADAY\"").unwrap();
        assert_eq!(back, TimeHorizon::Intraday);
    }

    #[test]
    fn only_buy_and_sell_are_directional() {
        assert!(Signal::Buy.is_directional());
        assert!(Signal::Sell.is_directional());
        assert!(!Signal::Hold.is_directional());
        assert!(!Signal::Neutral.is_directional());
    }
}
