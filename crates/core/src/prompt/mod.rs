pub mod analysis;
pub mod discovery;

pub use analysis::{AnalysisRequest, AnalysisRequestBuilder};
pub use discovery::{DiscoveryRequestBuilder, DISCOVERY_CANDIDATES};

/// Shared rules appended to every instruction.
pub(crate) const JSON_ONLY_RULES: [&str; 3] = [
    "Return ONLY valid JSON. Do not wrap it in markdown and do not write any prose before or after it.",
    "No trailing commas. No comments. Use double quotes for all JSON strings.",
    "Base every figure on a live web search performed now; do not rely on training data for prices or news.",
];
