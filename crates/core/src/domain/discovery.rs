use serde::{Deserialize, Serialize};

/// One hit from an opportunity scan. Fields are passed through from the model
/// as-is; missing ones are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryCandidate {
    pub symbol: String,
    pub company_name: String,
    pub brief_reasoning: String,
    pub potential_reason: String,
}
