pub mod analysis;
pub mod discovery;

pub use analysis::AnalysisClient;
pub use discovery::DiscoveryClient;
