//! Deliverability engine: cached address analysis and the order workflow built on it.

mod analysis;
mod cache;
mod orders;
mod report;

#[cfg(test)]
mod testing;

pub use analysis::{AnalysisError, DEFAULT_GATEWAY_TIMEOUT, DeliverabilityAnalysisService};
pub use cache::AnalysisResultCache;
pub use orders::{ActionError, EngineError, OrderActions, OrderProcessingEngine};
pub use report::{FailedOrder, ProcessReport};
