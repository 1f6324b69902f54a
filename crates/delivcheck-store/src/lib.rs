//! Storage layer: analysis results keyed by address, analysis status keyed by order.
//!
//! Both tables use the business identifier as primary key. Writes are upserts;
//! the store is the serialization point when two sweeps race on one address.

use std::collections::HashMap;

use async_trait::async_trait;
use delivcheck_core::{AddressId, AnalysisResult, OrderAnalysisStatus, OrderId};

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;

/// Persistent analysis results. A missing row is `Ok(None)`, not an error.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn load_result(&self, id: AddressId) -> Result<Option<AnalysisResult>, StoreError>;

    /// Insert or overwrite the result for `result.address_id`.
    async fn save_result(&self, result: &AnalysisResult) -> Result<(), StoreError>;

    /// Load every stored result among `ids`; absent ids are simply missing from the map.
    async fn load_results(
        &self,
        ids: &[AddressId],
    ) -> Result<HashMap<AddressId, AnalysisResult>, StoreError> {
        let mut found = HashMap::with_capacity(ids.len());
        for &id in ids {
            if let Some(result) = self.load_result(id).await? {
                found.insert(id, result);
            }
        }
        Ok(found)
    }
}

/// Persistent per-order analysis status. A missing row means
/// [`OrderAnalysisStatus::NotAnalysed`].
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn load_status(&self, order: OrderId) -> Result<Option<OrderAnalysisStatus>, StoreError>;

    /// Insert or overwrite the status of `order`.
    async fn save_status(
        &self,
        order: OrderId,
        status: OrderAnalysisStatus,
    ) -> Result<(), StoreError>;

    /// Orders currently in `status`, ascending by id.
    async fn orders_with_status(
        &self,
        status: OrderAnalysisStatus,
    ) -> Result<Vec<OrderId>, StoreError>;
}
