//! In-memory store for tests and single-process use. Not persistent.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use delivcheck_core::{AddressId, AnalysisResult, OrderAnalysisStatus, OrderId};
use tokio::sync::RwLock;

use crate::{ResultStore, StatusStore, StoreError};

/// HashMap-backed implementation of both store traits. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    results: Arc<RwLock<HashMap<AddressId, AnalysisResult>>>,
    statuses: Arc<RwLock<HashMap<OrderId, OrderAnalysisStatus>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn result_count(&self) -> usize {
        self.results.read().await.len()
    }

    pub async fn status_count(&self) -> usize {
        self.statuses.read().await.len()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn load_result(&self, id: AddressId) -> Result<Option<AnalysisResult>, StoreError> {
        Ok(self.results.read().await.get(&id).cloned())
    }

    async fn save_result(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        self.results
            .write()
            .await
            .insert(result.address_id, result.clone());
        Ok(())
    }

    async fn load_results(
        &self,
        ids: &[AddressId],
    ) -> Result<HashMap<AddressId, AnalysisResult>, StoreError> {
        let results = self.results.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| results.get(id).map(|r| (*id, r.clone())))
            .collect())
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn load_status(&self, order: OrderId) -> Result<Option<OrderAnalysisStatus>, StoreError> {
        Ok(self.statuses.read().await.get(&order).copied())
    }

    async fn save_status(
        &self,
        order: OrderId,
        status: OrderAnalysisStatus,
    ) -> Result<(), StoreError> {
        self.statuses.write().await.insert(order, status);
        Ok(())
    }

    async fn orders_with_status(
        &self,
        status: OrderAnalysisStatus,
    ) -> Result<Vec<OrderId>, StoreError> {
        let mut orders: Vec<OrderId> = self
            .statuses
            .read()
            .await
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|(id, _)| *id)
            .collect();
        orders.sort();
        Ok(orders)
    }
}
