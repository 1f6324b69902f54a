//! Analysis result cache. The result store is the cache; nothing is kept in process.

use std::collections::HashMap;
use std::sync::Arc;

use delivcheck_core::{AddressId, AnalysisResult};
use delivcheck_store::{ResultStore, StoreError};
use tracing::debug;

/// Maps address ids to their last known result.
///
/// An address with a stored result is never sent to the verification
/// service again. Lookups always go to the store, so several engines
/// sharing one store see each other's results.
pub struct AnalysisResultCache {
    store: Arc<dyn ResultStore>,
}

impl AnalysisResultCache {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    /// Split `ids` into known results and ids still needing analysis.
    ///
    /// The uncached list keeps the input order.
    pub async fn partition(
        &self,
        ids: &[AddressId],
    ) -> Result<(HashMap<AddressId, AnalysisResult>, Vec<AddressId>), StoreError> {
        if ids.is_empty() {
            return Ok((HashMap::new(), Vec::new()));
        }
        let cached = self.store.load_results(ids).await?;
        let uncached: Vec<AddressId> = ids
            .iter()
            .copied()
            .filter(|id| !cached.contains_key(id))
            .collect();

        debug!(cached = cached.len(), uncached = uncached.len(), "partitioned addresses");
        Ok((cached, uncached))
    }

    /// Upsert the result for `result.address_id`.
    pub async fn put(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        self.store.save_result(result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivcheck_store::MemoryStore;

    fn result(id: u64) -> AnalysisResult {
        AnalysisResult {
            address_id: AddressId(id),
            status_codes: vec!["PDC050105".into()],
            ..AnalysisResult::default()
        }
    }

    #[tokio::test]
    async fn partition_reads_through_to_store() {
        let store = MemoryStore::new();
        store.save_result(&result(2)).await.unwrap();
        let cache = AnalysisResultCache::new(Arc::new(store));

        let (cached, uncached) = cache
            .partition(&[AddressId(3), AddressId(2), AddressId(1)])
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);
        assert!(cached.contains_key(&AddressId(2)));
        assert_eq!(uncached, vec![AddressId(3), AddressId(1)]);
    }

    #[tokio::test]
    async fn put_is_visible_through_the_store() {
        let store = MemoryStore::new();
        let cache = AnalysisResultCache::new(Arc::new(store.clone()));
        cache.put(&result(5)).await.unwrap();

        assert!(store.load_result(AddressId(5)).await.unwrap().is_some());
        let (cached, uncached) = cache.partition(&[AddressId(5)]).await.unwrap();
        assert_eq!(cached.len(), 1);
        assert!(uncached.is_empty());
    }

    #[tokio::test]
    async fn nothing_is_held_in_process() {
        let store = MemoryStore::new();
        let cache = AnalysisResultCache::new(Arc::new(store.clone()));
        cache.put(&result(6)).await.unwrap();

        // A second writer replacing the row is seen on the next lookup.
        let mut replaced = result(6);
        replaced.status_codes = vec!["PDC050106".into(), "PDC040106".into()];
        store.save_result(&replaced).await.unwrap();

        let (cached, _) = cache.partition(&[AddressId(6)]).await.unwrap();
        assert_eq!(cached[&AddressId(6)], replaced);
    }

    #[tokio::test]
    async fn empty_partition_skips_the_store() {
        let cache = AnalysisResultCache::new(Arc::new(MemoryStore::new()));
        let (cached, uncached) = cache.partition(&[]).await.unwrap();
        assert!(cached.is_empty());
        assert!(uncached.is_empty());
    }
}
