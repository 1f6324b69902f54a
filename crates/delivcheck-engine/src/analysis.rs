//! Batch deliverability analysis: cache first, one gateway round-trip for the rest.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use delivcheck_core::{Address, AddressId, AnalysisResult, VerificationRecord, VerificationRequest};
use delivcheck_gateway::{GatewayError, VerificationGateway};
use delivcheck_store::{ResultStore, StoreError};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::cache::AnalysisResultCache;

pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The batch call failed. `cached` holds the results that were already
    /// known before the call; an empty map means nothing was analysed.
    #[error("verification gateway failed: {source}")]
    Gateway {
        #[source]
        source: GatewayError,
        cached: HashMap<AddressId, AnalysisResult>,
    },
    #[error("result lookup failed: {0}")]
    Store(#[from] StoreError),
}

impl AnalysisError {
    /// Results known before the failure, if the failure came from the gateway.
    pub fn cached(&self) -> Option<&HashMap<AddressId, AnalysisResult>> {
        match self {
            Self::Gateway { cached, .. } => Some(cached),
            Self::Store(_) => None,
        }
    }
}

/// Resolves addresses to analysis results with at most one external call
/// per address over the lifetime of the store.
pub struct DeliverabilityAnalysisService {
    cache: AnalysisResultCache,
    gateway: Arc<dyn VerificationGateway>,
    timeout: Duration,
}

impl DeliverabilityAnalysisService {
    pub fn new(store: Arc<dyn ResultStore>, gateway: Arc<dyn VerificationGateway>) -> Self {
        Self {
            cache: AnalysisResultCache::new(store),
            gateway,
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }

    /// Bound each gateway round-trip. Expiry fails the batch like a service error.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &AnalysisResultCache {
        &self.cache
    }

    /// Analyse a batch of addresses.
    ///
    /// Known addresses come from the cache. The rest go to the gateway in a
    /// single call; a full cache hit makes no call and writes nothing.
    /// Returned records are filtered for their subtype, mapped and upserted.
    ///
    /// An address is missing from the result when the service returned no
    /// record for it or its result could not be saved; both are logged.
    pub async fn analyse(
        &self,
        addresses: &[Address],
    ) -> Result<HashMap<AddressId, AnalysisResult>, AnalysisError> {
        let mut seen = HashSet::with_capacity(addresses.len());
        let unique: Vec<&Address> = addresses.iter().filter(|a| seen.insert(a.id)).collect();
        let ids: Vec<AddressId> = unique.iter().map(|a| a.id).collect();

        let (cached, uncached) = self.cache.partition(&ids).await?;
        if uncached.is_empty() {
            info!(count = cached.len(), "all addresses already analysed");
            return Ok(cached);
        }

        let pending: HashSet<AddressId> = uncached.iter().copied().collect();
        let requests: Vec<VerificationRequest> = unique
            .iter()
            .filter(|a| pending.contains(&a.id))
            .map(|a| VerificationRequest::from(*a))
            .collect();

        info!(
            cached = cached.len(),
            requested = requests.len(),
            "submitting uncached addresses for verification"
        );
        let records = match self.submit(&requests).await {
            Ok(records) => records,
            Err(source) => {
                error!(
                    error = %source,
                    authentication = source.is_authentication(),
                    requested = requests.len(),
                    "verification batch failed"
                );
                return Err(AnalysisError::Gateway { source, cached });
            }
        };

        let mut fresh: HashMap<AddressId, AnalysisResult> = HashMap::with_capacity(records.len());
        for record in &records {
            let id = record.record_id;
            if !pending.contains(&id) {
                warn!(address_id = %id, "ignoring record for an address that was not requested");
                continue;
            }
            if fresh.contains_key(&id) {
                warn!(address_id = %id, "ignoring duplicate record");
                continue;
            }

            let result = AnalysisResult::from_record(record);
            match self.cache.put(&result).await {
                Ok(()) => {
                    info!(
                        address_id = %id,
                        subtype = ?record.subtype(),
                        verdict = %result.verdict(),
                        "address analysed"
                    );
                    fresh.insert(id, result);
                }
                Err(e) => {
                    error!(address_id = %id, error = %e, "failed to save analysis result");
                }
            }
        }

        for id in uncached.iter().filter(|id| !fresh.contains_key(id)) {
            warn!(address_id = %id, "no analysis result for address");
        }

        let mut results = cached;
        results.extend(fresh);
        Ok(results)
    }

    /// One bounded gateway round-trip. An empty reply to a non-empty batch
    /// fails the batch like any other service error.
    async fn submit(
        &self,
        requests: &[VerificationRequest],
    ) -> Result<Vec<VerificationRecord>, GatewayError> {
        let records =
            match tokio::time::timeout(self.timeout, self.gateway.submit_batch(requests)).await {
                Ok(result) => result?,
                Err(_) => return Err(GatewayError::Timeout(self.timeout)),
            };
        if records.is_empty() && !requests.is_empty() {
            return Err(GatewayError::EmptyResponse {
                requested: requests.len(),
            });
        }
        Ok(records)
    }
}
