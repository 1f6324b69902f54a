//! Fakes for the engine's collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use delivcheck_core::{
    Address, AddressBlock, AddressId, AnalysisResult, Order, OrderAnalysisStatus, OrderId,
    PersonBlock, VerificationRecord, VerificationRequest,
};
use delivcheck_gateway::{GatewayError, VerificationGateway};
use delivcheck_store::{MemoryStore, ResultStore, StatusStore, StoreError};

use crate::orders::{ActionError, OrderActions};

pub fn address(id: u64) -> Address {
    Address {
        id: AddressId(id),
        country_code: "DE".into(),
        postal_code: "04229".into(),
        city: "Leipzig".into(),
        street_name: "Nonnenstrasse".into(),
        street_number: "11".into(),
        first_name: "Erika".into(),
        last_name: "Mustermann".into(),
    }
}

pub fn order(id: u64, address_id: u64) -> Order {
    Order {
        id: OrderId(id),
        shipping_address: address(address_id),
    }
}

/// A street record echoing `id` with the given codes and a corrected street.
pub fn record(id: u64, codes: &[&str]) -> VerificationRecord {
    let mut record = VerificationRecord::new(
        AddressId(id),
        codes.iter().map(|c| c.to_string()).collect(),
    );
    record.person = Some(PersonBlock {
        first_name: "Erika".into(),
        last_name: "Mustermann".into(),
    });
    record.address = Some(AddressBlock {
        postal_code: "04229".into(),
        city: "Leipzig".into(),
        street_name: "Nonnenstraße".into(),
        street_number: "11".into(),
        street_number_addition: "a".into(),
    });
    record
}

// ── Gateway ──

/// Answers from a fixed record table and counts calls.
#[derive(Default)]
pub struct CountingGateway {
    records: Mutex<HashMap<AddressId, VerificationRecord>>,
    extra: Mutex<Vec<VerificationRecord>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<Vec<AddressId>>>,
    failure: Mutex<Option<fn() -> GatewayError>>,
    delay: Option<Duration>,
}

impl CountingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(records: Vec<VerificationRecord>) -> Self {
        let gateway = Self::new();
        for r in records {
            gateway.add(r);
        }
        gateway
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn add(&self, record: VerificationRecord) {
        self.records.lock().unwrap().insert(record.record_id, record);
    }

    /// A record returned on every call whether requested or not.
    pub fn add_unsolicited(&self, record: VerificationRecord) {
        self.extra.lock().unwrap().push(record);
    }

    pub fn fail_with(&self, failure: fn() -> GatewayError) {
        *self.failure.lock().unwrap() = Some(failure);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ids of every batch submitted, in call order.
    pub fn requested(&self) -> Vec<Vec<AddressId>> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl VerificationGateway for CountingGateway {
    async fn submit_batch(
        &self,
        requests: &[VerificationRequest],
    ) -> Result<Vec<VerificationRecord>, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .unwrap()
            .push(requests.iter().map(|r| r.record_id).collect());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = *self.failure.lock().unwrap() {
            return Err(failure());
        }

        let records = self.records.lock().unwrap();
        let mut out: Vec<VerificationRecord> = requests
            .iter()
            .filter_map(|r| records.get(&r.record_id).cloned())
            .collect();
        out.extend(self.extra.lock().unwrap().iter().cloned());
        Ok(out)
    }
}

// ── Store ──

/// Memory store whose writes fail for selected ids.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing_results: HashSet<AddressId>,
    failing_statuses: HashSet<OrderId>,
    failing_loads: bool,
}

impl FlakyStore {
    pub fn failing_results(ids: &[u64]) -> Self {
        Self {
            failing_results: ids.iter().map(|&id| AddressId(id)).collect(),
            ..Self::default()
        }
    }

    /// Every result lookup fails; status reads and all writes work.
    pub fn failing_loads() -> Self {
        Self {
            failing_loads: true,
            ..Self::default()
        }
    }

    pub fn failing_statuses(ids: &[u64]) -> Self {
        Self {
            failing_statuses: ids.iter().map(|&id| OrderId(id)).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ResultStore for FlakyStore {
    async fn load_result(&self, id: AddressId) -> Result<Option<AnalysisResult>, StoreError> {
        if self.failing_loads {
            return Err(StoreError::Other("transient read failure".into()));
        }
        self.inner.load_result(id).await
    }

    async fn save_result(&self, result: &AnalysisResult) -> Result<(), StoreError> {
        if self.failing_results.contains(&result.address_id) {
            return Err(StoreError::Other("disk full".into()));
        }
        self.inner.save_result(result).await
    }
}

#[async_trait]
impl StatusStore for FlakyStore {
    async fn load_status(&self, order: OrderId) -> Result<Option<OrderAnalysisStatus>, StoreError> {
        self.inner.load_status(order).await
    }

    async fn save_status(
        &self,
        order: OrderId,
        status: OrderAnalysisStatus,
    ) -> Result<(), StoreError> {
        if self.failing_statuses.contains(&order) {
            return Err(StoreError::Other("disk full".into()));
        }
        self.inner.save_status(order, status).await
    }

    async fn orders_with_status(
        &self,
        status: OrderAnalysisStatus,
    ) -> Result<Vec<OrderId>, StoreError> {
        self.inner.orders_with_status(status).await
    }
}

// ── Order actions ──

/// Order subsystem fake: any order can be held or cancelled once.
#[derive(Default)]
pub struct RecordingActions {
    held: Mutex<Vec<OrderId>>,
    cancelled: Mutex<Vec<OrderId>>,
    updated: Mutex<HashMap<OrderId, Address>>,
    locked: HashSet<OrderId>,
    fail_updates: bool,
}

impl RecordingActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders the order subsystem refuses to hold or cancel.
    pub fn locked(ids: &[u64]) -> Self {
        Self {
            locked: ids.iter().map(|&id| OrderId(id)).collect(),
            ..Self::default()
        }
    }

    pub fn failing_updates() -> Self {
        Self {
            fail_updates: true,
            ..Self::default()
        }
    }

    pub fn held(&self) -> Vec<OrderId> {
        self.held.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<OrderId> {
        self.cancelled.lock().unwrap().clone()
    }

    pub fn updated(&self, order: OrderId) -> Option<Address> {
        self.updated.lock().unwrap().get(&order).cloned()
    }

    fn is_closed(&self, order: OrderId) -> bool {
        self.locked.contains(&order) || self.cancelled.lock().unwrap().contains(&order)
    }
}

#[async_trait]
impl OrderActions for RecordingActions {
    async fn can_hold(&self, order: OrderId) -> bool {
        !self.is_closed(order) && !self.held.lock().unwrap().contains(&order)
    }

    async fn hold(&self, order: OrderId) -> bool {
        self.held.lock().unwrap().push(order);
        true
    }

    async fn can_cancel(&self, order: OrderId) -> bool {
        !self.is_closed(order)
    }

    async fn cancel(&self, order: OrderId) -> bool {
        self.cancelled.lock().unwrap().push(order);
        true
    }

    async fn update_shipping_address(
        &self,
        order: OrderId,
        address: &Address,
    ) -> Result<(), ActionError> {
        if self.fail_updates {
            return Err(ActionError("address repository unavailable".into()));
        }
        self.updated.lock().unwrap().insert(order, address.clone());
        Ok(())
    }
}
