//! Order subsystem stand-in for batch runs from the command line.
//!
//! There is no shop behind the CLI, so every hold, cancellation and address
//! update is accepted and recorded for the final report. The record lives
//! for one run; repeat runs rely on the engine not re-actioning orders whose
//! stored status is already concluded.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use delivcheck_core::{Address, OrderId};
use delivcheck_engine::{ActionError, OrderActions};
use tracing::debug;

#[derive(Default)]
pub struct PlannedActions {
    held: Mutex<HashSet<OrderId>>,
    cancelled: Mutex<HashSet<OrderId>>,
    addresses: Mutex<BTreeMap<OrderId, Address>>,
}

impl PlannedActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shipping addresses as they would be after this run's corrections.
    pub fn corrected_addresses(&self) -> BTreeMap<OrderId, Address> {
        self.addresses
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    fn contains(set: &Mutex<HashSet<OrderId>>, order: OrderId) -> bool {
        set.lock().map(|s| s.contains(&order)).unwrap_or(true)
    }

    fn insert(set: &Mutex<HashSet<OrderId>>, order: OrderId) -> bool {
        set.lock().map(|mut s| s.insert(order)).unwrap_or(false)
    }
}

#[async_trait]
impl OrderActions for PlannedActions {
    async fn can_hold(&self, order: OrderId) -> bool {
        !Self::contains(&self.cancelled, order) && !Self::contains(&self.held, order)
    }

    async fn hold(&self, order: OrderId) -> bool {
        debug!(order_id = %order, "hold planned");
        Self::insert(&self.held, order)
    }

    async fn can_cancel(&self, order: OrderId) -> bool {
        !Self::contains(&self.cancelled, order)
    }

    async fn cancel(&self, order: OrderId) -> bool {
        debug!(order_id = %order, "cancellation planned");
        Self::insert(&self.cancelled, order)
    }

    async fn update_shipping_address(
        &self,
        order: OrderId,
        address: &Address,
    ) -> Result<(), ActionError> {
        let mut addresses = self
            .addresses
            .lock()
            .map_err(|_| ActionError("address table lock poisoned".into()))?;
        addresses.insert(order, address.clone());
        Ok(())
    }
}
