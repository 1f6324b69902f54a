//! Batch outcome of order processing, for user-facing messaging.

use std::collections::BTreeMap;

use delivcheck_core::{OrderAnalysisStatus, OrderId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedOrder {
    pub order_id: OrderId,
    pub reason: String,
}

/// What happened to each order of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    pub held: Vec<OrderId>,
    pub cancelled: Vec<OrderId>,
    pub corrected: Vec<OrderId>,
    pub failed: Vec<FailedOrder>,
    /// Final status of every order whose status was written in this pass.
    pub statuses: BTreeMap<OrderId, OrderAnalysisStatus>,
    /// Set when the batch's verification call failed.
    pub gateway_error: Option<String>,
    /// Set when stored results could not be read; no order was touched.
    pub store_error: Option<String>,
}

impl ProcessReport {
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
            && self.cancelled.is_empty()
            && self.corrected.is_empty()
            && self.failed.is_empty()
            && self.statuses.is_empty()
            && self.gateway_error.is_none()
            && self.store_error.is_none()
    }

    pub fn fail(&mut self, order_id: OrderId, reason: impl Into<String>) {
        self.failed.push(FailedOrder {
            order_id,
            reason: reason.into(),
        });
    }

    pub fn status_of(&self, order_id: OrderId) -> Option<OrderAnalysisStatus> {
        self.statuses.get(&order_id).copied()
    }

    pub fn is_failed(&self, order_id: OrderId) -> bool {
        self.failed.iter().any(|f| f.order_id == order_id)
    }
}
