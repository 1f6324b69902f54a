//! Order processing: turns analysis results into order statuses and actions.

use std::collections::HashMap;
use std::slice;
use std::sync::Arc;

use async_trait::async_trait;
use delivcheck_core::{
    ActionOrder, Address, AddressId, AnalysisResult, AnalysisTrigger, EngineConfig, Order,
    OrderAnalysisStatus, OrderId, Verdict,
};
use delivcheck_store::{StatusStore, StoreError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::analysis::{AnalysisError, DeliverabilityAnalysisService};
use crate::report::ProcessReport;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ActionError(pub String);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("status store failed: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// The order subsystem's side of the workflow.
///
/// Eligibility (`can_hold`, `can_cancel`) is owned by the order subsystem;
/// `hold` and `cancel` report whether the action actually took effect.
#[async_trait]
pub trait OrderActions: Send + Sync {
    async fn can_hold(&self, order: OrderId) -> bool;
    async fn hold(&self, order: OrderId) -> bool;
    async fn can_cancel(&self, order: OrderId) -> bool;
    async fn cancel(&self, order: OrderId) -> bool;
    async fn update_shipping_address(
        &self,
        order: OrderId,
        address: &Address,
    ) -> Result<(), ActionError>;
}

/// Drives orders through the analysis status machine.
pub struct OrderProcessingEngine {
    analysis: DeliverabilityAnalysisService,
    statuses: Arc<dyn StatusStore>,
    actions: Arc<dyn OrderActions>,
    config: EngineConfig,
}

impl OrderProcessingEngine {
    pub fn new(
        analysis: DeliverabilityAnalysisService,
        statuses: Arc<dyn StatusStore>,
        actions: Arc<dyn OrderActions>,
        config: EngineConfig,
    ) -> Self {
        Self {
            analysis,
            statuses,
            actions,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analysis(&self) -> &DeliverabilityAnalysisService {
        &self.analysis
    }

    /// Current status; no stored row means [`OrderAnalysisStatus::NotAnalysed`].
    pub async fn status(&self, order: OrderId) -> Result<OrderAnalysisStatus, EngineError> {
        Ok(self.statuses.load_status(order).await?.unwrap_or_default())
    }

    /// Orders waiting for the next sweep.
    pub async fn pending_orders(&self) -> Result<Vec<OrderId>, EngineError> {
        Ok(self
            .statuses
            .orders_with_status(OrderAnalysisStatus::Pending)
            .await?)
    }

    /// React to a newly placed order according to the configured trigger.
    ///
    /// Orders shipping outside the service's countries are left alone.
    pub async fn on_order_placed(&self, order: &Order) -> Result<OrderAnalysisStatus, EngineError> {
        if !order
            .shipping_address
            .is_domestic(&self.config.domestic_countries)
        {
            debug!(order_id = %order.id, "shipping address not covered, skipping analysis");
            return self.status(order.id).await;
        }

        match self.config.trigger {
            AnalysisTrigger::Manual => self.status(order.id).await,
            AnalysisTrigger::Cron => {
                self.statuses
                    .save_status(order.id, OrderAnalysisStatus::Pending)
                    .await?;
                info!(order_id = %order.id, "order queued for analysis");
                Ok(OrderAnalysisStatus::Pending)
            }
            AnalysisTrigger::OnPlacement => {
                let report = self.process_orders(slice::from_ref(order)).await;
                match report.status_of(order.id) {
                    Some(status) => Ok(status),
                    None => self.status(order.id).await,
                }
            }
        }
    }

    /// React to a manual edit of the shipping address.
    ///
    /// Concluded analyses become [`OrderAnalysisStatus::AddressCorrected`];
    /// pending or absent analyses are not preempted.
    pub async fn on_address_edited(&self, order: OrderId) -> Result<OrderAnalysisStatus, EngineError> {
        let current = self.status(order).await?;
        match current.after_address_edit() {
            Some(next) => {
                self.statuses.save_status(order, next).await?;
                info!(order_id = %order, from = %current, to = %next, "address edited");
                Ok(next)
            }
            None => Ok(current),
        }
    }

    /// Process the orders among `orders` that are currently pending.
    pub async fn sweep(&self, orders: &[Order]) -> ProcessReport {
        let mut pending = Vec::with_capacity(orders.len());
        let mut report = ProcessReport::default();
        for order in orders {
            match self.status(order.id).await {
                Ok(OrderAnalysisStatus::Pending) => pending.push(order.clone()),
                Ok(status) => {
                    debug!(order_id = %order.id, status = %status, "not pending, skipped by sweep");
                }
                Err(e) => {
                    error!(order_id = %order.id, error = %e, "failed to load order status");
                    report.fail(order.id, e.to_string());
                }
            }
        }

        if pending.is_empty() {
            return report;
        }
        info!(count = pending.len(), "sweeping pending orders");
        let mut processed = self.process_orders(&pending).await;
        processed.failed.extend(report.failed);
        processed
    }

    /// Analyse a batch of orders and run the configured actions.
    ///
    /// All addresses go through one analysis call. Orders without a result
    /// end as [`OrderAnalysisStatus::AnalysisFailed`]; everything else gets
    /// its verdict status, then hold/cancel and address correction as
    /// configured. Actions run only on the first conclusion of an order;
    /// orders already in a terminal status are left untouched. Failures are
    /// reported per order.
    pub async fn process_orders(&self, orders: &[Order]) -> ProcessReport {
        let mut report = ProcessReport::default();
        let mut eligible = Vec::with_capacity(orders.len());
        for order in orders {
            match self.status(order.id).await {
                Ok(status) if status.is_terminal() => {
                    debug!(order_id = %order.id, status = %status, "terminal status, not reprocessed");
                }
                Ok(status) => eligible.push((order, status)),
                Err(e) => {
                    error!(order_id = %order.id, error = %e, "failed to load order status");
                    report.fail(order.id, e.to_string());
                }
            }
        }
        if eligible.is_empty() {
            return report;
        }

        let addresses: Vec<_> = eligible
            .iter()
            .map(|(o, _)| o.shipping_address.clone())
            .collect();
        let results: HashMap<AddressId, AnalysisResult> =
            match self.analysis.analyse(&addresses).await {
                Ok(results) => results,
                Err(AnalysisError::Gateway { source, cached }) => {
                    error!(error = %source, known = cached.len(), "analysis batch failed");
                    report.gateway_error = Some(source.to_string());
                    cached
                }
                Err(e) => {
                    // Nothing was analysed; statuses stay as they are so the
                    // next pass retries these orders.
                    error!(error = %e, orders = eligible.len(), "result lookup failed");
                    let reason = e.to_string();
                    for (order, _) in &eligible {
                        report.fail(order.id, reason.clone());
                    }
                    report.store_error = Some(reason);
                    return report;
                }
            };

        for (order, previous) in &eligible {
            let result = results.get(&order.shipping_address.id);
            self.process_order(order, *previous, result, &mut report)
                .await;
        }

        info!(
            orders = eligible.len(),
            held = report.held.len(),
            cancelled = report.cancelled.len(),
            corrected = report.corrected.len(),
            failed = report.failed.len(),
            "order batch processed"
        );
        report
    }

    async fn process_order(
        &self,
        order: &Order,
        previous: OrderAnalysisStatus,
        result: Option<&AnalysisResult>,
        report: &mut ProcessReport,
    ) {
        let Some(result) = result else {
            warn!(order_id = %order.id, address_id = %order.shipping_address.id, "no analysis result");
            if self
                .transition(order.id, OrderAnalysisStatus::AnalysisFailed, report)
                .await
            {
                report.fail(order.id, "no analysis result");
            }
            return;
        };

        let verdict = result.verdict();
        if !self
            .transition(order.id, OrderAnalysisStatus::from_verdict(verdict), report)
            .await
        {
            return;
        }

        if previous.is_concluded() {
            debug!(order_id = %order.id, previous = %previous, "already concluded, actions not repeated");
            return;
        }

        let cancelled = self.apply_hold_and_cancel(order.id, verdict, report).await;
        if self.config.auto_update_address && !cancelled {
            self.correct_address(order, result, report).await;
        }
    }

    /// Returns whether the order was cancelled.
    async fn apply_hold_and_cancel(
        &self,
        order: OrderId,
        verdict: Verdict,
        report: &mut ProcessReport,
    ) -> bool {
        let hold = self.config.hold_non_deliverable;
        let cancel = self.config.auto_cancel;
        match self.config.action_order {
            ActionOrder::HoldThenCancel => {
                let held = hold && self.try_hold(order, verdict, report).await;
                !held && cancel && self.try_cancel(order, verdict, report).await
            }
            ActionOrder::CancelThenHold => {
                let cancelled = cancel && self.try_cancel(order, verdict, report).await;
                if !cancelled && hold {
                    self.try_hold(order, verdict, report).await;
                }
                cancelled
            }
        }
    }

    async fn try_hold(&self, order: OrderId, verdict: Verdict, report: &mut ProcessReport) -> bool {
        if verdict == Verdict::Deliverable || !self.actions.can_hold(order).await {
            return false;
        }
        if !self.actions.hold(order).await {
            warn!(order_id = %order, "hold rejected by order subsystem");
            return false;
        }
        info!(order_id = %order, verdict = %verdict, "order put on hold");
        report.held.push(order);
        true
    }

    async fn try_cancel(
        &self,
        order: OrderId,
        verdict: Verdict,
        report: &mut ProcessReport,
    ) -> bool {
        if verdict != Verdict::Undeliverable || !self.actions.can_cancel(order).await {
            return false;
        }
        if !self.actions.cancel(order).await {
            warn!(order_id = %order, "cancellation rejected by order subsystem");
            return false;
        }
        info!(order_id = %order, "undeliverable order cancelled");
        report.cancelled.push(order);
        true
    }

    async fn correct_address(
        &self,
        order: &Order,
        result: &AnalysisResult,
        report: &mut ProcessReport,
    ) {
        if !result.has_address() {
            debug!(order_id = %order.id, "result has no address to apply");
            return;
        }
        if !result.differs_from(&order.shipping_address) {
            debug!(order_id = %order.id, "shipping address already matches");
            return;
        }

        let corrected = result.apply_to(&order.shipping_address);
        match self
            .actions
            .update_shipping_address(order.id, &corrected)
            .await
        {
            Ok(()) => {
                info!(
                    order_id = %order.id,
                    street = %corrected.street_line(),
                    city = %corrected.city,
                    "shipping address corrected"
                );
                report.corrected.push(order.id);
                self.transition(order.id, OrderAnalysisStatus::AddressCorrected, report)
                    .await;
            }
            Err(e) => {
                error!(order_id = %order.id, error = %e, "failed to update shipping address");
                report.fail(order.id, format!("address update failed: {e}"));
            }
        }
    }

    /// Persist a status change. A failed write is reported against the order.
    async fn transition(
        &self,
        order: OrderId,
        status: OrderAnalysisStatus,
        report: &mut ProcessReport,
    ) -> bool {
        match self.statuses.save_status(order, status).await {
            Ok(()) => {
                info!(order_id = %order, status = %status, "order status updated");
                report.statuses.insert(order, status);
                true
            }
            Err(e) => {
                error!(order_id = %order, status = %status, error = %e, "failed to save order status");
                report.fail(order, format!("status update failed: {e}"));
                false
            }
        }
    }
}
