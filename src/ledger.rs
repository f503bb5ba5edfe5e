//! Reconciliation ledger: partitioned payment state and the audit trail
//!
//! The ledger is the single mutable shared resource in the engine. It owns
//! the three payment partitions (pending, reconciled, flagged) and the
//! append-only log of classification decisions, and exposes them only
//! through the transition operations below. Every transition appends exactly
//! one event, under one write lock, so two concurrent classification
//! attempts for the same payment cannot both succeed.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::*;

/// A payment together with its current classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedPayment {
    /// The immutable payment record as submitted
    pub record: PaymentRecord,
    /// Current classification; a pending payment carries a placeholder
    pub result: MatchResult,
}

/// Sizes of the three ledger partitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerCounts {
    pub pending: usize,
    pub reconciled: usize,
    pub flagged: usize,
}

impl LedgerCounts {
    /// Total payments ever submitted
    pub fn total(&self) -> usize {
        self.pending + self.reconciled + self.flagged
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    payments: HashMap<String, TrackedPayment>,
    // Partition membership, in submission/transition order. Every payment id
    // lives in exactly one of these at any time.
    pending_order: Vec<String>,
    reconciled_order: Vec<String>,
    flagged_order: Vec<String>,
    events: Vec<ClassificationEvent>,
}

/// Clone-shareable ledger with interior synchronization
///
/// Cloning shares the underlying state, so a batch processor and an operator
/// performing manual overrides can hold the same ledger concurrently.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl ReconciliationLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a payment in `Pending` state
    ///
    /// A duplicate identifier in any partition is a caller error and is
    /// surfaced, not swallowed.
    pub fn submit(&self, record: PaymentRecord) -> ReconcileResult<()> {
        let mut state = self.state.write().unwrap();

        if state.payments.contains_key(&record.id) {
            return Err(ReconcileError::DuplicatePayment(record.id));
        }

        debug!(payment_id = %record.id, "payment submitted");
        state.pending_order.push(record.id.clone());
        state.payments.insert(
            record.id.clone(),
            TrackedPayment {
                record,
                result: MatchResult::pending(),
            },
        );
        Ok(())
    }

    /// Record an automatic classification for a pending payment
    ///
    /// Valid only from `Pending`; the result's status must be `Reconciled`
    /// or `Flagged`. The partition move and the event append happen under
    /// one write lock, so a second classification attempt for the same
    /// payment fails cleanly instead of overwriting the first outcome.
    pub fn apply_automatic_result(
        &self,
        payment_id: &str,
        result: MatchResult,
    ) -> ReconcileResult<ClassificationEvent> {
        if result.status == PaymentStatus::Pending {
            return Err(ReconcileError::Validation(
                "automatic classification must resolve to Reconciled or Flagged".to_string(),
            ));
        }

        let mut state = self.state.write().unwrap();

        let tracked = state
            .payments
            .get(payment_id)
            .ok_or_else(|| ReconcileError::PaymentNotFound(payment_id.to_string()))?;
        if tracked.result.status != PaymentStatus::Pending {
            return Err(ReconcileError::InvalidTransition {
                payment_id: payment_id.to_string(),
                from: tracked.result.status.clone(),
                attempted: result.status,
            });
        }

        let event = ClassificationEvent::new(
            payment_id.to_string(),
            PaymentStatus::Pending,
            result.status.clone(),
            result.confidence,
            ClassificationSource::Automatic,
        );

        debug!(
            payment_id,
            confidence = result.confidence,
            status = ?result.status,
            "automatic classification applied"
        );

        state.pending_order.retain(|id| id != payment_id);
        match result.status {
            PaymentStatus::Reconciled => state.reconciled_order.push(payment_id.to_string()),
            PaymentStatus::Flagged => state.flagged_order.push(payment_id.to_string()),
            PaymentStatus::Pending => unreachable!("rejected above"),
        }
        if let Some(tracked) = state.payments.get_mut(payment_id) {
            tracked.result = result;
        }
        state.events.push(event.clone());

        Ok(event)
    }

    /// Reassign a flagged payment to a specific account holder
    ///
    /// The only path out of `Flagged`. Always records confidence 100 with a
    /// manual source, making the resulting transition the same shape as an
    /// automatic reconciliation. Irreversible and terminal.
    pub fn apply_manual_override(
        &self,
        payment_id: &str,
        holder_id: &str,
    ) -> ReconcileResult<ClassificationEvent> {
        let mut state = self.state.write().unwrap();

        let tracked = state
            .payments
            .get(payment_id)
            .ok_or_else(|| ReconcileError::PaymentNotFound(payment_id.to_string()))?;
        if tracked.result.status != PaymentStatus::Flagged {
            return Err(ReconcileError::InvalidTransition {
                payment_id: payment_id.to_string(),
                from: tracked.result.status.clone(),
                attempted: PaymentStatus::Reconciled,
            });
        }

        let event = ClassificationEvent::new(
            payment_id.to_string(),
            PaymentStatus::Flagged,
            PaymentStatus::Reconciled,
            100,
            ClassificationSource::Manual,
        );

        debug!(payment_id, holder_id, "manual override applied");

        state.flagged_order.retain(|id| id != payment_id);
        state.reconciled_order.push(payment_id.to_string());
        if let Some(tracked) = state.payments.get_mut(payment_id) {
            tracked.result = MatchResult {
                status: PaymentStatus::Reconciled,
                confidence: 100,
                holder_id: Some(holder_id.to_string()),
                reason: "manually assigned".to_string(),
            };
        }
        state.events.push(event.clone());

        Ok(event)
    }

    /// Look up a payment by id
    pub fn payment(&self, payment_id: &str) -> Option<TrackedPayment> {
        self.state
            .read()
            .unwrap()
            .payments
            .get(payment_id)
            .cloned()
    }

    /// Identifiers of the pending partition, in submission order
    pub fn pending_ids(&self) -> Vec<String> {
        self.state.read().unwrap().pending_order.clone()
    }

    /// Pending payments in submission order
    pub fn pending_payments(&self) -> Vec<TrackedPayment> {
        let state = self.state.read().unwrap();
        Self::collect(&state, &state.pending_order)
    }

    /// Reconciled payments in transition order
    pub fn reconciled_payments(&self) -> Vec<TrackedPayment> {
        let state = self.state.read().unwrap();
        Self::collect(&state, &state.reconciled_order)
    }

    /// Flagged payments in transition order
    pub fn flagged_payments(&self) -> Vec<TrackedPayment> {
        let state = self.state.read().unwrap();
        Self::collect(&state, &state.flagged_order)
    }

    fn collect(state: &LedgerState, order: &[String]) -> Vec<TrackedPayment> {
        order
            .iter()
            .filter_map(|id| state.payments.get(id).cloned())
            .collect()
    }

    /// Snapshot of the classification event log, oldest first
    pub fn events(&self) -> Vec<ClassificationEvent> {
        self.state.read().unwrap().events.clone()
    }

    /// Current partition sizes
    pub fn counts(&self) -> LedgerCounts {
        let state = self.state.read().unwrap();
        LedgerCounts {
            pending: state.pending_order.len(),
            reconciled: state.reconciled_order.len(),
            flagged: state.flagged_order.len(),
        }
    }

    /// Reconciled share of everything ever submitted, as a rounded percent
    pub fn reconciliation_rate(&self) -> u8 {
        let counts = self.counts();
        let total = counts.total();
        if total == 0 {
            return 0;
        }
        (counts.reconciled as f64 / total as f64 * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn payment(id: &str) -> PaymentRecord {
        PaymentRecord::new(
            id.to_string(),
            format!("ref-{id}"),
            String::new(),
            BigDecimal::from(1200),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            PaymentChannel::Check,
        )
    }

    fn reconciled_result(confidence: u8) -> MatchResult {
        MatchResult {
            status: PaymentStatus::Reconciled,
            confidence,
            holder_id: Some("t1".to_string()),
            reason: "test".to_string(),
        }
    }

    fn flagged_result(confidence: u8) -> MatchResult {
        MatchResult {
            status: PaymentStatus::Flagged,
            confidence,
            holder_id: Some("t1".to_string()),
            reason: "test".to_string(),
        }
    }

    #[test]
    fn submit_places_payment_in_pending() {
        let ledger = ReconciliationLedger::new();
        ledger.submit(payment("p1")).unwrap();

        let counts = ledger.counts();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.reconciled, 0);
        assert_eq!(counts.flagged, 0);
        assert_eq!(
            ledger.payment("p1").unwrap().result.status,
            PaymentStatus::Pending
        );
        // Submission is not a classification; the audit trail stays empty.
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn duplicate_submission_is_rejected() {
        let ledger = ReconciliationLedger::new();
        ledger.submit(payment("p1")).unwrap();

        let err = ledger.submit(payment("p1")).unwrap_err();
        assert!(matches!(err, ReconcileError::DuplicatePayment(id) if id == "p1"));
        assert_eq!(ledger.counts().total(), 1);
    }

    #[test]
    fn automatic_result_moves_payment_and_appends_one_event() {
        let ledger = ReconciliationLedger::new();
        ledger.submit(payment("p1")).unwrap();

        let event = ledger
            .apply_automatic_result("p1", reconciled_result(95))
            .unwrap();

        assert_eq!(event.prior_status, PaymentStatus::Pending);
        assert_eq!(event.new_status, PaymentStatus::Reconciled);
        assert_eq!(event.confidence, 95);
        assert_eq!(event.source, ClassificationSource::Automatic);

        let counts = ledger.counts();
        assert_eq!(counts.pending, 0);
        assert_eq!(counts.reconciled, 1);
        assert_eq!(ledger.events().len(), 1);
    }

    #[test]
    fn automatic_result_must_not_target_pending() {
        let ledger = ReconciliationLedger::new();
        ledger.submit(payment("p1")).unwrap();

        let mut result = reconciled_result(95);
        result.status = PaymentStatus::Pending;
        let err = ledger.apply_automatic_result("p1", result).unwrap_err();
        assert!(matches!(err, ReconcileError::Validation(_)));
        assert_eq!(ledger.counts().pending, 1);
    }

    #[test]
    fn reclassifying_a_reconciled_payment_fails_cleanly() {
        let ledger = ReconciliationLedger::new();
        ledger.submit(payment("p1")).unwrap();
        ledger
            .apply_automatic_result("p1", reconciled_result(95))
            .unwrap();

        // Second attempt must fail without overwriting the first outcome.
        let err = ledger
            .apply_automatic_result("p1", flagged_result(40))
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::InvalidTransition {
                from: PaymentStatus::Reconciled,
                ..
            }
        ));
        assert_eq!(
            ledger.payment("p1").unwrap().result.confidence,
            95,
            "first outcome must survive"
        );
        assert_eq!(ledger.events().len(), 1);
    }

    #[test]
    fn unknown_payment_is_reported() {
        let ledger = ReconciliationLedger::new();
        let err = ledger
            .apply_automatic_result("missing", reconciled_result(95))
            .unwrap_err();
        assert!(matches!(err, ReconcileError::PaymentNotFound(_)));
    }

    #[test]
    fn manual_override_reassigns_a_flagged_payment() {
        let ledger = ReconciliationLedger::new();
        ledger.submit(payment("p1")).unwrap();
        ledger
            .apply_automatic_result("p1", flagged_result(56))
            .unwrap();

        let before = ledger.counts();
        let event = ledger.apply_manual_override("p1", "t2").unwrap();
        let after = ledger.counts();

        assert_eq!(event.source, ClassificationSource::Manual);
        assert_eq!(event.confidence, 100);
        assert_eq!(after.flagged, before.flagged - 1);
        assert_eq!(after.reconciled, before.reconciled + 1);

        let tracked = ledger.payment("p1").unwrap();
        assert_eq!(tracked.result.status, PaymentStatus::Reconciled);
        assert_eq!(tracked.result.confidence, 100);
        assert_eq!(tracked.result.holder_id.as_deref(), Some("t2"));
        assert_eq!(tracked.result.reason, "manually assigned");
    }

    #[test]
    fn manual_override_is_only_valid_from_flagged() {
        let ledger = ReconciliationLedger::new();
        ledger.submit(payment("p1")).unwrap();

        // From pending.
        let err = ledger.apply_manual_override("p1", "t1").unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::InvalidTransition {
                from: PaymentStatus::Pending,
                ..
            }
        ));
        assert_eq!(ledger.counts().pending, 1);

        // From reconciled.
        ledger
            .apply_automatic_result("p1", reconciled_result(95))
            .unwrap();
        let err = ledger.apply_manual_override("p1", "t1").unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::InvalidTransition {
                from: PaymentStatus::Reconciled,
                ..
            }
        ));
        assert_eq!(ledger.events().len(), 1, "failed override appends nothing");
    }

    #[test]
    fn partitions_always_sum_to_total_submitted() {
        let ledger = ReconciliationLedger::new();
        for i in 0..6 {
            ledger.submit(payment(&format!("p{i}"))).unwrap();
        }
        ledger
            .apply_automatic_result("p0", reconciled_result(95))
            .unwrap();
        ledger
            .apply_automatic_result("p1", flagged_result(40))
            .unwrap();
        ledger
            .apply_automatic_result("p2", flagged_result(56))
            .unwrap();
        ledger.apply_manual_override("p1", "t1").unwrap();

        let counts = ledger.counts();
        assert_eq!(counts.total(), 6);
        assert_eq!(counts.pending, 3);
        assert_eq!(counts.reconciled, 2);
        assert_eq!(counts.flagged, 1);

        // Every id appears in exactly one partition.
        let mut seen: Vec<String> = Vec::new();
        for tracked in ledger
            .pending_payments()
            .into_iter()
            .chain(ledger.reconciled_payments())
            .chain(ledger.flagged_payments())
        {
            assert!(!seen.contains(&tracked.record.id));
            seen.push(tracked.record.id);
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn pending_snapshot_preserves_submission_order() {
        let ledger = ReconciliationLedger::new();
        for id in ["b", "a", "c"] {
            ledger.submit(payment(id)).unwrap();
        }
        assert_eq!(ledger.pending_ids(), vec!["b", "a", "c"]);
    }

    #[test]
    fn reconciliation_rate_is_rounded() {
        let ledger = ReconciliationLedger::new();
        assert_eq!(ledger.reconciliation_rate(), 0);

        for i in 0..3 {
            ledger.submit(payment(&format!("p{i}"))).unwrap();
        }
        ledger
            .apply_automatic_result("p0", reconciled_result(95))
            .unwrap();
        ledger
            .apply_automatic_result("p1", flagged_result(40))
            .unwrap();
        ledger
            .apply_automatic_result("p2", flagged_result(40))
            .unwrap();

        // 1 of 3 -> 33.33 -> 33.
        assert_eq!(ledger.reconciliation_rate(), 33);

        ledger.apply_manual_override("p1", "t1").unwrap();
        // 2 of 3 -> 66.67 -> 67.
        assert_eq!(ledger.reconciliation_rate(), 67);
    }

    #[test]
    fn event_log_records_every_transition_in_order() {
        let ledger = ReconciliationLedger::new();
        ledger.submit(payment("p1")).unwrap();
        ledger.submit(payment("p2")).unwrap();
        ledger
            .apply_automatic_result("p1", flagged_result(40))
            .unwrap();
        ledger
            .apply_automatic_result("p2", reconciled_result(95))
            .unwrap();
        ledger.apply_manual_override("p1", "t1").unwrap();

        let events = ledger.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].payment_id, "p1");
        assert_eq!(events[0].source, ClassificationSource::Automatic);
        assert_eq!(events[1].payment_id, "p2");
        assert_eq!(events[2].payment_id, "p1");
        assert_eq!(events[2].source, ClassificationSource::Manual);
        assert_eq!(events[2].prior_status, PaymentStatus::Flagged);
        assert_eq!(events[2].new_status, PaymentStatus::Reconciled);
    }
}
