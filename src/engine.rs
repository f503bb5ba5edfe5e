//! Reconciliation engine orchestrating intake, batch runs, and overrides
//!
//! The engine wires the pure scorer and policy to the ledger's transition
//! operations. A batch run drives the pending partition through
//! score -> classify -> commit, one payment at a time, with cooperative
//! cancellation between items and optional progress callbacks for UI
//! consumers. There is no artificial pacing anywhere; the engine only
//! exposes a completion report and the callbacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ledger::{ReconciliationLedger, TrackedPayment};
use crate::policy::ClassificationPolicy;
use crate::scoring::MatchScorer;
use crate::traits::{DefaultPaymentValidator, EventSink, PaymentValidator, ProgressObserver};
use crate::types::*;

/// Outcome of classifying one payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// The classified payment
    pub payment_id: String,
    /// The result recorded against it
    pub result: MatchResult,
}

/// Aggregate report for one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Payments classified by this run
    pub processed: usize,
    /// Of those, how many reconciled automatically
    pub reconciled: usize,
    /// Of those, how many were flagged for review
    pub flagged: usize,
    /// Payments skipped because another actor classified them first
    pub skipped: usize,
    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
    /// Per-payment outcomes, in processing order
    pub outcomes: Vec<PaymentOutcome>,
}

/// A payment rejected at the intake boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedPayment {
    /// Identifier of the offending payment (may be empty if that was the problem)
    pub payment_id: String,
    /// Why it was rejected
    pub reason: String,
}

/// Report for one intake call: accepted ids plus per-item rejections
///
/// Malformed items never stop the rest of the batch and are never silently
/// dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeReport {
    /// Payments now sitting in the pending partition
    pub accepted: Vec<String>,
    /// Payments rejected at the boundary, with reasons
    pub rejected: Vec<RejectedPayment>,
}

/// Derived snapshot of ledger state for dashboards and operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub pending: usize,
    pub reconciled: usize,
    pub flagged: usize,
    pub total: usize,
    /// reconciled / total, as a rounded percent
    pub reconciliation_rate: u8,
}

/// Payment reconciliation engine
///
/// Owns the account-holder directory snapshot, the scorer configuration, and
/// the ledger. The directory is read-only for the engine's lifetime; the
/// ledger is the only mutable shared state.
pub struct ReconciliationEngine {
    directory: Vec<AccountHolder>,
    scorer: MatchScorer,
    ledger: ReconciliationLedger,
    validator: Box<dyn PaymentValidator>,
    observer: Option<Arc<dyn ProgressObserver>>,
    sink: Option<Arc<dyn EventSink>>,
    batch_in_flight: AtomicBool,
}

impl ReconciliationEngine {
    /// Create an engine over an account-holder directory snapshot
    ///
    /// Directory order is preserved; it defines candidate tie-breaking.
    pub fn new(directory: Vec<AccountHolder>) -> Self {
        Self {
            directory,
            scorer: MatchScorer::new(),
            ledger: ReconciliationLedger::new(),
            validator: Box::new(DefaultPaymentValidator),
            observer: None,
            sink: None,
            batch_in_flight: AtomicBool::new(false),
        }
    }

    /// Replace the default scorer with a tuned one
    pub fn with_scorer(mut self, scorer: MatchScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Replace the default intake validator
    pub fn with_validator(mut self, validator: Box<dyn PaymentValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Attach a progress observer for UI consumers
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Attach a sink receiving every classification event for audit/export
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The account-holder directory this engine matches against
    pub fn directory(&self) -> &[AccountHolder] {
        &self.directory
    }

    /// A handle to the underlying ledger, sharing the same state
    pub fn ledger(&self) -> ReconciliationLedger {
        self.ledger.clone()
    }

    /// Validate and submit a batch of payments into the pending partition
    ///
    /// Each payment is validated independently; an invalid or duplicate item
    /// is reported in the rejection list while the rest continue.
    pub fn submit_payments(&self, payments: Vec<PaymentRecord>) -> IntakeReport {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for payment in payments {
            if let Err(err) = self.validator.validate_payment(&payment) {
                rejected.push(RejectedPayment {
                    payment_id: payment.id,
                    reason: err.to_string(),
                });
                continue;
            }

            let id = payment.id.clone();
            match self.ledger.submit(payment) {
                Ok(()) => accepted.push(id),
                Err(err) => rejected.push(RejectedPayment {
                    payment_id: id,
                    reason: err.to_string(),
                }),
            }
        }

        if !rejected.is_empty() {
            warn!(
                rejected = rejected.len(),
                accepted = accepted.len(),
                "some payments were rejected at intake"
            );
        }

        IntakeReport { accepted, rejected }
    }

    /// Run a batch over the current pending partition at the given threshold
    pub async fn run_batch(&self, threshold: MatchThreshold) -> ReconcileResult<BatchReport> {
        self.run_batch_with(threshold, &CancellationToken::new())
            .await
    }

    /// Run a batch with cooperative cancellation
    ///
    /// Cancellation is checked between items: the in-flight payment finishes
    /// and no new one starts. Transitions already committed are final and are
    /// never rolled back. A second run while one is in flight is rejected
    /// with [`ReconcileError::BatchInProgress`].
    pub async fn run_batch_with(
        &self,
        threshold: MatchThreshold,
        cancel: &CancellationToken,
    ) -> ReconcileResult<BatchReport> {
        let _guard = BatchGuard::acquire(&self.batch_in_flight)?;

        let policy = ClassificationPolicy::new(threshold);
        let pending = self.ledger.pending_ids();

        let mut report = BatchReport {
            processed: 0,
            reconciled: 0,
            flagged: 0,
            skipped: 0,
            cancelled: false,
            outcomes: Vec::new(),
        };

        for payment_id in pending {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let Some(tracked) = self.ledger.payment(&payment_id) else {
                report.skipped += 1;
                continue;
            };
            if tracked.result.status != PaymentStatus::Pending {
                report.skipped += 1;
                continue;
            }

            let candidate = self.scorer.best(&tracked.record, &self.directory);
            let result = policy.decide(&candidate);

            match self.ledger.apply_automatic_result(&payment_id, result.clone()) {
                Ok(event) => {
                    self.publish_event(&event).await;

                    match event.new_status {
                        PaymentStatus::Reconciled => report.reconciled += 1,
                        PaymentStatus::Flagged => report.flagged += 1,
                        PaymentStatus::Pending => {}
                    }
                    report.processed += 1;

                    let outcome = PaymentOutcome {
                        payment_id: payment_id.clone(),
                        result,
                    };
                    if let Some(observer) = &self.observer {
                        observer.payment_classified(&outcome).await;
                    }
                    report.outcomes.push(outcome);
                }
                // Another actor classified this payment between our snapshot
                // and the transition; their outcome stands.
                Err(ReconcileError::InvalidTransition { .. }) => report.skipped += 1,
                Err(err) => return Err(err),
            }
        }

        info!(
            processed = report.processed,
            reconciled = report.reconciled,
            flagged = report.flagged,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "batch run completed"
        );

        if let Some(observer) = &self.observer {
            observer.batch_completed(&report).await;
        }

        Ok(report)
    }

    /// Reassign a flagged payment to a specific account holder
    ///
    /// Produces a ledger transition of the same shape as an automatic
    /// reconciliation: confidence 100, reason "manually assigned".
    pub async fn manually_assign(
        &self,
        payment_id: &str,
        holder_id: &str,
    ) -> ReconcileResult<MatchResult> {
        if !self.directory.iter().any(|h| h.id == holder_id) {
            return Err(ReconcileError::UnknownAccountHolder(holder_id.to_string()));
        }

        let event = self.ledger.apply_manual_override(payment_id, holder_id)?;
        self.publish_event(&event).await;

        let result = self
            .ledger
            .payment(payment_id)
            .map(|t| t.result)
            .ok_or_else(|| ReconcileError::PaymentNotFound(payment_id.to_string()))?;

        if let Some(observer) = &self.observer {
            observer
                .payment_classified(&PaymentOutcome {
                    payment_id: payment_id.to_string(),
                    result: result.clone(),
                })
                .await;
        }

        Ok(result)
    }

    /// Derived aggregate counters; computed from the ledger, never stored
    pub fn summary(&self) -> ReconciliationSummary {
        let counts = self.ledger.counts();
        ReconciliationSummary {
            pending: counts.pending,
            reconciled: counts.reconciled,
            flagged: counts.flagged,
            total: counts.total(),
            reconciliation_rate: self.ledger.reconciliation_rate(),
        }
    }

    /// Classification event stream for audit/export collaborators
    pub fn events(&self) -> Vec<ClassificationEvent> {
        self.ledger.events()
    }

    /// The review queue, in transition order
    pub fn flagged_payments(&self) -> Vec<TrackedPayment> {
        self.ledger.flagged_payments()
    }

    /// Reconciled payments, in transition order
    pub fn reconciled_payments(&self) -> Vec<TrackedPayment> {
        self.ledger.reconciled_payments()
    }

    /// Payments still awaiting classification, in submission order
    pub fn pending_payments(&self) -> Vec<TrackedPayment> {
        self.ledger.pending_payments()
    }

    /// Publish an event to the sink, if one is attached
    ///
    /// The ledger's own log is the source of truth; a failing sink is logged
    /// and never aborts the transition that produced the event.
    async fn publish_event(&self, event: &ClassificationEvent) {
        if let Some(sink) = &self.sink {
            if let Err(err) = sink.publish(event).await {
                warn!(payment_id = %event.payment_id, error = %err, "event sink publish failed");
            }
        }
    }
}

/// Scope guard rejecting overlapping batch runs
struct BatchGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BatchGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> ReconcileResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ReconcileError::BatchInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
