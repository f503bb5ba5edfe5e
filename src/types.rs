//! Core types and data structures for the reconciliation engine

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment channels a record can arrive through
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentChannel {
    /// Card charge
    Card,
    /// Bank transfer (wire, ACH, SEPA, ...)
    BankTransfer,
    /// Paper check
    Check,
    /// Cash deposit
    Cash,
}

/// One inbound, unlabeled payment awaiting assignment to an account holder
///
/// Immutable once ingested: classification produces a [`MatchResult`] held
/// alongside the record, never a mutation of these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Unique identifier for the payment
    pub id: String,
    /// Free-text reference supplied by the payment rail
    pub reference: String,
    /// Free-text description (statement line, memo, ...)
    pub description: String,
    /// Payment amount, non-negative
    pub amount: BigDecimal,
    /// Date the payment was received
    pub date: NaiveDate,
    /// Channel the payment arrived through
    pub channel: PaymentChannel,
}

impl PaymentRecord {
    /// Create a new payment record
    pub fn new(
        id: String,
        reference: String,
        description: String,
        amount: BigDecimal,
        date: NaiveDate,
        channel: PaymentChannel,
    ) -> Self {
        Self {
            id,
            reference,
            description,
            amount,
            date,
            channel,
        }
    }
}

/// Directory entry a payment should be matched to
///
/// Supplied as a read-only snapshot per batch run. Directory order is
/// significant: it defines tie-breaking between equally-scored candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountHolder {
    /// Unique identifier for the account holder
    pub id: String,
    /// Display name, matched as a case-insensitive substring
    pub name: String,
    /// Unit/location label (e.g. "101")
    pub unit: String,
    /// Expected recurring charge amount
    pub expected_amount: BigDecimal,
}

impl AccountHolder {
    /// Create a new account holder entry
    pub fn new(id: String, name: String, unit: String, expected_amount: BigDecimal) -> Self {
        Self {
            id,
            name,
            unit,
            expected_amount,
        }
    }
}

/// Classification state of a payment
///
/// `Pending` is the initial state. `Reconciled` is terminal. `Flagged` is
/// terminal unless a manual override moves it to `Reconciled`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Awaiting classification
    Pending,
    /// Assigned to an account holder with acceptable confidence
    Reconciled,
    /// Best candidate fell below the active threshold; needs human review
    Flagged,
}

/// Origin of a classification decision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationSource {
    /// Produced by the scorer + policy pipeline
    Automatic,
    /// Operator-initiated reassignment
    Manual,
}

/// A scored candidate match produced by the scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Matched account holder, if any rule applied
    pub holder_id: Option<String>,
    /// Confidence in [0, 100]
    pub confidence: u8,
    /// Human-readable justification; advisory only, never used for logic
    pub reason: String,
}

impl MatchCandidate {
    /// Candidate pointing at a specific account holder
    pub fn matched(holder_id: String, confidence: u8, reason: String) -> Self {
        Self {
            holder_id: Some(holder_id),
            confidence,
            reason,
        }
    }

    /// Zero-confidence candidate with no account holder
    pub fn unmatched(reason: String) -> Self {
        Self {
            holder_id: None,
            confidence: 0,
            reason,
        }
    }
}

/// Classification outcome carried with a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Current classification state
    pub status: PaymentStatus,
    /// Confidence in [0, 100]
    pub confidence: u8,
    /// Assigned account holder, empty when no candidate cleared any rule
    pub holder_id: Option<String>,
    /// Human-readable justification shipped with every result
    pub reason: String,
}

impl MatchResult {
    /// Placeholder result for a payment that has not been classified yet
    pub fn pending() -> Self {
        Self {
            status: PaymentStatus::Pending,
            confidence: 0,
            holder_id: None,
            reason: "awaiting classification".to_string(),
        }
    }
}

/// Append-only audit record of one classification decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEvent {
    /// Unique event identifier
    pub id: Uuid,
    /// Payment the decision applies to
    pub payment_id: String,
    /// Status before the transition
    pub prior_status: PaymentStatus,
    /// Status after the transition
    pub new_status: PaymentStatus,
    /// Confidence recorded with the decision
    pub confidence: u8,
    /// Automatic or manual origin
    pub source: ClassificationSource,
    /// When the decision was recorded (UTC)
    pub timestamp: NaiveDateTime,
}

impl ClassificationEvent {
    /// Create a new event with a fresh identifier and the current timestamp
    pub fn new(
        payment_id: String,
        prior_status: PaymentStatus,
        new_status: PaymentStatus,
        confidence: u8,
        source: ClassificationSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            payment_id,
            prior_status,
            new_status,
            confidence,
            source,
            timestamp: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Confidence cutoff separating automatic reconciliation from flagging
///
/// Operator-selectable per batch run, not per payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchThreshold {
    /// Reconcile at confidence 90 or above
    High,
    /// Reconcile at confidence 70 or above
    Medium,
    /// Reconcile at confidence 50 or above
    Low,
}

impl MatchThreshold {
    /// The confidence cutoff this threshold applies
    pub fn cutoff(&self) -> u8 {
        match self {
            MatchThreshold::High => 90,
            MatchThreshold::Medium => 70,
            MatchThreshold::Low => 50,
        }
    }
}

/// Errors that can occur in the reconciliation engine
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Duplicate payment: {0}")]
    DuplicatePayment(String),
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),
    #[error("Unknown account holder: {0}")]
    UnknownAccountHolder(String),
    #[error("Invalid transition for payment '{payment_id}': {from:?} -> {attempted:?}")]
    InvalidTransition {
        payment_id: String,
        from: PaymentStatus,
        attempted: PaymentStatus,
    },
    #[error("A batch run is already in flight")]
    BatchInProgress,
    #[error("Event sink error: {0}")]
    EventSink(String),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
