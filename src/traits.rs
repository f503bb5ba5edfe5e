//! Traits for boundary validation and collaborator seams

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use crate::engine::{BatchReport, PaymentOutcome};
use crate::types::*;
use crate::utils::validation;

/// Boundary validation for incoming payment records
///
/// Runs before a payment enters the ledger. Malformed payments are rejected
/// here and reported back to the caller; valid payments in the same batch
/// keep going.
pub trait PaymentValidator: Send + Sync {
    /// Validate a payment before submission
    fn validate_payment(&self, payment: &PaymentRecord) -> ReconcileResult<()>;
}

/// Observer for batch progress, intended for UI consumers
///
/// All callbacks default to no-ops so implementors only override what they
/// display. The engine awaits each callback between items; observers should
/// not block on long work.
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    /// Called after each payment has been classified and committed
    async fn payment_classified(&self, _outcome: &PaymentOutcome) {}

    /// Called once when a batch run finishes (including cancelled runs)
    async fn batch_completed(&self, _report: &BatchReport) {}
}

/// Destination for the classification event stream
///
/// The audit/export collaborator boundary: every committed transition is
/// published here in addition to the ledger's own event log. A failing sink
/// never aborts a transition; the ledger log remains the source of truth.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish one classification event
    async fn publish(&self, event: &ClassificationEvent) -> ReconcileResult<()>;
}

/// Default payment validator with the minimal boundary rules
pub struct DefaultPaymentValidator;

impl PaymentValidator for DefaultPaymentValidator {
    fn validate_payment(&self, payment: &PaymentRecord) -> ReconcileResult<()> {
        if payment.id.trim().is_empty() {
            return Err(ReconcileError::Validation(
                "Payment ID cannot be empty".to_string(),
            ));
        }

        if payment.amount <= BigDecimal::from(0) {
            return Err(ReconcileError::Validation(format!(
                "Payment amount must be positive, got {}",
                payment.amount
            )));
        }

        Ok(())
    }
}

/// Strict payment validator with additional field-level checks
pub struct StrictPaymentValidator;

impl PaymentValidator for StrictPaymentValidator {
    fn validate_payment(&self, payment: &PaymentRecord) -> ReconcileResult<()> {
        validation::validate_payment_id(&payment.id)?;
        validation::validate_positive_amount(&payment.amount)?;
        validation::validate_free_text(&payment.reference, "reference")?;
        validation::validate_free_text(&payment.description, "description")?;
        Ok(())
    }
}
