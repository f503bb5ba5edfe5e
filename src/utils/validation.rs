//! Validation utilities for the intake boundary

use bigdecimal::BigDecimal;

use crate::types::{ReconcileError, ReconcileResult};

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> ReconcileResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(ReconcileError::Validation(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that a payment ID is valid
pub fn validate_payment_id(payment_id: &str) -> ReconcileResult<()> {
    if payment_id.trim().is_empty() {
        return Err(ReconcileError::Validation(
            "Payment ID cannot be empty".to_string(),
        ));
    }

    if payment_id.len() > 50 {
        return Err(ReconcileError::Validation(
            "Payment ID cannot exceed 50 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores)
    if !payment_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ReconcileError::Validation(
            "Payment ID can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate a free-text field (reference or description)
///
/// Empty text is valid: a payment with no reference simply has nothing to
/// match against, it is not malformed.
pub fn validate_free_text(text: &str, field: &str) -> ReconcileResult<()> {
    if text.len() > 500 {
        return Err(ReconcileError::Validation(format!(
            "Payment {field} cannot exceed 500 characters"
        )));
    }

    Ok(())
}
