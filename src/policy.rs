//! Threshold-based classification of scored candidates
//!
//! The policy is deliberately a single comparison: all matching nuance lives
//! in the scorer. Keeping the two separate means changing the threshold only
//! re-classifies already-computed confidences, never re-scores.

use crate::types::{MatchCandidate, MatchResult, MatchThreshold, PaymentStatus};

/// Applies a confidence threshold to the scorer's top candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationPolicy {
    threshold: MatchThreshold,
}

impl ClassificationPolicy {
    /// Create a policy for the given threshold
    pub fn new(threshold: MatchThreshold) -> Self {
        Self { threshold }
    }

    /// The threshold this policy applies
    pub fn threshold(&self) -> &MatchThreshold {
        &self.threshold
    }

    /// Classify a candidate: at or above the cutoff reconciles, below flags
    pub fn classify(&self, candidate: &MatchCandidate) -> PaymentStatus {
        if candidate.confidence >= self.threshold.cutoff() {
            PaymentStatus::Reconciled
        } else {
            PaymentStatus::Flagged
        }
    }

    /// Turn a candidate into the result to record against the payment
    pub fn decide(&self, candidate: &MatchCandidate) -> MatchResult {
        MatchResult {
            status: self.classify(candidate),
            confidence: candidate.confidence,
            holder_id: candidate.holder_id.clone(),
            reason: candidate.reason.clone(),
        }
    }
}
