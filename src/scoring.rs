//! Heuristic match scoring for unlabeled payments
//!
//! The scorer is a pure function from (payment, account-holder directory) to
//! scored candidates. Cheap, explainable textual rules sit above a numeric
//! fallback so that textual+amount agreement is treated as near-certain while
//! ambiguous payments still get a best-effort guess a reviewer can quickly
//! accept or reject. Same inputs always produce the same outputs.

use bigdecimal::{BigDecimal, ToPrimitive};

use crate::types::{AccountHolder, MatchCandidate, PaymentRecord};

/// Confidence for a name match combined with a matching amount
const CONFIDENCE_NAME_AND_AMOUNT: u8 = 95;
/// Confidence for a name match with a differing amount
const CONFIDENCE_NAME_ONLY: u8 = 85;
/// Confidence for a unit-label match combined with a matching amount
const CONFIDENCE_UNIT_AND_AMOUNT: u8 = 90;
/// Confidence for an amount-only match with no textual signal
const CONFIDENCE_AMOUNT_ONLY: u8 = 75;
/// Base confidence of the closest-amount fallback before the distance penalty
const FALLBACK_BASE: f64 = 60.0;
/// Cap on the fallback distance penalty
const FALLBACK_MAX_PENALTY: f64 = 40.0;

/// Tuning knobs for the scorer
#[derive(Debug, Clone, PartialEq)]
pub struct ScorerConfig {
    /// How far a payment amount may differ from the expected charge and
    /// still count as a match (default $1)
    pub amount_tolerance: BigDecimal,
    /// Whether the literal `"unit {label}"`/`"unit{label}"` reference rule
    /// participates in scoring. The pattern is narrow and rarely present in
    /// real references; disable it when it only produces noise.
    pub unit_rule_enabled: bool,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: BigDecimal::from(1),
            unit_rule_enabled: true,
        }
    }
}

/// Deterministic, side-effect-free match scorer
///
/// Evaluates an ordered rule cascade per account holder, then reduces the
/// candidate set to the single highest-scoring holder. Ties are broken by
/// directory order: the first-seen holder wins.
#[derive(Debug, Clone, Default)]
pub struct MatchScorer {
    config: ScorerConfig,
}

impl MatchScorer {
    /// Create a scorer with default tuning
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scorer with custom tuning
    pub fn with_config(config: ScorerConfig) -> Self {
        Self { config }
    }

    /// Score every account holder against the payment and return the textual
    /// candidates, highest confidence first
    ///
    /// Only the per-holder textual rules contribute here; the amount-based
    /// fallbacks apply to the directory as a whole and live in [`best`].
    /// The sort is stable, so equally-scored holders keep directory order.
    ///
    /// [`best`]: MatchScorer::best
    pub fn rank(&self, payment: &PaymentRecord, holders: &[AccountHolder]) -> Vec<MatchCandidate> {
        let mut candidates: Vec<MatchCandidate> = holders
            .iter()
            .filter_map(|holder| self.textual_candidate(payment, holder))
            .collect();
        candidates.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        candidates
    }

    /// Produce the single best candidate for the payment
    ///
    /// Falls through the textual rules to the amount-only match and finally
    /// the closest-amount guess. An empty directory yields a zero-confidence
    /// candidate with no holder.
    pub fn best(&self, payment: &PaymentRecord, holders: &[AccountHolder]) -> MatchCandidate {
        if holders.is_empty() {
            return MatchCandidate::unmatched("no account holders in directory".to_string());
        }

        let ranked = self.rank(payment, holders);
        if let Some(top) = ranked.into_iter().next() {
            return top;
        }

        // Amount-only: no textual signal, but the amount lines up with the
        // first holder whose expected charge is within tolerance.
        if let Some(holder) = holders
            .iter()
            .find(|h| self.amount_matches(&payment.amount, &h.expected_amount))
        {
            return MatchCandidate::matched(
                holder.id.clone(),
                CONFIDENCE_AMOUNT_ONLY,
                format!(
                    "amount {} matches expected charge for {}",
                    payment.amount, holder.name
                ),
            );
        }

        self.closest_amount_fallback(payment, holders)
    }

    /// Per-holder textual rule cascade; first satisfied rule wins
    fn textual_candidate(
        &self,
        payment: &PaymentRecord,
        holder: &AccountHolder,
    ) -> Option<MatchCandidate> {
        let reference = payment.reference.to_lowercase();
        let description = payment.description.to_lowercase();
        let name = holder.name.trim().to_lowercase();

        // An empty holder name would substring-match everything; treat it as
        // non-matching, the same way empty payment text is non-matching.
        let name_found =
            !name.is_empty() && (reference.contains(&name) || description.contains(&name));
        let amount_close = self.amount_matches(&payment.amount, &holder.expected_amount);

        if name_found && amount_close {
            return Some(MatchCandidate::matched(
                holder.id.clone(),
                CONFIDENCE_NAME_AND_AMOUNT,
                format!(
                    "strong match: '{}' in payment text and amount matches expected charge",
                    holder.name
                ),
            ));
        }

        if name_found {
            return Some(MatchCandidate::matched(
                holder.id.clone(),
                CONFIDENCE_NAME_ONLY,
                format!(
                    "'{}' in payment text but amount differs from expected charge",
                    holder.name
                ),
            ));
        }

        if self.config.unit_rule_enabled
            && amount_close
            && self.unit_label_in_reference(&reference, holder)
        {
            return Some(MatchCandidate::matched(
                holder.id.clone(),
                CONFIDENCE_UNIT_AND_AMOUNT,
                format!(
                    "unit '{}' in reference and amount matches expected charge",
                    holder.unit
                ),
            ));
        }

        None
    }

    /// Literal `"unit {label}"` / `"unit{label}"` check against the reference
    fn unit_label_in_reference(&self, reference_lower: &str, holder: &AccountHolder) -> bool {
        let unit = holder.unit.trim().to_lowercase();
        if unit.is_empty() {
            return false;
        }
        reference_lower.contains(&format!("unit {unit}"))
            || reference_lower.contains(&format!("unit{unit}"))
    }

    fn amount_matches(&self, amount: &BigDecimal, expected: &BigDecimal) -> bool {
        (amount - expected).abs() <= self.config.amount_tolerance
    }

    /// Last resort: the holder whose expected charge is numerically closest,
    /// scored by distance. The penalty grows with the relative difference and
    /// is capped, so the result lands roughly in [20, 60].
    fn closest_amount_fallback(
        &self,
        payment: &PaymentRecord,
        holders: &[AccountHolder],
    ) -> MatchCandidate {
        // Strictly-less comparison keeps the first-seen holder on ties.
        let mut closest = &holders[0];
        let mut closest_diff = (&payment.amount - &closest.expected_amount).abs();
        for holder in &holders[1..] {
            let diff = (&payment.amount - &holder.expected_amount).abs();
            if diff < closest_diff {
                closest = holder;
                closest_diff = diff;
            }
        }

        let penalty = match (closest_diff.to_f64(), closest.expected_amount.to_f64()) {
            (Some(diff), Some(expected)) if expected > 0.0 => {
                (diff / expected * 100.0).min(FALLBACK_MAX_PENALTY)
            }
            _ => FALLBACK_MAX_PENALTY,
        };
        let confidence = (FALLBACK_BASE - penalty).round() as u8;

        MatchCandidate::matched(
            closest.id.clone(),
            confidence,
            format!(
                "no textual match; closest expected charge is {} for {}",
                closest.expected_amount, closest.name
            ),
        )
    }
}
