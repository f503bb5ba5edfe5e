//! # Reconciliation Core
//!
//! A payment reconciliation library that assigns unlabeled incoming payments
//! (bank transfers, checks, card charges with free-text references) to the
//! correct account holder with a calibrated confidence score, routing
//! low-confidence matches to a human-review queue.
//!
//! ## Features
//!
//! - **Match scoring**: deterministic, explainable rule cascade over names,
//!   unit labels, and amounts; every result ships with a reason
//! - **Threshold classification**: operator-selectable cutoff separating
//!   auto-reconciliation from flagging, separable from scoring
//! - **Reconciliation ledger**: three payment partitions plus an append-only
//!   audit trail of every classification decision
//! - **Batch processing**: cooperative cancellation, progress callbacks, and
//!   lost-update prevention for concurrent classification attempts
//! - **Manual override**: operator reassignment of flagged payments, recorded
//!   in the same shape as an automatic reconciliation
//!
//! ## Quick Start
//!
//! ```rust
//! use reconciliation_core::{AccountHolder, MatchScorer, PaymentChannel, PaymentRecord};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! let directory = vec![AccountHolder::new(
//!     "t1".to_string(),
//!     "John Smith".to_string(),
//!     "101".to_string(),
//!     BigDecimal::from(1200),
//! )];
//!
//! let payment = PaymentRecord::new(
//!     "pay-001".to_string(),
//!     "RT-1200".to_string(),
//!     "Transfer from John Smith".to_string(),
//!     BigDecimal::from(1200),
//!     NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
//!     PaymentChannel::BankTransfer,
//! );
//!
//! let best = MatchScorer::new().best(&payment, &directory);
//! assert_eq!(best.confidence, 95);
//! assert_eq!(best.holder_id.as_deref(), Some("t1"));
//! ```

pub mod engine;
pub mod ledger;
pub mod policy;
pub mod scoring;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use engine::*;
pub use ledger::*;
pub use policy::*;
pub use scoring::*;
pub use traits::*;
pub use types::*;
