//! Batch reconciliation walkthrough example

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use reconciliation_core::{
    utils::MemorySink, AccountHolder, EventSink, MatchThreshold, PaymentChannel, PaymentRecord,
    ReconciliationEngine,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("💳 Reconciliation Core - Batch Reconciliation Example\n");

    // 1. The account-holder directory snapshot for this run
    let directory = vec![
        AccountHolder::new(
            "t1".to_string(),
            "John Smith".to_string(),
            "101".to_string(),
            BigDecimal::from(1200),
        ),
        AccountHolder::new(
            "t2".to_string(),
            "Alice Wong".to_string(),
            "202".to_string(),
            BigDecimal::from(950),
        ),
    ];

    println!("📒 Account holder directory:");
    for holder in &directory {
        println!(
            "  ✓ {} - {} (unit {}, expects {})",
            holder.id, holder.name, holder.unit, holder.expected_amount
        );
    }
    println!();

    let sink = Arc::new(MemorySink::new());
    let sink_handle: Arc<dyn EventSink> = sink.clone();
    let engine = ReconciliationEngine::new(directory).with_event_sink(sink_handle);

    // 2. Submit a batch of unlabeled incoming payments
    println!("📥 Submitting incoming payments...");
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let intake = engine.submit_payments(vec![
        PaymentRecord::new(
            "pay-001".to_string(),
            "RENT-0601".to_string(),
            "Bank transfer from JOHN SMITH".to_string(),
            BigDecimal::from(1200),
            date,
            PaymentChannel::BankTransfer,
        ),
        PaymentRecord::new(
            "pay-002".to_string(),
            String::new(),
            "Check from Alice Wong".to_string(),
            BigDecimal::from(1000),
            date,
            PaymentChannel::Check,
        ),
        PaymentRecord::new(
            "pay-003".to_string(),
            "misc deposit".to_string(),
            String::new(),
            BigDecimal::from(600),
            date,
            PaymentChannel::Cash,
        ),
        // Zero amount: rejected at the boundary, the rest continue.
        PaymentRecord::new(
            "pay-004".to_string(),
            String::new(),
            String::new(),
            BigDecimal::from(0),
            date,
            PaymentChannel::Card,
        ),
    ]);

    for id in &intake.accepted {
        println!("  ✓ Accepted: {id}");
    }
    for rejected in &intake.rejected {
        println!("  ✗ Rejected: {} ({})", rejected.payment_id, rejected.reason);
    }
    println!();

    // 3. Run the batch at the medium threshold
    println!("⚙️  Running batch at threshold Medium (70)...\n");
    let report = engine.run_batch(MatchThreshold::Medium).await?;

    for outcome in &report.outcomes {
        println!(
            "  {} -> {:?} (confidence {}, holder {:?})",
            outcome.payment_id,
            outcome.result.status,
            outcome.result.confidence,
            outcome.result.holder_id
        );
        println!("      reason: {}", outcome.result.reason);
    }
    println!(
        "\n  Processed {}, reconciled {}, flagged {}\n",
        report.processed, report.reconciled, report.flagged
    );

    // 4. Review the flagged queue and manually reassign
    println!("👀 Review queue:");
    for tracked in engine.flagged_payments() {
        println!("  ? {} - {}", tracked.record.id, tracked.result.reason);
    }

    println!("\n✍️  Manually assigning pay-003 to t2...");
    let result = engine.manually_assign("pay-003", "t2").await?;
    println!(
        "  ✓ {:?} at confidence {} ({})",
        result.status, result.confidence, result.reason
    );
    println!();

    // 5. Final summary and audit trail
    let summary = engine.summary();
    println!("📊 Summary:");
    println!("  Pending:             {}", summary.pending);
    println!("  Reconciled:          {}", summary.reconciled);
    println!("  Flagged:             {}", summary.flagged);
    println!("  Reconciliation rate: {}%", summary.reconciliation_rate);
    println!();

    println!("🧾 Audit trail ({} events):", sink.events().len());
    for event in sink.events() {
        println!(
            "  {} {:?} -> {:?} via {:?} (confidence {})",
            event.payment_id, event.prior_status, event.new_status, event.source, event.confidence
        );
    }

    Ok(())
}
