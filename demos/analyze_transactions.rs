//! Money-muling analysis example
//!
//! This example feeds a small batch containing a circular routing ring,
//! a fan-in smurfing cluster and a shell chain through the analyzer and
//! prints the resulting forensic report.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_mule_detector::{MuleNetworkAnalyzer, Transaction, TransactionGraph};

fn ts(datetime: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d %H:%M:%S")
        .expect("fixture timestamp")
        .and_utc()
}

fn txn(id: &str, from: &str, to: &str, amount: f64, datetime: &str) -> Transaction {
    Transaction {
        transaction_id: id.to_string(),
        from_account: from.to_string(),
        to_account: to.to_string(),
        amount,
        timestamp: ts(datetime),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== Money-Muling Network Analyzer ===\n");

    let mut transactions = vec![
        // Circular routing: funds travel A -> B -> C and back to A.
        txn("TXN-0001", "ACCT-ALPHA", "ACCT-BRAVO", 9500.0, "2024-04-01 09:00:00"),
        txn("TXN-0002", "ACCT-BRAVO", "ACCT-CHARLIE", 9400.0, "2024-04-01 14:00:00"),
        txn("TXN-0003", "ACCT-CHARLIE", "ACCT-ALPHA", 9300.0, "2024-04-01 18:30:00"),
        // Shell chain: rapid pass-through over three quiet intermediaries.
        txn("TXN-0004", "ACCT-SOURCE", "SHELL-ONE", 4800.0, "2024-04-02 10:00:00"),
        txn("TXN-0005", "SHELL-ONE", "SHELL-TWO", 4700.0, "2024-04-02 10:40:00"),
        txn("TXN-0006", "SHELL-TWO", "SHELL-THREE", 4600.0, "2024-04-02 11:15:00"),
        txn("TXN-0007", "SHELL-THREE", "ACCT-EXIT", 4500.0, "2024-04-02 11:45:00"),
    ];
    // Fan-in smurfing: ten distinct senders converge on one aggregator
    // inside two days.
    for i in 0..10 {
        transactions.push(txn(
            &format!("TXN-01{:02}", i),
            &format!("MULE-{:02}", i + 1),
            "ACCT-COLLECTOR",
            950.0,
            &format!("2024-04-03 {:02}:15:00", i * 2),
        ));
    }

    let graph = TransactionGraph::from_transactions(&transactions);
    let stats = graph.get_stats();
    println!(
        "Input: {} transactions, {} accounts, {} edges, total volume {:.2}\n",
        stats.total_transactions, stats.node_count, stats.edge_count, stats.total_amount
    );

    let analyzer = MuleNetworkAnalyzer::new();
    let report = analyzer
        .analyze_with_progress(&transactions, |stage, percent| {
            println!("  [{:>3}%] {}", percent, stage);
        })
        .expect("analysis");

    println!("\n--- Fraud Rings ---");
    for ring in &report.fraud_rings {
        println!(
            "{}: {} (risk {:.1}) members: {}",
            ring.ring_id,
            ring.pattern_type,
            ring.risk_score,
            ring.member_accounts.join(", ")
        );
    }

    println!("\n--- Suspicious Accounts ---");
    for account in &report.suspicious_accounts {
        println!(
            "{:<16} score {:>5.1}  patterns: {}",
            account.account_id,
            account.suspicion_score,
            account
                .detected_patterns
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    println!("\n--- Report JSON ---");
    println!("{}", report.to_json().expect("serialize report"));
}
