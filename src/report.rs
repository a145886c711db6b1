//! Forensic report assembly and its stable serialization contract.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::graph::TransactionGraph;
use crate::patterns::{FraudRing, PatternType};

/// One flagged account in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousAccount {
    pub account_id: String,
    /// In [0, 100] at one-decimal precision.
    pub suspicion_score: f64,
    /// Deduplicated, first-seen order preserved.
    pub detected_patterns: Vec<PatternType>,
    /// First ring in the account's membership list, if any.
    pub ring_id: Option<String>,
}

/// Batch-level totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    /// Wall-clock seconds, rounded to one decimal.
    pub processing_time_seconds: f64,
}

/// The full deterministic report produced by one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForensicReport {
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    pub fraud_rings: Vec<FraudRing>,
    pub summary: AnalysisSummary,
}

impl ForensicReport {
    /// Export as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Assemble the report from a scored graph and the merged rings.
///
/// Accounts are sorted by suspicion score descending, ties broken by
/// account id ascending; rings keep ring-id order.
pub fn build_report(
    graph: &TransactionGraph,
    rings: Vec<FraudRing>,
    processing_time_seconds: f64,
) -> ForensicReport {
    let mut suspicious_accounts: Vec<SuspiciousAccount> = graph
        .nodes()
        .filter(|node| node.is_suspicious)
        .map(|node| SuspiciousAccount {
            account_id: node.account_id.clone(),
            suspicion_score: node.suspicion_score,
            detected_patterns: dedup_first_seen(&node.detected_patterns),
            ring_id: node.ring_ids.first().cloned(),
        })
        .collect();
    suspicious_accounts.sort_by(|a, b| {
        b.suspicion_score
            .partial_cmp(&a.suspicion_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.account_id.cmp(&b.account_id))
    });

    let summary = AnalysisSummary {
        total_accounts_analyzed: graph.node_count(),
        suspicious_accounts_flagged: suspicious_accounts.len(),
        fraud_rings_detected: rings.len(),
        processing_time_seconds,
    };

    ForensicReport {
        suspicious_accounts,
        fraud_rings: rings,
        summary,
    }
}

fn dedup_first_seen(patterns: &[PatternType]) -> Vec<PatternType> {
    let mut seen: HashSet<PatternType> = HashSet::new();
    let mut deduped = Vec::new();
    for pattern in patterns {
        if seen.insert(*pattern) {
            deduped.push(*pattern);
        }
    }
    deduped
}
