//! # Rust Mule Detector
//!
//! A memory-safe forensic engine that flags accounts likely participating
//! in money-muling networks and groups them into fraud rings with risk
//! scores.
//!
//! ## Features
//!
//! - **Transaction Graph**: directed multi-graph with per-account
//!   aggregates and per-edge temporal transaction lists
//! - **Pattern Detection**: circular routing, temporal smurfing and
//!   shell-chain detectors over one shared graph
//! - **Ring Merging**: canonical deduplication, subset elimination and
//!   overlap-based union with dense ring ids
//! - **Deterministic Scoring**: rule-based suspicion and risk scores,
//!   byte-stable report output for identical input
//!
//! Input validation (CSV parsing, field checks) is an upstream concern;
//! the engine accepts a batch of already-validated transactions and
//! terminates after producing the report.

pub mod cycles;
pub mod graph;
pub mod merge;
pub mod patterns;
pub mod report;
pub mod scoring;
pub mod shell;
pub mod smurfing;

pub use graph::{AccountNode, GraphStats, TransactionEdge, TransactionGraph};
pub use merge::merge_rings;
pub use patterns::{FraudRing, PatternType, RingCandidate};
pub use report::{AnalysisSummary, ForensicReport, SuspiciousAccount};

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Analysis errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// An internal consistency check failed; indicates a bug.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    /// The batch held no transactions and the analyzer is configured to
    /// reject that instead of producing an empty report.
    #[error("no transactions to analyze")]
    EmptyInput,
}

/// A validated transfer between two accounts.
///
/// Self-loops (sender equals receiver) are legal input; duplicate
/// transaction ids are treated as separate observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub from_account: String,
    pub to_account: String,
    /// Positive monetary amount.
    pub amount: f64,
    /// Millisecond resolution; arrival order may disagree with timestamp
    /// order, the detectors sort internally where it matters.
    pub timestamp: DateTime<Utc>,
}

/// Analyzer configuration.
///
/// Detection thresholds are fixed constants in the detector modules; the
/// knobs here only select behavior the contract leaves to the caller.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Fail with [`AnalysisError::EmptyInput`] on an empty batch instead
    /// of producing an empty report.
    pub fail_on_empty_input: bool,
    /// Window for the shell-chain rapid-forwarding test, in milliseconds.
    pub rapid_forward_window_ms: i64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fail_on_empty_input: false,
            rapid_forward_window_ms: shell::DEFAULT_RAPID_FORWARD_WINDOW_MS,
        }
    }
}

/// Money-muling network analyzer.
///
/// Runs the fixed pipeline build -> cycles -> smurfing -> shell -> merge
/// -> score -> report on one logical thread. All pipeline state, the ring
/// counter included, is scoped to a single run, so one analyzer can be
/// reused across batches.
pub struct MuleNetworkAnalyzer {
    config: AnalyzerConfig,
}

impl MuleNetworkAnalyzer {
    /// Create an analyzer with default configuration.
    pub fn new() -> Self {
        Self {
            config: AnalyzerConfig::default(),
        }
    }

    /// Create an analyzer with custom configuration.
    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Analyze a batch of transactions into a forensic report.
    pub fn analyze(&self, transactions: &[Transaction]) -> Result<ForensicReport, AnalysisError> {
        self.analyze_with_progress(transactions, |_, _| {})
    }

    /// Analyze a batch, invoking `progress` with a stage label and a
    /// percentage at every stage boundary. The final call reports 100.
    pub fn analyze_with_progress<F>(
        &self,
        transactions: &[Transaction],
        mut progress: F,
    ) -> Result<ForensicReport, AnalysisError>
    where
        F: FnMut(&str, u8),
    {
        let started = Instant::now();

        if transactions.is_empty() {
            if self.config.fail_on_empty_input {
                return Err(AnalysisError::EmptyInput);
            }
            progress("report", 100);
            return Ok(report::build_report(&TransactionGraph::new(), Vec::new(), 0.0));
        }

        let mut graph = TransactionGraph::from_transactions(transactions);
        info!(
            accounts = graph.node_count(),
            transactions = transactions.len(),
            "transaction graph built"
        );
        progress("graph_build", 10);

        // Detector order is fixed: pattern attribution on nodes
        // accumulates across detectors and the merger breaks ties by
        // arrival order.
        let mut candidates = graph.detect_cycles();
        progress("cycle_detection", 30);
        candidates.extend(graph.detect_smurfing());
        progress("smurfing_detection", 45);
        candidates.extend(graph.detect_shell_chains(self.config.rapid_forward_window_ms));
        progress("shell_detection", 60);

        let mut rings = merge::merge_rings(candidates);
        graph.assign_ring_membership(&rings)?;
        progress("ring_merge", 75);

        scoring::score_accounts(&mut graph);
        scoring::score_rings(&graph, &mut rings);
        progress("scoring", 90);

        let elapsed = scoring::round_one_decimal(started.elapsed().as_secs_f64());
        let report = report::build_report(&graph, rings, elapsed);
        info!(
            suspicious = report.summary.suspicious_accounts_flagged,
            rings = report.summary.fraud_rings_detected,
            "analysis finished"
        );
        progress("report", 100);
        Ok(report)
    }
}

impl Default for MuleNetworkAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
