//! Directed transaction multi-graph underlying all pattern detection.
//!
//! The graph is built in a single pass over the input batch. Topology is
//! immutable after the build; only the per-node analysis state mutates as
//! detectors run.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::patterns::{FraudRing, PatternType};
use crate::{AnalysisError, Transaction};

/// One node per distinct account id observed in the batch.
#[derive(Debug, Clone)]
pub struct AccountNode {
    pub account_id: String,
    /// Number of transactions received, not distinct counterparties.
    pub in_degree: usize,
    /// Number of transactions sent, not distinct counterparties.
    pub out_degree: usize,
    pub total_inflow: f64,
    pub total_outflow: f64,
    /// Every transaction where this account is sender or receiver, in
    /// arrival order. A self-loop appears once.
    pub transactions: Vec<Transaction>,
    /// Accounts that sent to this one. Set semantics: repeated transfers
    /// from the same counterparty contribute one entry.
    pub incoming_accounts: BTreeSet<String>,
    /// Accounts this one sent to.
    pub outgoing_accounts: BTreeSet<String>,
    pub is_suspicious: bool,
    pub suspicion_score: f64,
    /// Pattern tags accumulated across detectors; may hold duplicates
    /// until report assembly deduplicates them.
    pub detected_patterns: Vec<PatternType>,
    /// Merged rings this account belongs to, rebuilt after every merge.
    pub ring_ids: Vec<String>,
}

impl AccountNode {
    fn new(account_id: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            in_degree: 0,
            out_degree: 0,
            total_inflow: 0.0,
            total_outflow: 0.0,
            transactions: Vec::new(),
            incoming_accounts: BTreeSet::new(),
            outgoing_accounts: BTreeSet::new(),
            is_suspicious: false,
            suspicion_score: 0.0,
            detected_patterns: Vec::new(),
            ring_ids: Vec::new(),
        }
    }

    /// In-degree plus out-degree, counting transactions.
    pub fn total_degree(&self) -> usize {
        self.in_degree + self.out_degree
    }
}

/// One edge per ordered (sender, receiver) pair with at least one transaction.
#[derive(Debug, Clone)]
pub struct TransactionEdge {
    pub from_account: String,
    pub to_account: String,
    /// Transactions on this edge in arrival order.
    pub transactions: Vec<Transaction>,
    pub total_amount: f64,
    pub transaction_count: usize,
}

impl TransactionEdge {
    fn new(from_account: &str, to_account: &str) -> Self {
        Self {
            from_account: from_account.to_string(),
            to_account: to_account.to_string(),
            transactions: Vec::new(),
            total_amount: 0.0,
            transaction_count: 0,
        }
    }
}

/// Aggregate graph statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub total_transactions: usize,
    pub total_amount: f64,
}

/// Directed multi-graph of accounts and transfers.
///
/// Ordered maps keep every traversal a pure function of the input batch,
/// which the report contract depends on.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    nodes: BTreeMap<String, AccountNode>,
    edges: BTreeMap<(String, String), TransactionEdge>,
}

impl TransactionGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a batch of validated transactions in one pass.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut graph = Self::new();
        for transaction in transactions {
            graph.add_transaction(transaction);
        }
        graph
    }

    /// Record one transaction: endpoints, aggregates, adjacency, edge list.
    pub fn add_transaction(&mut self, transaction: &Transaction) {
        let is_self_loop = transaction.from_account == transaction.to_account;

        let sender = self
            .nodes
            .entry(transaction.from_account.clone())
            .or_insert_with(|| AccountNode::new(&transaction.from_account));
        sender.out_degree += 1;
        sender.total_outflow += transaction.amount;
        sender.outgoing_accounts.insert(transaction.to_account.clone());
        sender.transactions.push(transaction.clone());

        let receiver = self
            .nodes
            .entry(transaction.to_account.clone())
            .or_insert_with(|| AccountNode::new(&transaction.to_account));
        receiver.in_degree += 1;
        receiver.total_inflow += transaction.amount;
        receiver
            .incoming_accounts
            .insert(transaction.from_account.clone());
        if !is_self_loop {
            receiver.transactions.push(transaction.clone());
        }

        let edge = self
            .edges
            .entry((
                transaction.from_account.clone(),
                transaction.to_account.clone(),
            ))
            .or_insert_with(|| {
                TransactionEdge::new(&transaction.from_account, &transaction.to_account)
            });
        edge.transactions.push(transaction.clone());
        edge.total_amount += transaction.amount;
        edge.transaction_count += 1;
    }

    /// Get a node by account id.
    pub fn node(&self, account_id: &str) -> Option<&AccountNode> {
        self.nodes.get(account_id)
    }

    /// Get the edge for an ordered (sender, receiver) pair.
    pub fn edge(&self, from_account: &str, to_account: &str) -> Option<&TransactionEdge> {
        self.edges
            .get(&(from_account.to_string(), to_account.to_string()))
    }

    /// All account ids, ascending.
    pub fn account_ids(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    /// Iterate nodes in ascending account-id order.
    pub fn nodes(&self) -> impl Iterator<Item = &AccountNode> {
        self.nodes.values()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut AccountNode> {
        self.nodes.values_mut()
    }

    /// Direct successors of an account, ascending.
    pub fn successor_list(&self, account_id: &str) -> Vec<String> {
        self.nodes
            .get(account_id)
            .map(|node| node.outgoing_accounts.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Total degree of an account; 0 for unknown accounts.
    pub fn total_degree(&self, account_id: &str) -> usize {
        self.nodes
            .get(account_id)
            .map(|node| node.total_degree())
            .unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Flag an account and record the pattern that implicated it.
    pub fn mark_suspicious(&mut self, account_id: &str, pattern: PatternType) {
        if let Some(node) = self.nodes.get_mut(account_id) {
            node.is_suspicious = true;
            node.detected_patterns.push(pattern);
        }
    }

    /// Rebuild per-node ring membership from the merged rings.
    ///
    /// A ring member that does not exist as a node indicates a detector bug
    /// and aborts the pipeline.
    pub fn assign_ring_membership(&mut self, rings: &[FraudRing]) -> Result<(), AnalysisError> {
        for node in self.nodes.values_mut() {
            node.ring_ids.clear();
        }
        for ring in rings {
            for member in &ring.member_accounts {
                let node = self.nodes.get_mut(member).ok_or_else(|| {
                    AnalysisError::InvariantViolation(format!(
                        "ring {} references unknown account {}",
                        ring.ring_id, member
                    ))
                })?;
                node.is_suspicious = true;
                node.ring_ids.push(ring.ring_id.clone());
            }
        }
        Ok(())
    }

    /// Aggregate statistics over the whole graph.
    pub fn get_stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            total_transactions: self
                .edges
                .values()
                .map(|edge| edge.transaction_count)
                .sum(),
            total_amount: self.edges.values().map(|edge| edge.total_amount).sum(),
        }
    }
}
