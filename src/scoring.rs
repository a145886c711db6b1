//! Rule-based suspicion scoring for accounts and risk scoring for rings.

use std::collections::BTreeSet;

use crate::graph::TransactionGraph;
use crate::patterns::{FraudRing, PatternType};

/// Starting score for any account implicated in at least one pattern.
const SUSPICION_BASE: f64 = 20.0;
/// Extra weight for membership in more than one merged ring.
const MULTI_RING_BONUS: f64 = 10.0;

/// Round half away from zero to one decimal place.
pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn pattern_bonus(pattern: PatternType) -> f64 {
    match pattern {
        PatternType::CycleLength3 => 20.0,
        PatternType::CycleLength4 => 30.0,
        PatternType::CycleLength5 => 40.0,
        PatternType::FanIn72h | PatternType::FanOut72h => 35.0,
        PatternType::ShellNetwork => 25.0,
    }
}

/// Score every account. Non-suspicious accounts score 0; suspicious ones
/// add a fixed bonus per unique pattern and a bonus for sitting in more
/// than one merged ring, clamped to [0, 100].
pub fn score_accounts(graph: &mut TransactionGraph) {
    for node in graph.nodes_mut() {
        if !node.is_suspicious {
            node.suspicion_score = 0.0;
            continue;
        }
        let unique_patterns: BTreeSet<PatternType> =
            node.detected_patterns.iter().copied().collect();
        let mut score = SUSPICION_BASE;
        for pattern in unique_patterns {
            score += pattern_bonus(pattern);
        }
        let distinct_rings: BTreeSet<&str> =
            node.ring_ids.iter().map(String::as_str).collect();
        if distinct_rings.len() > 1 {
            score += MULTI_RING_BONUS;
        }
        node.suspicion_score = round_one_decimal(score.clamp(0.0, 100.0));
    }
}

/// Overwrite every ring's risk score with the arithmetic mean of its
/// member suspicion scores. Run after [`score_accounts`].
pub fn score_rings(graph: &TransactionGraph, rings: &mut [FraudRing]) {
    for ring in rings {
        if ring.member_accounts.is_empty() {
            ring.risk_score = 0.0;
            continue;
        }
        let total: f64 = ring
            .member_accounts
            .iter()
            .filter_map(|member| graph.node(member))
            .map(|node| node.suspicion_score)
            .sum();
        ring.risk_score = round_one_decimal(total / ring.member_accounts.len() as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transaction;
    use chrono::Utc;

    fn txn(id: &str, from: &str, to: &str) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            from_account: from.to_string(),
            to_account: to.to_string(),
            amount: 100.0,
            timestamp: Utc::now(),
        }
    }

    fn ring(id: &str, members: &[&str]) -> FraudRing {
        FraudRing {
            ring_id: id.to_string(),
            member_accounts: members.iter().map(|m| m.to_string()).collect(),
            pattern_type: PatternType::CycleLength3,
            risk_score: 0.0,
        }
    }

    #[test]
    fn test_non_suspicious_scores_zero() {
        let mut graph = TransactionGraph::from_transactions(&[txn("T1", "A", "B")]);
        score_accounts(&mut graph);

        assert_eq!(graph.node("A").unwrap().suspicion_score, 0.0);
        assert_eq!(graph.node("B").unwrap().suspicion_score, 0.0);
    }

    #[test]
    fn test_base_plus_pattern_bonus() {
        let mut graph = TransactionGraph::from_transactions(&[txn("T1", "A", "B")]);
        graph.mark_suspicious("A", PatternType::CycleLength3);
        score_accounts(&mut graph);

        assert_eq!(graph.node("A").unwrap().suspicion_score, 40.0);
    }

    #[test]
    fn test_duplicate_patterns_count_once() {
        let mut graph = TransactionGraph::from_transactions(&[txn("T1", "A", "B")]);
        graph.mark_suspicious("A", PatternType::ShellNetwork);
        graph.mark_suspicious("A", PatternType::ShellNetwork);
        graph.mark_suspicious("A", PatternType::ShellNetwork);
        score_accounts(&mut graph);

        assert_eq!(graph.node("A").unwrap().suspicion_score, 45.0);
    }

    #[test]
    fn test_multi_ring_bonus() {
        let mut graph = TransactionGraph::from_transactions(&[txn("T1", "A", "B")]);
        graph.mark_suspicious("A", PatternType::CycleLength3);
        graph.mark_suspicious("A", PatternType::FanIn72h);
        graph
            .assign_ring_membership(&[ring("RING_001", &["A"]), ring("RING_002", &["A", "B"])])
            .unwrap();
        score_accounts(&mut graph);

        // 20 base + 20 cycle_3 + 35 fan_in + 10 multi-ring.
        assert_eq!(graph.node("A").unwrap().suspicion_score, 85.0);
    }

    #[test]
    fn test_score_clamped_to_100() {
        let mut graph = TransactionGraph::from_transactions(&[txn("T1", "A", "B")]);
        for pattern in [
            PatternType::CycleLength3,
            PatternType::CycleLength4,
            PatternType::CycleLength5,
            PatternType::FanIn72h,
            PatternType::FanOut72h,
            PatternType::ShellNetwork,
        ] {
            graph.mark_suspicious("A", pattern);
        }
        score_accounts(&mut graph);

        assert_eq!(graph.node("A").unwrap().suspicion_score, 100.0);
    }

    #[test]
    fn test_ring_risk_is_member_mean() {
        let mut graph = TransactionGraph::from_transactions(&[txn("T1", "A", "B")]);
        graph.mark_suspicious("A", PatternType::CycleLength5);
        graph.mark_suspicious("B", PatternType::CycleLength3);
        score_accounts(&mut graph);

        let mut rings = [ring("RING_001", &["A", "B"])];
        score_rings(&graph, &mut rings);

        // Mean of 60.0 and 40.0.
        assert_eq!(rings[0].risk_score, 50.0);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(round_one_decimal(72.25), 72.3);
        assert_eq!(round_one_decimal(36.64), 36.6);
        assert_eq!(round_one_decimal(0.05), 0.1);
        assert_eq!(round_one_decimal(-0.05), -0.1);
    }
}
