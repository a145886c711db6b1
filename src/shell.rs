//! Shell-chain detection: layered pass-through paths over low-activity
//! intermediary accounts with rapid forwarding.

use std::collections::HashSet;

use tracing::debug;

use crate::graph::TransactionGraph;
use crate::patterns::{PatternType, RingCandidate};

/// Shortest chain worth reporting, in nodes.
pub const MIN_CHAIN_LEN: usize = 3;
/// Longest chain the search will extend to, in nodes.
pub const MAX_CHAIN_LEN: usize = 6;
/// Total-degree ceiling for every expansion after the first.
pub const SHELL_DEGREE_MAX: usize = 3;
/// Intermediate accounts must have total degree inside this range.
pub const SHELL_INTERMEDIATE_DEGREES: std::ops::RangeInclusive<usize> = 2..=3;
/// Default window for the rapid-forwarding test, in milliseconds.
pub const DEFAULT_RAPID_FORWARD_WINDOW_MS: i64 = 72 * 60 * 60 * 1000;

impl TransactionGraph {
    /// Find simple directed chains of 3 to 6 accounts whose intermediaries
    /// are shell-like and where at least one hop forwards funds within the
    /// rapid-forwarding window. One candidate per canonical member set.
    ///
    /// A chain whose tail has an edge back to its head is a closed loop
    /// and is left to the cycle detector.
    pub fn detect_shell_chains(&mut self, rapid_forward_window_ms: i64) -> Vec<RingCandidate> {
        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut candidates: Vec<RingCandidate> = Vec::new();

        for start in self.account_ids() {
            for path in self.chain_paths_from(&start) {
                if !self.intermediates_are_shells(&path) {
                    continue;
                }
                if !self.has_rapid_forwarding(&path, rapid_forward_window_ms) {
                    continue;
                }
                let risk = (55.0 + 8.0 * path.len() as f64).min(100.0);
                let candidate =
                    RingCandidate::new(path.into_iter(), PatternType::ShellNetwork, risk);
                if seen_keys.insert(candidate.canonical_key()) {
                    candidates.push(candidate);
                }
            }
        }

        for ring in &candidates {
            for member in &ring.members {
                self.mark_suspicious(member, ring.pattern);
            }
        }
        debug!(rings = candidates.len(), "shell chain detection finished");
        candidates
    }

    /// All simple paths from `start` of 3 to MAX_CHAIN_LEN nodes that do
    /// not close back on their head. The first expansion from the start is
    /// unconditional; every later expansion requires the next node's total
    /// degree to stay at or below SHELL_DEGREE_MAX.
    fn chain_paths_from(&self, start: &str) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        let mut path: Vec<String> = vec![start.to_string()];
        let mut stack: Vec<(Vec<String>, usize)> = vec![(self.successor_list(start), 0)];

        while let Some((successors, next)) = stack.last_mut() {
            if *next >= successors.len() {
                stack.pop();
                path.pop();
                continue;
            }
            let candidate = successors[*next].clone();
            *next += 1;

            if path.contains(&candidate) {
                continue;
            }
            if path.len() > 1 && self.total_degree(&candidate) > SHELL_DEGREE_MAX {
                continue;
            }

            let successors = self.successor_list(&candidate);
            path.push(candidate);
            if path.len() >= MIN_CHAIN_LEN && self.edge(&path[path.len() - 1], &path[0]).is_none()
            {
                paths.push(path.clone());
            }
            if path.len() < MAX_CHAIN_LEN {
                stack.push((successors, 0));
            } else {
                path.pop();
            }
        }
        paths
    }

    fn intermediates_are_shells(&self, path: &[String]) -> bool {
        path[1..path.len() - 1]
            .iter()
            .all(|account| SHELL_INTERMEDIATE_DEGREES.contains(&self.total_degree(account)))
    }

    /// True when some consecutive hop pair (u, v, w) forwards within the
    /// window: the earliest v->w transfer happens less than `window_ms`
    /// after the latest u->v transfer. A v that pays out before the last
    /// top-up arrives is below the threshold and also qualifies.
    fn has_rapid_forwarding(&self, path: &[String], window_ms: i64) -> bool {
        for triple in path.windows(3) {
            let (inbound, outbound) = match (
                self.edge(&triple[0], &triple[1]),
                self.edge(&triple[1], &triple[2]),
            ) {
                (Some(inbound), Some(outbound)) => (inbound, outbound),
                _ => continue,
            };
            let latest_in = inbound
                .transactions
                .iter()
                .map(|t| t.timestamp.timestamp_millis())
                .max();
            let earliest_out = outbound
                .transactions
                .iter()
                .map(|t| t.timestamp.timestamp_millis())
                .min();
            if let (Some(latest_in), Some(earliest_out)) = (latest_in, earliest_out) {
                if earliest_out - latest_in < window_ms {
                    return true;
                }
            }
        }
        false
    }
}
