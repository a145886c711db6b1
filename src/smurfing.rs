//! Temporal smurfing detection: high distinct-counterparty fan-in or
//! fan-out concentrated inside a rolling 72-hour window.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::graph::TransactionGraph;
use crate::patterns::{PatternType, RingCandidate};

/// Rolling window for counterparty clustering, in milliseconds.
pub const SMURFING_WINDOW_MS: i64 = 72 * 60 * 60 * 1000;
/// Distinct counterparties required inside one window.
pub const MIN_COUNTERPARTIES: usize = 10;
/// Accounts above this total degree are high-volume legitimate and skipped.
pub const LEGITIMACY_DEGREE_CUTOFF: usize = 100;

enum Direction {
    Incoming,
    Outgoing,
}

impl TransactionGraph {
    /// Flag aggregator accounts whose distinct senders (fan-in) or
    /// receivers (fan-out) inside any 72-hour window reach the threshold.
    /// At most one fan-in and one fan-out ring per aggregator.
    pub fn detect_smurfing(&mut self) -> Vec<RingCandidate> {
        let mut candidates = Vec::new();

        for account in self.account_ids() {
            if self.total_degree(&account) > LEGITIMACY_DEGREE_CUTOFF {
                continue;
            }
            if let Some(senders) = self.clustered_counterparties(&account, Direction::Incoming) {
                candidates.push(self.smurfing_ring(&account, senders, PatternType::FanIn72h));
            }
            if let Some(receivers) = self.clustered_counterparties(&account, Direction::Outgoing) {
                candidates.push(self.smurfing_ring(&account, receivers, PatternType::FanOut72h));
            }
        }
        debug!(rings = candidates.len(), "smurfing detection finished");
        candidates
    }

    /// The largest distinct-counterparty set reachable within one window,
    /// when it reaches MIN_COUNTERPARTIES.
    ///
    /// Two-pointer sweep over the (timestamp, counterparty) pairs of every
    /// transaction between the account and its counterparties in the given
    /// direction. The first maximal window wins, which keeps the result
    /// independent of map iteration order.
    fn clustered_counterparties(
        &self,
        account: &str,
        direction: Direction,
    ) -> Option<BTreeSet<String>> {
        let node = self.node(account)?;
        let counterparties = match direction {
            Direction::Incoming => &node.incoming_accounts,
            Direction::Outgoing => &node.outgoing_accounts,
        };
        if counterparties.len() < MIN_COUNTERPARTIES {
            return None;
        }

        let mut pairs: Vec<(i64, String)> = Vec::new();
        for counterparty in counterparties {
            let edge = match direction {
                Direction::Incoming => self.edge(counterparty, account),
                Direction::Outgoing => self.edge(account, counterparty),
            };
            if let Some(edge) = edge {
                for transaction in &edge.transactions {
                    pairs.push((transaction.timestamp.timestamp_millis(), counterparty.clone()));
                }
            }
        }
        pairs.sort();

        let mut window_counts: HashMap<String, usize> = HashMap::new();
        let mut start = 0;
        let mut best: Option<(usize, usize, usize)> = None;

        for end in 0..pairs.len() {
            *window_counts.entry(pairs[end].1.clone()).or_insert(0) += 1;
            while pairs[end].0 - pairs[start].0 > SMURFING_WINDOW_MS {
                if let Some(count) = window_counts.get_mut(&pairs[start].1) {
                    *count -= 1;
                    if *count == 0 {
                        window_counts.remove(&pairs[start].1);
                    }
                }
                start += 1;
            }
            let distinct = window_counts.len();
            if best.map_or(true, |(size, _, _)| distinct > size) {
                best = Some((distinct, start, end));
            }
        }

        match best {
            Some((size, window_start, window_end)) if size >= MIN_COUNTERPARTIES => Some(
                pairs[window_start..=window_end]
                    .iter()
                    .map(|(_, counterparty)| counterparty.clone())
                    .collect(),
            ),
            _ => None,
        }
    }

    fn smurfing_ring(
        &mut self,
        aggregator: &str,
        counterparties: BTreeSet<String>,
        pattern: PatternType,
    ) -> RingCandidate {
        let risk = (60.0 + 2.0 * counterparties.len() as f64).min(100.0);
        let mut members = counterparties;
        members.insert(aggregator.to_string());
        let candidate = RingCandidate {
            members,
            pattern,
            risk_score: risk,
        };
        for member in &candidate.members {
            self.mark_suspicious(member, pattern);
        }
        candidate
    }
}
