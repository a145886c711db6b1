//! Ring merging: exact deduplication, subset elimination and fuzzy
//! overlap union across detector families.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::patterns::{drop_strict_subsets, FraudRing, RingCandidate};

/// Two rings sharing at least this fraction of either member set merge.
pub const OVERLAP_THRESHOLD: f64 = 0.70;

/// Disjoint-set forest with path compression.
///
/// Pairwise overlap is not transitive; the forest closes the relation so
/// that chained merges land in one group.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, index: usize) -> usize {
        if self.parent[index] != index {
            let root = self.find(self.parent[index]);
            self.parent[index] = root;
        }
        self.parent[index]
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent[root_b] = root_a;
        }
    }
}

/// Merge detector candidates into final rings with dense `RING_NNN` ids.
///
/// Input order is the detector concatenation order and drives every
/// tie-break, so the output is a pure function of the candidate list.
/// Merged ring risk is the maximum constituent risk; the scoring engine
/// overwrites it from member scores afterwards.
pub fn merge_rings(candidates: Vec<RingCandidate>) -> Vec<FraudRing> {
    let deduped = dedup_by_member_set(candidates);
    let survivors = drop_strict_subsets(deduped);

    let mut sets = DisjointSet::new(survivors.len());
    for i in 0..survivors.len() {
        for j in (i + 1)..survivors.len() {
            let overlap = survivors[i].overlap_count(&survivors[j]) as f64;
            if overlap / survivors[i].members.len() as f64 >= OVERLAP_THRESHOLD
                || overlap / survivors[j].members.len() as f64 >= OVERLAP_THRESHOLD
            {
                sets.union(i, j);
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut slot_by_root: HashMap<usize, usize> = HashMap::new();
    for index in 0..survivors.len() {
        let root = sets.find(index);
        let slot = *slot_by_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(index);
    }

    let mut rings = Vec::with_capacity(groups.len());
    for (counter, group) in groups.iter().enumerate() {
        let mut members: BTreeSet<String> = BTreeSet::new();
        let mut pattern = survivors[group[0]].pattern;
        let mut risk_score = 0.0f64;
        for &index in group {
            members.extend(survivors[index].members.iter().cloned());
            if survivors[index].pattern.severity_rank() < pattern.severity_rank() {
                pattern = survivors[index].pattern;
            }
            risk_score = risk_score.max(survivors[index].risk_score);
        }
        rings.push(FraudRing {
            ring_id: format!("RING_{:03}", counter + 1),
            member_accounts: members.into_iter().collect(),
            pattern_type: pattern,
            risk_score,
        });
    }
    debug!(rings = rings.len(), "ring merge finished");
    rings
}

/// Keep one candidate per canonical member set, preferring the most
/// severe pattern; ties keep the earlier candidate.
fn dedup_by_member_set(candidates: Vec<RingCandidate>) -> Vec<RingCandidate> {
    let mut kept: Vec<RingCandidate> = Vec::new();
    let mut slot_by_key: HashMap<String, usize> = HashMap::new();
    for candidate in candidates {
        let key = candidate.canonical_key();
        match slot_by_key.get(&key) {
            Some(&slot) => {
                if candidate.pattern.severity_rank() < kept[slot].pattern.severity_rank() {
                    kept[slot] = candidate;
                }
            }
            None => {
                slot_by_key.insert(key, kept.len());
                kept.push(candidate);
            }
        }
    }
    kept
}
