//! Pattern taxonomy and ring representations shared by detectors and merger.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Laundering pattern tags attached to accounts and rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PatternType {
    #[serde(rename = "cycle_length_3")]
    CycleLength3,
    #[serde(rename = "cycle_length_4")]
    CycleLength4,
    #[serde(rename = "cycle_length_5")]
    CycleLength5,
    #[serde(rename = "fan_in_72h")]
    FanIn72h,
    #[serde(rename = "fan_out_72h")]
    FanOut72h,
    #[serde(rename = "shell_network")]
    ShellNetwork,
}

impl PatternType {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternType::CycleLength3 => "cycle_length_3",
            PatternType::CycleLength4 => "cycle_length_4",
            PatternType::CycleLength5 => "cycle_length_5",
            PatternType::FanIn72h => "fan_in_72h",
            PatternType::FanOut72h => "fan_out_72h",
            PatternType::ShellNetwork => "shell_network",
        }
    }

    /// Severity used for merge tie-breaks, 0 is most severe.
    pub fn severity_rank(self) -> u8 {
        match self {
            PatternType::ShellNetwork => 0,
            PatternType::CycleLength5 => 1,
            PatternType::CycleLength4 => 2,
            PatternType::CycleLength3 => 3,
            PatternType::FanIn72h => 4,
            PatternType::FanOut72h => 5,
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detector-produced ring before merging: members plus pattern, no id.
///
/// Ids are assigned only when the merger emits final rings, so candidates
/// never carry stale bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct RingCandidate {
    pub members: BTreeSet<String>,
    pub pattern: PatternType,
    pub risk_score: f64,
}

impl RingCandidate {
    pub fn new<I>(members: I, pattern: PatternType, risk_score: f64) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            members: members.into_iter().collect(),
            pattern,
            risk_score,
        }
    }

    /// Sorted member set joined by `,`. Rotations and reversals of the
    /// same member set share one key.
    pub fn canonical_key(&self) -> String {
        self.members
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn is_strict_subset_of(&self, other: &RingCandidate) -> bool {
        self.members.len() < other.members.len() && self.members.is_subset(&other.members)
    }

    pub fn overlap_count(&self, other: &RingCandidate) -> usize {
        self.members.intersection(&other.members).count()
    }
}

/// Drop every candidate whose member set is a strict subset of another
/// candidate's. Equal-size sets never eliminate each other.
pub fn drop_strict_subsets(candidates: Vec<RingCandidate>) -> Vec<RingCandidate> {
    candidates
        .iter()
        .filter(|candidate| {
            !candidates
                .iter()
                .any(|other| candidate.is_strict_subset_of(other))
        })
        .cloned()
        .collect()
}

/// A merged fraud ring as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudRing {
    /// Stable label `RING_NNN`, dense from `RING_001` within one run.
    pub ring_id: String,
    /// Ascending, duplicate-free.
    pub member_accounts: Vec<String>,
    pub pattern_type: PatternType,
    /// In [0, 100] at one-decimal precision.
    pub risk_score: f64,
}
