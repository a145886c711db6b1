//! Property tests over randomly generated transaction batches.

use chrono::DateTime;
use proptest::prelude::*;
use rust_mule_detector::{MuleNetworkAnalyzer, Transaction};

const BASE_MILLIS: i64 = 1_706_745_600_000; // 2024-02-01 00:00:00 UTC
const TWO_WEEKS_MS: i64 = 14 * 24 * 60 * 60 * 1000;

fn arb_transactions() -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec(
        (0u8..30, 0u8..30, 1u32..5_000_000, 0i64..TWO_WEEKS_MS),
        0..120,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(index, (from, to, cents, offset))| Transaction {
                transaction_id: format!("TX-{:05}", index),
                from_account: format!("ACC-{:02}", from),
                to_account: format!("ACC-{:02}", to),
                amount: cents as f64 / 100.0,
                timestamp: DateTime::from_timestamp_millis(BASE_MILLIS + offset).unwrap(),
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn report_invariants_hold(transactions in arb_transactions()) {
        let analyzer = MuleNetworkAnalyzer::new();
        let report = analyzer.analyze(&transactions).unwrap();

        // Ring ids are dense and zero-padded from RING_001.
        for (index, ring) in report.fraud_rings.iter().enumerate() {
            prop_assert_eq!(&ring.ring_id, &format!("RING_{:03}", index + 1));
        }

        // Member lists are sorted ascending and duplicate-free.
        for ring in &report.fraud_rings {
            prop_assert!(!ring.member_accounts.is_empty());
            prop_assert!(ring
                .member_accounts
                .windows(2)
                .all(|pair| pair[0] < pair[1]));
        }

        // No two rings share a member set and none is a strict subset of
        // another.
        for (i, a) in report.fraud_rings.iter().enumerate() {
            for (j, b) in report.fraud_rings.iter().enumerate() {
                if i == j {
                    continue;
                }
                let a_set: std::collections::BTreeSet<&String> =
                    a.member_accounts.iter().collect();
                let b_set: std::collections::BTreeSet<&String> =
                    b.member_accounts.iter().collect();
                prop_assert_ne!(&a_set, &b_set);
                prop_assert!(!a_set.is_subset(&b_set) || a_set.len() >= b_set.len());
            }
        }

        // Every ring member is a flagged account whose first ring id is a
        // real ring.
        let ring_ids: std::collections::HashSet<&str> = report
            .fraud_rings
            .iter()
            .map(|r| r.ring_id.as_str())
            .collect();
        for ring in &report.fraud_rings {
            for member in &ring.member_accounts {
                let entry = report
                    .suspicious_accounts
                    .iter()
                    .find(|a| &a.account_id == member);
                prop_assert!(entry.is_some());
                let entry = entry.unwrap();
                prop_assert!(entry.ring_id.as_deref().is_some_and(|id| ring_ids.contains(id)));
            }
        }

        // Scores are bounded and the account list is sorted by score
        // descending with ascending-id tie-breaks.
        for entry in &report.suspicious_accounts {
            prop_assert!((0.0..=100.0).contains(&entry.suspicion_score));
            prop_assert!(!entry.detected_patterns.is_empty());
        }
        for ring in &report.fraud_rings {
            prop_assert!((0.0..=100.0).contains(&ring.risk_score));
        }
        prop_assert!(
            report.suspicious_accounts.windows(2).all(|pair| {
                pair[0].suspicion_score > pair[1].suspicion_score
                    || (pair[0].suspicion_score == pair[1].suspicion_score
                        && pair[0].account_id < pair[1].account_id)
            }),
            "suspicious_accounts not sorted by descending score / ascending id tie-break"
        );

        prop_assert_eq!(
            report.summary.suspicious_accounts_flagged,
            report.suspicious_accounts.len()
        );
        prop_assert_eq!(report.summary.fraud_rings_detected, report.fraud_rings.len());
    }

    #[test]
    fn pipeline_is_deterministic(transactions in arb_transactions()) {
        let analyzer = MuleNetworkAnalyzer::new();
        let mut first = analyzer.analyze(&transactions).unwrap();
        let mut second = analyzer.analyze(&transactions).unwrap();

        first.summary.processing_time_seconds = 0.0;
        second.summary.processing_time_seconds = 0.0;
        prop_assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }
}
