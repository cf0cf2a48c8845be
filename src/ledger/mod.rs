//! Transfer ledger reducer
//!
//! Turns an unordered transfer log for a single asset into acquisition and
//! disposal aggregates plus a holding period. Records are stably sorted by
//! timestamp before the scan, so acquisition order is chronological with
//! input order breaking ties. Malformed values and unrepresentable
//! timestamps skip the record rather than aborting the reduction; the
//! running balance is clamped to
//! zero because disposals can exceed recorded acquisitions when history
//! before the fetch window is missing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{TokenStandard, TransferRecord};

/// Aggregates reduced from one asset's transfer history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Earliest inbound transfer, `None` when nothing was ever acquired
    pub first_acquisition: Option<DateTime<Utc>>,
    /// Latest transfer in either direction
    pub last_activity: Option<DateTime<Utc>>,
    /// Days since first acquisition, 0 when never acquired
    pub holding_period_days: i64,
    pub total_acquired: f64,
    pub total_sold: f64,
    pub acquisition_count: u32,
    pub sale_count: u32,
    /// Reconstructed balance, never negative
    pub current_balance: f64,
}

/// Reduce one asset's transfer records for `address` into aggregates
///
/// O(n log n) in the record count, dominated by the sort. Independent
/// assets can be reduced in parallel; this function has no shared state.
pub fn reduce_transfers(
    address: &str,
    records: &[TransferRecord],
    standard: TokenStandard,
) -> LedgerSummary {
    let mut sorted: Vec<&TransferRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.timestamp);

    let mut summary = LedgerSummary::default();
    let mut balance = 0.0_f64;

    for record in sorted {
        let quantity = match record.quantity(standard) {
            Some(q) => q,
            None => {
                debug!(
                    tx_hash = %record.tx_hash,
                    value = %record.value,
                    "Skipping transfer with malformed value"
                );
                continue;
            }
        };

        let when = match record.datetime() {
            Some(when) => when,
            None => {
                debug!(
                    tx_hash = %record.tx_hash,
                    timestamp = record.timestamp,
                    "Skipping transfer with unrepresentable timestamp"
                );
                continue;
            }
        };

        if record.is_inbound(address) {
            balance += quantity;
            summary.total_acquired += quantity;
            summary.acquisition_count += 1;
            if summary.first_acquisition.is_none() {
                summary.first_acquisition = Some(when);
            }
        } else if record.is_outbound(address) {
            balance -= quantity;
            summary.total_sold += quantity;
            summary.sale_count += 1;
        } else {
            // Record does not involve this address at all
            continue;
        }

        match summary.last_activity {
            Some(last) if last >= when => {}
            _ => summary.last_activity = Some(when),
        }
    }

    if let Some(first) = summary.first_acquisition {
        summary.holding_period_days = (Utc::now() - first).num_days().max(0);
    }

    summary.current_balance = balance.max(0.0);
    summary
}

/// Group transfer records by lowercase contract address
///
/// Records with no contract address (native transfers) are dropped.
pub fn group_by_contract(records: &[TransferRecord]) -> HashMap<String, Vec<TransferRecord>> {
    let mut grouped: HashMap<String, Vec<TransferRecord>> = HashMap::new();
    for record in records {
        if let Some(key) = record.contract_key() {
            grouped.entry(key).or_default().push(record.clone());
        }
    }
    grouped
}

/// Group transfer records by (lowercase contract, token id) pairs
pub fn group_by_token(
    records: &[TransferRecord],
) -> HashMap<(String, String), Vec<TransferRecord>> {
    let mut grouped: HashMap<(String, String), Vec<TransferRecord>> = HashMap::new();
    for record in records {
        if let (Some(contract), Some(token_id)) = (record.contract_key(), record.token_id.clone())
        {
            grouped
                .entry((contract, token_id))
                .or_default()
                .push(record.clone());
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0xWallet";

    fn transfer(from: &str, to: &str, value: &str, timestamp: i64) -> TransferRecord {
        TransferRecord {
            contract_address: Some("0xToken".to_string()),
            from: from.to_string(),
            to: to.to_string(),
            value: value.to_string(),
            timestamp,
            tx_hash: format!("0xhash{timestamp}"),
            token_id: None,
            source_chain: None,
        }
    }

    #[test]
    fn test_empty_ledger_is_all_zeros() {
        let summary = reduce_transfers(WALLET, &[], TokenStandard::Erc20);
        assert_eq!(summary.holding_period_days, 0);
        assert_eq!(summary.acquisition_count, 0);
        assert_eq!(summary.current_balance, 0.0);
        assert!(summary.first_acquisition.is_none());
        assert!(summary.last_activity.is_none());
    }

    #[test]
    fn test_acquisitions_and_disposals() {
        let records = vec![
            transfer("0xother", WALLET, "100", 1_000),
            transfer(WALLET, "0xother", "30", 2_000),
            transfer("0xother", WALLET, "50", 3_000),
        ];
        let summary = reduce_transfers(WALLET, &records, TokenStandard::Erc20);

        assert_eq!(summary.total_acquired, 150.0);
        assert_eq!(summary.total_sold, 30.0);
        assert_eq!(summary.acquisition_count, 2);
        assert_eq!(summary.sale_count, 1);
        assert_eq!(summary.current_balance, 120.0);
        assert_eq!(summary.first_acquisition.unwrap().timestamp(), 1_000);
        assert_eq!(summary.last_activity.unwrap().timestamp(), 3_000);
    }

    #[test]
    fn test_order_independence_of_aggregates() {
        let forward = vec![
            transfer("0xother", WALLET, "100", 1_000),
            transfer(WALLET, "0xother", "60", 2_000),
            transfer("0xother", WALLET, "10", 3_000),
        ];
        let mut shuffled = forward.clone();
        shuffled.reverse();
        shuffled.swap(0, 1);

        let a = reduce_transfers(WALLET, &forward, TokenStandard::Erc20);
        let b = reduce_transfers(WALLET, &shuffled, TokenStandard::Erc20);

        assert_eq!(a.total_acquired, b.total_acquired);
        assert_eq!(a.total_sold, b.total_sold);
        assert_eq!(a.current_balance, b.current_balance);
        // First acquisition is the true chronological minimum either way
        assert_eq!(a.first_acquisition, b.first_acquisition);
        assert_eq!(a.first_acquisition.unwrap().timestamp(), 1_000);
    }

    #[test]
    fn test_balance_clamped_when_history_is_truncated() {
        // A disposal with no recorded acquisition (pre-window history)
        let records = vec![transfer(WALLET, "0xother", "500", 1_000)];
        let summary = reduce_transfers(WALLET, &records, TokenStandard::Erc20);

        assert_eq!(summary.current_balance, 0.0);
        assert_eq!(summary.total_sold, 500.0);
        assert!(summary.first_acquisition.is_none());
        assert_eq!(summary.holding_period_days, 0);
    }

    #[test]
    fn test_malformed_values_are_skipped() {
        let records = vec![
            transfer("0xother", WALLET, "not-a-number", 1_000),
            transfer("0xother", WALLET, "40", 2_000),
        ];
        let summary = reduce_transfers(WALLET, &records, TokenStandard::Erc20);

        assert_eq!(summary.total_acquired, 40.0);
        assert_eq!(summary.acquisition_count, 1);
        assert_eq!(summary.first_acquisition.unwrap().timestamp(), 2_000);
    }

    #[test]
    fn test_unrepresentable_timestamp_skips_record() {
        let records = vec![
            transfer("0xother", WALLET, "10", i64::MAX),
            transfer("0xother", WALLET, "40", 2_000),
        ];
        let summary = reduce_transfers(WALLET, &records, TokenStandard::Erc20);

        assert_eq!(summary.total_acquired, 40.0);
        assert_eq!(summary.acquisition_count, 1);
        assert_eq!(summary.first_acquisition.unwrap().timestamp(), 2_000);
    }

    #[test]
    fn test_erc721_counts_one_per_record() {
        let mut records = vec![
            transfer("0xother", WALLET, "999999", 1_000),
            transfer("0xother", WALLET, "garbage", 2_000),
            transfer(WALLET, "0xother", "7", 3_000),
        ];
        for (i, record) in records.iter_mut().enumerate() {
            record.token_id = Some(i.to_string());
        }
        let summary = reduce_transfers(WALLET, &records, TokenStandard::Erc721);

        assert_eq!(summary.total_acquired, 2.0);
        assert_eq!(summary.total_sold, 1.0);
        assert_eq!(summary.current_balance, 1.0);
    }

    #[test]
    fn test_unrelated_records_are_ignored() {
        let records = vec![transfer("0xa", "0xb", "100", 1_000)];
        let summary = reduce_transfers(WALLET, &records, TokenStandard::Erc20);
        assert_eq!(summary.acquisition_count, 0);
        assert_eq!(summary.sale_count, 0);
        assert!(summary.last_activity.is_none());
    }

    #[test]
    fn test_group_by_contract_lowercases_keys() {
        let mut a = transfer("0x1", "0x2", "1", 0);
        a.contract_address = Some("0xAAA".to_string());
        let mut b = transfer("0x1", "0x2", "1", 1);
        b.contract_address = Some("0xaaa".to_string());
        let mut native = transfer("0x1", "0x2", "1", 2);
        native.contract_address = None;

        let grouped = group_by_contract(&[a, b, native]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.get("0xaaa").unwrap().len(), 2);
    }

    #[test]
    fn test_group_by_token_splits_token_ids() {
        let mut a = transfer("0x1", "0x2", "1", 0);
        a.token_id = Some("1".to_string());
        let mut b = transfer("0x1", "0x2", "1", 1);
        b.token_id = Some("2".to_string());

        let grouped = group_by_token(&[a, b]);
        assert_eq!(grouped.len(), 2);
    }
}
