//! Activity and swap analysis over time-windowed transfer streams
//!
//! The swap heuristic counts a transaction hash with two or more token
//! transfer legs as one swap: a plain send has a single leg, while a swap
//! typically has an inbound and an outbound leg in the same transaction.
//! It is an approximation; no contract ABI or method selector inspection
//! happens here.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{TokenStandard, TransferRecord};
use crate::source::TransferProvider;

/// Default lookback window in days
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Activity counts over a lookback window
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActivityScore {
    /// Distinct calendar dates (UTC) with at least one transaction
    pub active_days: u32,
    /// Transactions inside the window
    pub total_transactions: u32,
}

/// Swap/DEX heuristics over a lookback window
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SwapActivity {
    /// Transaction hashes with two or more transfer legs
    pub swap_count: u32,
    /// Distinct token contracts seen in-window
    pub unique_tokens: u32,
    /// Distinct transaction hashes with any transfer
    pub dex_interactions: u32,
}

/// Count distinct active days and transactions within the window
pub fn activity_score(records: &[TransferRecord], since: DateTime<Utc>) -> ActivityScore {
    let mut active_days = HashSet::new();
    let mut total_transactions = 0u32;

    for record in records {
        let Some(when) = record.datetime() else {
            continue;
        };
        if when >= since {
            active_days.insert(when.date_naive());
            total_transactions += 1;
        }
    }

    ActivityScore {
        active_days: active_days.len() as u32,
        total_transactions,
    }
}

/// Apply the multi-leg swap heuristic to in-window token transfers
pub fn swap_activity(records: &[TransferRecord], since: DateTime<Utc>) -> SwapActivity {
    let mut legs_by_hash: HashMap<&str, u32> = HashMap::new();
    let mut unique_tokens = HashSet::new();

    for record in records {
        let Some(when) = record.datetime() else {
            continue;
        };
        if when < since {
            continue;
        }
        *legs_by_hash.entry(record.tx_hash.as_str()).or_insert(0) += 1;
        if let Some(contract) = record.contract_key() {
            unique_tokens.insert(contract);
        }
    }

    let swap_count = legs_by_hash.values().filter(|legs| **legs >= 2).count() as u32;

    SwapActivity {
        swap_count,
        unique_tokens: unique_tokens.len() as u32,
        dex_interactions: legs_by_hash.len() as u32,
    }
}

/// Earliest transaction timestamp, used as the wallet creation date
pub fn wallet_creation_date(records: &[TransferRecord]) -> Option<DateTime<Utc>> {
    records.iter().filter_map(|r| r.datetime()).min()
}

/// Facade that fetches transfer streams and runs the windowed analyses
pub struct ActivityAnalyzer {
    transfers: TransferProvider,
}

impl ActivityAnalyzer {
    pub fn new(transfers: TransferProvider) -> Self {
        Self { transfers }
    }

    /// Activity metrics from normal transactions over the last `days`
    pub async fn calculate_activity_score(&self, address: &str, days: i64) -> ActivityScore {
        let since = Utc::now() - Duration::days(days);
        match self
            .transfers
            .fetch_transfers(address, TokenStandard::Native)
            .await
        {
            Ok(records) => {
                let score = activity_score(&records, since);
                debug!(
                    address = %address,
                    active_days = score.active_days,
                    total_transactions = score.total_transactions,
                    "Computed activity score"
                );
                score
            }
            Err(e) => {
                debug!(address = %address, error = %e, "Activity fetch failed, defaulting to zero");
                ActivityScore::default()
            }
        }
    }

    /// Swap metrics from fungible transfers over the last `days`
    pub async fn analyze_swap_activity(&self, address: &str, days: i64) -> SwapActivity {
        let since = Utc::now() - Duration::days(days);
        match self
            .transfers
            .fetch_transfers(address, TokenStandard::Erc20)
            .await
        {
            Ok(records) => swap_activity(&records, since),
            Err(e) => {
                debug!(address = %address, error = %e, "Swap fetch failed, defaulting to zero");
                SwapActivity::default()
            }
        }
    }

    /// First normal transaction, or `None` when the history is empty or
    /// unavailable
    pub async fn wallet_creation_date(&self, address: &str) -> Option<DateTime<Utc>> {
        match self
            .transfers
            .fetch_transfers(address, TokenStandard::Native)
            .await
        {
            Ok(records) => wallet_creation_date(&records),
            Err(e) => {
                debug!(address = %address, error = %e, "Creation date fetch failed");
                None
            }
        }
    }
}
