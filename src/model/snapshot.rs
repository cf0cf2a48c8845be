//! Immutable portfolio snapshot with derived read-only metrics
//!
//! A snapshot is built once per analysis call and never mutated; every
//! metric below is a pure function of its state. The dust/significant
//! boundary is fixed at $5 with one rule everywhere: dust is strictly
//! between $0 and $5, significant is $5 or more, so a position worth
//! exactly $5.00 is significant and never dust.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::holdings::{NFTHolding, TokenHolding};

/// Display threshold separating dust from significant positions (USD)
pub const DUST_THRESHOLD_USD: f64 = 5.0;

/// Class of the asset that tops the portfolio by value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Native,
    Token,
    Nft,
}

/// The single highest-value asset in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopAsset {
    pub class: AssetClass,
    /// Symbol for native/tokens, collection name for NFTs
    pub label: String,
    pub value_usd: f64,
}

/// Share of portfolio value per asset class
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PortfolioComposition {
    pub eth: f64,
    pub tokens: f64,
    pub nfts: f64,
}

/// Count and total value of one side of the dust/significant partition
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PositionPartition {
    pub count: u32,
    pub value_usd: f64,
}

/// A complete reconciled portfolio valuation at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub address: String,
    pub eth_balance: f64,
    pub eth_value_usd: f64,
    pub token_holdings: Vec<TokenHolding>,
    pub nft_holdings: Vec<NFTHolding>,
    pub total_value_usd: f64,
    pub analysis_timestamp: DateTime<Utc>,
}

impl PortfolioSnapshot {
    /// Assemble a snapshot, computing the total from its parts
    pub fn new(
        address: impl Into<String>,
        eth_balance: f64,
        eth_value_usd: f64,
        token_holdings: Vec<TokenHolding>,
        nft_holdings: Vec<NFTHolding>,
    ) -> Self {
        let total_token_value: f64 = token_holdings.iter().map(|h| h.value_usd).sum();
        let total_nft_value: f64 = nft_holdings.iter().map(|h| h.estimated_value_usd).sum();
        Self {
            address: address.into(),
            eth_balance,
            eth_value_usd,
            token_holdings,
            nft_holdings,
            total_value_usd: eth_value_usd + total_token_value + total_nft_value,
            analysis_timestamp: Utc::now(),
        }
    }

    /// Highest-value asset across native, tokens, and NFT aggregates
    ///
    /// Iteration order is native first, then tokens, then NFTs; ties keep
    /// the first asset encountered, which makes the result deterministic.
    pub fn top_asset_by_value(&self) -> TopAsset {
        let mut top = TopAsset {
            class: AssetClass::Native,
            label: "ETH".to_string(),
            value_usd: self.eth_value_usd,
        };

        for holding in &self.token_holdings {
            if holding.value_usd > top.value_usd {
                top = TopAsset {
                    class: AssetClass::Token,
                    label: holding.symbol.clone(),
                    value_usd: holding.value_usd,
                };
            }
        }

        for holding in &self.nft_holdings {
            if holding.estimated_value_usd > top.value_usd {
                top = TopAsset {
                    class: AssetClass::Nft,
                    label: holding.collection_name.clone(),
                    value_usd: holding.estimated_value_usd,
                };
            }
        }

        top
    }

    /// Share of portfolio value held in the top asset, 0 when valueless
    pub fn token_concentration_ratio(&self) -> f64 {
        if self.total_value_usd <= 0.0 {
            return 0.0;
        }
        self.top_asset_by_value().value_usd / self.total_value_usd
    }

    pub fn is_top_asset_nft(&self) -> bool {
        self.top_asset_by_value().class == AssetClass::Nft
    }

    pub fn is_top_asset_token_not_eth(&self) -> bool {
        self.top_asset_by_value().class == AssetClass::Token
    }

    /// Longest holding period across token and NFT holdings, in days
    pub fn longest_holding_period(&self) -> i64 {
        self.token_holdings
            .iter()
            .map(|h| h.holding_period_days)
            .chain(self.nft_holdings.iter().map(|h| h.holding_period_days))
            .max()
            .unwrap_or(0)
    }

    pub fn total_token_value(&self) -> f64 {
        self.token_holdings.iter().map(|h| h.value_usd).sum()
    }

    pub fn total_nft_value(&self) -> f64 {
        self.nft_holdings.iter().map(|h| h.estimated_value_usd).sum()
    }

    /// Value shares per asset class, all zero when the total is non-positive
    pub fn portfolio_composition(&self) -> PortfolioComposition {
        if self.total_value_usd <= 0.0 {
            return PortfolioComposition::default();
        }
        PortfolioComposition {
            eth: self.eth_value_usd / self.total_value_usd,
            tokens: self.total_token_value() / self.total_value_usd,
            nfts: self.total_nft_value() / self.total_value_usd,
        }
    }

    /// Positions showing active trading behavior
    pub fn active_trading_positions(&self) -> Vec<&TokenHolding> {
        self.token_holdings
            .iter()
            .filter(|h| h.is_active_trader())
            .collect()
    }

    /// Token positions held for more than one year
    pub fn long_term_holdings(&self) -> Vec<&TokenHolding> {
        self.token_holdings
            .iter()
            .filter(|h| h.holding_period_days > 365)
            .collect()
    }

    /// Token positions acquired within the last 30 days
    pub fn recent_acquisitions(&self) -> Vec<&TokenHolding> {
        self.token_holdings
            .iter()
            .filter(|h| h.holding_period_days <= 30)
            .collect()
    }

    /// Token holdings at or above the significance threshold
    pub fn significant_token_holdings(&self) -> Vec<&TokenHolding> {
        self.token_holdings
            .iter()
            .filter(|h| h.value_usd >= DUST_THRESHOLD_USD)
            .collect()
    }

    /// NFT holdings at or above the significance threshold
    pub fn significant_nft_holdings(&self) -> Vec<&NFTHolding> {
        self.nft_holdings
            .iter()
            .filter(|h| h.estimated_value_usd >= DUST_THRESHOLD_USD)
            .collect()
    }

    fn is_dust(value: f64) -> bool {
        value > 0.0 && value < DUST_THRESHOLD_USD
    }

    fn is_significant(value: f64) -> bool {
        value >= DUST_THRESHOLD_USD
    }

    /// All positions worth less than $5 (exclusive at both ends)
    pub fn dust_positions(&self) -> PositionPartition {
        self.partition(Self::is_dust)
    }

    /// All positions worth $5 or more
    pub fn significant_positions(&self) -> PositionPartition {
        self.partition(Self::is_significant)
    }

    pub fn dust_positions_count(&self) -> u32 {
        self.dust_positions().count
    }

    pub fn dust_value_usd(&self) -> f64 {
        self.dust_positions().value_usd
    }

    pub fn significant_positions_count(&self) -> u32 {
        self.significant_positions().count
    }

    pub fn significant_value_usd(&self) -> f64 {
        self.significant_positions().value_usd
    }

    fn partition(&self, keep: impl Fn(f64) -> bool) -> PositionPartition {
        let mut partition = PositionPartition::default();

        if keep(self.eth_value_usd) {
            partition.count += 1;
            partition.value_usd += self.eth_value_usd;
        }
        for holding in &self.token_holdings {
            if keep(holding.value_usd) {
                partition.count += 1;
                partition.value_usd += holding.value_usd;
            }
        }
        for holding in &self.nft_holdings {
            if keep(holding.estimated_value_usd) {
                partition.count += 1;
                partition.value_usd += holding.estimated_value_usd;
            }
        }

        partition
    }
}
