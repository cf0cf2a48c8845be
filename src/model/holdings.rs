//! Token and NFT holding models with acquisition metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fungible token position with valuation and transfer-history metadata
///
/// `balance`/`value_usd` come from whichever reconciliation path supplied
/// the position (authoritative source or transfer reconstruction), while
/// `total_acquired`/`total_sold` always come from the transfer ledger. The
/// two are intentionally not forced to agree; `net_position()` exists for
/// callers that want to compare them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenHolding {
    pub contract_address: String,
    pub symbol: String,
    pub balance: f64,
    pub decimals: u32,
    pub price_usd: f64,
    pub value_usd: f64,

    // Holding-period tracking, populated by ledger enrichment
    pub acquisition_date: Option<DateTime<Utc>>,
    pub last_activity_date: Option<DateTime<Utc>>,
    pub holding_period_days: i64,

    // Trading-activity aggregates
    pub total_acquired: f64,
    pub total_sold: f64,
    pub acquisition_transactions: u32,
    pub sale_transactions: u32,
}

impl TokenHolding {
    /// Create a priced holding with no transfer history attached yet
    pub fn new(
        contract_address: impl Into<String>,
        symbol: impl Into<String>,
        balance: f64,
        decimals: u32,
        price_usd: f64,
        value_usd: f64,
    ) -> Self {
        Self {
            contract_address: contract_address.into(),
            symbol: symbol.into(),
            balance,
            decimals,
            price_usd,
            value_usd,
            acquisition_date: None,
            last_activity_date: None,
            holding_period_days: 0,
            total_acquired: 0.0,
            total_sold: 0.0,
            acquisition_transactions: 0,
            sale_transactions: 0,
        }
    }

    /// Net position from the transfer ledger (acquired - sold)
    pub fn net_position(&self) -> f64 {
        self.total_acquired - self.total_sold
    }

    /// Ratio of sold to acquired quantity (0 when nothing acquired)
    pub fn trading_activity_ratio(&self) -> f64 {
        if self.total_acquired > 0.0 {
            self.total_sold / self.total_acquired
        } else {
            0.0
        }
    }

    /// Position with at least one sale and more than 10% of acquisitions sold
    pub fn is_active_trader(&self) -> bool {
        self.sale_transactions > 0 && self.trading_activity_ratio() > 0.1
    }
}

/// An NFT position: either a single token or a whole collection
/// aggregated as one unit (`token_id = None`, `token_count > 1`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NFTHolding {
    pub contract_address: String,
    /// `None` marks a collection-level aggregate entry
    pub token_id: Option<String>,
    pub collection_name: String,
    pub estimated_value_usd: f64,
    /// Floor price per NFT
    pub floor_price_usd: f64,
    pub token_count: u32,

    pub acquisition_date: Option<DateTime<Utc>>,
    pub holding_period_days: i64,

    /// Individual token ids when known and the collection is small
    pub token_ids: Option<Vec<String>>,
}

impl NFTHolding {
    /// Collection-level aggregate entry
    pub fn collection(
        contract_address: impl Into<String>,
        collection_name: impl Into<String>,
        estimated_value_usd: f64,
        floor_price_usd: f64,
        token_count: u32,
    ) -> Self {
        Self {
            contract_address: contract_address.into(),
            token_id: None,
            collection_name: collection_name.into(),
            estimated_value_usd,
            floor_price_usd,
            token_count,
            acquisition_date: None,
            holding_period_days: 0,
            token_ids: None,
        }
    }

    /// Single-token entry
    pub fn single(
        contract_address: impl Into<String>,
        token_id: impl Into<String>,
        collection_name: impl Into<String>,
    ) -> Self {
        Self {
            contract_address: contract_address.into(),
            token_id: Some(token_id.into()),
            collection_name: collection_name.into(),
            estimated_value_usd: 0.0,
            floor_price_usd: 0.0,
            token_count: 1,
            acquisition_date: None,
            holding_period_days: 0,
            token_ids: None,
        }
    }

    pub fn is_collection_aggregate(&self) -> bool {
        self.token_id.is_none()
    }

    /// Average value per NFT in the collection
    pub fn average_value_per_nft(&self) -> f64 {
        if self.token_count > 0 {
            self.estimated_value_usd / self.token_count as f64
        } else {
            0.0
        }
    }
}
