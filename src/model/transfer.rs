//! Raw transfer records as delivered by explorer-style adapters
//!
//! Numeric fields arrive as strings (explorers serialize big integers that
//! way) and are only parsed when a component actually consumes them, so a
//! single malformed record never poisons a whole response.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Chain identifier (e.g. 1 = Ethereum mainnet, 8453 = Base)
pub type ChainId = u64;

/// Reject inputs that are not shaped like an EVM address
///
/// Checksum casing is not verified; lookups downstream are
/// case-insensitive anyway.
pub fn validate_address(address: &str) -> Result<()> {
    let hex = address
        .strip_prefix("0x")
        .ok_or_else(|| Error::InvalidAddress(address.to_string()))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidAddress(address.to_string()));
    }
    Ok(())
}

/// Token standard of a transfer stream, controls value interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStandard {
    /// Native chain currency movements (normal transactions)
    Native,
    /// Fungible token transfers
    Erc20,
    /// Non-fungible token transfers (quantity is always 1 per record)
    Erc721,
    /// Semi-fungible token transfers (quantity from the value field)
    Erc1155,
}

impl TokenStandard {
    /// NFT-shaped standards carry a token id per record
    pub fn has_token_id(&self) -> bool {
        matches!(self, TokenStandard::Erc721 | TokenStandard::Erc1155)
    }
}

/// A single raw transfer record for a wallet address
///
/// Ordering is not guaranteed; consumers sort by timestamp themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Token contract address, `None` for native-currency transfers
    #[serde(rename = "contractAddress")]
    pub contract_address: Option<String>,

    /// Sender address
    pub from: String,

    /// Recipient address
    pub to: String,

    /// Raw decimal quantity as delivered by the adapter
    pub value: String,

    /// Unix timestamp in seconds
    #[serde(rename = "timeStamp")]
    pub timestamp: i64,

    /// Transaction hash (several transfer legs can share one hash)
    #[serde(rename = "hash")]
    pub tx_hash: String,

    /// Token id for ERC-721/1155 records
    #[serde(rename = "tokenID", default)]
    pub token_id: Option<String>,

    /// Chain the record was fetched from, tagged by the multi-chain provider
    #[serde(rename = "sourceChainId", default)]
    pub source_chain: Option<ChainId>,
}

impl TransferRecord {
    /// Transfer timestamp as a UTC datetime
    ///
    /// `None` for timestamps outside the representable range; callers
    /// skip those records like any other malformed field.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp, 0).single()
    }

    /// True when this record moved the asset into `address`
    pub fn is_inbound(&self, address: &str) -> bool {
        self.to.eq_ignore_ascii_case(address)
    }

    /// True when this record moved the asset out of `address`
    pub fn is_outbound(&self, address: &str) -> bool {
        self.from.eq_ignore_ascii_case(address)
    }

    /// Parse the raw value according to the token standard
    ///
    /// ERC-721 transfers always count as one token regardless of payload.
    /// Returns `None` for unparseable values; callers skip those records.
    pub fn quantity(&self, standard: TokenStandard) -> Option<f64> {
        match standard {
            TokenStandard::Erc721 => Some(1.0),
            _ => {
                let parsed = self.value.trim().parse::<f64>().ok()?;
                if parsed.is_finite() {
                    Some(parsed)
                } else {
                    None
                }
            }
        }
    }

    /// Contract address lowercased, for grouping keys
    pub fn contract_key(&self) -> Option<String> {
        self.contract_address.as_ref().map(|c| c.to_lowercase())
    }
}
