//! JSON-fixture data sources for offline analysis
//!
//! A fixture file bundles everything the analyzers would otherwise fetch
//! over the network: priced positions, NFT collections, per-standard
//! transfer logs, native balances, and a price table. One store implements
//! all three source traits, so the whole pipeline runs against a single
//! file. Address and contract keys are matched case-insensitively.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{TokenStandard, TransferRecord};
use crate::source::{
    NftCollection, PositionSource, PriceSource, PricedPosition, TransferSource,
};

/// Per-address transfer logs split by token standard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferBook {
    #[serde(default)]
    pub native: Vec<TransferRecord>,
    #[serde(default)]
    pub erc20: Vec<TransferRecord>,
    #[serde(default)]
    pub erc721: Vec<TransferRecord>,
    #[serde(default)]
    pub erc1155: Vec<TransferRecord>,
}

impl TransferBook {
    fn for_standard(&self, standard: TokenStandard) -> &[TransferRecord] {
        match standard {
            TokenStandard::Native => &self.native,
            TokenStandard::Erc20 => &self.erc20,
            TokenStandard::Erc721 => &self.erc721,
            TokenStandard::Erc1155 => &self.erc1155,
        }
    }
}

/// Deserialized fixture file backing all three source traits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureStore {
    /// Priced positions per address; an address missing here means the
    /// authoritative source has no data for it
    #[serde(default)]
    pub positions: HashMap<String, Vec<PricedPosition>>,
    #[serde(default)]
    pub nft_collections: HashMap<String, Vec<NftCollection>>,
    #[serde(default)]
    pub transfers: HashMap<String, TransferBook>,
    #[serde(default)]
    pub native_balances: HashMap<String, f64>,
    /// USD price per token contract, keyed lowercase
    #[serde(default)]
    pub prices: HashMap<String, f64>,
    #[serde(default)]
    pub native_price_usd: f64,
}

impl FixtureStore {
    /// Load and parse a fixture file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let store: FixtureStore = serde_json::from_str(&raw)?;

        info!(
            path = %path.display(),
            addresses = store.transfers.len(),
            priced_contracts = store.prices.len(),
            "Loaded fixture store"
        );

        Ok(Arc::new(store))
    }

    fn lookup<'a, T>(map: &'a HashMap<String, T>, address: &str) -> Option<&'a T> {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(address))
            .map(|(_, value)| value)
    }
}

#[async_trait]
impl PositionSource for FixtureStore {
    async fn fetch_positions(&self, address: &str) -> Result<Vec<PricedPosition>> {
        Self::lookup(&self.positions, address)
            .cloned()
            .ok_or_else(|| Error::PositionSource(format!("no positions for {address}")))
    }

    async fn fetch_nft_collections(&self, address: &str) -> Result<Vec<NftCollection>> {
        Ok(Self::lookup(&self.nft_collections, address)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl TransferSource for FixtureStore {
    async fn fetch_transfers(
        &self,
        address: &str,
        standard: TokenStandard,
    ) -> Result<Vec<TransferRecord>> {
        Ok(Self::lookup(&self.transfers, address)
            .map(|book| book.for_standard(standard).to_vec())
            .unwrap_or_default())
    }

    async fn fetch_native_balance(&self, address: &str) -> Result<f64> {
        Ok(Self::lookup(&self.native_balances, address)
            .copied()
            .unwrap_or(0.0))
    }
}

#[async_trait]
impl PriceSource for FixtureStore {
    async fn fetch_prices(&self, contracts: &[String]) -> Result<HashMap<String, f64>> {
        let mut out = HashMap::new();
        for contract in contracts {
            let key = contract.to_lowercase();
            if let Some(price) = self.prices.get(&key) {
                out.insert(contract.clone(), *price);
            }
        }
        Ok(out)
    }

    async fn native_price(&self) -> Result<f64> {
        Ok(self.native_price_usd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_from_json(raw: &str) -> FixtureStore {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_empty_fixture_parses() {
        let store = store_from_json("{}");
        assert!(store.positions.is_empty());
        assert_eq!(store.native_price_usd, 0.0);
    }

    #[tokio::test]
    async fn test_missing_positions_is_a_source_error() {
        let store = store_from_json("{}");
        let err = store.fetch_positions("0xabc").await.unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_address_lookup_is_case_insensitive() {
        let raw = r#"{
            "transfers": {
                "0xABC": {
                    "erc20": [{
                        "contractAddress": "0xaaa",
                        "from": "0x1",
                        "to": "0xABC",
                        "value": "100",
                        "timeStamp": 1700000000,
                        "hash": "0xh1"
                    }]
                }
            },
            "native_balances": {"0xABC": 2.5}
        }"#;
        let store = store_from_json(raw);

        let records = store
            .fetch_transfers("0xabc", TokenStandard::Erc20)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, "100");

        let balance = store.fetch_native_balance("0xabc").await.unwrap();
        assert!((balance - 2.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_price_lookup_lowercases_contracts() {
        let raw = r#"{"prices": {"0xaaa": 1.5}, "native_price_usd": 2500.0}"#;
        let store = store_from_json(raw);

        let prices = store.fetch_prices(&["0xAAA".to_string()]).await.unwrap();
        assert_eq!(prices.get("0xAAA"), Some(&1.5));
        assert_eq!(store.native_price().await.unwrap(), 2500.0);
    }
}
