//! Data-source abstractions the core consumes
//!
//! The core never performs network I/O; callers hand it implementations of
//! these traits (HTTP adapters, fixtures, test doubles). Multi-chain
//! support is an explicit capability picked at construction time via
//! [`TransferProvider`], not discovered by runtime probing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::model::{ChainId, TokenStandard, TransferRecord};

/// A priced fungible position from an authoritative portfolio source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedPosition {
    /// Token contract, `None` for the chain's native asset
    pub contract_address: Option<String>,
    pub symbol: String,
    pub balance: f64,
    pub price_usd: f64,
    pub value_usd: f64,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 {
    18
}

/// An NFT collection summary from an authoritative portfolio source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftCollection {
    pub collection_id: String,
    pub collection_name: String,
    pub nft_count: u32,
    pub total_floor_price_usd: f64,
}

/// Authoritative value-priced position source (e.g. a portfolio API)
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn fetch_positions(&self, address: &str) -> Result<Vec<PricedPosition>>;

    async fn fetch_nft_collections(&self, address: &str) -> Result<Vec<NftCollection>>;
}

/// Raw transfer-history source for one chain (e.g. an explorer API)
#[async_trait]
pub trait TransferSource: Send + Sync {
    /// Fetch all transfer records of one token standard for an address
    async fn fetch_transfers(
        &self,
        address: &str,
        standard: TokenStandard,
    ) -> Result<Vec<TransferRecord>>;

    /// Current native-currency balance for an address
    async fn fetch_native_balance(&self, address: &str) -> Result<f64>;
}

/// Batched price lookup for token contracts
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Price per contract address, keyed lowercase; missing entries mean
    /// no price is known
    async fn fetch_prices(&self, contracts: &[String]) -> Result<HashMap<String, f64>>;

    /// Current native-asset price in USD
    async fn native_price(&self) -> Result<f64>;
}

/// Transfer-history capability: one chain or several, chosen up front
///
/// The multi-chain variant aggregates records across all configured chains
/// and tags each record with its source chain. A single failing chain is
/// logged and skipped rather than failing the whole fetch; no ordering is
/// assumed between chains.
#[derive(Clone)]
pub enum TransferProvider {
    SingleChain(Arc<dyn TransferSource>),
    MultiChain(Vec<(ChainId, Arc<dyn TransferSource>)>),
}

impl TransferProvider {
    pub fn single(source: Arc<dyn TransferSource>) -> Self {
        TransferProvider::SingleChain(source)
    }

    pub fn multi(sources: Vec<(ChainId, Arc<dyn TransferSource>)>) -> Self {
        TransferProvider::MultiChain(sources)
    }

    /// Fetch transfers of one standard, aggregated across chains
    pub async fn fetch_transfers(
        &self,
        address: &str,
        standard: TokenStandard,
    ) -> Result<Vec<TransferRecord>> {
        match self {
            TransferProvider::SingleChain(source) => {
                source.fetch_transfers(address, standard).await
            }
            TransferProvider::MultiChain(sources) => {
                let mut all = Vec::new();
                for (chain_id, source) in sources {
                    match source.fetch_transfers(address, standard).await {
                        Ok(mut records) => {
                            for record in &mut records {
                                record.source_chain = Some(*chain_id);
                            }
                            all.extend(records);
                        }
                        Err(e) => {
                            warn!(chain_id = %chain_id, error = %e, "Chain transfer fetch failed, skipping");
                        }
                    }
                }
                Ok(all)
            }
        }
    }

    /// Native balance summed across chains
    pub async fn fetch_native_balance(&self, address: &str) -> Result<f64> {
        match self {
            TransferProvider::SingleChain(source) => source.fetch_native_balance(address).await,
            TransferProvider::MultiChain(sources) => {
                let mut total = 0.0;
                for (chain_id, source) in sources {
                    match source.fetch_native_balance(address).await {
                        Ok(balance) => total += balance,
                        Err(e) => {
                            warn!(chain_id = %chain_id, error = %e, "Chain balance fetch failed, skipping");
                        }
                    }
                }
                Ok(total)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct StubSource {
        records: Vec<TransferRecord>,
        balance: f64,
        fail: bool,
    }

    #[async_trait]
    impl TransferSource for StubSource {
        async fn fetch_transfers(
            &self,
            _address: &str,
            _standard: TokenStandard,
        ) -> Result<Vec<TransferRecord>> {
            if self.fail {
                return Err(Error::TransferSource("stub outage".to_string()));
            }
            Ok(self.records.clone())
        }

        async fn fetch_native_balance(&self, _address: &str) -> Result<f64> {
            if self.fail {
                return Err(Error::TransferSource("stub outage".to_string()));
            }
            Ok(self.balance)
        }
    }

    fn record(hash: &str) -> TransferRecord {
        TransferRecord {
            contract_address: Some("0xaaa".to_string()),
            from: "0x1".to_string(),
            to: "0x2".to_string(),
            value: "1".to_string(),
            timestamp: 0,
            tx_hash: hash.to_string(),
            token_id: None,
            source_chain: None,
        }
    }

    #[tokio::test]
    async fn test_multi_chain_tags_source_chain() {
        let provider = TransferProvider::multi(vec![
            (
                1,
                Arc::new(StubSource {
                    records: vec![record("a")],
                    balance: 1.0,
                    fail: false,
                }) as Arc<dyn TransferSource>,
            ),
            (
                8453,
                Arc::new(StubSource {
                    records: vec![record("b")],
                    balance: 2.0,
                    fail: false,
                }) as Arc<dyn TransferSource>,
            ),
        ]);

        let records = provider
            .fetch_transfers("0x2", TokenStandard::Erc20)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_chain, Some(1));
        assert_eq!(records[1].source_chain, Some(8453));

        let balance = provider.fetch_native_balance("0x2").await.unwrap();
        assert!((balance - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_multi_chain_skips_failed_chain() {
        let provider = TransferProvider::multi(vec![
            (
                1,
                Arc::new(StubSource {
                    records: vec![],
                    balance: 0.0,
                    fail: true,
                }) as Arc<dyn TransferSource>,
            ),
            (
                8453,
                Arc::new(StubSource {
                    records: vec![record("b")],
                    balance: 2.0,
                    fail: false,
                }) as Arc<dyn TransferSource>,
            ),
        ]);

        let records = provider
            .fetch_transfers("0x2", TokenStandard::Erc20)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_chain, Some(8453));
    }
}
