//! Position reconciliation and snapshot construction
//!
//! Prefers an authoritative value-priced position source when one is
//! configured and healthy; otherwise reconstructs balances from transfer
//! history and prices them through the batched price source. Acquisition
//! enrichment from the transfer ledger always runs, whichever path
//! supplied the balances, so holding-period fields are populated either
//! way.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::ledger::{group_by_contract, group_by_token, reduce_transfers};
use crate::model::{NFTHolding, PortfolioSnapshot, TokenHolding, TokenStandard};
use crate::source::{PositionSource, PriceSource, TransferProvider};

/// Decimals assumed for fallback-reconstructed tokens, which carry no
/// metadata beyond their transfer log
const FALLBACK_TOKEN_DECIMALS: u32 = 18;

/// First characters of a contract string, safe for any UTF-8 input
fn contract_prefix(contract: &str) -> String {
    contract.chars().take(8).collect()
}

/// Holdings plus native balance, before snapshot assembly
struct ReconciledPositions {
    tokens: Vec<TokenHolding>,
    nfts: Vec<NFTHolding>,
    eth_balance: f64,
    eth_value_usd: f64,
}

/// Builds reconciled portfolio snapshots for wallet addresses
pub struct PortfolioAnalyzer {
    positions: Option<Arc<dyn PositionSource>>,
    transfers: TransferProvider,
    prices: Arc<dyn PriceSource>,
    config: AnalyzerConfig,
}

impl PortfolioAnalyzer {
    pub fn new(
        positions: Option<Arc<dyn PositionSource>>,
        transfers: TransferProvider,
        prices: Arc<dyn PriceSource>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            positions,
            transfers,
            prices,
            config,
        }
    }

    /// Analyze a wallet's complete portfolio
    ///
    /// Best-effort: an unreachable authoritative source falls back to
    /// transfer-based reconstruction, and partial enrichment failures
    /// degrade to holdings without acquisition metadata.
    pub async fn analyze_portfolio(&self, address: &str) -> Result<PortfolioSnapshot> {
        info!(address = %address, "Analyzing portfolio");

        let mut reconciled = match &self.positions {
            Some(source) => match self.authoritative_positions(source.as_ref(), address).await {
                Ok(positions) => positions,
                Err(e) if e.is_recoverable() => {
                    warn!(address = %address, error = %e, "Authoritative source failed, falling back to transfer history");
                    self.fallback_positions(address).await
                }
                Err(e) => return Err(e),
            },
            None => self.fallback_positions(address).await,
        };

        // Holding-period enrichment runs on both paths
        self.enrich_with_acquisitions(address, &mut reconciled.tokens, &mut reconciled.nfts)
            .await;

        let snapshot = PortfolioSnapshot::new(
            address,
            reconciled.eth_balance,
            reconciled.eth_value_usd,
            reconciled.tokens,
            reconciled.nfts,
        );

        info!(
            address = %address,
            total_value_usd = %format!("{:.2}", snapshot.total_value_usd),
            tokens = snapshot.token_holdings.len(),
            nfts = snapshot.nft_holdings.len(),
            "Portfolio reconciled"
        );

        Ok(snapshot)
    }

    /// Authoritative path: consume value-priced positions directly
    async fn authoritative_positions(
        &self,
        source: &dyn PositionSource,
        address: &str,
    ) -> Result<ReconciledPositions> {
        let mut tokens = Vec::new();
        let mut eth_balance = 0.0;
        let mut eth_value_usd = 0.0;

        for position in source.fetch_positions(address).await? {
            // Ingest-stage dust filter, independent of the $5 display threshold
            if position.value_usd < self.config.min_position_value_usd {
                continue;
            }

            let is_native = position.contract_address.is_none()
                && position.symbol.eq_ignore_ascii_case(&self.config.native_symbol);

            if is_native {
                eth_balance += position.balance;
                eth_value_usd += position.value_usd;
                continue;
            }

            let contract = match position.contract_address {
                Some(contract) if position.balance > 0.0 => contract.to_lowercase(),
                _ => continue,
            };

            tokens.push(TokenHolding::new(
                contract,
                position.symbol,
                position.balance,
                position.decimals,
                position.price_usd,
                position.value_usd,
            ));
        }

        // NFT collections are independent of fungible positions; a failure
        // here yields partial holdings rather than an error.
        let nfts = match source.fetch_nft_collections(address).await {
            Ok(collections) => collections
                .into_iter()
                .filter(|c| {
                    c.nft_count > 0 && c.total_floor_price_usd >= self.config.min_position_value_usd
                })
                .map(|c| {
                    let floor_per_nft = c.total_floor_price_usd / c.nft_count as f64;
                    NFTHolding::collection(
                        c.collection_id,
                        c.collection_name,
                        c.total_floor_price_usd,
                        floor_per_nft,
                        c.nft_count,
                    )
                })
                .collect(),
            Err(e) => {
                warn!(address = %address, error = %e, "NFT collection fetch failed, continuing without NFTs");
                Vec::new()
            }
        };

        Ok(ReconciledPositions {
            tokens,
            nfts,
            eth_balance,
            eth_value_usd,
        })
    }

    /// Fallback path: rebuild balances from transfer history and price
    /// them through the batched price source
    async fn fallback_positions(&self, address: &str) -> ReconciledPositions {
        let tokens = self.tokens_from_transfers(address).await;
        let nfts = self.nfts_from_transfers(address).await;

        let eth_balance = match self.transfers.fetch_native_balance(address).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(address = %address, error = %e, "Native balance fetch failed, defaulting to zero");
                0.0
            }
        };
        let eth_price = match self.prices.native_price().await {
            Ok(price) => price,
            Err(e) => {
                warn!(error = %e, "Native price fetch failed, defaulting to zero");
                0.0
            }
        };

        ReconciledPositions {
            tokens,
            nfts,
            eth_balance,
            eth_value_usd: eth_balance * eth_price,
        }
    }

    async fn tokens_from_transfers(&self, address: &str) -> Vec<TokenHolding> {
        let records = match self
            .transfers
            .fetch_transfers(address, TokenStandard::Erc20)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(address = %address, error = %e, "ERC-20 transfer fetch failed");
                return Vec::new();
            }
        };

        let mut holdings = Vec::new();
        for (contract, transfers) in group_by_contract(&records) {
            let summary = reduce_transfers(address, &transfers, TokenStandard::Erc20);
            if summary.current_balance <= 0.0 {
                continue;
            }
            // Explorer values are base units; scale to whole tokens
            // before pricing
            let balance =
                summary.current_balance / 10f64.powi(FALLBACK_TOKEN_DECIMALS as i32);
            let symbol = format!("TOKEN-{}", contract_prefix(&contract));
            holdings.push(TokenHolding::new(
                contract,
                symbol,
                balance,
                FALLBACK_TOKEN_DECIMALS,
                0.0,
                0.0,
            ));
        }

        // Prices are fetched in one batch, not per asset
        let contracts: Vec<String> = holdings.iter().map(|h| h.contract_address.clone()).collect();
        if !contracts.is_empty() {
            match self.prices.fetch_prices(&contracts).await {
                Ok(prices) => {
                    for holding in &mut holdings {
                        let price = prices
                            .get(&holding.contract_address)
                            .copied()
                            .unwrap_or(0.0);
                        holding.price_usd = price;
                        holding.value_usd = holding.balance * price;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Batch price fetch failed, holdings stay unpriced");
                }
            }
        }

        debug!(address = %address, count = holdings.len(), "Reconstructed token holdings from transfers");
        holdings
    }

    async fn nfts_from_transfers(&self, address: &str) -> Vec<NFTHolding> {
        let records = match self
            .transfers
            .fetch_transfers(address, TokenStandard::Erc721)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(address = %address, error = %e, "ERC-721 transfer fetch failed");
                return Vec::new();
            }
        };

        let mut holdings = Vec::new();
        for ((contract, token_id), transfers) in group_by_token(&records) {
            // Still held only if the latest transfer moved it inbound
            let latest = transfers.iter().max_by_key(|t| t.timestamp);
            let held = latest.map(|t| t.is_inbound(address)).unwrap_or(false);
            if !held {
                continue;
            }
            let name = format!("Collection-{}", contract_prefix(&contract));
            holdings.push(NFTHolding::single(contract, token_id, name));
        }

        debug!(address = %address, count = holdings.len(), "Reconstructed NFT holdings from transfers");
        holdings
    }

    /// Attach acquisition metadata from the transfer ledger to every
    /// holding. Errors degrade to warn-and-continue; holdings keep their
    /// balances even when history is unavailable.
    async fn enrich_with_acquisitions(
        &self,
        address: &str,
        tokens: &mut [TokenHolding],
        nfts: &mut [NFTHolding],
    ) {
        if let Err(e) = self.enrich_token_holdings(address, tokens).await {
            warn!(address = %address, error = %e, "ERC-20 enrichment failed");
        }
        if let Err(e) = self.enrich_nft_holdings(address, nfts).await {
            warn!(address = %address, error = %e, "ERC-721 enrichment failed");
        }
        if let Err(e) = self.enrich_erc1155_holdings(address, nfts).await {
            warn!(address = %address, error = %e, "ERC-1155 enrichment failed");
        }
    }

    async fn enrich_token_holdings(&self, address: &str, tokens: &mut [TokenHolding]) -> Result<()> {
        if tokens.is_empty() {
            return Ok(());
        }

        let records = self
            .transfers
            .fetch_transfers(address, TokenStandard::Erc20)
            .await?;
        let grouped = group_by_contract(&records);

        for holding in tokens {
            let Some(transfers) = grouped.get(&holding.contract_address.to_lowercase()) else {
                continue;
            };
            let summary = reduce_transfers(address, transfers, TokenStandard::Erc20);

            // Ledger sums are base units; scale them to the holding's
            // decimals so they compare against its balance
            let scale = 10f64.powi(holding.decimals as i32);

            holding.acquisition_date = summary.first_acquisition;
            holding.last_activity_date = summary.last_activity;
            holding.holding_period_days = summary.holding_period_days;
            holding.total_acquired = summary.total_acquired / scale;
            holding.total_sold = summary.total_sold / scale;
            holding.acquisition_transactions = summary.acquisition_count;
            holding.sale_transactions = summary.sale_count;

            debug!(
                symbol = %holding.symbol,
                holding_period_days = holding.holding_period_days,
                "Enriched token holding"
            );
        }

        Ok(())
    }

    async fn enrich_nft_holdings(&self, address: &str, nfts: &mut [NFTHolding]) -> Result<()> {
        if nfts.is_empty() {
            return Ok(());
        }

        let records = self
            .transfers
            .fetch_transfers(address, TokenStandard::Erc721)
            .await?;
        let by_token = group_by_token(&records);
        let by_contract = group_by_contract(&records);

        for holding in nfts {
            let contract = holding.contract_address.to_lowercase();

            match &holding.token_id {
                Some(token_id) => {
                    let key = (contract, token_id.clone());
                    if let Some(transfers) = by_token.get(&key) {
                        let summary = reduce_transfers(address, transfers, TokenStandard::Erc721);
                        holding.acquisition_date = summary.first_acquisition;
                        holding.holding_period_days = summary.holding_period_days;
                    }
                }
                None => {
                    // Collection aggregate: earliest inbound transfer across
                    // the whole collection dates the entire unit
                    let Some(transfers) = by_contract.get(&contract) else {
                        continue;
                    };
                    let earliest_inbound = transfers
                        .iter()
                        .filter(|t| t.is_inbound(address))
                        .min_by_key(|t| t.timestamp);
                    if let Some(acquired) = earliest_inbound.and_then(|t| t.datetime()) {
                        holding.acquisition_date = Some(acquired);
                        holding.holding_period_days = (Utc::now() - acquired).num_days().max(0);
                        debug!(
                            collection = %holding.collection_name,
                            holding_period_days = holding.holding_period_days,
                            "Enriched NFT collection"
                        );
                    }
                }
            }
        }

        Ok(())
    }

    async fn enrich_erc1155_holdings(&self, address: &str, nfts: &mut [NFTHolding]) -> Result<()> {
        if nfts.is_empty() {
            return Ok(());
        }

        let records = self
            .transfers
            .fetch_transfers(address, TokenStandard::Erc1155)
            .await?;
        if records.is_empty() {
            return Ok(());
        }

        let grouped = group_by_token(&records);
        let mut summaries: HashMap<(String, String), _> = HashMap::new();
        for ((contract, token_id), transfers) in &grouped {
            // Only tokens whose latest movement was inbound are still held
            let latest = transfers.iter().max_by_key(|t| t.timestamp);
            if latest.map(|t| t.is_inbound(address)).unwrap_or(false) {
                summaries.insert(
                    (contract.clone(), token_id.clone()),
                    reduce_transfers(address, transfers, TokenStandard::Erc1155),
                );
            }
        }

        for holding in nfts {
            let Some(token_id) = holding.token_id.clone() else {
                continue;
            };
            let key = (holding.contract_address.to_lowercase(), token_id);
            if let Some(summary) = summaries.get(&key) {
                if holding.acquisition_date.is_none() {
                    holding.acquisition_date = summary.first_acquisition;
                    holding.holding_period_days = summary.holding_period_days;
                }
            }
        }

        Ok(())
    }
}
