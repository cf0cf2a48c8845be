//! Core data model: transfer records, holdings, and the portfolio snapshot

pub mod holdings;
pub mod snapshot;
pub mod transfer;

pub use holdings::{NFTHolding, TokenHolding};
pub use snapshot::{
    AssetClass, PortfolioComposition, PortfolioSnapshot, PositionPartition, TopAsset,
    DUST_THRESHOLD_USD,
};
pub use transfer::{validate_address, ChainId, TokenStandard, TransferRecord};
