//! Wallet Persona Library
//!
//! Onchain portfolio reconciliation, holding-period reconstruction, and
//! weighted persona classification for EVM wallet addresses.

pub mod activity;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod model;
pub mod persona;
pub mod portfolio;
pub mod source;

// Re-export commonly used types
pub use config::AnalyzerConfig;
pub use error::{Error, Result};
pub use model::PortfolioSnapshot;
pub use persona::{Persona, PersonaClassification, PersonaClassifier};
pub use portfolio::PortfolioAnalyzer;
