//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::model::DUST_THRESHOLD_USD;

/// Analyzer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Lookback window for activity and swap metrics, in days
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,

    /// Ingest-stage filter: positions below this value are discarded
    /// outright before reconciliation (USD)
    #[serde(default = "default_min_position_value")]
    pub min_position_value_usd: f64,

    /// Symbol that marks the chain's native asset in position feeds
    #[serde(default = "default_native_symbol")]
    pub native_symbol: String,

    /// Max addresses classified concurrently in a batch
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

fn default_lookback_days() -> i64 {
    crate::activity::DEFAULT_LOOKBACK_DAYS
}

fn default_min_position_value() -> f64 {
    1.0
}

fn default_native_symbol() -> String {
    "ETH".to_string()
}

fn default_batch_concurrency() -> usize {
    4
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            min_position_value_usd: default_min_position_value(),
            native_symbol: default_native_symbol(),
            batch_concurrency: default_batch_concurrency(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix PERSONA_)
            .add_source(
                config::Environment::with_prefix("PERSONA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: AnalyzerConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.lookback_days <= 0 {
            anyhow::bail!("lookback_days must be positive, got {}", self.lookback_days);
        }

        if self.min_position_value_usd < 0.0 {
            anyhow::bail!(
                "min_position_value_usd cannot be negative, got {}",
                self.min_position_value_usd
            );
        }

        if self.min_position_value_usd > DUST_THRESHOLD_USD {
            anyhow::bail!(
                "min_position_value_usd ({}) cannot exceed the ${} significance threshold",
                self.min_position_value_usd,
                DUST_THRESHOLD_USD
            );
        }

        if self.batch_concurrency == 0 {
            anyhow::bail!("batch_concurrency must be at least 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lookback_days, 365);
        assert_eq!(config.native_symbol, "ETH");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AnalyzerConfig::default();
        config.lookback_days = 0;
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.min_position_value_usd = 10.0; // above dust threshold
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.batch_concurrency = 0;
        assert!(config.validate().is_err());
    }
}
