//! CLI command implementations

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::activity::ActivityAnalyzer;
use crate::cli::fixtures::FixtureStore;
use crate::config::AnalyzerConfig;
use crate::model::validate_address;
use crate::persona::PersonaClassifier;
use crate::portfolio::PortfolioAnalyzer;
use crate::source::TransferProvider;

/// Everything needed to run analysis against one fixture file
struct Pipeline {
    portfolio: Arc<PortfolioAnalyzer>,
    classifier: PersonaClassifier,
}

fn build_pipeline(config: &AnalyzerConfig, fixture_path: &str) -> Result<Pipeline> {
    let store = FixtureStore::load(fixture_path)
        .with_context(|| format!("Failed to load fixture file {fixture_path}"))?;

    let transfers = TransferProvider::single(store.clone());
    let portfolio = Arc::new(PortfolioAnalyzer::new(
        Some(store.clone()),
        transfers.clone(),
        store,
        config.clone(),
    ));
    let activity = Arc::new(ActivityAnalyzer::new(transfers));
    let classifier = PersonaClassifier::new(portfolio.clone(), activity, config.clone());

    Ok(Pipeline {
        portfolio,
        classifier,
    })
}

/// Analyze one wallet's portfolio and print the snapshot as JSON
pub async fn analyze(config: &AnalyzerConfig, fixture_path: &str, address: &str) -> Result<()> {
    validate_address(address)?;
    let pipeline = build_pipeline(config, fixture_path)?;

    let snapshot = pipeline
        .portfolio
        .analyze_portfolio(address)
        .await
        .with_context(|| format!("Portfolio analysis failed for {address}"))?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Classify one wallet and print the full classification as JSON
pub async fn classify(config: &AnalyzerConfig, fixture_path: &str, address: &str) -> Result<()> {
    validate_address(address)?;
    let pipeline = build_pipeline(config, fixture_path)?;

    let classification = pipeline.classifier.classify_persona(address, None).await;

    println!("{}", serde_json::to_string_pretty(&classification)?);
    Ok(())
}

/// Classify a batch of wallets and print the report as JSON
///
/// Addresses come from the command line, or one per line from a file
/// when `--file` is given. Blank lines and `#` comments are skipped.
pub async fn batch(
    config: &AnalyzerConfig,
    fixture_path: &str,
    mut addresses: Vec<String>,
    file: Option<&str>,
) -> Result<()> {
    if let Some(path) = file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read address file {path}"))?;
        addresses.extend(
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }

    if addresses.is_empty() {
        anyhow::bail!("No addresses to classify; pass addresses or --file");
    }

    for address in &addresses {
        validate_address(address)
            .with_context(|| format!("Rejecting batch with invalid address {address}"))?;
    }

    let pipeline = build_pipeline(config, fixture_path)?;
    let report = pipeline.classifier.classify_batch(&addresses).await;

    info!(
        classified = report.results.len(),
        "Batch classification finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Print the effective configuration
pub fn show_config(config: &AnalyzerConfig) -> Result<()> {
    println!("Lookback window:     {} days", config.lookback_days);
    println!(
        "Dust threshold:      ${:.2}",
        crate::model::DUST_THRESHOLD_USD
    );
    println!("Min position value:  ${:.2}", config.min_position_value_usd);
    println!("Native symbol:       {}", config.native_symbol);
    println!("Batch concurrency:   {}", config.batch_concurrency);
    Ok(())
}
