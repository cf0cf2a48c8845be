//! Classification engine: gather metrics, then evaluate, score, and rank
//!
//! Gathering is the only fallible stage. Any failure there collapses to
//! the terminal `Error` persona instead of propagating, so one bad wallet
//! never aborts a batch. Scoring itself is pure and cannot fail.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::activity::ActivityAnalyzer;
use crate::config::AnalyzerConfig;
use crate::model::PortfolioSnapshot;
use crate::portfolio::PortfolioAnalyzer;

use super::{classify_metrics, ClassifierMetrics, PersonaClassification};

/// One batch entry: the address plus its full classification
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AddressClassification {
    pub address: String,
    pub classification: PersonaClassification,
}

/// Batch output with a persona distribution over all processed addresses
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BatchReport {
    pub results: Vec<AddressClassification>,
    /// Count per persona label, `Error` entries included
    pub distribution: HashMap<String, u32>,
}

/// Wallet persona classifier
pub struct PersonaClassifier {
    portfolio: Arc<PortfolioAnalyzer>,
    activity: Arc<ActivityAnalyzer>,
    config: AnalyzerConfig,
}

impl PersonaClassifier {
    pub fn new(
        portfolio: Arc<PortfolioAnalyzer>,
        activity: Arc<ActivityAnalyzer>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            portfolio,
            activity,
            config,
        }
    }

    /// Classify one wallet
    ///
    /// Pass a prebuilt snapshot to skip portfolio analysis (batch callers
    /// that already hold one); otherwise the portfolio is analyzed here.
    pub async fn classify_persona(
        &self,
        address: &str,
        snapshot: Option<&PortfolioSnapshot>,
    ) -> PersonaClassification {
        let metrics = match self.gather_metrics(address, snapshot).await {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!(address = %address, error = %e, "Metric gathering failed, classifying as Error");
                return PersonaClassification::error();
            }
        };

        let classification = classify_metrics(metrics);
        info!(
            address = %address,
            persona = %classification.persona,
            confidence = %format!("{:.0}%", classification.confidence * 100.0),
            "Classified wallet"
        );
        classification
    }

    /// Classify many wallets concurrently, yielding each result as it
    /// completes
    ///
    /// Completion order is not input order; results carry their address.
    /// Dropping the stream cancels only in-flight work; entries already
    /// yielded stay with the caller.
    pub fn classify_stream<'a>(
        &'a self,
        addresses: &'a [String],
    ) -> impl Stream<Item = AddressClassification> + 'a {
        stream::iter(addresses.iter().cloned())
            .map(move |address| async move {
                let classification = self.classify_persona(&address, None).await;
                AddressClassification {
                    address,
                    classification,
                }
            })
            .buffer_unordered(self.config.batch_concurrency)
    }

    /// Collect a full batch into a report with a persona distribution
    ///
    /// Per-address failures land in the report as `Error` classifications.
    /// Callers that need results to survive mid-batch cancellation consume
    /// [`classify_stream`](Self::classify_stream) directly instead.
    pub async fn classify_batch(&self, addresses: &[String]) -> BatchReport {
        info!(
            count = addresses.len(),
            concurrency = self.config.batch_concurrency,
            "Classifying batch"
        );

        let results: Vec<AddressClassification> =
            self.classify_stream(addresses).collect().await;

        let mut distribution: HashMap<String, u32> = HashMap::new();
        for entry in &results {
            *distribution
                .entry(entry.classification.persona.to_string())
                .or_insert(0) += 1;
        }

        info!(distribution = ?distribution, "Batch complete");
        BatchReport {
            results,
            distribution,
        }
    }

    /// Gather every input the criteria battery needs
    async fn gather_metrics(
        &self,
        address: &str,
        snapshot: Option<&PortfolioSnapshot>,
    ) -> crate::error::Result<ClassifierMetrics> {
        let owned_snapshot;
        let snapshot = match snapshot {
            Some(snapshot) => snapshot,
            None => {
                owned_snapshot = self.portfolio.analyze_portfolio(address).await?;
                &owned_snapshot
            }
        };

        let days = self.config.lookback_days;
        let activity = self.activity.calculate_activity_score(address, days).await;
        let swaps = self.activity.analyze_swap_activity(address, days).await;
        let created = self.activity.wallet_creation_date(address).await;

        let wallet_age_years = created
            .map(|d| (chrono::Utc::now() - d).num_days().max(0) as f64 / 365.25)
            .unwrap_or(0.0);

        debug!(
            address = %address,
            active_days = activity.active_days,
            swap_count = swaps.swap_count,
            total_value_usd = %format!("{:.2}", snapshot.total_value_usd),
            "Gathered classifier metrics"
        );

        Ok(ClassifierMetrics {
            wallet_creation_date: created,
            wallet_age_years,
            active_days: activity.active_days,
            total_transactions: activity.total_transactions,
            swap_count: swaps.swap_count,
            unique_tokens: swaps.unique_tokens,
            dex_interactions: swaps.dex_interactions,
            top_asset: Some(snapshot.top_asset_by_value()),
            token_concentration: snapshot.token_concentration_ratio(),
            longest_holding_days: snapshot.longest_holding_period(),
            eth_balance: snapshot.eth_balance,
            is_top_asset_token_not_native: snapshot.is_top_asset_token_not_eth(),
            total_portfolio_value: snapshot.total_value_usd,
        })
    }
}
