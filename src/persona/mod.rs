//! Persona classification types and the weighted criteria battery
//!
//! Each archetype carries a fixed set of threshold criteria. Thresholds
//! are a hard external contract: downstream consumers compare wallets
//! against these exact numbers, so they must not drift.

pub mod engine;

pub use engine::{AddressClassification, BatchReport, PersonaClassifier};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::TopAsset;

/// The four behavioral archetypes a wallet is scored against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaArchetype {
    Conservative,
    Moderate,
    Aggressive,
    Newbie,
}

impl PersonaArchetype {
    /// Fixed evaluation order; ranking ties fall to the earlier entry
    pub const ALL: [PersonaArchetype; 4] = [
        PersonaArchetype::Conservative,
        PersonaArchetype::Moderate,
        PersonaArchetype::Aggressive,
        PersonaArchetype::Newbie,
    ];

    /// Display label matching the product naming
    pub fn label(&self) -> &'static str {
        match self {
            PersonaArchetype::Conservative => "OG (Conservative)",
            PersonaArchetype::Moderate => "DeFi Chad (Moderate)",
            PersonaArchetype::Aggressive => "Degen (Aggressive)",
            PersonaArchetype::Newbie => "Virgin CT (Newbie)",
        }
    }
}

impl fmt::Display for PersonaArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Final classification label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Archetype(PersonaArchetype),
    /// No archetype could be scored (defensive; the fixed battery always
    /// has positive max weight)
    Unclassified,
    /// Terminal state when upstream data gathering failed
    Error,
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Persona::Archetype(archetype) => f.write_str(archetype.label()),
            Persona::Unclassified => f.write_str("Unclassified"),
            Persona::Error => f.write_str("Error"),
        }
    }
}

/// Criterion weight tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weight {
    High,
    Medium,
    Low,
}

impl Weight {
    pub fn value(&self) -> u32 {
        match self {
            Weight::High => 3,
            Weight::Medium => 2,
            Weight::Low => 1,
        }
    }
}

/// Threshold comparison, with `Between` as an explicit variant instead of
/// a tuple-shaped threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Gt(f64),
    Lt(f64),
    Gte(f64),
    Lte(f64),
    Eq(f64),
    /// Exclusive at both ends
    Between(f64, f64),
}

impl Comparison {
    /// Evaluate against an optional metric value; a missing value never
    /// passes and never errors (unknown wallet age, empty portfolio)
    pub fn evaluate(&self, actual: Option<f64>) -> bool {
        let Some(value) = actual else {
            return false;
        };
        match *self {
            Comparison::Gt(threshold) => value > threshold,
            Comparison::Lt(threshold) => value < threshold,
            Comparison::Gte(threshold) => value >= threshold,
            Comparison::Lte(threshold) => value <= threshold,
            Comparison::Eq(threshold) => value == threshold,
            Comparison::Between(min, max) => min < value && value < max,
        }
    }
}

/// Metric identity for a criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    TokenConcentration,
    LongestHoldingDays,
    TopAssetValue,
    WalletCreationYear,
    NativeBalance,
    ActiveDays,
    SwapCount,
    TotalPortfolioValue,
    TotalTransactions,
    TopAssetIsTokenNotNative,
}

/// One evaluated criterion for one archetype
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaCriterion {
    pub archetype: PersonaArchetype,
    pub metric: MetricName,
    pub description: String,
    pub actual: Option<f64>,
    pub comparison: Comparison,
    pub weight: Weight,
    pub passes: bool,
}

/// Weighted score for one archetype
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PersonaScore {
    pub archetype: PersonaArchetype,
    pub total_score: u32,
    pub max_possible: u32,
    pub passed_metrics: u32,
    pub total_metrics: u32,
}

impl PersonaScore {
    /// Share of achievable weight actually earned
    pub fn percentage(&self) -> f64 {
        if self.max_possible > 0 {
            self.total_score as f64 / self.max_possible as f64
        } else {
            0.0
        }
    }
}

/// Everything the criteria battery evaluates against, gathered from the
/// snapshot and activity analyses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierMetrics {
    pub wallet_creation_date: Option<DateTime<Utc>>,
    pub wallet_age_years: f64,
    pub active_days: u32,
    pub total_transactions: u32,
    pub swap_count: u32,
    pub unique_tokens: u32,
    pub dex_interactions: u32,
    pub top_asset: Option<TopAsset>,
    pub token_concentration: f64,
    pub longest_holding_days: i64,
    pub eth_balance: f64,
    pub is_top_asset_token_not_native: bool,
    pub total_portfolio_value: f64,
}

impl ClassifierMetrics {
    fn wallet_creation_year(&self) -> Option<f64> {
        self.wallet_creation_date.map(|d| d.year() as f64)
    }

    fn top_asset_value(&self) -> f64 {
        self.top_asset.as_ref().map(|t| t.value_usd).unwrap_or(0.0)
    }
}

/// The result of a full evaluate -> score -> rank pass
///
/// Explicit return value bundling everything; nothing is stashed on the
/// classifier itself, keeping classification reentrant for batch use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaClassification {
    pub persona: Persona,
    /// Winning archetype's earned-weight share, no minimum floor applied.
    /// A low-percentage winner is still returned; consumers apply their
    /// own floor using this value.
    pub confidence: f64,
    pub scores: Vec<PersonaScore>,
    pub criteria: Vec<PersonaCriterion>,
    pub metrics: ClassifierMetrics,
}

impl PersonaClassification {
    /// Terminal error classification with empty detail
    pub fn error() -> Self {
        Self {
            persona: Persona::Error,
            confidence: 0.0,
            scores: Vec::new(),
            criteria: Vec::new(),
            metrics: ClassifierMetrics::default(),
        }
    }
}

/// Evaluate the fixed criteria battery against gathered metrics
pub fn evaluate_criteria(metrics: &ClassifierMetrics) -> Vec<PersonaCriterion> {
    let concentration = Some(metrics.token_concentration);
    let longest_holding = Some(metrics.longest_holding_days as f64);
    let top_value = Some(metrics.top_asset_value());
    let wallet_year = metrics.wallet_creation_year();
    let native_balance = Some(metrics.eth_balance);
    let active_days = Some(metrics.active_days as f64);
    let swap_count = Some(metrics.swap_count as f64);
    let total_value = Some(metrics.total_portfolio_value);
    let total_transactions = Some(metrics.total_transactions as f64);
    let top_is_token = Some(if metrics.is_top_asset_token_not_native {
        1.0
    } else {
        0.0
    });

    let battery: [(
        PersonaArchetype,
        MetricName,
        &'static str,
        Option<f64>,
        Comparison,
        Weight,
    ); 18] = [
        // OG (Conservative)
        (
            PersonaArchetype::Conservative,
            MetricName::TokenConcentration,
            "Token holding > 60% of portfolio value",
            concentration,
            Comparison::Gt(0.6),
            Weight::High,
        ),
        (
            PersonaArchetype::Conservative,
            MetricName::LongestHoldingDays,
            "Longest holding period > 12 months (365 days)",
            longest_holding,
            Comparison::Gt(365.0),
            Weight::High,
        ),
        (
            PersonaArchetype::Conservative,
            MetricName::TopAssetValue,
            "Top asset value < $5,000",
            top_value,
            Comparison::Lt(5000.0),
            Weight::Medium,
        ),
        (
            PersonaArchetype::Conservative,
            MetricName::WalletCreationYear,
            "Wallet created before 2020",
            wallet_year,
            Comparison::Lt(2020.0),
            Weight::High,
        ),
        (
            PersonaArchetype::Conservative,
            MetricName::NativeBalance,
            "Currently holding ETH",
            native_balance,
            Comparison::Gt(0.0),
            Weight::Medium,
        ),
        // DeFi Chad (Moderate)
        (
            PersonaArchetype::Moderate,
            MetricName::LongestHoldingDays,
            "Longest holding > 3 months (90 days)",
            longest_holding,
            Comparison::Gt(90.0),
            Weight::High,
        ),
        (
            PersonaArchetype::Moderate,
            MetricName::TokenConcentration,
            "Token holding > 50% of portfolio value",
            concentration,
            Comparison::Gt(0.5),
            Weight::High,
        ),
        (
            PersonaArchetype::Moderate,
            MetricName::ActiveDays,
            "Active > 120 days in last 12 months",
            active_days,
            Comparison::Gt(120.0),
            Weight::High,
        ),
        (
            PersonaArchetype::Moderate,
            MetricName::TopAssetValue,
            "Top asset value between $2,000 and $5,000",
            top_value,
            Comparison::Between(2000.0, 5000.0),
            Weight::Medium,
        ),
        // Degen (Aggressive)
        (
            PersonaArchetype::Aggressive,
            MetricName::ActiveDays,
            "Active > 180 days in 12 months",
            active_days,
            Comparison::Gt(180.0),
            Weight::High,
        ),
        (
            PersonaArchetype::Aggressive,
            MetricName::SwapCount,
            "Over 100 swap transactions in 12 months",
            swap_count,
            Comparison::Gt(100.0),
            Weight::High,
        ),
        (
            PersonaArchetype::Aggressive,
            MetricName::LongestHoldingDays,
            "Holding period < 3 months (90 days)",
            longest_holding,
            Comparison::Lt(90.0),
            Weight::High,
        ),
        (
            PersonaArchetype::Aggressive,
            MetricName::TokenConcentration,
            "Token holding > 70% of portfolio value",
            concentration,
            Comparison::Gt(0.7),
            Weight::Medium,
        ),
        (
            PersonaArchetype::Aggressive,
            MetricName::TopAssetIsTokenNotNative,
            "Top asset is token but not ETH",
            top_is_token,
            Comparison::Eq(1.0),
            Weight::Medium,
        ),
        // Virgin CT (Newbie)
        (
            PersonaArchetype::Newbie,
            MetricName::WalletCreationYear,
            "Wallet created after 2023",
            wallet_year,
            Comparison::Gt(2023.0),
            Weight::High,
        ),
        (
            PersonaArchetype::Newbie,
            MetricName::ActiveDays,
            "Active > 30 days in last 12 months",
            active_days,
            Comparison::Gt(30.0),
            Weight::Medium,
        ),
        (
            PersonaArchetype::Newbie,
            MetricName::TotalPortfolioValue,
            "Total portfolio value < $5,000",
            total_value,
            Comparison::Lt(5000.0),
            Weight::High,
        ),
        (
            PersonaArchetype::Newbie,
            MetricName::TotalTransactions,
            "Total onchain transactions < 50",
            total_transactions,
            Comparison::Lt(50.0),
            Weight::Medium,
        ),
    ];

    battery
        .into_iter()
        .map(
            |(archetype, metric, description, actual, comparison, weight)| PersonaCriterion {
                archetype,
                metric,
                description: description.to_string(),
                actual,
                comparison,
                weight,
                passes: comparison.evaluate(actual),
            },
        )
        .collect()
}

/// Sum passing weights per archetype, in fixed archetype order
pub fn score_criteria(criteria: &[PersonaCriterion]) -> Vec<PersonaScore> {
    PersonaArchetype::ALL
        .iter()
        .map(|archetype| {
            let mut score = PersonaScore {
                archetype: *archetype,
                total_score: 0,
                max_possible: 0,
                passed_metrics: 0,
                total_metrics: 0,
            };
            for criterion in criteria.iter().filter(|c| c.archetype == *archetype) {
                let weight = criterion.weight.value();
                score.max_possible += weight;
                score.total_metrics += 1;
                if criterion.passes {
                    score.total_score += weight;
                    score.passed_metrics += 1;
                }
            }
            score
        })
        .collect()
}

/// Pick the winner: highest percentage, ties broken by higher absolute
/// points, remaining ties by battery order
pub fn rank_scores(scores: &[PersonaScore]) -> (Persona, f64) {
    let mut best: Option<&PersonaScore> = None;

    for score in scores {
        if score.max_possible == 0 {
            continue;
        }
        match best {
            None => best = Some(score),
            Some(current) => {
                let better = score.percentage() > current.percentage()
                    || (score.percentage() == current.percentage()
                        && score.total_score > current.total_score);
                if better {
                    best = Some(score);
                }
            }
        }
    }

    match best {
        Some(score) => (Persona::Archetype(score.archetype), score.percentage()),
        None => (Persona::Unclassified, 0.0),
    }
}

/// Full evaluate -> score -> rank pass over gathered metrics
pub fn classify_metrics(metrics: ClassifierMetrics) -> PersonaClassification {
    let criteria = evaluate_criteria(&metrics);
    let scores = score_criteria(&criteria);
    let (persona, confidence) = rank_scores(&scores);

    PersonaClassification {
        persona,
        confidence,
        scores,
        criteria,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn metrics_for_conservative() -> ClassifierMetrics {
        ClassifierMetrics {
            wallet_creation_date: Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).single(),
            token_concentration: 0.65,
            longest_holding_days: 400,
            top_asset: Some(crate::model::TopAsset {
                class: crate::model::AssetClass::Token,
                label: "AAA".to_string(),
                value_usd: 3000.0,
            }),
            eth_balance: 1.5,
            total_portfolio_value: 4600.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_comparison_operators() {
        assert!(Comparison::Gt(1.0).evaluate(Some(2.0)));
        assert!(!Comparison::Gt(1.0).evaluate(Some(1.0)));
        assert!(Comparison::Gte(1.0).evaluate(Some(1.0)));
        assert!(Comparison::Lt(5.0).evaluate(Some(4.9)));
        assert!(Comparison::Lte(5.0).evaluate(Some(5.0)));
        assert!(Comparison::Eq(1.0).evaluate(Some(1.0)));
        assert!(Comparison::Between(2000.0, 5000.0).evaluate(Some(3000.0)));
        // Between is exclusive at both ends
        assert!(!Comparison::Between(2000.0, 5000.0).evaluate(Some(2000.0)));
        assert!(!Comparison::Between(2000.0, 5000.0).evaluate(Some(5000.0)));
    }

    #[test]
    fn test_missing_value_never_passes() {
        assert!(!Comparison::Gt(0.0).evaluate(None));
        assert!(!Comparison::Lt(2020.0).evaluate(None));
        assert!(!Comparison::Between(0.0, 1.0).evaluate(None));
    }

    #[test]
    fn test_weight_values() {
        assert_eq!(Weight::High.value(), 3);
        assert_eq!(Weight::Medium.value(), 2);
        assert_eq!(Weight::Low.value(), 1);
    }

    #[test]
    fn test_battery_shape() {
        let criteria = evaluate_criteria(&ClassifierMetrics::default());
        assert_eq!(criteria.len(), 18);

        let per_archetype = |a: PersonaArchetype| {
            criteria.iter().filter(|c| c.archetype == a).count()
        };
        assert_eq!(per_archetype(PersonaArchetype::Conservative), 5);
        assert_eq!(per_archetype(PersonaArchetype::Moderate), 4);
        assert_eq!(per_archetype(PersonaArchetype::Aggressive), 5);
        assert_eq!(per_archetype(PersonaArchetype::Newbie), 4);
    }

    #[test]
    fn test_unknown_wallet_year_fails_without_error() {
        let metrics = ClassifierMetrics::default();
        let criteria = evaluate_criteria(&metrics);
        let wallet_year_criteria: Vec<_> = criteria
            .iter()
            .filter(|c| c.metric == MetricName::WalletCreationYear)
            .collect();
        assert_eq!(wallet_year_criteria.len(), 2);
        assert!(wallet_year_criteria.iter().all(|c| !c.passes));
        assert!(wallet_year_criteria.iter().all(|c| c.actual.is_none()));
    }

    #[test]
    fn test_full_conservative_scenario() {
        // concentration=0.65, longest=400d, top=$3000, created 2019, has ETH
        let classification = classify_metrics(metrics_for_conservative());

        let conservative = classification
            .scores
            .iter()
            .find(|s| s.archetype == PersonaArchetype::Conservative)
            .unwrap();
        assert_eq!(conservative.passed_metrics, 5);
        assert_eq!(conservative.total_metrics, 5);
        assert_eq!(conservative.total_score, conservative.max_possible);
        assert_eq!(conservative.max_possible, 13); // 3+3+2+3+2

        assert_eq!(
            classification.persona,
            Persona::Archetype(PersonaArchetype::Conservative)
        );
        assert!((classification.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let a = classify_metrics(metrics_for_conservative());
        let b = classify_metrics(metrics_for_conservative());
        assert_eq!(a.persona, b.persona);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.scores.len(), b.scores.len());
        for (x, y) in a.scores.iter().zip(&b.scores) {
            assert_eq!(x.total_score, y.total_score);
        }
    }

    #[test]
    fn test_tie_break_prefers_absolute_points() {
        // Same percentage (50%), different absolute totals
        let scores = vec![
            PersonaScore {
                archetype: PersonaArchetype::Conservative,
                total_score: 3,
                max_possible: 6,
                passed_metrics: 1,
                total_metrics: 2,
            },
            PersonaScore {
                archetype: PersonaArchetype::Aggressive,
                total_score: 6,
                max_possible: 12,
                passed_metrics: 2,
                total_metrics: 4,
            },
        ];
        let (persona, confidence) = rank_scores(&scores);
        assert_eq!(persona, Persona::Archetype(PersonaArchetype::Aggressive));
        assert!((confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_equal_ties_keep_battery_order() {
        let scores = vec![
            PersonaScore {
                archetype: PersonaArchetype::Moderate,
                total_score: 3,
                max_possible: 6,
                passed_metrics: 1,
                total_metrics: 2,
            },
            PersonaScore {
                archetype: PersonaArchetype::Newbie,
                total_score: 3,
                max_possible: 6,
                passed_metrics: 1,
                total_metrics: 2,
            },
        ];
        let (persona, _) = rank_scores(&scores);
        assert_eq!(persona, Persona::Archetype(PersonaArchetype::Moderate));
    }

    #[test]
    fn test_unclassified_when_nothing_scoreable() {
        let scores = vec![PersonaScore {
            archetype: PersonaArchetype::Conservative,
            total_score: 0,
            max_possible: 0,
            passed_metrics: 0,
            total_metrics: 0,
        }];
        let (persona, confidence) = rank_scores(&scores);
        assert_eq!(persona, Persona::Unclassified);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_low_confidence_winner_is_still_returned() {
        // Nothing passes except one Medium criterion for Newbie
        let metrics = ClassifierMetrics {
            active_days: 31,
            total_transactions: 100, // fails the < 50 check
            total_portfolio_value: 10_000.0,
            ..Default::default()
        };
        let classification = classify_metrics(metrics);
        // A winner exists even though its percentage is low
        assert!(matches!(classification.persona, Persona::Archetype(_)));
        assert!(classification.confidence > 0.0);
        assert!(classification.confidence < 0.5);
    }

    #[test]
    fn test_error_classification_shape() {
        let error = PersonaClassification::error();
        assert_eq!(error.persona, Persona::Error);
        assert!(error.criteria.is_empty());
        assert!(error.scores.is_empty());
        assert_eq!(error.confidence, 0.0);
    }

    #[test]
    fn test_persona_labels() {
        assert_eq!(
            Persona::Archetype(PersonaArchetype::Aggressive).to_string(),
            "Degen (Aggressive)"
        );
        assert_eq!(Persona::Unclassified.to_string(), "Unclassified");
        assert_eq!(Persona::Error.to_string(), "Error");
    }
}
