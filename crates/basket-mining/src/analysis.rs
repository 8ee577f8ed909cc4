//! The end-to-end analysis pipeline.
//!
//! Runs the miner, the rule generator, the co-occurrence builder and the
//! threshold advisor over one encoded dataset, and applies the optional
//! fallback policies when the requested thresholds find nothing.

use basket_core::{AnalysisConfig, BasketError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::apriori::{mine_with, CancellationToken, FrequentItemsets, MiningOptions};
use crate::cooccurrence::{build_cooccurrence, CooccurrenceMatrix};
use crate::encoder::{EncodedDataset, InputLayout};
use crate::rules::{generate_rules, AssociationRule};
use crate::thresholds::{suggest_thresholds, ThresholdSuggestions};

/// Parameters of one [`analyze`] call.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub min_support: f64,
    pub min_confidence: f64,
    /// Re-mine at the `very_low` suggestion when nothing reaches `min_support`.
    pub support_fallback: bool,
    /// Confidence to retry rule generation with when no rule passes.
    pub confidence_fallback: Option<f64>,
    pub max_len: Option<usize>,
    pub parallel: bool,
    pub cancel: Option<CancellationToken>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for AnalysisOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            min_support: config.min_support,
            min_confidence: config.min_confidence,
            support_fallback: config.support_fallback,
            confidence_fallback: config.confidence_fallback,
            max_len: config.max_len,
            parallel: config.parallel,
            cancel: None,
        }
    }
}

impl AnalysisOptions {
    /// Options with the given thresholds and no fallbacks.
    pub fn with_thresholds(min_support: f64, min_confidence: f64) -> Self {
        Self {
            min_support,
            min_confidence,
            ..Self::default()
        }
    }

    fn mining(&self) -> MiningOptions {
        MiningOptions {
            max_len: self.max_len,
            parallel: self.parallel,
            cancel: self.cancel.clone(),
        }
    }
}

/// How an [`Analysis`] was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMeta {
    /// File name, sample id, or other caller-chosen label of the input.
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub layout: InputLayout,
    pub n_transactions: usize,
    pub n_items: usize,
    pub requested_min_support: f64,
    /// Support actually mined with.
    pub min_support: f64,
    pub requested_min_confidence: f64,
    /// Confidence the returned rules were filtered with.
    pub min_confidence: f64,
    pub support_fallback_applied: bool,
    pub confidence_fallback_applied: bool,
    pub n_frequent_itemsets: usize,
    pub n_rules: usize,
}

/// Everything one analysis found. Immutable once built.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub meta: AnalysisMeta,
    pub suggestions: ThresholdSuggestions,
    pub itemsets: FrequentItemsets,
    pub rules: Vec<AssociationRule>,
    pub cooccurrence: CooccurrenceMatrix,
    /// Transaction labels for grouped input, indexed like `supportingTransactions`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// Analyze an encoded dataset.
///
/// Rules are generated only when more than one itemset is frequent.
///
/// # Errors
///
/// - [`BasketError::InvalidThreshold`] for a threshold outside `(0, 1]`.
/// - [`BasketError::NoFrequentItemsets`] when nothing is frequent and the
///   support fallback is off or cannot go lower.
/// - [`BasketError::Cancelled`] if the options' token fires.
///
/// # Examples
///
/// ```
/// use basket_core::RawTable;
/// use basket_mining::{analyze, encode, AnalysisOptions};
///
/// let table = RawTable::single_column(
///     "items",
///     ["bread,milk", "bread,butter", "milk,butter", "bread,milk,butter"],
/// );
/// let dataset = encode(&table).unwrap();
/// let analysis = analyze("doc", &dataset, &AnalysisOptions::with_thresholds(0.5, 0.6)).unwrap();
/// assert_eq!(analysis.itemsets.len(), 6);
/// assert_eq!(analysis.rules.len(), 6);
/// assert!(!analysis.meta.support_fallback_applied);
/// ```
pub fn analyze(
    source: &str,
    dataset: &EncodedDataset,
    options: &AnalysisOptions,
) -> Result<Analysis, BasketError> {
    basket_core::validate_threshold("min_support", options.min_support)?;
    basket_core::validate_threshold("min_confidence", options.min_confidence)?;
    if let Some(floor) = options.confidence_fallback {
        basket_core::validate_threshold("confidence_fallback", floor)?;
    }

    let matrix = &dataset.matrix;
    let suggestions = suggest_thresholds(matrix);
    let mining = options.mining();

    let mut support_fallback_applied = false;
    let itemsets = match mine_with(matrix, options.min_support, &mining) {
        Err(BasketError::NoFrequentItemsets { .. })
            if options.support_fallback && options.min_support > suggestions.very_low =>
        {
            warn!(
                requested = options.min_support,
                fallback = suggestions.very_low,
                "no frequent itemsets, retrying at the very_low suggestion"
            );
            support_fallback_applied = true;
            mine_with(matrix, suggestions.very_low, &mining)?
        }
        other => other?,
    };

    let mut min_confidence = options.min_confidence;
    let mut confidence_fallback_applied = false;
    let mut rules = Vec::new();
    if itemsets.len() > 1 {
        rules = generate_rules(&itemsets, min_confidence)?;
        if let Some(floor) = options.confidence_fallback {
            if rules.is_empty() && floor < min_confidence {
                warn!(
                    requested = min_confidence,
                    fallback = floor,
                    "no rules passed, retrying at the confidence floor"
                );
                rules = generate_rules(&itemsets, floor)?;
                min_confidence = floor;
                confidence_fallback_applied = true;
            }
        }
    }

    let cooccurrence = build_cooccurrence(matrix);

    let meta = AnalysisMeta {
        source: source.to_string(),
        created_at: Utc::now(),
        layout: dataset.layout,
        n_transactions: matrix.n_transactions(),
        n_items: matrix.n_items(),
        requested_min_support: options.min_support,
        min_support: itemsets.min_support,
        requested_min_confidence: options.min_confidence,
        min_confidence,
        support_fallback_applied,
        confidence_fallback_applied,
        n_frequent_itemsets: itemsets.len(),
        n_rules: rules.len(),
    };
    info!(
        source,
        itemsets = meta.n_frequent_itemsets,
        rules = meta.n_rules,
        min_support = meta.min_support,
        "analysis complete"
    );

    Ok(Analysis {
        meta,
        suggestions,
        itemsets,
        rules,
        cooccurrence,
        labels: dataset.labels.clone(),
    })
}
