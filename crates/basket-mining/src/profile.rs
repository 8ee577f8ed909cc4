//! Dataset profiling: shape, density, and threshold advice.

use std::fmt;

use serde::Serialize;

use crate::encoder::{EncodedDataset, InputLayout};
use crate::thresholds::{item_frequencies, suggest_thresholds, ThresholdSuggestions, ThresholdTier};

/// Confidence recommended alongside the suggested support.
pub const RECOMMENDED_MIN_CONFIDENCE: f64 = 0.3;

/// An item with the fraction of transactions containing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFrequency {
    pub name: String,
    pub frequency: f64,
}

/// Thresholds to start an analysis with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// The [`ThresholdTier::Low`] suggestion, so every item can appear.
    pub suggested_min_support: f64,
    pub suggested_min_confidence: f64,
}

/// Summary of an encoded dataset.
///
/// # Examples
///
/// ```
/// use basket_core::RawTable;
/// use basket_mining::{encode, profile_dataset};
///
/// let table = RawTable::single_column("items", ["a,b", "a,c", "b,c"]);
/// let profile = profile_dataset(&encode(&table).unwrap());
/// assert_eq!(profile.n_transactions, 3);
/// assert_eq!(profile.n_items, 3);
/// assert_eq!(profile.avg_items_per_transaction, 2.0);
/// assert!(profile.to_string().contains("Transactions"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetProfile {
    pub layout: InputLayout,
    pub n_transactions: usize,
    pub n_items: usize,
    pub avg_items_per_transaction: f64,
    /// Fraction of zero cells in the transaction matrix.
    pub sparsity: f64,
    pub most_frequent_item: Option<ItemFrequency>,
    pub least_frequent_item: Option<ItemFrequency>,
    pub suggestions: ThresholdSuggestions,
    pub recommendation: Recommendation,
}

/// Profile an encoded dataset.
///
/// Ties for most or least frequent item go to the first item in vocabulary order.
pub fn profile_dataset(dataset: &EncodedDataset) -> DatasetProfile {
    let matrix = &dataset.matrix;
    let n = matrix.n_transactions();
    let m = matrix.n_items();
    let positives = matrix.total_positives();

    let frequencies = item_frequencies(matrix);
    let mut most: Option<usize> = None;
    let mut least: Option<usize> = None;
    for (col, &freq) in frequencies.iter().enumerate() {
        if most.map_or(true, |best| freq > frequencies[best]) {
            most = Some(col);
        }
        if least.map_or(true, |best| freq < frequencies[best]) {
            least = Some(col);
        }
    }
    let describe = |col: usize| ItemFrequency {
        name: matrix.item(col).to_string(),
        frequency: frequencies[col],
    };

    let suggestions = suggest_thresholds(matrix);
    DatasetProfile {
        layout: dataset.layout,
        n_transactions: n,
        n_items: m,
        avg_items_per_transaction: if n == 0 {
            0.0
        } else {
            positives as f64 / n as f64
        },
        sparsity: if n * m == 0 {
            1.0
        } else {
            1.0 - positives as f64 / (n * m) as f64
        },
        most_frequent_item: most.map(describe),
        least_frequent_item: least.map(describe),
        suggestions,
        recommendation: Recommendation {
            suggested_min_support: suggestions.get(ThresholdTier::Low),
            suggested_min_confidence: RECOMMENDED_MIN_CONFIDENCE,
        },
    }
}

impl fmt::Display for DatasetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset Profile")?;
        writeln!(f, "===============")?;
        writeln!(f, "Layout:            {}", self.layout)?;
        writeln!(f, "Transactions:      {}", self.n_transactions)?;
        writeln!(f, "Items:             {}", self.n_items)?;
        writeln!(f, "Avg items/basket:  {:.2}", self.avg_items_per_transaction)?;
        writeln!(f, "Sparsity:          {:.1}%", self.sparsity * 100.0)?;
        if let Some(item) = &self.most_frequent_item {
            writeln!(f, "Most frequent:     {} ({:.1}%)", item.name, item.frequency * 100.0)?;
        }
        if let Some(item) = &self.least_frequent_item {
            writeln!(f, "Least frequent:    {} ({:.1}%)", item.name, item.frequency * 100.0)?;
        }

        writeln!(f, "\nSuggested support thresholds:")?;
        for (tier, value) in self.suggestions.tiers() {
            writeln!(f, "  {:<14} {:>6.3}  {}", tier.to_string(), value, tier.description())?;
        }
        writeln!(
            f,
            "\nRecommended: --min-support {:.3} --min-confidence {:.2}",
            self.recommendation.suggested_min_support, self.recommendation.suggested_min_confidence
        )
    }
}

impl DatasetProfile {
    /// Render the profile as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Dataset Profile\n\n");
        out.push_str("| Metric | Value |\n");
        out.push_str("|--------|-------|\n");
        out.push_str(&format!("| Layout | {} |\n", self.layout));
        out.push_str(&format!("| Transactions | {} |\n", self.n_transactions));
        out.push_str(&format!("| Items | {} |\n", self.n_items));
        out.push_str(&format!(
            "| Avg items per transaction | {:.2} |\n",
            self.avg_items_per_transaction
        ));
        out.push_str(&format!("| Sparsity | {:.1}% |\n", self.sparsity * 100.0));
        if let Some(item) = &self.most_frequent_item {
            out.push_str(&format!(
                "| Most frequent | {} ({:.1}%) |\n",
                item.name,
                item.frequency * 100.0
            ));
        }
        if let Some(item) = &self.least_frequent_item {
            out.push_str(&format!(
                "| Least frequent | {} ({:.1}%) |\n",
                item.name,
                item.frequency * 100.0
            ));
        }

        out.push_str("\n## Suggested Support Thresholds\n\n");
        out.push_str("| Tier | Support | Keeps |\n");
        out.push_str("|------|---------|-------|\n");
        for (tier, value) in self.suggestions.tiers() {
            out.push_str(&format!("| {tier} | {value:.3} | {} |\n", tier.description()));
        }
        out.push_str(&format!(
            "\n**Recommended:** min support {:.3}, min confidence {:.2}\n",
            self.recommendation.suggested_min_support, self.recommendation.suggested_min_confidence
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use basket_core::RawTable;

    fn profile(rows: &[&str]) -> DatasetProfile {
        profile_dataset(&encode(&RawTable::single_column("items", rows)).unwrap())
    }

    #[test]
    fn shape_and_density() {
        let p = profile(&["bread,milk", "bread", "bread,milk,eggs", "eggs"]);
        assert_eq!(p.n_transactions, 4);
        assert_eq!(p.n_items, 3);
        assert_eq!(p.avg_items_per_transaction, 7.0 / 4.0);
        assert!((p.sparsity - (1.0 - 7.0 / 12.0)).abs() < 1e-12);
    }

    #[test]
    fn most_and_least_frequent() {
        let p = profile(&["bread,milk", "bread", "bread,milk,eggs"]);
        let most = p.most_frequent_item.unwrap();
        let least = p.least_frequent_item.unwrap();
        assert_eq!(most.name, "bread");
        assert_eq!(most.frequency, 1.0);
        assert_eq!(least.name, "eggs");
    }

    #[test]
    fn ties_prefer_first_in_vocabulary_order() {
        let p = profile(&["b,a", "c"]);
        assert_eq!(p.most_frequent_item.unwrap().name, "a");
        assert_eq!(p.least_frequent_item.unwrap().name, "a");
    }

    #[test]
    fn recommendation_uses_low_tier() {
        let p = profile(&["a,b", "a"]);
        assert_eq!(p.recommendation.suggested_min_support, p.suggestions.low);
        assert_eq!(p.recommendation.suggested_min_confidence, 0.3);
    }

    #[test]
    fn renders_text_and_markdown() {
        let p = profile(&["a,b", "a,c", "b,c"]);
        let text = p.to_string();
        assert!(text.contains("Dataset Profile"));
        assert!(text.contains("very_low"));
        let md = p.to_markdown();
        assert!(md.starts_with("# Dataset Profile"));
        assert!(md.contains("| strict |"));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(profile(&["a,b"])).unwrap();
        assert_eq!(json["nTransactions"], 1);
        assert_eq!(json["layout"], "singleColumnList");
        assert!(json["mostFrequentItem"]["name"].is_string());
    }
}
