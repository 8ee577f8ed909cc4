//! Built-in demonstration datasets.

use basket_core::{BasketError, RawTable};
use serde::Serialize;

use crate::analysis::{analyze, Analysis, AnalysisOptions};
use crate::encoder::encode;

/// Support used when analyzing a sample.
pub const SAMPLE_MIN_SUPPORT: f64 = 0.1;
/// Confidence used when analyzing a sample.
pub const SAMPLE_MIN_CONFIDENCE: f64 = 0.3;

/// A small named set of baskets.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleDataset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub baskets: &'static [&'static [&'static str]],
}

impl SampleDataset {
    /// The baskets as a single `items` column of comma-joined lists.
    pub fn to_table(&self) -> RawTable {
        RawTable::single_column("items", self.baskets.iter().map(|basket| basket.join(",")))
    }

    /// Encode and analyze at [`SAMPLE_MIN_SUPPORT`] / [`SAMPLE_MIN_CONFIDENCE`].
    ///
    /// # Errors
    ///
    /// Propagates encoding and mining errors; none occur for the built-in data.
    pub fn analyze(&self) -> Result<Analysis, BasketError> {
        let dataset = encode(&self.to_table())?;
        let options = AnalysisOptions::with_thresholds(SAMPLE_MIN_SUPPORT, SAMPLE_MIN_CONFIDENCE);
        analyze(&format!("{} (sample)", self.name), &dataset, &options)
    }
}

pub const SAMPLES: &[SampleDataset] = &[
    SampleDataset {
        id: "groceries",
        name: "Grocery Store",
        description: "Common grocery store purchases",
        baskets: &[
            &["bread", "milk", "eggs"],
            &["bread", "butter", "cheese"],
            &["milk", "eggs", "yogurt"],
            &["bread", "cheese", "butter"],
            &["bread", "milk", "butter"],
            &["eggs", "yogurt", "milk"],
            &["bread", "eggs", "butter"],
            &["milk", "cheese", "yogurt"],
        ],
    },
    SampleDataset {
        id: "electronics",
        name: "Electronics Store",
        description: "Electronics store purchases",
        baskets: &[
            &["laptop", "mouse", "keyboard"],
            &["smartphone", "case", "charger"],
            &["laptop", "charger", "headphones"],
            &["tablet", "case", "stylus"],
            &["smartphone", "headphones", "charger"],
            &["laptop", "keyboard", "mouse"],
            &["tablet", "keyboard", "stylus"],
            &["smartphone", "case", "headphones"],
        ],
    },
    SampleDataset {
        id: "office",
        name: "Office Supplies",
        description: "Office supply store purchases",
        baskets: &[
            &["paper", "pens", "stapler"],
            &["notebook", "pens", "highlighter"],
            &["paper", "stapler", "clips"],
            &["pens", "highlighter", "ruler"],
            &["notebook", "paper", "pens"],
            &["stapler", "clips", "tape"],
            &["pens", "ruler", "highlighter"],
            &["paper", "clips", "tape"],
        ],
    },
];

/// Look up a sample by id.
///
/// # Examples
///
/// ```
/// use basket_mining::samples::sample_dataset;
///
/// assert_eq!(sample_dataset("office").unwrap().name, "Office Supplies");
/// assert!(sample_dataset("pharmacy").is_none());
/// ```
pub fn sample_dataset(id: &str) -> Option<&'static SampleDataset> {
    SAMPLES.iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::InputLayout;

    #[test]
    fn every_sample_has_eight_baskets() {
        assert_eq!(SAMPLES.len(), 3);
        for sample in SAMPLES {
            assert_eq!(sample.baskets.len(), 8, "{}", sample.id);
        }
    }

    #[test]
    fn samples_encode_through_single_column_path() {
        let dataset = encode(&sample_dataset("groceries").unwrap().to_table()).unwrap();
        assert_eq!(dataset.layout, InputLayout::SingleColumnList);
        assert_eq!(dataset.matrix.n_transactions(), 8);
        assert_eq!(dataset.matrix.n_items(), 6);
    }

    #[test]
    fn every_sample_analyzes() {
        for sample in SAMPLES {
            let analysis = sample.analyze().unwrap();
            assert_eq!(analysis.meta.min_support, SAMPLE_MIN_SUPPORT);
            assert_eq!(analysis.meta.min_confidence, SAMPLE_MIN_CONFIDENCE);
            assert!(!analysis.rules.is_empty(), "{}", sample.id);
            assert!(analysis.meta.source.contains(sample.name));
        }
    }

    #[test]
    fn groceries_bread_and_butter() {
        let analysis = sample_dataset("groceries").unwrap().analyze().unwrap();
        let rule = analysis
            .rules
            .iter()
            .find(|r| r.to_string() == "{butter} => {bread}")
            .unwrap();
        // butter appears in 4 baskets, always with bread
        assert_eq!(rule.confidence, 1.0);
        assert_eq!(rule.supporting_transactions, vec![1, 3, 4, 6]);
    }
}
