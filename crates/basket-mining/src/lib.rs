//! Market basket analysis: encoding, Apriori, association rules, co-occurrence.
//!
//! Normalizes tabular input into a bitset-backed transaction matrix, mines
//! frequent itemsets level by level with antimonotonic pruning, derives
//! association rules scored by confidence and lift, counts pairwise
//! co-occurrence, and suggests support thresholds from item frequencies.
//!
//! # Examples
//!
//! ```
//! use basket_core::RawTable;
//! use basket_mining::{build_cooccurrence, encode, generate_rules, mine};
//!
//! let table = RawTable::single_column(
//!     "items",
//!     ["bread,milk", "bread,butter", "milk,butter", "bread,milk,butter"],
//! );
//! let dataset = encode(&table).unwrap();
//! let itemsets = mine(&dataset.matrix, 0.5).unwrap();
//! assert_eq!(itemsets.len(), 6);
//!
//! let rules = generate_rules(&itemsets, 0.6).unwrap();
//! assert!(rules.iter().all(|r| r.confidence >= 0.6));
//!
//! let co = build_cooccurrence(&dataset.matrix);
//! assert_eq!(co.count("bread", "milk"), Some(2));
//! ```

pub mod analysis;
pub mod apriori;
pub mod cooccurrence;
pub mod encoder;
pub mod itemset;
pub mod matrix;
pub mod profile;
pub mod report;
pub mod rules;
pub mod samples;
pub mod thresholds;

pub use analysis::{analyze, Analysis, AnalysisMeta, AnalysisOptions};
pub use apriori::{
    mine, mine_with, CancellationToken, FrequentItemset, FrequentItemsets, MiningOptions,
};
pub use cooccurrence::{build_cooccurrence, CooccurrenceMatrix};
pub use encoder::{encode, EncodedDataset, InputLayout};
pub use itemset::Itemset;
pub use matrix::{TransactionMatrix, TransactionSet};
pub use profile::{profile_dataset, DatasetProfile};
pub use rules::{generate_rules, AssociationRule};
pub use thresholds::{suggest_thresholds, ThresholdSuggestions, ThresholdTier};
