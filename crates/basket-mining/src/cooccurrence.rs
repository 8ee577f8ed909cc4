//! Pairwise co-occurrence counts.
//!
//! Counts, for every pair of items, how many transactions contain both,
//! which surfaces items bought together regardless of any support threshold.

use serde::Serialize;
use tracing::debug;

use crate::matrix::TransactionMatrix;

/// Symmetric item-by-item count matrix with a zero diagonal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CooccurrenceMatrix {
    /// Row and column labels, in vocabulary order.
    pub items: Vec<String>,
    /// `counts[i][j]` = transactions containing both `items[i]` and `items[j]`.
    pub counts: Vec<Vec<usize>>,
    /// Transactions containing each item on its own.
    pub item_counts: Vec<usize>,
}

/// A pair of items that appear together.
///
/// # Examples
///
/// ```
/// use basket_mining::cooccurrence::CooccurringPair;
///
/// let pair = CooccurringPair {
///     item_a: "beer".into(),
///     item_b: "chips".into(),
///     co_occurrences: 4,
///     count_a: 5,
///     count_b: 6,
/// };
/// assert!(pair.co_occurrences <= pair.count_a.min(pair.count_b));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CooccurringPair {
    /// First item in the pair (lexicographically smaller).
    pub item_a: String,
    /// Second item in the pair.
    pub item_b: String,
    /// Transactions containing both items.
    pub co_occurrences: usize,
    /// Transactions containing item_a.
    pub count_a: usize,
    /// Transactions containing item_b.
    pub count_b: usize,
}

impl CooccurrenceMatrix {
    /// Count at row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> usize {
        self.counts[i][j]
    }

    /// Co-occurrence count of two named items, if both are in the vocabulary.
    pub fn count(&self, a: &str, b: &str) -> Option<usize> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        Some(self.counts[i][j])
    }

    fn position(&self, item: &str) -> Option<usize> {
        self.items
            .binary_search_by(|probe| probe.as_str().cmp(item))
            .ok()
    }

    /// Up to `limit` non-zero pairs, most frequent first.
    ///
    /// Ties keep vocabulary order.
    pub fn top_pairs(&self, limit: usize) -> Vec<CooccurringPair> {
        let mut pairs = Vec::new();
        for i in 0..self.items.len() {
            for j in (i + 1)..self.items.len() {
                let co_occurrences = self.counts[i][j];
                if co_occurrences == 0 {
                    continue;
                }
                pairs.push(CooccurringPair {
                    item_a: self.items[i].clone(),
                    item_b: self.items[j].clone(),
                    co_occurrences,
                    count_a: self.item_counts[i],
                    count_b: self.item_counts[j],
                });
            }
        }

        pairs.sort_by(|a, b| b.co_occurrences.cmp(&a.co_occurrences));
        pairs.truncate(limit);
        pairs
    }
}

/// Build the co-occurrence matrix of `matrix` (`XᵀX` with the diagonal zeroed).
///
/// # Examples
///
/// ```
/// use basket_mining::{build_cooccurrence, matrix::TransactionMatrix};
///
/// let m = TransactionMatrix::from_transactions(vec![vec!["a", "b"], vec!["a", "c"], vec!["b", "c"]]);
/// let co = build_cooccurrence(&m);
/// assert_eq!(co.count("a", "b"), Some(1));
/// assert_eq!(co.get(0, 0), 0);
/// ```
pub fn build_cooccurrence(matrix: &TransactionMatrix) -> CooccurrenceMatrix {
    let n = matrix.n_items();
    let mut counts = vec![vec![0usize; n]; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let both = matrix.column(i).intersection_count(matrix.column(j));
            counts[i][j] = both;
            counts[j][i] = both;
        }
    }

    let item_counts = (0..n).map(|col| matrix.item_count(col)).collect();
    debug!(items = n, "built co-occurrence matrix");

    CooccurrenceMatrix {
        items: matrix.items().to_vec(),
        counts,
        item_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_always_together_count_every_transaction() {
        let m = TransactionMatrix::from_transactions(vec![vec!["a", "b"]; 3]);
        let co = build_cooccurrence(&m);
        assert_eq!(co.count("a", "b"), Some(3));
        assert_eq!(co.count("b", "a"), Some(3));
    }

    #[test]
    fn items_never_together_are_zero() {
        let m = TransactionMatrix::from_transactions(vec![vec!["a"], vec!["b"]]);
        let co = build_cooccurrence(&m);
        assert_eq!(co.count("a", "b"), Some(0));
        assert!(co.top_pairs(10).is_empty());
    }

    #[test]
    fn matrix_is_symmetric_with_zero_diagonal() {
        let m = TransactionMatrix::from_transactions(vec![
            vec!["a", "b", "c"],
            vec!["a", "c"],
            vec!["b"],
        ]);
        let co = build_cooccurrence(&m);
        for i in 0..3 {
            assert_eq!(co.get(i, i), 0);
            for j in 0..3 {
                assert_eq!(co.get(i, j), co.get(j, i));
            }
        }
        assert_eq!(co.count("a", "c"), Some(2));
        assert_eq!(co.item_counts, vec![2, 2, 2]);
    }

    #[test]
    fn single_item_gives_one_by_one_zero() {
        let m = TransactionMatrix::from_transactions(vec![vec!["solo"], vec!["solo"]]);
        let co = build_cooccurrence(&m);
        assert_eq!(co.counts, vec![vec![0]]);
    }

    #[test]
    fn unknown_item_has_no_count() {
        let m = TransactionMatrix::from_transactions(vec![vec!["a", "b"]]);
        assert_eq!(build_cooccurrence(&m).count("a", "zzz"), None);
    }

    #[test]
    fn top_pairs_sorted_and_limited() {
        let m = TransactionMatrix::from_transactions(vec![
            vec!["beer", "chips"],
            vec!["beer", "chips"],
            vec!["beer", "chips", "salsa"],
            vec!["chips", "salsa"],
        ]);
        let pairs = build_cooccurrence(&m).top_pairs(2);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].item_a, "beer");
        assert_eq!(pairs[0].item_b, "chips");
        assert_eq!(pairs[0].co_occurrences, 3);
        assert_eq!(pairs[0].count_b, 4);
        assert_eq!(pairs[1].item_a, "chips");
        assert_eq!(pairs[1].item_b, "salsa");
        assert_eq!(pairs[1].co_occurrences, 2);
    }
}
