//! Level-wise Apriori mining over a [`TransactionMatrix`].
//!
//! Level `k` candidates are joined from frequent `(k-1)`-itemsets sharing
//! their first `k-2` items, pruned unless every `(k-1)`-subset is frequent,
//! and counted by intersecting the two parents' transaction bitsets.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use basket_core::BasketError;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::itemset::Itemset;
use crate::matrix::{TransactionMatrix, TransactionSet};

/// Below this many candidates a level is counted on the calling thread.
const PARALLEL_MIN_CANDIDATES: usize = 64;

/// Cooperative cancellation flag shared between a caller and a running mine.
///
/// # Examples
///
/// ```
/// use basket_mining::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; mining stops before the next level.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Knobs for [`mine_with`].
#[derive(Debug, Clone)]
pub struct MiningOptions {
    /// Largest itemset size to produce, at least 1. `None` mines until a level is empty.
    pub max_len: Option<usize>,
    /// Count each level's candidates on the rayon pool.
    pub parallel: bool,
    /// Checked between levels.
    pub cancel: Option<CancellationToken>,
}

impl Default for MiningOptions {
    fn default() -> Self {
        Self {
            max_len: None,
            parallel: true,
            cancel: None,
        }
    }
}

/// One frequent itemset with its support.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequentItemset {
    pub itemset: Itemset,
    /// Fraction of transactions containing every item.
    pub support: f64,
    /// Number of transactions containing every item.
    pub count: usize,
    /// The containing transactions.
    #[serde(skip)]
    pub transactions: TransactionSet,
}

/// All frequent itemsets found at one support threshold.
///
/// Sorted by support descending, then size ascending, then items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequentItemsets {
    pub min_support: f64,
    pub n_transactions: usize,
    pub itemsets: Vec<FrequentItemset>,
}

impl FrequentItemsets {
    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrequentItemset> {
        self.itemsets.iter()
    }

    /// Look up an itemset by identity.
    pub fn get(&self, itemset: &Itemset) -> Option<&FrequentItemset> {
        self.itemsets.iter().find(|f| &f.itemset == itemset)
    }

    /// Support of `itemset`, if it is frequent.
    pub fn support_of(&self, itemset: &Itemset) -> Option<f64> {
        self.get(itemset).map(|f| f.support)
    }

    /// Number of itemsets of each size, indexed by `size - 1`.
    pub fn level_sizes(&self) -> Vec<usize> {
        let max = self.itemsets.iter().map(|f| f.itemset.len()).max().unwrap_or(0);
        let mut sizes = vec![0; max];
        for f in &self.itemsets {
            sizes[f.itemset.len() - 1] += 1;
        }
        sizes
    }
}

/// Mine frequent itemsets with default options.
///
/// # Errors
///
/// See [`mine_with`].
///
/// # Examples
///
/// ```
/// use basket_mining::{matrix::TransactionMatrix, mine, Itemset};
///
/// let m = TransactionMatrix::from_transactions(vec![
///     vec!["bread", "milk"],
///     vec!["bread", "butter"],
///     vec!["milk", "butter"],
///     vec!["bread", "milk", "butter"],
/// ]);
/// let found = mine(&m, 0.5).unwrap();
/// assert_eq!(found.len(), 6);
/// assert_eq!(found.support_of(&Itemset::new(["bread"])), Some(0.75));
/// assert_eq!(found.support_of(&Itemset::new(["bread", "milk", "butter"])), None);
/// ```
pub fn mine(matrix: &TransactionMatrix, min_support: f64) -> Result<FrequentItemsets, BasketError> {
    mine_with(matrix, min_support, &MiningOptions::default())
}

/// Candidate or frequent itemset as sorted column indices.
struct Node {
    cols: Vec<usize>,
    transactions: TransactionSet,
}

/// Mine frequent itemsets level by level.
///
/// # Errors
///
/// - [`BasketError::InvalidThreshold`] if `min_support` is outside `(0, 1]`.
/// - [`BasketError::NoFrequentItemsets`] if no single item is frequent.
/// - [`BasketError::Cancelled`] if the token fires before a level starts.
/// - [`BasketError::Config`] if `max_len` is `Some(0)`.
pub fn mine_with(
    matrix: &TransactionMatrix,
    min_support: f64,
    options: &MiningOptions,
) -> Result<FrequentItemsets, BasketError> {
    basket_core::validate_threshold("min_support", min_support)?;
    if options.max_len == Some(0) {
        return Err(BasketError::Config("max_len must be at least 1".into()));
    }

    let n = matrix.n_transactions();
    let is_frequent = |count: usize| n > 0 && count as f64 / n as f64 >= min_support;
    let check_cancel = || match &options.cancel {
        Some(token) if token.is_cancelled() => Err(BasketError::Cancelled),
        _ => Ok(()),
    };
    let max_len = options.max_len.unwrap_or(usize::MAX);

    check_cancel()?;
    let mut level: Vec<Node> = (0..matrix.n_items())
        .filter(|&col| is_frequent(matrix.item_count(col)))
        .map(|col| Node {
            cols: vec![col],
            transactions: matrix.column(col).clone(),
        })
        .collect();
    debug!(level = 1, frequent = level.len(), "apriori level");

    if level.is_empty() {
        return Err(BasketError::NoFrequentItemsets { min_support });
    }

    let mut frequent: Vec<Node> = Vec::new();
    let mut k = 1;
    while !level.is_empty() && k < max_len {
        check_cancel()?;
        k += 1;

        let candidates = join_and_prune(&level);
        let candidate_count = candidates.len();
        let count = |(cols, a, b): (Vec<usize>, &TransactionSet, &TransactionSet)| {
            let transactions = a.intersection(b);
            is_frequent(transactions.count()).then_some(Node { cols, transactions })
        };
        let next: Vec<Node> = if options.parallel && candidate_count >= PARALLEL_MIN_CANDIDATES {
            candidates.into_par_iter().filter_map(count).collect()
        } else {
            candidates.into_iter().filter_map(count).collect()
        };
        debug!(
            level = k,
            candidates = candidate_count,
            frequent = next.len(),
            "apriori level"
        );

        frequent.append(&mut level);
        level = next;
    }
    frequent.append(&mut level);

    let mut itemsets: Vec<FrequentItemset> = frequent
        .into_iter()
        .map(|node| {
            let count = node.transactions.count();
            FrequentItemset {
                itemset: Itemset::new(node.cols.iter().map(|&c| matrix.item(c))),
                support: count as f64 / n as f64,
                count,
                transactions: node.transactions,
            }
        })
        .collect();
    itemsets.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.itemset.len().cmp(&b.itemset.len()))
            .then_with(|| a.itemset.cmp(&b.itemset))
    });

    Ok(FrequentItemsets {
        min_support,
        n_transactions: n,
        itemsets,
    })
}

/// Join itemsets of one level that share all but their last item, keeping
/// only candidates whose every immediate subset is in the level.
///
/// `level` must be sorted by column indices, which holds because level 1 is
/// built in column order and each join preserves prefix order.
fn join_and_prune(level: &[Node]) -> Vec<(Vec<usize>, &TransactionSet, &TransactionSet)> {
    let known: HashSet<&[usize]> = level.iter().map(|node| node.cols.as_slice()).collect();
    let mut candidates = Vec::new();

    for (i, a) in level.iter().enumerate() {
        let prefix = &a.cols[..a.cols.len() - 1];
        for b in &level[i + 1..] {
            if &b.cols[..b.cols.len() - 1] != prefix {
                break;
            }
            let mut cols = a.cols.clone();
            cols.push(b.cols[b.cols.len() - 1]);

            let all_subsets_frequent = (0..cols.len()).all(|skip| {
                let subset: Vec<usize> = cols
                    .iter()
                    .enumerate()
                    .filter(|&(idx, _)| idx != skip)
                    .map(|(_, &c)| c)
                    .collect();
                known.contains(subset.as_slice())
            });
            if all_subsets_frequent {
                candidates.push((cols, &a.transactions, &b.transactions));
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bread_milk_butter() -> TransactionMatrix {
        TransactionMatrix::from_transactions(vec![
            vec!["bread", "milk"],
            vec!["bread", "butter"],
            vec!["milk", "butter"],
            vec!["bread", "milk", "butter"],
        ])
    }

    fn set(items: &[&str]) -> Itemset {
        Itemset::new(items.iter().copied())
    }

    #[test]
    fn bread_milk_butter_at_half_support() {
        let found = mine(&bread_milk_butter(), 0.5).unwrap();
        assert_eq!(found.len(), 6);
        for item in ["bread", "milk", "butter"] {
            assert_eq!(found.support_of(&set(&[item])), Some(0.75));
        }
        assert_eq!(found.support_of(&set(&["bread", "milk"])), Some(0.5));
        assert_eq!(found.support_of(&set(&["bread", "butter"])), Some(0.5));
        assert_eq!(found.support_of(&set(&["butter", "milk"])), Some(0.5));
        assert!(found.get(&set(&["bread", "butter", "milk"])).is_none());
    }

    #[test]
    fn output_order_is_support_then_size_then_items() {
        let found = mine(&bread_milk_butter(), 0.25).unwrap();
        let order: Vec<String> = found.iter().map(|f| f.itemset.to_string()).collect();
        assert_eq!(
            order,
            vec![
                "{bread}",
                "{butter}",
                "{milk}",
                "{bread, butter}",
                "{bread, milk}",
                "{butter, milk}",
                "{bread, butter, milk}",
            ]
        );
    }

    #[test]
    fn transactions_match_itemset() {
        let found = mine(&bread_milk_butter(), 0.25).unwrap();
        let triple = found.get(&set(&["bread", "butter", "milk"])).unwrap();
        assert_eq!(triple.count, 1);
        assert_eq!(triple.transactions.iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn invalid_support_is_rejected() {
        let m = bread_milk_butter();
        for bad in [0.0, -0.1, 1.5, f64::NAN] {
            let err = mine(&m, bad).unwrap_err();
            assert!(matches!(
                err,
                BasketError::InvalidThreshold {
                    name: "min_support",
                    ..
                }
            ));
        }
    }

    #[test]
    fn nothing_frequent_is_an_error() {
        let m = TransactionMatrix::from_transactions(vec![vec!["a"], vec!["b"], vec!["c"]]);
        let err = mine(&m, 0.9).unwrap_err();
        assert!(matches!(err, BasketError::NoFrequentItemsets { .. }));
    }

    #[test]
    fn support_of_one_requires_every_transaction() {
        let m = TransactionMatrix::from_transactions(vec![vec!["a", "b"], vec!["a"]]);
        let found = mine(&m, 1.0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found.itemsets[0].itemset, set(&["a"]));
    }

    #[test]
    fn max_len_stops_early() {
        let options = MiningOptions {
            max_len: Some(1),
            ..MiningOptions::default()
        };
        let found = mine_with(&bread_milk_butter(), 0.25, &options).unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found.level_sizes(), vec![3]);
    }

    #[test]
    fn zero_max_len_is_rejected() {
        let options = MiningOptions {
            max_len: Some(0),
            ..MiningOptions::default()
        };
        let err = mine_with(&bread_milk_butter(), 0.25, &options).unwrap_err();
        assert!(matches!(err, BasketError::Config(_)));
    }

    #[test]
    fn cancelled_token_stops_mining() {
        let token = CancellationToken::new();
        token.cancel();
        let options = MiningOptions {
            cancel: Some(token),
            ..MiningOptions::default()
        };
        let err = mine_with(&bread_milk_butter(), 0.5, &options).unwrap_err();
        assert!(matches!(err, BasketError::Cancelled));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        // Enough items that level 2 crosses the parallel cutoff.
        let items: Vec<String> = (0..20).map(|i| format!("item{i:02}")).collect();
        let transactions: Vec<Vec<&str>> = (0..40)
            .map(|t| {
                items
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| (t + i) % 3 != 0)
                    .map(|(_, s)| s.as_str())
                    .collect()
            })
            .collect();
        let m = TransactionMatrix::from_transactions(transactions);

        let sequential = MiningOptions {
            parallel: false,
            max_len: Some(3),
            ..MiningOptions::default()
        };
        let parallel = MiningOptions {
            parallel: true,
            max_len: Some(3),
            ..MiningOptions::default()
        };
        let a = mine_with(&m, 0.3, &sequential).unwrap();
        let b = mine_with(&m, 0.3, &parallel).unwrap();
        let names = |f: &FrequentItemsets| -> Vec<(Itemset, usize)> {
            f.iter().map(|i| (i.itemset.clone(), i.count)).collect()
        };
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn prune_drops_candidates_with_infrequent_subset() {
        // {a,b} and {a,c} are frequent but {b,c} is not, so {a,b,c} is never counted.
        let m = TransactionMatrix::from_transactions(vec![
            vec!["a", "b"],
            vec!["a", "b"],
            vec!["a", "c"],
            vec!["a", "c"],
            vec!["b", "c", "a"],
        ]);
        let found = mine(&m, 0.4).unwrap();
        assert!(found.get(&set(&["b", "c"])).is_none());
        assert!(found.get(&set(&["a", "b", "c"])).is_none());
        assert!(found.get(&set(&["a", "b"])).is_some());
    }

    #[test]
    fn serializes_without_transactions() {
        let found = mine(&bread_milk_butter(), 0.5).unwrap();
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["minSupport"], 0.5);
        assert_eq!(json["itemsets"][0]["itemset"], serde_json::json!(["bread"]));
        assert!(json["itemsets"][0].get("transactions").is_none());
    }
}
