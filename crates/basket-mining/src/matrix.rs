//! Binary transaction matrix stored column-wise as bitsets.
//!
//! Each vocabulary item owns a [`TransactionSet`] of the rows containing it,
//! so the support of an itemset is the population count of the intersection
//! of its items' sets, costing `O(transactions / 64)` per conjunction.

use std::collections::BTreeSet;

const WORD_BITS: usize = 64;

/// A set of transaction indices, stored as a fixed-width bitset.
///
/// # Examples
///
/// ```
/// use basket_mining::matrix::TransactionSet;
///
/// let mut a = TransactionSet::empty(100);
/// a.insert(3);
/// a.insert(70);
/// let mut b = TransactionSet::empty(100);
/// b.insert(70);
/// assert_eq!(a.intersection(&b).iter().collect::<Vec<_>>(), vec![70]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionSet {
    words: Vec<u64>,
    universe: usize,
}

impl TransactionSet {
    /// An empty set over `universe` transactions.
    pub fn empty(universe: usize) -> Self {
        Self {
            words: vec![0; universe.div_ceil(WORD_BITS)],
            universe,
        }
    }

    /// Number of transactions this set ranges over.
    pub fn universe(&self) -> usize {
        self.universe
    }

    /// Add transaction `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= universe`.
    pub fn insert(&mut self, index: usize) {
        assert!(index < self.universe, "transaction index out of range");
        self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
    }

    /// Returns `true` if transaction `index` is in the set.
    pub fn contains(&self, index: usize) -> bool {
        index < self.universe && self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    /// Number of transactions in the set.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns `true` if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Transactions present in both sets.
    pub fn intersection(&self, other: &Self) -> Self {
        debug_assert_eq!(self.universe, other.universe);
        Self {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & b)
                .collect(),
            universe: self.universe,
        }
    }

    /// Size of the intersection, without allocating it.
    pub fn intersection_count(&self, other: &Self) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Merge `other` into `self`.
    pub fn union_with(&mut self, other: &Self) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    /// Member indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let offset = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(wi * WORD_BITS + offset)
            })
        })
    }
}

/// Canonical binary transaction matrix.
///
/// Columns are the vocabulary in lexicographic order; rows are transactions
/// in input order. Equal inputs always produce equal matrices.
///
/// # Examples
///
/// ```
/// use basket_mining::matrix::TransactionMatrix;
///
/// let m = TransactionMatrix::from_transactions(vec![
///     vec!["milk", "bread"],
///     vec!["bread", "bread"],
/// ]);
/// assert_eq!(m.items(), &["bread".to_string(), "milk".to_string()]);
/// assert_eq!(m.n_transactions(), 2);
/// assert_eq!(m.item_count(0), 2);
/// assert!(!m.contains(1, 1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionMatrix {
    items: Vec<String>,
    columns: Vec<TransactionSet>,
    n_transactions: usize,
}

impl TransactionMatrix {
    /// Build a matrix from item lists, one per transaction.
    ///
    /// Duplicate items within a transaction collapse. Empty transactions are
    /// kept as all-zero rows; callers drop them beforehand if undesired.
    pub fn from_transactions<I, T, S>(transactions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows: Vec<BTreeSet<String>> = transactions
            .into_iter()
            .map(|t| t.into_iter().map(|s| s.as_ref().to_string()).collect())
            .collect();
        let vocabulary: BTreeSet<&String> = rows.iter().flatten().collect();
        let items: Vec<String> = vocabulary.into_iter().cloned().collect();

        let n_transactions = rows.len();
        let mut columns = vec![TransactionSet::empty(n_transactions); items.len()];
        for (row, basket) in rows.iter().enumerate() {
            for item in basket {
                if let Ok(col) = items.binary_search(item) {
                    columns[col].insert(row);
                }
            }
        }

        Self {
            items,
            columns,
            n_transactions,
        }
    }

    /// Build a matrix from named columns over `n_transactions` rows.
    ///
    /// Columns are sorted by name; columns sharing a name are merged by OR.
    ///
    /// # Examples
    ///
    /// ```
    /// use basket_mining::matrix::{TransactionMatrix, TransactionSet};
    ///
    /// let mut eggs = TransactionSet::empty(2);
    /// eggs.insert(1);
    /// let m = TransactionMatrix::from_columns(2, vec![
    ///     ("eggs".to_string(), eggs),
    ///     ("apples".to_string(), TransactionSet::empty(2)),
    /// ]);
    /// assert_eq!(m.items()[0], "apples");
    /// assert!(m.contains(1, 1));
    /// ```
    pub fn from_columns<I>(n_transactions: usize, columns: I) -> Self
    where
        I: IntoIterator<Item = (String, TransactionSet)>,
    {
        let mut named: Vec<(String, TransactionSet)> = Vec::new();
        for (name, set) in columns {
            debug_assert_eq!(set.universe(), n_transactions);
            match named.iter_mut().find(|(n, _)| *n == name) {
                Some((_, existing)) => existing.union_with(&set),
                None => named.push((name, set)),
            }
        }
        named.sort_by(|a, b| a.0.cmp(&b.0));

        let (items, columns) = named.into_iter().unzip();
        Self {
            items,
            columns,
            n_transactions,
        }
    }

    /// Number of transactions (rows).
    pub fn n_transactions(&self) -> usize {
        self.n_transactions
    }

    /// Number of vocabulary items (columns).
    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    /// Vocabulary in column order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Name of column `col`.
    pub fn item(&self, col: usize) -> &str {
        &self.items[col]
    }

    /// Column index of `item`, if it is in the vocabulary.
    pub fn index_of(&self, item: &str) -> Option<usize> {
        self.items
            .binary_search_by(|probe| probe.as_str().cmp(item))
            .ok()
    }

    /// Transactions containing item `col`.
    pub fn column(&self, col: usize) -> &TransactionSet {
        &self.columns[col]
    }

    /// Returns `true` if transaction `row` contains item `col`.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.columns[col].contains(row)
    }

    /// Number of transactions containing item `col`.
    pub fn item_count(&self, col: usize) -> usize {
        self.columns[col].count()
    }

    /// Total number of positive cells.
    pub fn total_positives(&self) -> usize {
        self.columns.iter().map(TransactionSet::count).sum()
    }

    /// Transactions containing every item in `cols`.
    ///
    /// An empty `cols` yields every transaction.
    pub fn transactions_containing(&self, cols: &[usize]) -> TransactionSet {
        let Some((&first, rest)) = cols.split_first() else {
            let mut all = TransactionSet::empty(self.n_transactions);
            for row in 0..self.n_transactions {
                all.insert(row);
            }
            return all;
        };
        rest.iter().fold(self.columns[first].clone(), |acc, &col| {
            acc.intersection(&self.columns[col])
        })
    }

    /// One row as booleans in column order.
    pub fn row(&self, row: usize) -> Vec<bool> {
        self.columns.iter().map(|c| c.contains(row)).collect()
    }

    /// Items present in transaction `row`, in column order.
    pub fn transaction_items(&self, row: usize) -> Vec<&str> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.contains(row))
            .map(|(col, _)| self.items[col].as_str())
            .collect()
    }
}
