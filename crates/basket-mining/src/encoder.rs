//! Normalization of tabular input into a [`TransactionMatrix`].
//!
//! Layout detection runs a fixed list of rules in priority order and records
//! which one matched, so the same table always encodes the same way.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use basket_core::{BasketError, Cell, RawTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::matrix::{TransactionMatrix, TransactionSet};

/// Values treated as "present" in an already-encoded table, after trimming
/// and lowercasing.
const TRUTHY: &[&str] = &["1", "true", "yes", "y", "t", "x"];

/// The input layout recognized by [`encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputLayout {
    /// Two columns: a transaction id and an item/product per row.
    GroupedIdItem,
    /// One column of comma-separated item lists.
    SingleColumnList,
    /// A column whose header mentions `item`, holding comma-separated lists.
    NamedItemColumn,
    /// A one-hot table: one column per item.
    AlreadyEncoded,
}

impl fmt::Display for InputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputLayout::GroupedIdItem => write!(f, "grouped id/item"),
            InputLayout::SingleColumnList => write!(f, "single-column list"),
            InputLayout::NamedItemColumn => write!(f, "named item column"),
            InputLayout::AlreadyEncoded => write!(f, "already encoded"),
        }
    }
}

/// Output of [`encode`]: the matrix plus how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedDataset {
    /// Which detection rule matched.
    pub layout: InputLayout,
    /// Canonical binary matrix.
    pub matrix: TransactionMatrix,
    /// Group keys, one per row, for [`InputLayout::GroupedIdItem`] input.
    pub labels: Option<Vec<String>>,
}

/// Normalize a raw table into an [`EncodedDataset`].
///
/// Columns with an empty header or one starting with `Unnamed` are dropped
/// first. The first matching rule wins:
///
/// 1. two columns whose second header contains `item` or `product`:
///    rows are grouped by the first column into transactions;
/// 2. a single column of comma-separated item lists;
/// 3. the first column whose header contains `item`, split the same way
///    (falls through when it yields nothing);
/// 4. a one-hot table of truthy cells.
///
/// # Errors
///
/// - [`BasketError::EmptyDataset`] if the table has no rows.
/// - [`BasketError::NoValidTransactions`] if a list layout yields no items.
/// - [`BasketError::UnsupportedFormat`] if the one-hot fallback finds no
///   positive cell.
///
/// # Examples
///
/// ```
/// use basket_core::RawTable;
/// use basket_mining::{encode, InputLayout};
///
/// let table = RawTable::single_column("items", ["a,b", "a,c", "b,c"]);
/// let dataset = encode(&table).unwrap();
/// assert_eq!(dataset.layout, InputLayout::SingleColumnList);
/// assert_eq!(dataset.matrix.n_items(), 3);
/// assert_eq!(dataset.matrix.n_transactions(), 3);
/// ```
pub fn encode(table: &RawTable) -> Result<EncodedDataset, BasketError> {
    if table.is_empty() {
        return Err(BasketError::EmptyDataset);
    }

    let table = table.retain_columns(|_, name| {
        let name = name.trim();
        !name.is_empty() && !name.starts_with("Unnamed")
    });
    if table.column_count() == 0 {
        return Err(BasketError::UnsupportedFormat(
            "no named columns remain after dropping index columns".into(),
        ));
    }

    let dataset = if is_grouped_layout(&table) {
        encode_grouped(&table)?
    } else if table.column_count() == 1 {
        let transactions = split_lists(&table, 0);
        if transactions.is_empty() {
            return Err(BasketError::NoValidTransactions);
        }
        EncodedDataset {
            layout: InputLayout::SingleColumnList,
            matrix: TransactionMatrix::from_transactions(transactions),
            labels: None,
        }
    } else {
        match encode_named_item_column(&table) {
            Some(dataset) => dataset,
            None => encode_one_hot(&table)?,
        }
    };

    info!(
        layout = %dataset.layout,
        transactions = dataset.matrix.n_transactions(),
        items = dataset.matrix.n_items(),
        "encoded dataset"
    );
    Ok(dataset)
}

fn is_grouped_layout(table: &RawTable) -> bool {
    if table.column_count() != 2 {
        return false;
    }
    let header = table.columns[1].to_lowercase();
    header.contains("item") || header.contains("product")
}

/// Ordering key for transaction ids: numbers first, numerically, then text.
/// Identity is always the source text, so `7` and `007` stay distinct orders.
#[derive(Debug, Clone)]
enum GroupKey {
    Number { value: f64, raw: String },
    Text(String),
}

impl GroupKey {
    fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Empty => None,
            Cell::Number { value, raw } => Some(GroupKey::Number {
                value: *value,
                raw: raw.clone(),
            }),
            Cell::Text(s) => Some(GroupKey::Text(s.clone())),
        }
    }

    fn label(&self) -> String {
        match self {
            GroupKey::Number { raw, .. } => raw.clone(),
            GroupKey::Text(s) => s.clone(),
        }
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (
                GroupKey::Number { value: a, raw: ra },
                GroupKey::Number { value: b, raw: rb },
            ) => a.total_cmp(b).then_with(|| ra.cmp(rb)),
            (GroupKey::Number { .. }, GroupKey::Text(_)) => Ordering::Less,
            (GroupKey::Text(_), GroupKey::Number { .. }) => Ordering::Greater,
            (GroupKey::Text(a), GroupKey::Text(b)) => a.cmp(b),
        }
    }
}

fn encode_grouped(table: &RawTable) -> Result<EncodedDataset, BasketError> {
    let mut groups: BTreeMap<GroupKey, Vec<String>> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in &table.rows {
        let key = GroupKey::from_cell(&row[0]);
        let item = (!row[1].is_empty()).then(|| row[1].as_str().to_string());
        match (key, item) {
            (Some(key), Some(item)) => groups.entry(key).or_default().push(item),
            _ => skipped += 1,
        }
    }

    if groups.is_empty() {
        return Err(BasketError::NoValidTransactions);
    }
    if skipped > 0 {
        debug!(skipped, "skipped rows with an empty id or item");
    }

    let labels = groups.keys().map(GroupKey::label).collect();
    Ok(EncodedDataset {
        layout: InputLayout::GroupedIdItem,
        matrix: TransactionMatrix::from_transactions(groups.into_values()),
        labels: Some(labels),
    })
}

fn encode_named_item_column(table: &RawTable) -> Option<EncodedDataset> {
    let col = table
        .columns
        .iter()
        .position(|name| name.to_lowercase().contains("item"))?;
    let transactions = split_lists(table, col);
    if transactions.is_empty() {
        debug!(
            column = %table.columns[col],
            "item column holds no items, treating table as one-hot"
        );
        return None;
    }
    Some(EncodedDataset {
        layout: InputLayout::NamedItemColumn,
        matrix: TransactionMatrix::from_transactions(transactions),
        labels: None,
    })
}

/// Split each cell of column `col` on commas, dropping empty items and rows.
fn split_lists(table: &RawTable, col: usize) -> Vec<Vec<String>> {
    table
        .column(col)
        .map(|cell| {
            cell.as_str()
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .filter(|items| !items.is_empty())
        .collect()
}

fn is_truthy(cell: &Cell) -> bool {
    match cell {
        Cell::Empty => false,
        Cell::Number { value, .. } => *value != 0.0,
        Cell::Text(s) => TRUTHY.contains(&s.trim().to_lowercase().as_str()),
    }
}

fn encode_one_hot(table: &RawTable) -> Result<EncodedDataset, BasketError> {
    let n = table.row_count();
    let columns = table.columns.iter().enumerate().map(|(col, name)| {
        let mut set = TransactionSet::empty(n);
        for (row, cell) in table.column(col).enumerate() {
            if is_truthy(cell) {
                set.insert(row);
            }
        }
        (name.trim().to_string(), set)
    });
    let matrix = TransactionMatrix::from_columns(n, columns);

    if matrix.total_positives() == 0 {
        return Err(BasketError::UnsupportedFormat(
            "table is not a recognized basket layout and has no truthy cells".into(),
        ));
    }

    Ok(EncodedDataset {
        layout: InputLayout::AlreadyEncoded,
        matrix,
        labels: None,
    })
}
