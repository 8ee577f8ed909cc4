use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single typed cell of a [`RawTable`].
///
/// # Examples
///
/// ```
/// use basket_core::Cell;
///
/// assert_eq!(Cell::parse("  "), Cell::Empty);
/// assert_eq!(Cell::parse("1.5").as_number(), Some(1.5));
/// assert_eq!(Cell::parse(" 007 ").as_str(), "007");
/// assert_eq!(Cell::parse(" milk "), Cell::Text("milk".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value.
    Empty,
    /// A value that parsed as a number. `raw` is the trimmed source text,
    /// which stays the cell's identity.
    Number { value: f64, raw: String },
    /// Any other text, trimmed.
    Text(String),
}

impl Cell {
    /// Type a raw field: blank becomes [`Cell::Empty`], numeric text becomes
    /// [`Cell::Number`], anything else is kept as trimmed [`Cell::Text`].
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Number {
                value,
                raw: trimmed.to_string(),
            },
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    /// Returns `true` for [`Cell::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The cell's text as it appeared in the input, trimmed.
    pub fn as_str(&self) -> &str {
        match self {
            Cell::Empty => "",
            Cell::Number { raw, .. } => raw,
            Cell::Text(s) => s,
        }
    }

    /// The numeric value, for [`Cell::Number`] only.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number { value, .. } => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A header row plus typed data rows, as produced by ingestion.
///
/// Rows are padded or truncated to the header width on construction.
///
/// # Examples
///
/// ```
/// use basket_core::{Cell, RawTable};
///
/// let table = RawTable::new(
///     vec!["items".into()],
///     vec![vec![Cell::Text("bread,milk".into())]],
/// );
/// assert_eq!(table.row_count(), 1);
/// assert_eq!(table.column_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTable {
    /// Column headers.
    pub columns: Vec<String>,
    /// Data rows, each exactly `columns.len()` wide.
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Build a table, padding short rows with [`Cell::Empty`].
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Build a single-column table from one text value per row.
    ///
    /// # Examples
    ///
    /// ```
    /// use basket_core::RawTable;
    ///
    /// let table = RawTable::single_column("items", ["a,b", "a,c"]);
    /// assert_eq!(table.columns, vec!["items".to_string()]);
    /// assert_eq!(table.row_count(), 2);
    /// ```
    pub fn single_column<I, S>(header: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = values
            .into_iter()
            .map(|v| vec![Cell::parse(v.as_ref())])
            .collect();
        Self::new(vec![header.to_string()], rows)
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate the cells of column `index`, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Keep only the columns whose index satisfies `keep`.
    pub fn retain_columns(&self, keep: impl Fn(usize, &str) -> bool) -> Self {
        let indices: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, name)| keep(*i, name))
            .map(|(i, _)| i)
            .collect();
        Self {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use basket_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
