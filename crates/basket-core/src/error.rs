use std::path::PathBuf;

/// Errors that can occur across basket.
///
/// The analysis variants mirror the ways a dataset can fail to produce
/// patterns; the remaining variants wrap I/O and parsing domains. Library
/// crates return this type directly; the binary renders it through `miette`.
///
/// # Examples
///
/// ```
/// use basket_core::BasketError;
///
/// let err = BasketError::InvalidThreshold { name: "min_support", value: 1.5 };
/// assert!(err.to_string().contains("min_support"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum BasketError {
    /// The input table has no rows.
    #[error("dataset is empty")]
    #[diagnostic(code(basket::empty_dataset))]
    EmptyDataset,

    /// No layout matched and the boolean fallback produced no positive cells.
    #[error("unsupported format: {0}")]
    #[diagnostic(
        code(basket::unsupported_format),
        help("provide one basket per row as comma-separated items, an (id, item) pair per row, or a one-hot table")
    )]
    UnsupportedFormat(String),

    /// Every row produced zero items.
    #[error("no valid transactions found in the data")]
    #[diagnostic(code(basket::no_valid_transactions))]
    NoValidTransactions,

    /// A support or confidence threshold outside `(0, 1]`.
    #[error("{name} must be in (0, 1], got {value}")]
    #[diagnostic(code(basket::invalid_threshold))]
    InvalidThreshold {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// Mining at the requested support found no frequent single items.
    #[error("no frequent itemsets found with min_support={min_support}")]
    #[diagnostic(
        code(basket::no_frequent_itemsets),
        help("run `basket profile` for suggested thresholds, or pass a lower --min-support")
    )]
    NoFrequentItemsets {
        /// Support threshold that was used.
        min_support: f64,
    },

    /// Mining was cancelled between levels.
    #[error("analysis cancelled")]
    #[diagnostic(code(basket::cancelled))]
    Cancelled,

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed tabular input.
    #[error("parse error: {0}")]
    Parse(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BasketError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn invalid_threshold_names_parameter() {
        let err = BasketError::InvalidThreshold {
            name: "min_confidence",
            value: 0.0,
        };
        assert_eq!(err.to_string(), "min_confidence must be in (0, 1], got 0");
    }

    #[test]
    fn no_frequent_itemsets_shows_support() {
        let err = BasketError::NoFrequentItemsets { min_support: 0.25 };
        assert!(err.to_string().contains("0.25"));
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = BasketError::FileNotFound(PathBuf::from("/tmp/baskets.csv"));
        assert!(err.to_string().contains("/tmp/baskets.csv"));
    }
}
