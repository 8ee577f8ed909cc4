use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BasketError;

/// Top-level configuration loaded from `.basket.toml`.
///
/// Supports layered resolution: CLI flags > `--config` file > local
/// `.basket.toml` > defaults.
///
/// # Examples
///
/// ```
/// use basket_core::BasketConfig;
///
/// let config = BasketConfig::default();
/// assert_eq!(config.analysis.min_support, 0.1);
/// assert_eq!(config.output.limit, 20);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasketConfig {
    /// Mining thresholds and fallback policies.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// CSV ingestion settings.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl BasketConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::Io`] if the file cannot be read,
    /// [`BasketError::Toml`] if the content is not valid TOML, or
    /// [`BasketError::InvalidThreshold`] if a threshold is out of range.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use basket_core::BasketConfig;
    /// use std::path::Path;
    ///
    /// let config = BasketConfig::from_file(Path::new(".basket.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, BasketError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::Toml`] if parsing fails, or
    /// [`BasketError::InvalidThreshold`] if a threshold is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use basket_core::BasketConfig;
    ///
    /// let toml = r#"
    /// [analysis]
    /// min_support = 0.05
    /// "#;
    /// let config = BasketConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.analysis.min_support, 0.05);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, BasketError> {
        let config: Self = toml::from_str(content)?;
        config.analysis.validate()?;
        Ok(config)
    }
}

/// Mining thresholds and the caller-side fallback policies.
///
/// # Examples
///
/// ```
/// use basket_core::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.min_confidence, 0.3);
/// assert!(!config.support_fallback);
/// assert_eq!(config.confidence_fallback, None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum itemset support (default: 0.1).
    #[serde(default = "default_min_support")]
    pub min_support: f64,
    /// Minimum rule confidence (default: 0.3).
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Re-mine at the `very_low` suggestion when nothing is frequent (default: false).
    #[serde(default)]
    pub support_fallback: bool,
    /// Confidence to retry with when no rule passes `min_confidence`.
    pub confidence_fallback: Option<f64>,
    /// Largest itemset size to mine. Unlimited when absent.
    pub max_len: Option<usize>,
    /// Count candidate supports on the rayon pool (default: true).
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_min_support() -> f64 {
    0.1
}

fn default_min_confidence() -> f64 {
    0.3
}

fn default_parallel() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_support: default_min_support(),
            min_confidence: default_min_confidence(),
            support_fallback: false,
            confidence_fallback: None,
            max_len: None,
            parallel: default_parallel(),
        }
    }
}

impl AnalysisConfig {
    /// Reject thresholds outside `(0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::InvalidThreshold`] naming the first bad value.
    pub fn validate(&self) -> Result<(), BasketError> {
        crate::validate_threshold("min_support", self.min_support)?;
        crate::validate_threshold("min_confidence", self.min_confidence)?;
        if let Some(floor) = self.confidence_fallback {
            crate::validate_threshold("confidence_fallback", floor)?;
        }
        if self.max_len == Some(0) {
            return Err(BasketError::Config("max_len must be at least 1".into()));
        }
        Ok(())
    }
}

/// CSV ingestion configuration.
///
/// # Examples
///
/// ```
/// use basket_core::IngestConfig;
///
/// let config = IngestConfig::default();
/// assert_eq!(config.delimiters, vec![',', ';', '\t']);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Field delimiters to try, in order (default: comma, semicolon, tab).
    #[serde(default = "default_delimiters")]
    pub delimiters: Vec<char>,
}

fn default_delimiters() -> Vec<char> {
    vec![',', ';', '\t']
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            delimiters: default_delimiters(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Maximum rows per section in text and markdown output (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Analyses the MCP server keeps before evicting the oldest (default: 32).
    #[serde(default = "default_max_stored_analyses")]
    pub max_stored_analyses: usize,
}

fn default_limit() -> usize {
    20
}

fn default_max_stored_analyses() -> usize {
    32
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            max_stored_analyses: default_max_stored_analyses(),
        }
    }
}
