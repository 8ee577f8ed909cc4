//! Support threshold suggestions from item frequency statistics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::matrix::TransactionMatrix;

/// Five support thresholds, from permissive to selective.
///
/// Derived from the per-item frequencies of one matrix:
///
/// | tier           | formula                    |
/// |----------------|----------------------------|
/// | `very_low`     | `max(0.01, min * 0.5)`     |
/// | `low`          | `max(0.02, min)`           |
/// | `conservative` | `max(0.05, median * 0.3)`  |
/// | `moderate`     | `max(0.10, median * 0.5)`  |
/// | `strict`       | `max(0.20, median)`        |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ThresholdSuggestions {
    pub very_low: f64,
    pub low: f64,
    pub conservative: f64,
    pub moderate: f64,
    pub strict: f64,
}

impl ThresholdSuggestions {
    /// Threshold for `tier`.
    pub fn get(&self, tier: ThresholdTier) -> f64 {
        match tier {
            ThresholdTier::VeryLow => self.very_low,
            ThresholdTier::Low => self.low,
            ThresholdTier::Conservative => self.conservative,
            ThresholdTier::Moderate => self.moderate,
            ThresholdTier::Strict => self.strict,
        }
    }

    /// Tiers paired with their thresholds, most permissive first.
    pub fn tiers(&self) -> [(ThresholdTier, f64); 5] {
        ThresholdTier::ALL.map(|tier| (tier, self.get(tier)))
    }
}

/// Names one of the [`ThresholdSuggestions`].
///
/// # Examples
///
/// ```
/// use basket_mining::ThresholdTier;
///
/// let tier: ThresholdTier = "very-low".parse().unwrap();
/// assert_eq!(tier, ThresholdTier::VeryLow);
/// assert_eq!(tier.to_string(), "very_low");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdTier {
    VeryLow,
    Low,
    Conservative,
    Moderate,
    Strict,
}

impl ThresholdTier {
    pub const ALL: [ThresholdTier; 5] = [
        ThresholdTier::VeryLow,
        ThresholdTier::Low,
        ThresholdTier::Conservative,
        ThresholdTier::Moderate,
        ThresholdTier::Strict,
    ];

    /// What mining at this tier tends to keep.
    pub fn description(self) -> &'static str {
        match self {
            ThresholdTier::VeryLow => "most patterns, including rare items",
            ThresholdTier::Low => "every item at least once",
            ThresholdTier::Conservative => "a balanced set of patterns",
            ThresholdTier::Moderate => "fewer, more reliable patterns",
            ThresholdTier::Strict => "only the most common items",
        }
    }
}

impl fmt::Display for ThresholdTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdTier::VeryLow => write!(f, "very_low"),
            ThresholdTier::Low => write!(f, "low"),
            ThresholdTier::Conservative => write!(f, "conservative"),
            ThresholdTier::Moderate => write!(f, "moderate"),
            ThresholdTier::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for ThresholdTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "very_low" => Ok(ThresholdTier::VeryLow),
            "low" => Ok(ThresholdTier::Low),
            "conservative" => Ok(ThresholdTier::Conservative),
            "moderate" => Ok(ThresholdTier::Moderate),
            "strict" => Ok(ThresholdTier::Strict),
            other => Err(format!(
                "unknown support tier: {other} (expected very_low, low, conservative, moderate, strict)"
            )),
        }
    }
}

/// Minimum, median and maximum of the per-item frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyStats {
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

/// Fraction of transactions containing each item, in column order.
pub fn item_frequencies(matrix: &TransactionMatrix) -> Vec<f64> {
    let n = matrix.n_transactions();
    if n == 0 {
        return vec![0.0; matrix.n_items()];
    }
    (0..matrix.n_items())
        .map(|col| matrix.item_count(col) as f64 / n as f64)
        .collect()
}

/// Summary statistics of `frequencies`; `None` when it is empty.
///
/// The median of an even count is the mean of the two middle values.
pub fn frequency_stats(frequencies: &[f64]) -> Option<FrequencyStats> {
    if frequencies.is_empty() {
        return None;
    }
    let mut sorted = frequencies.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    Some(FrequencyStats {
        min: sorted[0],
        median,
        max: sorted[sorted.len() - 1],
    })
}

/// Suggest support thresholds for mining `matrix`.
///
/// An empty vocabulary yields the floor of every tier.
///
/// # Examples
///
/// ```
/// use basket_mining::{matrix::TransactionMatrix, suggest_thresholds};
///
/// let m = TransactionMatrix::from_transactions(vec![
///     vec!["bread", "milk"],
///     vec!["bread", "butter"],
///     vec!["milk", "butter"],
///     vec!["bread", "milk", "butter"],
/// ]);
/// let s = suggest_thresholds(&m);
/// assert_eq!(s.low, 0.75);
/// assert_eq!(s.strict, 0.75);
/// ```
pub fn suggest_thresholds(matrix: &TransactionMatrix) -> ThresholdSuggestions {
    let stats = frequency_stats(&item_frequencies(matrix)).unwrap_or(FrequencyStats {
        min: 0.0,
        median: 0.0,
        max: 0.0,
    });
    ThresholdSuggestions {
        very_low: f64::max(0.01, stats.min * 0.5),
        low: f64::max(0.02, stats.min),
        conservative: f64::max(0.05, stats.median * 0.3),
        moderate: f64::max(0.10, stats.median * 0.5),
        strict: f64::max(0.20, stats.median),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn median_of_even_count_averages_middle() {
        let stats = frequency_stats(&[0.4, 0.1, 0.3, 0.2]).unwrap();
        assert!(approx(stats.median, 0.25));
        assert_eq!(stats.min, 0.1);
        assert_eq!(stats.max, 0.4);
    }

    #[test]
    fn median_of_odd_count_is_middle() {
        let stats = frequency_stats(&[0.9, 0.1, 0.5]).unwrap();
        assert_eq!(stats.median, 0.5);
    }

    #[test]
    fn empty_frequencies_have_no_stats() {
        assert!(frequency_stats(&[]).is_none());
    }

    #[test]
    fn floors_apply_to_rare_items() {
        // 100 transactions, one item in each except a rare one in a single row.
        let mut transactions: Vec<Vec<&str>> = vec![vec!["common"]; 99];
        transactions.push(vec!["common", "rare"]);
        let m = TransactionMatrix::from_transactions(transactions);
        let s = suggest_thresholds(&m);
        assert!(approx(s.very_low, 0.01));
        assert!(approx(s.low, 0.02));
        // median of [1.0, 0.01] = 0.505
        assert!(approx(s.conservative, 0.505 * 0.3));
        assert!(approx(s.moderate, 0.2525));
        assert!(approx(s.strict, 0.505));
    }

    #[test]
    fn scaled_values_win_over_floors() {
        let m = TransactionMatrix::from_transactions(vec![vec!["a", "b"], vec!["a"]]);
        let s = suggest_thresholds(&m);
        // frequencies a=1.0, b=0.5
        assert!(approx(s.very_low, 0.25));
        assert!(approx(s.low, 0.5));
        assert!(approx(s.conservative, 0.225));
        assert!(approx(s.moderate, 0.375));
        assert!(approx(s.strict, 0.75));
    }

    #[test]
    fn empty_matrix_uses_floors() {
        let m = TransactionMatrix::from_transactions(Vec::<Vec<&str>>::new());
        let s = suggest_thresholds(&m);
        assert_eq!(s.very_low, 0.01);
        assert_eq!(s.strict, 0.2);
    }

    #[test]
    fn tier_lookup_and_parsing() {
        let s = ThresholdSuggestions {
            very_low: 0.01,
            low: 0.02,
            conservative: 0.05,
            moderate: 0.1,
            strict: 0.2,
        };
        assert_eq!(s.get(ThresholdTier::Moderate), 0.1);
        assert_eq!(s.tiers()[0], (ThresholdTier::VeryLow, 0.01));
        assert_eq!("STRICT".parse::<ThresholdTier>().unwrap(), ThresholdTier::Strict);
        assert!("extreme".parse::<ThresholdTier>().is_err());
    }

    #[test]
    fn serialized_keys_match_tier_names() {
        let m = TransactionMatrix::from_transactions(vec![vec!["a"]]);
        let suggestions = suggest_thresholds(&m);
        let json = serde_json::to_value(suggestions).unwrap();
        for (tier, value) in suggestions.tiers() {
            let key = tier.to_string();
            assert_eq!(json[key.as_str()], value, "{key}");
            assert_eq!(key.parse::<ThresholdTier>().unwrap(), tier);
        }
        assert!(json.get("veryLow").is_none());
    }
}
