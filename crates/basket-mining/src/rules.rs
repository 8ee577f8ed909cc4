//! Association rules derived from frequent itemsets.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use basket_core::BasketError;
use serde::Serialize;
use tracing::debug;

use crate::apriori::{FrequentItemset, FrequentItemsets};
use crate::itemset::Itemset;

/// An implication `antecedent => consequent` with its quality metrics.
///
/// # Examples
///
/// ```
/// use basket_mining::{generate_rules, matrix::TransactionMatrix, mine};
///
/// let m = TransactionMatrix::from_transactions(vec![
///     vec!["bread", "milk"],
///     vec!["bread", "butter"],
///     vec!["milk", "butter"],
///     vec!["bread", "milk", "butter"],
/// ]);
/// let rules = generate_rules(&mine(&m, 0.5).unwrap(), 0.6).unwrap();
/// let rule = rules
///     .iter()
///     .find(|r| r.to_string() == "{bread} => {milk}")
///     .unwrap();
/// assert!((rule.confidence - 0.667).abs() < 1e-3);
/// assert!((rule.lift - 0.889).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationRule {
    pub antecedent: Itemset,
    pub consequent: Itemset,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    /// Support of `antecedent ∪ consequent`.
    pub support: f64,
    /// `support / antecedent_support`.
    pub confidence: f64,
    /// `confidence / consequent_support`; above 1 means positive association.
    pub lift: f64,
    /// `support - antecedent_support * consequent_support`.
    pub leverage: f64,
    /// `(1 - consequent_support) / (1 - confidence)`, `None` when confidence is 1.
    pub conviction: Option<f64>,
    /// Number of transactions containing both sides.
    pub n_transactions: usize,
    /// Indices of the transactions containing both sides, ascending.
    pub supporting_transactions: Vec<usize>,
}

impl fmt::Display for AssociationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.antecedent, self.consequent)
    }
}

/// Derive every rule whose confidence reaches `min_confidence`.
///
/// Each frequent itemset of two or more items is split into every non-empty
/// proper antecedent and its complement. Rules are filtered after
/// enumeration and returned by confidence, then lift, both descending.
/// An empty result is not an error.
///
/// # Errors
///
/// Returns [`BasketError::InvalidThreshold`] if `min_confidence` is outside `(0, 1]`.
pub fn generate_rules(
    itemsets: &FrequentItemsets,
    min_confidence: f64,
) -> Result<Vec<AssociationRule>, BasketError> {
    basket_core::validate_threshold("min_confidence", min_confidence)?;

    let n = itemsets.n_transactions;
    let by_items: HashMap<&Itemset, &FrequentItemset> =
        itemsets.iter().map(|f| (&f.itemset, f)).collect();

    let mut rules = Vec::new();
    let mut enumerated = 0usize;
    for union in itemsets.iter().filter(|f| f.itemset.len() >= 2) {
        let items = union.itemset.items();
        for size in 1..items.len() {
            for picked in combinations(items.len(), size) {
                enumerated += 1;
                let antecedent = Itemset::new(picked.iter().map(|&i| items[i].as_str()));
                let consequent = union.itemset.difference(&antecedent);
                let (Some(ante), Some(cons)) =
                    (by_items.get(&antecedent), by_items.get(&consequent))
                else {
                    debug!(itemset = %union.itemset, "subset missing from frequent itemsets");
                    continue;
                };

                let confidence = union.count as f64 / ante.count as f64;
                if confidence < min_confidence {
                    continue;
                }
                rules.push(build_rule(union, ante, cons, confidence, n));
            }
        }
    }
    debug!(enumerated, kept = rules.len(), min_confidence, "generated rules");

    rules.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.lift.partial_cmp(&a.lift).unwrap_or(Ordering::Equal))
            .then_with(|| a.antecedent.cmp(&b.antecedent))
            .then_with(|| a.consequent.cmp(&b.consequent))
    });
    Ok(rules)
}

fn build_rule(
    union: &FrequentItemset,
    ante: &FrequentItemset,
    cons: &FrequentItemset,
    confidence: f64,
    n: usize,
) -> AssociationRule {
    let support = union.support;
    let consequent_support = cons.support;
    let lift = if consequent_support > 0.0 {
        confidence / consequent_support
    } else {
        0.0
    };
    let conviction =
        (union.count < ante.count).then(|| (1.0 - consequent_support) / (1.0 - confidence));
    let supporting_transactions: Vec<usize> = union.transactions.iter().collect();
    debug_assert_eq!(supporting_transactions.len(), union.count);
    debug_assert!(union.count <= n);

    AssociationRule {
        antecedent: ante.itemset.clone(),
        consequent: cons.itemset.clone(),
        antecedent_support: ante.support,
        consequent_support,
        support,
        confidence,
        lift,
        leverage: support - ante.support * consequent_support,
        conviction,
        n_transactions: union.count,
        supporting_transactions,
    }
}

/// All `k`-element index subsets of `0..n`, in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k == 0 || k > n {
        return out;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.clone());
        let Some(pos) = (0..k).rev().find(|&i| idx[i] != i + n - k) else {
            return out;
        };
        idx[pos] += 1;
        for j in pos + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apriori::mine;
    use crate::matrix::TransactionMatrix;

    fn bread_milk_butter() -> FrequentItemsets {
        let m = TransactionMatrix::from_transactions(vec![
            vec!["bread", "milk"],
            vec!["bread", "butter"],
            vec!["milk", "butter"],
            vec!["bread", "milk", "butter"],
        ]);
        mine(&m, 0.5).unwrap()
    }

    #[test]
    fn bread_implies_milk() {
        let rules = generate_rules(&bread_milk_butter(), 0.6).unwrap();
        assert_eq!(rules.len(), 6);
        let rule = rules
            .iter()
            .find(|r| {
                r.antecedent == Itemset::new(["bread"]) && r.consequent == Itemset::new(["milk"])
            })
            .unwrap();
        assert!((rule.confidence - 2.0 / 3.0).abs() < 1e-9);
        assert!((rule.lift - 8.0 / 9.0).abs() < 1e-9);
        assert!((rule.support - 0.5).abs() < 1e-9);
        assert_eq!(rule.antecedent_support, 0.75);
        assert_eq!(rule.consequent_support, 0.75);
        assert!((rule.leverage - (0.5 - 0.5625)).abs() < 1e-9);
        assert!((rule.conviction.unwrap() - 0.75).abs() < 1e-9);
        assert_eq!(rule.supporting_transactions, vec![0, 3]);
        assert_eq!(rule.n_transactions, 2);
    }

    #[test]
    fn high_confidence_filters_everything() {
        let rules = generate_rules(&bread_milk_butter(), 0.9).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn perfect_rule_has_no_conviction() {
        let m = TransactionMatrix::from_transactions(vec![
            vec!["chips", "salsa"],
            vec!["chips", "salsa"],
            vec!["chips"],
        ]);
        let rules = generate_rules(&mine(&m, 0.5).unwrap(), 0.5).unwrap();
        let first = &rules[0];
        assert_eq!(first.to_string(), "{salsa} => {chips}");
        assert_eq!(first.confidence, 1.0);
        assert!(first.conviction.is_none());
        assert_eq!(rules[1].to_string(), "{chips} => {salsa}");
    }

    #[test]
    fn rules_from_triples_cover_all_splits() {
        let m = TransactionMatrix::from_transactions(vec![vec!["a", "b", "c"]; 3]);
        let rules = generate_rules(&mine(&m, 0.5).unwrap(), 0.5).unwrap();
        // 3 pairs * 2 splits + 1 triple * 6 splits
        assert_eq!(rules.len(), 12);
        for rule in &rules {
            let union = rule.antecedent.union(&rule.consequent);
            assert_eq!(union.len(), rule.antecedent.len() + rule.consequent.len());
            assert!((0.0..=1.0).contains(&rule.confidence));
        }
    }

    #[test]
    fn single_items_only_give_no_rules() {
        let m = TransactionMatrix::from_transactions(vec![vec!["a"], vec!["b"]]);
        let rules = generate_rules(&mine(&m, 0.5).unwrap(), 0.1).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn invalid_confidence_is_rejected() {
        let err = generate_rules(&bread_milk_butter(), 0.0).unwrap_err();
        assert!(matches!(
            err,
            BasketError::InvalidThreshold {
                name: "min_confidence",
                ..
            }
        ));
    }

    #[test]
    fn combinations_are_lexicographic() {
        assert_eq!(
            combinations(4, 2),
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(combinations(3, 3), vec![vec![0, 1, 2]]);
        assert!(combinations(2, 3).is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let rules = generate_rules(&bread_milk_butter(), 0.6).unwrap();
        let json = serde_json::to_value(&rules[0]).unwrap();
        assert!(json.get("antecedentSupport").is_some());
        assert!(json.get("supportingTransactions").is_some());
        assert_eq!(json["nTransactions"], 2);
    }
}
