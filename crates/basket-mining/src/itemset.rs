use std::fmt;

use serde::{Deserialize, Serialize};

/// A canonically sorted, duplicate-free sequence of items.
///
/// Two itemsets are equal exactly when they hold the same items, regardless
/// of the order they were built from, and serialize identically.
///
/// # Examples
///
/// ```
/// use basket_mining::Itemset;
///
/// let a = Itemset::new(["milk", "bread", "milk"]);
/// let b: Itemset = ["bread", "milk"].into_iter().collect();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "{bread, milk}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Itemset(Vec<String>);

impl Itemset {
    /// Build an itemset from any items; sorts and deduplicates.
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<String> = items.into_iter().map(Into::into).collect();
        items.sort();
        items.dedup();
        Self(items)
    }

    /// Items in canonical order.
    pub fn items(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.0
            .binary_search_by(|probe| probe.as_str().cmp(item))
            .is_ok()
    }

    /// Returns `true` if every item of `self` is in `other`.
    pub fn is_subset(&self, other: &Itemset) -> bool {
        self.0.iter().all(|item| other.contains(item))
    }

    /// Items in either set.
    pub fn union(&self, other: &Itemset) -> Itemset {
        Itemset::new(self.0.iter().chain(&other.0).cloned())
    }

    /// Items of `self` not in `other`.
    pub fn difference(&self, other: &Itemset) -> Itemset {
        Itemset(
            self.0
                .iter()
                .filter(|item| !other.contains(item))
                .cloned()
                .collect(),
        )
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for Itemset {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Itemset::new(iter)
    }
}

impl<'a> IntoIterator for &'a Itemset {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Itemset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_does_not_affect_identity() {
        assert_eq!(Itemset::new(["c", "a", "b"]), Itemset::new(["b", "c", "a"]));
        assert_eq!(Itemset::new(["c", "a", "b"]).items(), &["a", "b", "c"]);
    }

    #[test]
    fn subset_union_difference() {
        let ab = Itemset::new(["a", "b"]);
        let abc = Itemset::new(["a", "b", "c"]);
        assert!(ab.is_subset(&abc));
        assert!(!abc.is_subset(&ab));
        assert_eq!(ab.union(&Itemset::new(["c"])), abc);
        assert_eq!(abc.difference(&ab), Itemset::new(["c"]));
    }

    #[test]
    fn serializes_as_plain_array() {
        let json = serde_json::to_string(&Itemset::new(["milk", "bread"])).unwrap();
        assert_eq!(json, r#"["bread","milk"]"#);
    }

    #[test]
    fn ordering_is_lexicographic_over_items() {
        let mut sets = vec![
            Itemset::new(["b"]),
            Itemset::new(["a", "c"]),
            Itemset::new(["a"]),
        ];
        sets.sort();
        assert_eq!(sets[0], Itemset::new(["a"]));
        assert_eq!(sets[1], Itemset::new(["a", "c"]));
    }
}
