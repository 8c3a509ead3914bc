use serde::{Deserialize, Serialize};
use std::fmt;

/// The SKUs attached to an order, parsed once from the two-level wire
/// encoding: bundles are separated by `,`, SKUs within a bundle by `+`.
///
/// `"A+B,C"` is two bundles: `[A, B]` shipped together, and `[C]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SkuList {
    bundles: Vec<Vec<String>>,
}

impl SkuList {
    /// Parse the delimited wire form. Empty tokens are dropped.
    pub fn parse(raw: &str) -> Self {
        Self::from_tokens(raw.split(','))
    }

    /// Build from bundle tokens (each token may itself be `+`-joined).
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let bundles = tokens
            .into_iter()
            .filter_map(|token| {
                let bundle: Vec<String> = token
                    .as_ref()
                    .split('+')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
                if bundle.is_empty() {
                    None
                } else {
                    Some(bundle)
                }
            })
            .collect();
        Self { bundles }
    }

    pub fn bundles(&self) -> &[Vec<String>] {
        &self.bundles
    }

    /// Every individual SKU, bundle structure flattened away.
    pub fn iter_skus(&self) -> impl Iterator<Item = &str> {
        self.bundles.iter().flatten().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

impl fmt::Display for SkuList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .bundles
            .iter()
            .map(|b| b.join("+"))
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

impl From<String> for SkuList {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<SkuList> for String {
    fn from(list: SkuList) -> Self {
        list.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bundles_and_singles() {
        let list = SkuList::parse("A+B,C");
        assert_eq!(list.bundles(), &[vec!["A".to_string(), "B".to_string()], vec!["C".to_string()]]);
        assert_eq!(list.iter_skus().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_round_trip() {
        let list = SkuList::parse("A+B,C,D+E+F");
        assert_eq!(list.to_string(), "A+B,C,D+E+F");
    }

    #[test]
    fn test_empty_tokens_dropped() {
        let list = SkuList::parse(",A,,B+,");
        assert_eq!(list.to_string(), "A,B");
        assert!(SkuList::parse("").is_empty());
    }

    #[test]
    fn test_repeated_bundle_kept() {
        // The same bundle listed twice is two occurrences, not one.
        let list = SkuList::parse("A+B,A+B");
        assert_eq!(list.bundles().len(), 2);
        assert_eq!(list.iter_skus().count(), 4);
    }
}
