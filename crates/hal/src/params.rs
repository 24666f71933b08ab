//! Free-form `key=value;key=value` parameter strings.
//!
//! Both the device and stream surfaces carry vendor parameters as a single
//! string. Keys are unique; a later assignment wins. A segment without `=`
//! is a key with an empty value, which is also how key lists for `get`
//! requests are spelled (`"routing;format"`).

use std::collections::BTreeMap;
use std::fmt;

/// Parsed parameter set, ordered by key for stable output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyValuePairs {
    entries: BTreeMap<String, String>,
}

impl KeyValuePairs {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `k1=v1;k2=v2`. Empty segments and empty keys are skipped.
    pub fn parse(input: &str) -> Self {
        let entries = input
            .split(';')
            .filter_map(|segment| {
                let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
                let key = key.trim();
                (!key.is_empty()).then(|| (key.to_owned(), value.trim().to_owned()))
            })
            .collect();
        Self { entries }
    }

    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set `key` to `value`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Apply every entry of `other` on top of `self`.
    pub fn merge(&mut self, other: KeyValuePairs) {
        self.entries.extend(other.entries);
    }

    /// The entries named in the `;`-separated `keys` list that are present.
    pub fn subset(&self, keys: &str) -> KeyValuePairs {
        let entries = keys
            .split(';')
            .map(str::trim)
            .filter_map(|key| {
                self.entries
                    .get_key_value(key)
                    .map(|(k, v)| (k.clone(), v.clone()))
            })
            .collect();
        KeyValuePairs { entries }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for KeyValuePairs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pairs() {
        let kv = KeyValuePairs::parse("routing=2;screen_state=on");
        assert_eq!(kv.get("routing"), Some("2"));
        assert_eq!(kv.get("screen_state"), Some("on"));
        assert_eq!(kv.len(), 2);
    }

    #[test]
    fn parse_skips_empty_segments() {
        let kv = KeyValuePairs::parse(";;a=1;;");
        assert_eq!(kv.len(), 1);
        assert_eq!(kv.get("a"), Some("1"));
    }

    #[test]
    fn bare_key_has_empty_value() {
        let kv = KeyValuePairs::parse("routing");
        assert_eq!(kv.get("routing"), Some(""));
    }

    #[test]
    fn later_assignment_wins() {
        let kv = KeyValuePairs::parse("a=1;a=2");
        assert_eq!(kv.get("a"), Some("2"));
    }

    #[test]
    fn value_may_contain_equals() {
        let kv = KeyValuePairs::parse("bt_headset_name=a=b");
        assert_eq!(kv.get("bt_headset_name"), Some("a=b"));
    }

    #[test]
    fn subset_returns_only_known_keys() {
        let kv = KeyValuePairs::parse("a=1;b=2;c=3");
        assert_eq!(kv.subset("c;a;missing").to_string(), "a=1;c=3");
        assert!(kv.subset("").is_empty());
    }

    #[test]
    fn display_is_sorted() {
        let kv = KeyValuePairs::parse("b=2;a=1");
        assert_eq!(kv.to_string(), "a=1;b=2");
    }

    #[test]
    fn merge_overrides() {
        let mut kv = KeyValuePairs::parse("a=1;b=2");
        kv.merge(KeyValuePairs::parse("b=3;c=4"));
        assert_eq!(kv.to_string(), "a=1;b=3;c=4");
    }
}
