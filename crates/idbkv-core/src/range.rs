//! Key ranges and key queries.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::key::Key;

/// A contiguous interval of keys.
///
/// Either bound may be absent (unbounded) and either may be open (exclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    pub lower: Option<Key>,
    pub upper: Option<Key>,
    pub lower_open: bool,
    pub upper_open: bool,
}

impl KeyRange {
    /// A range matching exactly one key.
    pub fn only(key: impl Into<Key>) -> Self {
        let key = key.into();
        Self {
            lower: Some(key.clone()),
            upper: Some(key),
            lower_open: false,
            upper_open: false,
        }
    }

    /// All keys above `lower` (inclusive unless `open`).
    pub fn lower_bound(lower: impl Into<Key>, open: bool) -> Self {
        Self {
            lower: Some(lower.into()),
            upper: None,
            lower_open: open,
            upper_open: false,
        }
    }

    /// All keys below `upper` (inclusive unless `open`).
    pub fn upper_bound(upper: impl Into<Key>, open: bool) -> Self {
        Self {
            lower: None,
            upper: Some(upper.into()),
            lower_open: false,
            upper_open: open,
        }
    }

    /// Keys between `lower` and `upper`.
    ///
    /// Fails if `lower > upper`, or if the bounds are equal and either is open.
    pub fn bound(
        lower: impl Into<Key>,
        upper: impl Into<Key>,
        lower_open: bool,
        upper_open: bool,
    ) -> Result<Self> {
        let lower = lower.into();
        let upper = upper.into();
        if lower > upper {
            return Err(CoreError::InvalidRange(format!(
                "lower bound {lower} is greater than upper bound {upper}"
            )));
        }
        if lower == upper && (lower_open || upper_open) {
            return Err(CoreError::InvalidRange(format!(
                "open range on a single key {lower} is empty"
            )));
        }
        Ok(Self {
            lower: Some(lower),
            upper: Some(upper),
            lower_open,
            upper_open,
        })
    }

    /// Whether `key` lies within the range.
    pub fn contains(&self, key: &Key) -> bool {
        let above_lower = match &self.lower {
            None => true,
            Some(lower) if self.lower_open => key > lower,
            Some(lower) => key >= lower,
        };
        let below_upper = match &self.upper {
            None => true,
            Some(upper) if self.upper_open => key < upper,
            Some(upper) => key <= upper,
        };
        above_lower && below_upper
    }
}

/// Which records an operation such as `count` applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyQuery {
    /// Every record in the store.
    #[default]
    All,
    /// The record with exactly this key.
    Key(Key),
    /// Records whose key lies in the range.
    Range(KeyRange),
}

impl KeyQuery {
    pub fn matches(&self, key: &Key) -> bool {
        match self {
            KeyQuery::All => true,
            KeyQuery::Key(k) => k == key,
            KeyQuery::Range(range) => range.contains(key),
        }
    }
}

impl From<Key> for KeyQuery {
    fn from(key: Key) -> Self {
        KeyQuery::Key(key)
    }
}

impl From<&Key> for KeyQuery {
    fn from(key: &Key) -> Self {
        KeyQuery::Key(key.clone())
    }
}

impl From<KeyRange> for KeyQuery {
    fn from(range: KeyRange) -> Self {
        KeyQuery::Range(range)
    }
}

impl From<&str> for KeyQuery {
    fn from(s: &str) -> Self {
        KeyQuery::Key(Key::from(s))
    }
}

impl From<String> for KeyQuery {
    fn from(s: String) -> Self {
        KeyQuery::Key(Key::from(s))
    }
}

impl From<i32> for KeyQuery {
    fn from(n: i32) -> Self {
        KeyQuery::Key(Key::from(n))
    }
}

impl<T: Into<KeyQuery>> From<Option<T>> for KeyQuery {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only() {
        let range = KeyRange::only("b");
        assert!(range.contains(&Key::from("b")));
        assert!(!range.contains(&Key::from("a")));
        assert!(!range.contains(&Key::from("c")));
    }

    #[test]
    fn test_open_bounds() {
        let range = KeyRange::bound(1, 3, true, false).unwrap();
        assert!(!range.contains(&Key::from(1)));
        assert!(range.contains(&Key::from(2)));
        assert!(range.contains(&Key::from(3)));
        assert!(!range.contains(&Key::from(4)));
    }

    #[test]
    fn test_half_bounded() {
        let lower = KeyRange::lower_bound("m", false);
        assert!(lower.contains(&Key::from("m")));
        assert!(lower.contains(&Key::from("z")));
        assert!(!lower.contains(&Key::from(1)));

        let upper = KeyRange::upper_bound("m", true);
        assert!(!upper.contains(&Key::from("m")));
        assert!(upper.contains(&Key::from(1)));
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(matches!(
            KeyRange::bound("z", "a", false, false),
            Err(CoreError::InvalidRange(_))
        ));
        assert!(KeyRange::bound("a", "a", true, false).is_err());
        assert!(KeyRange::bound("a", "a", false, false).is_ok());
    }

    #[test]
    fn test_query_matches() {
        assert!(KeyQuery::All.matches(&Key::from("anything")));
        assert!(KeyQuery::from("aKey").matches(&Key::from("aKey")));
        assert!(!KeyQuery::from("aKey").matches(&Key::from("bKey")));
        assert_eq!(KeyQuery::from(None::<&str>), KeyQuery::All);
    }
}
