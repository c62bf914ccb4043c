//! Ordered mapping type for dict nodes.
//!
//! This module provides [`TreeMap`], a wrapper around [`IndexMap`] that keeps
//! insertion order, and [`Key`], the key type of mapping nodes.
//!
//! Equality of two maps ignores order: `{"a": 1, "b": 2}` equals
//! `{"b": 2, "a": 1}`. Flattening sorts keys by default, so a rebuilt map may
//! iterate in a different order than the original while still comparing equal.
//!
//! ## Examples
//!
//! ```rust
//! use treespec::{Key, TreeMap, TreeValue};
//!
//! let mut map = TreeMap::new();
//! map.insert(Key::from("name"), TreeValue::from("Alice"));
//! map.insert(Key::from(7), TreeValue::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get(&Key::from("name")).and_then(|v| v.as_str()), Some("Alice"));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A mapping key: an integer or a string.
///
/// Keys are totally ordered with every integer sorting before every string,
/// which is the order the flatten pass stores them in.
///
/// `Display` renders the canonical form used in spec text: strings are
/// single-quoted, integers are bare.
///
/// ```rust
/// use treespec::Key;
///
/// assert_eq!(Key::from("a").to_string(), "'a'");
/// assert_eq!(Key::from("it's").to_string(), r"'it\'s'");
/// assert_eq!(Key::from(-3).to_string(), "-3");
/// assert!(Key::from(100) < Key::from("0"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// If the key is a string, returns it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            Key::Int(_) => None,
        }
    }

    /// If the key is an integer, returns it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Key::Int(i) => Some(*i),
            Key::Str(_) => None,
        }
    }

    /// Reads a key back from a tree value: strings and whole numbers qualify.
    ///
    /// ```rust
    /// use treespec::{Key, TreeValue};
    ///
    /// assert_eq!(Key::from_value(&TreeValue::from("a")), Some(Key::from("a")));
    /// assert_eq!(Key::from_value(&TreeValue::from(2)), Some(Key::from(2)));
    /// assert_eq!(Key::from_value(&TreeValue::None), None);
    /// ```
    #[must_use]
    pub fn from_value(value: &crate::TreeValue) -> Option<Key> {
        match value {
            crate::TreeValue::String(s) => Some(Key::Str(s.clone())),
            crate::TreeValue::Number(n) => n.as_i64().map(Key::Int),
            _ => None,
        }
    }
}

impl From<Key> for crate::TreeValue {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(i) => crate::TreeValue::from(i),
            Key::Str(s) => crate::TreeValue::String(s),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Str(s) => {
                f.write_str("'")?;
                for ch in s.chars() {
                    match ch {
                        '\'' => f.write_str("\\'")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        _ => write!(f, "{}", ch)?,
                    }
                }
                f.write_str("'")
            }
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(value as i64)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Key::Int(i) => serializer.serialize_i64(*i),
            Key::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = Key;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an integer or string key")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Key::Int(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                i64::try_from(value)
                    .map(Key::Int)
                    .map_err(|_| E::custom(format!("key {} is out of range", value)))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Key::Str(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Key::Str(value))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

/// An insertion-ordered map from [`Key`] to tree values.
///
/// This is a thin wrapper around [`IndexMap`].
///
/// # Examples
///
/// ```rust
/// use treespec::{Key, TreeMap, TreeValue};
///
/// let mut map = TreeMap::new();
/// map.insert(Key::from("second"), TreeValue::from(2));
/// map.insert(Key::from("first"), TreeValue::from(1));
///
/// // Iteration follows insertion order
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec![Key::from("second"), Key::from("first")]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TreeMap(IndexMap<Key, crate::TreeValue>);

impl TreeMap {
    /// Creates an empty `TreeMap`.
    #[must_use]
    pub fn new() -> Self {
        TreeMap(IndexMap::new())
    }

    /// Creates an empty `TreeMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        TreeMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is returned and
    /// the key keeps its original position.
    pub fn insert(&mut self, key: Key, value: crate::TreeValue) -> Option<crate::TreeValue> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&crate::TreeValue> {
        self.0.get(key)
    }

    /// Returns the number of elements in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, Key, crate::TreeValue> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, Key, crate::TreeValue> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, crate::TreeValue> {
        self.0.iter()
    }
}

impl Default for TreeMap {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoIterator for TreeMap {
    type Item = (Key, crate::TreeValue);
    type IntoIter = indexmap::map::IntoIter<Key, crate::TreeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TreeMap {
    type Item = (&'a Key, &'a crate::TreeValue);
    type IntoIter = indexmap::map::Iter<'a, Key, crate::TreeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Key, crate::TreeValue)> for TreeMap {
    fn from_iter<T: IntoIterator<Item = (Key, crate::TreeValue)>>(iter: T) -> Self {
        TreeMap(IndexMap::from_iter(iter))
    }
}
