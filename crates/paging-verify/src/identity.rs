//! Item identity and the sets built from it.
//!
//! Items returned by different calls are always freshly decoded, so sets are
//! keyed by a value derived from each item rather than by the item itself.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;

use serde_json::Value;

/// Identity of a returned record.
///
/// Two items are the same record iff their keys are equal.
pub trait ItemIdentity {
    type Key: Ord + Hash + Clone + fmt::Debug + fmt::Display + Send + Sync;

    fn identity(&self) -> Self::Key;
}

impl ItemIdentity for u32 {
    type Key = u32;

    fn identity(&self) -> u32 {
        *self
    }
}

impl ItemIdentity for u64 {
    type Key = u64;

    fn identity(&self) -> u64 {
        *self
    }
}

/// Distinct item keys plus the number of items delivered to build them.
#[derive(Debug, Clone)]
pub struct ItemSet<K> {
    keys: BTreeSet<K>,
    delivered: usize,
}

impl<K: Ord> Default for ItemSet<K> {
    fn default() -> Self {
        Self {
            keys: BTreeSet::new(),
            delivered: 0,
        }
    }
}

impl<K: Ord + Clone> ItemSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. Returns `false` when it was already present.
    pub fn insert(&mut self, key: K) -> bool {
        self.delivered += 1;
        self.keys.insert(key)
    }

    /// Add every item of a page.
    pub fn extend_from<T>(&mut self, items: &[T])
    where
        T: ItemIdentity<Key = K>,
    {
        for item in items {
            self.insert(item.identity());
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of items delivered, duplicates included.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Deliveries of a key that was already present.
    pub fn duplicates(&self) -> usize {
        self.delivered - self.keys.len()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    pub fn is_subset(&self, other: &ItemSet<K>) -> bool {
        self.keys.is_subset(&other.keys)
    }

    /// Keys present here but absent from `other`, in key order.
    pub fn missing_from<'a>(&'a self, other: &'a ItemSet<K>) -> Vec<&'a K> {
        self.keys.difference(&other.keys).collect()
    }

    pub fn same_items(&self, other: &ItemSet<K>) -> bool {
        self.keys == other.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }
}

impl<K: Ord + Clone> FromIterator<K> for ItemSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = ItemSet::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

/// Render a JSON value with object keys sorted at every depth.
///
/// Two structurally equal documents render to the same text regardless of the
/// key order the server used.
///
/// `Value::to_string` only sorts keys while serde_json's `preserve_order`
/// feature is off, and any crate in the build can turn it on.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(val, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
