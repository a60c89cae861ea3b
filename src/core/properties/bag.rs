/*!
Ordered string map backing a provider's properties.
*/

use indexmap::IndexMap;

/// Ordered mapping of property keys to values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBag {
    entries: IndexMap<String, String>,
}

impl PropertyBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Check whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store `value` under `key`, returning the previous value.
    ///
    /// Replacing an existing key keeps its original position.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Store `value` only if `key` is absent, returning the current value otherwise
    pub fn put_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        if let Some(existing) = self.entries.get(&key) {
            return Some(existing.clone());
        }
        self.entries.insert(key, value.into());
        None
    }

    /// Remove `key`, preserving the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = PropertyBag::new();
        for (key, value) in iter {
            bag.put(key, value);
        }
        bag
    }
}
