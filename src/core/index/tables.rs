/*!
A pair of two-key tables: records by standard name, and alias keys pointing
at those records.
*/

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::service::{ServiceKey, ServiceRecord};

#[derive(Debug, Default)]
pub struct ServiceTables {
    records: IndexMap<ServiceKey, Arc<ServiceRecord>>,
    aliases: HashMap<ServiceKey, ServiceKey>,
}

impl ServiceTables {
    /// Record stored under its standard name
    pub fn get(&self, key: &ServiceKey) -> Option<&Arc<ServiceRecord>> {
        self.records.get(key)
    }

    /// Record stored under `key` as a standard name or as an alias
    pub fn find(&self, key: &ServiceKey) -> Option<&Arc<ServiceRecord>> {
        self.records
            .get(key)
            .or_else(|| self.aliases.get(key).and_then(|target| self.records.get(target)))
    }

    /// Mutable access to a record; records shared with callers are copied
    /// first so handed-out snapshots never change underneath them
    pub fn get_mut(&mut self, key: &ServiceKey) -> Option<&mut ServiceRecord> {
        self.records.get_mut(key).map(Arc::make_mut)
    }

    /// Whether `key` is taken, as a standard name or an alias
    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.records.contains_key(key) || self.aliases.contains_key(key)
    }

    /// Store a record under its standard name and all of its aliases
    pub fn insert(&mut self, record: ServiceRecord) -> Arc<ServiceRecord> {
        let key = record.key();
        for alias in record.alias_keys() {
            self.aliases.insert(alias, key.clone());
        }
        let record = Arc::new(record);
        self.records.insert(key, record.clone());
        record
    }

    /// Point `alias` at the record stored under `target`
    pub fn link_alias(&mut self, alias: ServiceKey, target: ServiceKey) {
        self.aliases.insert(alias, target);
    }

    /// Drop the alias entry `alias`, returning its target
    pub fn unlink_alias(&mut self, alias: &ServiceKey) -> Option<ServiceKey> {
        self.aliases.remove(alias)
    }

    /// Remove a record and every alias entry pointing at it
    pub fn remove(&mut self, key: &ServiceKey) -> Option<Arc<ServiceRecord>> {
        let removed = self.records.shift_remove(key)?;
        self.aliases.retain(|_, target| target != key);
        Some(removed)
    }

    /// Free `key` for another table: drops a record stored under it, or the
    /// alias entry (and the alias on its target record)
    pub fn evict(&mut self, key: &ServiceKey) -> bool {
        if self.remove(key).is_some() {
            return true;
        }
        match self.aliases.remove(key) {
            Some(target) => {
                if let Some(record) = self.get_mut(&target) {
                    record.remove_alias(key.algorithm());
                }
                true
            }
            None => false,
        }
    }

    /// Records in insertion order
    pub fn records(&self) -> impl Iterator<Item = &Arc<ServiceRecord>> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.aliases.clear();
    }
}
