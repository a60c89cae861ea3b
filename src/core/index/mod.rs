/*!
Per-provider service index.

Two sources feed the index: records registered explicitly through the
provider API, and records derived from the provider's property declarations.
Explicit records are indexed eagerly. Property writes only append to a
pending-change log; the log is replayed by [`ServiceIndex::reconcile`] the
next time a read needs the property-derived tables.

A key lives in at most one of the tables. Explicit registration evicts the
matching property-derived entries, and replay skips keys that an explicit
record already holds.
*/

pub mod changes;
pub mod tables;

use std::sync::Arc;

use crate::core::service::key::DeclarationKey;
use crate::core::service::{ProviderRef, ServiceKey, ServiceRecord};

pub use changes::PendingChange;
use tables::ServiceTables;

/// Service index of one provider
#[derive(Debug)]
pub struct ServiceIndex {
    provider: ProviderRef,
    explicit: ServiceTables,
    derived: ServiceTables,
    pending: Vec<PendingChange>,
    last_lookup: Option<(ServiceKey, Arc<ServiceRecord>)>,
    all_services: Option<Arc<[Arc<ServiceRecord>]>>,
    reconcile_passes: u64,
}

impl ServiceIndex {
    pub fn new(provider: ProviderRef) -> Self {
        Self {
            provider,
            explicit: ServiceTables::default(),
            derived: ServiceTables::default(),
            pending: Vec::new(),
            last_lookup: None,
            all_services: None,
            reconcile_passes: 0,
        }
    }

    /// Whether property writes are waiting to be replayed
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of changes waiting to be replayed
    pub fn pending_changes(&self) -> usize {
        self.pending.len()
    }

    /// Number of replays performed so far
    pub fn reconcile_passes(&self) -> u64 {
        self.reconcile_passes
    }

    /// Append a property write to the log
    pub fn record_change(&mut self, change: PendingChange) {
        if change == PendingChange::Clear {
            self.pending.clear();
        }
        self.pending.push(change);
        self.last_lookup = None;
    }

    fn invalidate(&mut self) {
        self.last_lookup = None;
        self.all_services = None;
    }

    /// Register a record explicitly, replacing any explicit record with the
    /// same standard name
    pub fn add_explicit(&mut self, record: ServiceRecord) -> Arc<ServiceRecord> {
        let key = record.key();
        if let Some(previous) = self.explicit.remove(&key) {
            log::debug!("Replacing explicit service {}", previous);
        }
        for taken in std::iter::once(key).chain(record.alias_keys()) {
            if self.derived.evict(&taken) {
                log::debug!(
                    "Explicit service {} shadows property declaration {}",
                    record.key(),
                    taken
                );
            }
        }
        let record = self.explicit.insert(record);
        self.invalidate();
        record
    }

    /// Remove the explicit record stored under the standard name `key`.
    ///
    /// Aliases are not followed, so a record whose alias equals `key` stays.
    pub fn take_explicit(&mut self, key: &ServiceKey) -> Option<Arc<ServiceRecord>> {
        let removed = self.explicit.remove(key)?;
        self.invalidate();
        Some(removed)
    }

    /// Remove the explicit record reachable under `key` (standard name or alias)
    pub fn remove_explicit(&mut self, key: &ServiceKey) -> Option<Arc<ServiceRecord>> {
        let target = self.explicit.find(key)?.key();
        let removed = self.explicit.remove(&target);
        self.invalidate();
        removed
    }

    /// Drop every explicit record
    pub fn clear_explicit(&mut self) {
        self.explicit.clear();
        self.invalidate();
    }

    /// Find the record registered under `key`.
    ///
    /// Explicit records win over property-derived ones; the property tables
    /// are only reconciled when the explicit tables miss.
    pub fn lookup(&mut self, key: &ServiceKey) -> Option<Arc<ServiceRecord>> {
        if let Some((cached, record)) = &self.last_lookup {
            if cached == key {
                return Some(record.clone());
            }
        }

        let found = match self.explicit.find(key) {
            Some(record) => Some(record.clone()),
            None => {
                self.reconcile();
                self.derived.find(key).filter(|record| record.is_complete()).cloned()
            }
        };

        if let Some(record) = &found {
            self.last_lookup = Some((key.clone(), record.clone()));
        }
        found
    }

    /// Every complete record: explicit ones first, then property-derived,
    /// each in registration order
    pub fn all_services(&mut self) -> Arc<[Arc<ServiceRecord>]> {
        self.reconcile();
        if let Some(services) = &self.all_services {
            return services.clone();
        }
        let services: Arc<[Arc<ServiceRecord>]> = self
            .explicit
            .records()
            .chain(self.derived.records().filter(|record| record.is_complete()))
            .cloned()
            .collect();
        self.all_services = Some(services.clone());
        services
    }

    /// Replay the pending-change log into the property-derived tables.
    ///
    /// Declarations may arrive in any order within one batch: an alias or
    /// attribute seen before its base declaration picks up the class name
    /// from the batch. An alias whose target is declared neither in the
    /// tables nor in the batch is dropped.
    pub fn reconcile(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        // The log is only cleared once every change is applied, so a replay
        // that unwinds leaves the index dirty
        let batch = self.pending.clone();
        log::trace!(
            "Reconciling {} pending change(s) for provider {}",
            batch.len(),
            self.provider.name()
        );

        for change in &batch {
            self.apply(change, &batch);
        }

        self.pending.clear();
        self.reconcile_passes += 1;
        self.invalidate();
        log::trace!(
            "Provider {} now has {} property-derived service(s)",
            self.provider.name(),
            self.derived.len()
        );
    }

    fn apply(&mut self, change: &PendingChange, batch: &[PendingChange]) {
        match change {
            PendingChange::Clear => self.derived.clear(),
            PendingChange::Put { key, value } => self.apply_put(key, value, batch),
            PendingChange::Remove { key } => self.apply_remove(key),
        }
    }

    fn apply_put(&mut self, key: &DeclarationKey, value: &str, batch: &[PendingChange]) {
        let target = key.target(value);
        match key {
            DeclarationKey::Implementation { service_type, algorithm } => {
                if self.is_shadowed(&target) {
                    return;
                }
                if value.is_empty() {
                    log::debug!("Ignoring empty class name for {}", target);
                    return;
                }
                match self.derived.get_mut(&target) {
                    Some(record) => record.set_class_name(value),
                    None => {
                        let mut record = ServiceRecord::placeholder(self.provider.clone(), service_type, algorithm);
                        record.set_class_name(value);
                        self.derived.insert(record);
                    }
                }
            }
            DeclarationKey::Attribute { service_type, algorithm, name } => {
                if self.is_shadowed(&target) {
                    return;
                }
                match self.derived.get_mut(&target) {
                    Some(record) => record.set_attribute(name, value),
                    None => {
                        let mut record = ServiceRecord::placeholder(self.provider.clone(), service_type, algorithm);
                        if let Some((_, class_name)) = base_declaration(batch, &target) {
                            record.set_class_name(class_name);
                        }
                        record.set_attribute(name, value);
                        self.derived.insert(record);
                    }
                }
            }
            DeclarationKey::Alias { service_type, alias } => {
                let alias_key = ServiceKey::new(service_type, alias);
                self.unlink_alias(&alias_key);
                if self.is_shadowed(&alias_key) || self.is_shadowed(&target) {
                    return;
                }
                if self.derived.get(&target).is_none() {
                    let Some((algorithm, class_name)) = base_declaration(batch, &target) else {
                        log::debug!("Ignoring alias {} for {}: no base declaration", alias, target);
                        return;
                    };
                    let mut record = ServiceRecord::placeholder(self.provider.clone(), service_type, algorithm);
                    record.set_class_name(class_name);
                    self.derived.insert(record);
                }
                if let Some(record) = self.derived.get_mut(&target) {
                    record.push_alias(alias);
                }
                self.derived.link_alias(alias_key, target);
            }
        }
    }

    fn apply_remove(&mut self, key: &DeclarationKey) {
        match key {
            DeclarationKey::Implementation { service_type, algorithm } => {
                self.derived.remove(&ServiceKey::new(service_type, algorithm));
            }
            DeclarationKey::Attribute { service_type, algorithm, name } => {
                if let Some(record) = self.derived.get_mut(&ServiceKey::new(service_type, algorithm)) {
                    record.remove_attribute(name);
                }
            }
            DeclarationKey::Alias { service_type, alias } => {
                self.unlink_alias(&ServiceKey::new(service_type, alias));
            }
        }
    }

    fn unlink_alias(&mut self, alias_key: &ServiceKey) {
        if let Some(target) = self.derived.unlink_alias(alias_key) {
            if let Some(record) = self.derived.get_mut(&target) {
                record.remove_alias(alias_key.algorithm());
            }
        }
    }

    fn is_shadowed(&self, key: &ServiceKey) -> bool {
        let shadowed = self.explicit.contains(key);
        if shadowed {
            log::debug!("Property declaration for {} shadowed by explicit service", key);
        }
        shadowed
    }
}

/// Algorithm and class name of the last base declaration for `target` in `batch`
fn base_declaration<'a>(batch: &'a [PendingChange], target: &ServiceKey) -> Option<(&'a str, &'a str)> {
    batch.iter().rev().find_map(|change| match change {
        PendingChange::Put {
            key: DeclarationKey::Implementation { service_type, algorithm },
            value,
        } if !value.is_empty() && ServiceKey::new(service_type, algorithm) == *target => {
            Some((algorithm.as_str(), value.as_str()))
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::service::FactoryTable;

    fn index() -> ServiceIndex {
        ServiceIndex::new(ProviderRef::new("Test", Arc::new(FactoryTable::new())))
    }

    fn put(index: &mut ServiceIndex, key: &str, value: &str) {
        if let Some(change) = PendingChange::put(key, value) {
            index.record_change(change);
        }
    }

    fn remove(index: &mut ServiceIndex, key: &str) {
        if let Some(change) = PendingChange::remove(key) {
            index.record_change(change);
        }
    }

    fn key(service_type: &str, algorithm: &str) -> ServiceKey {
        ServiceKey::new(service_type, algorithm)
    }

    #[test]
    fn test_writes_are_batched_until_read() {
        let mut index = index();
        put(&mut index, "MessageDigest.MD5", "org.example.Md5Impl");
        put(&mut index, "MessageDigest.SHA-1", "org.example.Sha1Impl");
        assert!(index.is_dirty());
        assert_eq!(index.pending_changes(), 2);
        assert_eq!(index.reconcile_passes(), 0);

        assert!(index.lookup(&key("MessageDigest", "md5")).is_some());
        assert!(!index.is_dirty());
        assert_eq!(index.reconcile_passes(), 1);

        assert!(index.lookup(&key("MessageDigest", "SHA-1")).is_some());
        assert_eq!(index.reconcile_passes(), 1);
    }

    #[test]
    fn test_alias_before_base_in_same_batch() {
        let mut index = index();
        put(&mut index, "Alg.Alias.MessageDigest.MD-5", "MD5");
        put(&mut index, "MessageDigest.MD5", "org.example.Md5Impl");

        let by_alias = index.lookup(&key("MessageDigest", "MD-5")).unwrap();
        assert_eq!(by_alias.class_name(), "org.example.Md5Impl");
        assert_eq!(by_alias.aliases(), &["MD-5".to_string()]);
        let by_name = index.lookup(&key("MessageDigest", "MD5")).unwrap();
        assert!(Arc::ptr_eq(&by_alias, &by_name));
    }

    #[test]
    fn test_alias_without_base_is_dropped() {
        let mut index = index();
        put(&mut index, "Alg.Alias.MessageDigest.MD-5", "MD5");
        assert!(index.lookup(&key("MessageDigest", "MD-5")).is_none());

        put(&mut index, "MessageDigest.MD5", "org.example.Md5Impl");
        assert!(index.lookup(&key("MessageDigest", "MD5")).is_some());
        assert!(index.lookup(&key("MessageDigest", "MD-5")).is_none());
    }

    #[test]
    fn test_alias_in_later_batch() {
        let mut index = index();
        put(&mut index, "MessageDigest.MD5", "org.example.Md5Impl");
        index.reconcile();
        put(&mut index, "Alg.Alias.MessageDigest.MD-5", "MD5");
        assert_eq!(
            index.lookup(&key("MessageDigest", "md-5")).unwrap().class_name(),
            "org.example.Md5Impl"
        );
    }

    #[test]
    fn test_alias_retarget() {
        let mut index = index();
        put(&mut index, "MessageDigest.SHA-1", "org.example.Sha1");
        put(&mut index, "MessageDigest.SHA-256", "org.example.Sha256");
        put(&mut index, "Alg.Alias.MessageDigest.SHA", "SHA-1");
        index.reconcile();
        put(&mut index, "Alg.Alias.MessageDigest.SHA", "SHA-256");

        assert_eq!(index.lookup(&key("MessageDigest", "SHA")).unwrap().algorithm(), "SHA-256");
        assert!(index.lookup(&key("MessageDigest", "SHA-1")).unwrap().aliases().is_empty());
    }

    #[test]
    fn test_attribute_before_base() {
        let mut index = index();
        put(&mut index, "Cipher.AES KeySize", "256");
        index.reconcile();
        // Incomplete records stay hidden
        assert!(index.lookup(&key("Cipher", "AES")).is_none());
        assert!(index.all_services().is_empty());

        put(&mut index, "Cipher.AES", "org.example.Aes");
        let record = index.lookup(&key("Cipher", "AES")).unwrap();
        assert_eq!(record.attribute("KeySize").unwrap(), Some("256"));
    }

    #[test]
    fn test_attribute_backfills_class_from_batch() {
        let mut index = index();
        put(&mut index, "Cipher.AES KeySize", "256");
        put(&mut index, "Cipher.AES", "org.example.Aes");
        let record = index.lookup(&key("Cipher", "AES")).unwrap();
        assert_eq!(record.class_name(), "org.example.Aes");
    }

    #[test]
    fn test_class_name_update_in_place() {
        let mut index = index();
        put(&mut index, "MessageDigest.MD5", "org.example.Md5Impl");
        let before = index.lookup(&key("MessageDigest", "MD5")).unwrap();
        put(&mut index, "MessageDigest.MD5", "org.example.FastMd5");
        let after = index.lookup(&key("MessageDigest", "MD5")).unwrap();
        assert_eq!(before.class_name(), "org.example.Md5Impl");
        assert_eq!(after.class_name(), "org.example.FastMd5");
    }

    #[test]
    fn test_removals() {
        let mut index = index();
        put(&mut index, "Cipher.AES", "org.example.Aes");
        put(&mut index, "Cipher.AES KeySize", "256");
        put(&mut index, "Alg.Alias.Cipher.Rijndael", "AES");
        index.reconcile();

        remove(&mut index, "Cipher.AES KeySize");
        remove(&mut index, "Alg.Alias.Cipher.Rijndael");
        let record = index.lookup(&key("Cipher", "AES")).unwrap();
        assert_eq!(record.attribute("KeySize").unwrap(), None);
        assert!(index.lookup(&key("Cipher", "Rijndael")).is_none());

        remove(&mut index, "Cipher.AES");
        assert!(index.lookup(&key("Cipher", "AES")).is_none());
    }

    #[test]
    fn test_clear_discards_pending_and_tables() {
        let mut index = index();
        put(&mut index, "Cipher.AES", "org.example.Aes");
        index.reconcile();
        put(&mut index, "Cipher.DES", "org.example.Des");
        index.record_change(PendingChange::Clear);
        assert_eq!(index.pending_changes(), 1);
        assert!(index.lookup(&key("Cipher", "AES")).is_none());
        assert!(index.lookup(&key("Cipher", "DES")).is_none());
    }

    #[test]
    fn test_explicit_precedes_derived() {
        let mut index = index();
        put(&mut index, "MessageDigest.SHA-256", "org.example.Legacy");
        put(&mut index, "Alg.Alias.MessageDigest.SHA256", "SHA-256");
        index.reconcile();

        let explicit = ServiceRecord::new(&index.provider.clone(), "MessageDigest", "SHA-256", "org.example.Explicit")
            .unwrap();
        index.add_explicit(explicit);
        assert_eq!(
            index.lookup(&key("MessageDigest", "SHA-256")).unwrap().class_name(),
            "org.example.Explicit"
        );
        // The evicted declaration does not come back on the next replay
        put(&mut index, "MessageDigest.SHA-256", "org.example.Legacy2");
        assert_eq!(
            index.lookup(&key("MessageDigest", "sha-256")).unwrap().class_name(),
            "org.example.Explicit"
        );
        assert_eq!(index.all_services().len(), 1);
    }

    #[test]
    fn test_remove_explicit_by_alias() {
        let mut index = index();
        let record = ServiceRecord::new(&index.provider.clone(), "Cipher", "AES", "org.example.Aes")
            .unwrap()
            .with_alias("Rijndael")
            .unwrap();
        index.add_explicit(record);
        assert!(index.remove_explicit(&key("Cipher", "RIJNDAEL")).is_some());
        assert!(index.lookup(&key("Cipher", "AES")).is_none());
        assert!(index.remove_explicit(&key("Cipher", "AES")).is_none());
    }

    #[test]
    fn test_take_explicit_ignores_aliases() {
        let mut index = index();
        let record = ServiceRecord::new(&index.provider.clone(), "Cipher", "AES", "org.example.Aes")
            .unwrap()
            .with_alias("Rijndael")
            .unwrap();
        index.add_explicit(record);
        assert!(index.take_explicit(&key("Cipher", "Rijndael")).is_none());
        assert!(index.lookup(&key("Cipher", "Rijndael")).is_some());
        assert!(index.take_explicit(&key("Cipher", "aes")).is_some());
        assert!(index.lookup(&key("Cipher", "AES")).is_none());
    }

    // Panics while the marker alias is being reported as dropped
    struct AbortingLogger;

    const ABORT_MARKER: &str = "REPLAY-ABORT";

    impl log::Log for AbortingLogger {
        fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            if record.args().to_string().contains(ABORT_MARKER) {
                panic!("replay aborted");
            }
        }

        fn flush(&self) {}
    }

    static ABORTING_LOGGER: AbortingLogger = AbortingLogger;

    #[test]
    fn test_interrupted_reconcile_stays_dirty() {
        let _ = log::set_logger(&ABORTING_LOGGER);
        log::set_max_level(log::LevelFilter::Trace);

        let mut index = index();
        put(&mut index, "MessageDigest.MD5", "org.example.Md5Impl");
        put(&mut index, &format!("Alg.Alias.MessageDigest.{}", ABORT_MARKER), "MISSING");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| index.reconcile()));
        assert!(result.is_err());
        assert!(index.is_dirty());
        assert_eq!(index.pending_changes(), 2);
        assert_eq!(index.reconcile_passes(), 0);
    }

    #[test]
    fn test_memo_is_invalidated_by_writes() {
        let mut index = index();
        put(&mut index, "MessageDigest.MD5", "org.example.Md5Impl");
        assert!(index.lookup(&key("MessageDigest", "MD5")).is_some());
        remove(&mut index, "MessageDigest.MD5");
        assert!(index.lookup(&key("MessageDigest", "MD5")).is_none());
    }

    #[test]
    fn test_all_services_is_cached() {
        let mut index = index();
        put(&mut index, "MessageDigest.MD5", "org.example.Md5Impl");
        let first = index.all_services();
        let second = index.all_services();
        assert!(Arc::ptr_eq(&first, &second));

        put(&mut index, "MessageDigest.SHA-1", "org.example.Sha1Impl");
        let third = index.all_services();
        assert_eq!(third.len(), 2);
    }
}
