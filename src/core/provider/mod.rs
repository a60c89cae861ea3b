/*!
Providers: a named source of services plus metadata properties.

A provider owns its [`PropertyBag`] and [`ServiceIndex`] behind a single
lock. Reads take the same lock as writes because a lookup may replay pending
property changes into the index.

Property keys beginning with `Provider.` are metadata. They are seeded when
the provider is built and cannot be changed through the property API.
*/

pub mod builder;

use std::collections::HashSet;
use std::io::Read;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::fmt;

use crate::core::constants::{metadata, PROVIDER_PREFIX};
use crate::core::error::Result;
use crate::core::index::{PendingChange, ServiceIndex};
use crate::core::properties::{format, PropertyBag};
use crate::core::service::key::DeclarationKey;
use crate::core::service::{FactoryTable, ProviderRef, ServiceKey, ServiceRecord};
use crate::invalid_argument_err;

pub use builder::ProviderBuilder;

const UNREGISTERED: isize = -1;

struct ProviderState {
    properties: PropertyBag,
    index: ServiceIndex,
}

/// A named source of services
pub struct Provider {
    name: String,
    version: String,
    info: String,
    handle: ProviderRef,
    priority: AtomicIsize,
    max_property_bytes: usize,
    state: Mutex<ProviderState>,
}

impl Provider {
    /// Create a provider with no implementation factories.
    ///
    /// Records of such a provider can be looked up but not instantiated.
    pub fn new(name: &str, version: &str, info: &str) -> Result<Self> {
        ProviderBuilder::new(name).version(version).info(info).build()
    }

    /// Start building a provider
    pub fn builder(name: &str) -> ProviderBuilder {
        ProviderBuilder::new(name)
    }

    pub(crate) fn assemble(
        name: &str,
        version: &str,
        info: &str,
        factories: FactoryTable,
        max_property_bytes: usize,
    ) -> Result<Self> {
        if name.is_empty() {
            return invalid_argument_err!("provider name must be non-empty");
        }
        let handle = ProviderRef::new(name, Arc::new(factories));
        let provider = Self {
            name: name.to_string(),
            version: version.to_string(),
            info: info.to_string(),
            priority: AtomicIsize::new(UNREGISTERED),
            max_property_bytes,
            state: Mutex::new(ProviderState {
                properties: PropertyBag::new(),
                index: ServiceIndex::new(handle.clone()),
            }),
            handle,
        };
        provider.seed_metadata(&mut provider.lock().properties);
        Ok(provider)
    }

    fn seed_metadata(&self, properties: &mut PropertyBag) {
        properties.put(metadata::NAME, self.name.as_str());
        properties.put(metadata::VERSION, self.version.as_str());
        properties.put(metadata::INFO, self.info.as_str());
    }

    fn lock(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Provider name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version string
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Human-readable description
    pub fn info(&self) -> &str {
        &self.info
    }

    /// Identity handed to the records this provider owns
    pub fn handle(&self) -> &ProviderRef {
        &self.handle
    }

    /// 1-based position in the registry, or `None` while not registered
    pub fn priority(&self) -> Option<usize> {
        let priority = self.priority.load(Ordering::Acquire);
        if priority < 1 { None } else { Some(priority as usize) }
    }

    pub(crate) fn set_priority(&self, priority: Option<usize>) {
        let value = priority.map_or(UNREGISTERED, |p| p as isize);
        self.priority.store(value, Ordering::Release);
    }

    // Property access

    /// Value of property `key`
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().properties.get(key).map(str::to_string)
    }

    /// Store a property, returning the previous value.
    ///
    /// Metadata keys are read-only: writing one is ignored and returns `None`.
    pub fn put(&self, key: &str, value: &str) -> Option<String> {
        let mut state = self.lock();
        put_locked(&mut state, key, value)
    }

    /// Remove a property, returning its value
    pub fn remove(&self, key: &str) -> Option<String> {
        if is_metadata(key) {
            log::debug!("Ignoring removal of metadata key {} from provider {}", key, self.name);
            return None;
        }
        let mut state = self.lock();
        let previous = state.properties.remove(key)?;
        if let Some(change) = PendingChange::remove(key) {
            state.index.record_change(change);
        }
        Some(previous)
    }

    /// Store every entry, in iteration order
    pub fn put_all<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut state = self.lock();
        for (key, value) in entries {
            put_locked(&mut state, key.as_ref(), value.as_ref());
        }
    }

    /// Drop every property and every service, then re-seed the metadata
    pub fn clear(&self) {
        let mut state = self.lock();
        state.properties.clear();
        self.seed_metadata(&mut state.properties);
        state.index.clear_explicit();
        state.index.record_change(PendingChange::Clear);
        log::debug!("Cleared provider {}", self.name);
    }

    /// Load a `key=value` property stream.
    ///
    /// The stream is parsed completely before any entry is stored, so a
    /// malformed stream leaves the provider unchanged.
    pub fn load(&self, raw: &[u8]) -> Result<()> {
        if raw.len() > self.max_property_bytes {
            return invalid_argument_err!(
                "property stream of {} bytes exceeds the limit of {} bytes",
                raw.len(),
                self.max_property_bytes
            );
        }
        let entries = format::parse(raw)?;
        log::debug!("Loading {} properties into provider {}", entries.len(), self.name);
        self.put_all(entries);
        Ok(())
    }

    /// Load a property stream from a reader
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<()> {
        let mut raw = Vec::new();
        let limit = self.max_property_bytes as u64 + 1;
        reader.take(limit).read_to_end(&mut raw)?;
        self.load(&raw)
    }

    /// Render every property, metadata included, as a property stream
    pub fn store(&self, header: Option<&str>) -> String {
        let state = self.lock();
        format::store(state.properties.iter(), header)
    }

    /// Snapshot of every property, in insertion order
    pub fn entries(&self) -> Vec<(String, String)> {
        self.lock()
            .properties
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // Services

    /// Register a service explicitly, replacing any explicit service with the
    /// same type and algorithm.
    ///
    /// The record's declarations are also written to the properties, where
    /// they stay readable but do not feed the property-derived index.
    pub fn put_service(&self, record: ServiceRecord) -> Result<Arc<ServiceRecord>> {
        if record.provider_name() != self.name {
            return invalid_argument_err!(
                "service {}.{} belongs to provider {}, not {}",
                record.service_type(),
                record.algorithm(),
                record.provider_name(),
                self.name
            );
        }

        let mut state = self.lock();
        if let Some(previous) = state.index.take_explicit(&record.key()) {
            for (key, _) in previous.property_strings() {
                state.properties.remove(&key);
            }
            requeue_shadowed(&mut state, &previous);
        }
        for (key, value) in record.property_strings() {
            state.properties.put(key, value);
        }
        let record = state.index.add_explicit(record);
        log::trace!("Registered {}", record);
        Ok(record)
    }

    /// Build and register a service owned by this provider
    pub fn register_service(
        &self,
        service_type: &str,
        algorithm: &str,
        class_name: &str,
        aliases: &[&str],
        attributes: &[(&str, &str)],
    ) -> Result<Arc<ServiceRecord>> {
        let mut record = ServiceRecord::new(&self.handle, service_type, algorithm, class_name)?;
        for alias in aliases {
            record.add_alias(alias)?;
        }
        for (name, value) in attributes {
            record.put_attribute(name, value)?;
        }
        self.put_service(record)
    }

    /// Remove an explicitly registered service and its property strings.
    ///
    /// `algorithm` may be the standard name or an alias.
    pub fn remove_service(&self, service_type: &str, algorithm: &str) -> Option<Arc<ServiceRecord>> {
        let mut state = self.lock();
        let removed = state.index.remove_explicit(&ServiceKey::new(service_type, algorithm))?;
        for (key, _) in removed.property_strings() {
            state.properties.remove(&key);
        }
        requeue_shadowed(&mut state, &removed);
        log::trace!("Removed {}", removed);
        Some(removed)
    }

    /// The service registered for `service_type` and `algorithm` (standard
    /// name or alias, any ASCII case)
    pub fn get_service(&self, service_type: &str, algorithm: &str) -> Option<Arc<ServiceRecord>> {
        if service_type.is_empty() || algorithm.is_empty() {
            return None;
        }
        self.lock().index.lookup(&ServiceKey::new(service_type, algorithm))
    }

    /// Every service: explicit ones first, then property-derived ones
    pub fn services(&self) -> Arc<[Arc<ServiceRecord>]> {
        self.lock().index.all_services()
    }

    /// Whether property changes are waiting to be indexed
    pub fn is_dirty(&self) -> bool {
        self.lock().index.is_dirty()
    }

    /// Number of property changes waiting to be indexed
    pub fn pending_changes(&self) -> usize {
        self.lock().index.pending_changes()
    }

    /// Number of times pending property changes have been indexed
    pub fn reconcile_passes(&self) -> u64 {
        self.lock().index.reconcile_passes()
    }
}

fn is_metadata(key: &str) -> bool {
    key.starts_with(PROVIDER_PREFIX)
}

fn put_locked(state: &mut ProviderState, key: &str, value: &str) -> Option<String> {
    if is_metadata(key) {
        log::debug!("Ignoring write to metadata key {}", key);
        return None;
    }
    let previous = state.properties.put(key, value);
    if let Some(change) = PendingChange::put(key, value) {
        state.index.record_change(change);
    }
    previous
}

/// Queue the declarations an explicit record kept out of the property-derived
/// tables, so the next replay indexes them again
fn requeue_shadowed(state: &mut ProviderState, removed: &ServiceRecord) {
    let freed: HashSet<ServiceKey> = std::iter::once(removed.key()).chain(removed.alias_keys()).collect();
    let changes: Vec<PendingChange> = state
        .properties
        .iter()
        .filter_map(|(key, value)| {
            let declaration = DeclarationKey::parse(key)?;
            let shadowed = freed.contains(&declaration.target(value))
                || declaration.alias_key().is_some_and(|alias| freed.contains(&alias));
            shadowed.then(|| PendingChange::Put {
                key: declaration,
                value: value.to_string(),
            })
        })
        .collect();
    for change in changes {
        state.index.record_change(change);
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("priority", &self.priority())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} version {}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use crate::core::service::ServiceFactory;

    fn provider() -> Provider {
        Provider::new("Test", "1.0", "test provider").unwrap()
    }

    #[test]
    fn test_new_seeds_metadata() {
        let p = provider();
        assert_eq!(p.get(metadata::NAME).as_deref(), Some("Test"));
        assert_eq!(p.get(metadata::VERSION).as_deref(), Some("1.0"));
        assert_eq!(p.get(metadata::INFO).as_deref(), Some("test provider"));
        assert_eq!(p.priority(), None);
        assert!(!p.is_dirty());
        assert!(matches!(Provider::new("", "1.0", ""), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_metadata_is_read_only() {
        let p = provider();
        assert_eq!(p.put(metadata::NAME, "Other"), None);
        assert_eq!(p.remove(metadata::INFO), None);
        assert_eq!(p.get(metadata::NAME).as_deref(), Some("Test"));
        assert!(!p.is_dirty());
    }

    #[test]
    fn test_non_service_keys_do_not_dirty_the_index() {
        let p = provider();
        p.put("comment", "not a declaration");
        assert!(!p.is_dirty());
        p.put("MessageDigest.SHA-1", "org.example.Sha1");
        assert!(p.is_dirty());
    }

    #[test]
    fn test_property_declarations_are_indexed_lazily() {
        let p = provider();
        p.put_all([
            ("MessageDigest.MD5", "org.example.Md5Impl"),
            ("Alg.Alias.MessageDigest.MD-5", "MD5"),
        ]);
        assert_eq!(p.pending_changes(), 2);
        let record = p.get_service("MessageDigest", "md-5").unwrap();
        assert_eq!(record.class_name(), "org.example.Md5Impl");
        assert_eq!(record.provider_name(), "Test");
        assert_eq!(p.reconcile_passes(), 1);
        assert!(!p.is_dirty());
    }

    #[test]
    fn test_put_service_writes_property_strings() {
        let p = provider();
        let record = p
            .register_service("Cipher", "AES", "org.example.Aes", &["Rijndael"], &[("KeySize", "256")])
            .unwrap();
        assert_eq!(p.get("Cipher.AES").as_deref(), Some("org.example.Aes"));
        assert_eq!(p.get("Alg.Alias.Cipher.Rijndael").as_deref(), Some("AES"));
        assert_eq!(p.get("Cipher.AES KeySize").as_deref(), Some("256"));
        assert!(!p.is_dirty());
        assert!(Arc::ptr_eq(&record, &p.get_service("Cipher", "rijndael").unwrap()));
    }

    #[test]
    fn test_put_service_replaces_previous_strings() {
        let p = provider();
        p.register_service("Cipher", "AES", "org.example.Aes", &["Rijndael"], &[]).unwrap();
        p.register_service("Cipher", "AES", "org.example.FastAes", &[], &[]).unwrap();
        assert_eq!(p.get("Alg.Alias.Cipher.Rijndael"), None);
        assert_eq!(p.get("Cipher.AES").as_deref(), Some("org.example.FastAes"));
        assert!(p.get_service("Cipher", "Rijndael").is_none());
        assert_eq!(p.services().len(), 1);
    }

    #[test]
    fn test_put_service_keeps_record_owning_the_alias() {
        let p = provider();
        p.register_service("Cipher", "AES", "org.example.Aes", &["Rijndael"], &[]).unwrap();
        p.register_service("Cipher", "Rijndael", "org.example.Rijndael", &[], &[]).unwrap();

        assert_eq!(p.get_service("Cipher", "AES").unwrap().class_name(), "org.example.Aes");
        assert_eq!(p.get("Cipher.AES").as_deref(), Some("org.example.Aes"));
        assert_eq!(p.get_service("Cipher", "Rijndael").unwrap().class_name(), "org.example.Rijndael");
        assert_eq!(p.services().len(), 2);
    }

    #[test]
    fn test_removing_explicit_service_restores_shadowed_declarations() {
        let p = provider();
        p.put("MessageDigest.SHA1", "org.example.LegacySha1");
        p.put("MessageDigest.SHA1 ImplementedIn", "Software");
        assert_eq!(p.get_service("MessageDigest", "SHA1").unwrap().class_name(), "org.example.LegacySha1");
        p.register_service("MessageDigest", "SHA-1", "org.example.Sha1", &["SHA1"], &[]).unwrap();
        assert_eq!(p.get_service("MessageDigest", "SHA1").unwrap().class_name(), "org.example.Sha1");

        p.remove_service("MessageDigest", "SHA-1").unwrap();
        assert_eq!(p.get("MessageDigest.SHA1").as_deref(), Some("org.example.LegacySha1"));
        let restored = p.get_service("MessageDigest", "SHA1").unwrap();
        assert_eq!(restored.class_name(), "org.example.LegacySha1");
        assert_eq!(restored.attribute("ImplementedIn").unwrap(), Some("Software"));
        assert!(!p.is_dirty());
    }

    #[test]
    fn test_replacing_explicit_service_restores_dropped_alias_targets() {
        let p = provider();
        p.put("MessageDigest.SHA1", "org.example.LegacySha1");
        p.register_service("MessageDigest", "SHA-1", "org.example.Sha1", &["SHA1"], &[]).unwrap();
        p.register_service("MessageDigest", "SHA-1", "org.example.FastSha1", &[], &[]).unwrap();

        assert_eq!(p.get_service("MessageDigest", "SHA1").unwrap().class_name(), "org.example.LegacySha1");
        assert_eq!(p.get_service("MessageDigest", "SHA-1").unwrap().class_name(), "org.example.FastSha1");
        assert_eq!(p.services().len(), 2);
    }

    #[test]
    fn test_put_service_rejects_foreign_records() {
        let p = provider();
        let other = provider_named("Other");
        let record = ServiceRecord::new(other.handle(), "MessageDigest", "SHA-1", "x").unwrap();
        assert!(matches!(p.put_service(record), Err(Error::InvalidArgument(_))));
    }

    fn provider_named(name: &str) -> Provider {
        Provider::new(name, "1.0", "").unwrap()
    }

    #[test]
    fn test_remove_service() {
        let p = provider();
        p.register_service("Cipher", "AES", "org.example.Aes", &["Rijndael"], &[]).unwrap();
        assert!(p.remove_service("Cipher", "rijndael").is_some());
        assert!(p.get_service("Cipher", "AES").is_none());
        assert_eq!(p.get("Cipher.AES"), None);
        assert!(p.remove_service("Cipher", "AES").is_none());
    }

    #[test]
    fn test_clear_reseeds_metadata() {
        let p = provider();
        p.register_service("Cipher", "AES", "org.example.Aes", &[], &[]).unwrap();
        p.put("MessageDigest.MD5", "org.example.Md5Impl");
        p.clear();
        assert!(p.services().is_empty());
        assert_eq!(p.entries().len(), 3);
        assert_eq!(p.get(metadata::NAME).as_deref(), Some("Test"));
    }

    #[test]
    fn test_load_and_store() {
        let p = provider();
        p.load(b"Cipher.AES=org.example.Aes\nCipher.AES\\ KeySize=256\nProvider.id name=Ignored\n")
            .unwrap();
        assert_eq!(p.get(metadata::NAME).as_deref(), Some("Test"));
        let record = p.get_service("Cipher", "AES").unwrap();
        assert_eq!(record.attribute("KeySize").unwrap(), Some("256"));

        let copy = provider();
        copy.load(p.store(None).as_bytes()).unwrap();
        assert_eq!(copy.entries(), p.entries());
    }

    #[test]
    fn test_load_is_all_or_nothing() {
        let p = provider();
        let result = p.load(b"Cipher.AES=org.example.Aes\nbad=\\uZZZZ\n");
        assert!(matches!(result, Err(Error::InvalidFormat { .. })));
        assert_eq!(p.get("Cipher.AES"), None);
    }

    #[test]
    fn test_load_limit() {
        let p = Provider::builder("Small").max_property_bytes(8).build().unwrap();
        assert!(matches!(p.load(b"Cipher.AES=org.example.Aes\n"), Err(Error::InvalidArgument(_))));
        let reader: &[u8] = b"Cipher.AES=org.example.Aes\n";
        assert!(matches!(p.load_from_reader(reader), Err(Error::InvalidArgument(_))));
        assert!(p.load(b"a=1\n").is_ok());
    }

    #[test]
    fn test_builder_factories_back_instantiation() {
        #[derive(Debug, PartialEq)]
        struct Md5Impl;

        let p = Provider::builder("Test")
            .factories(FactoryTable::new().register("org.example.Md5Impl", ServiceFactory::new(|| Ok(Md5Impl))))
            .declarations("MessageDigest.MD5=org.example.Md5Impl\n")
            .build()
            .unwrap();
        let record = p.get_service("MessageDigest", "MD5").unwrap();
        let spi = record.instantiate(None).unwrap();
        assert_eq!(spi.downcast_ref::<Md5Impl>(), Some(&Md5Impl));
    }

    #[test]
    fn test_priority_round_trip() {
        let p = provider();
        p.set_priority(Some(3));
        assert_eq!(p.priority(), Some(3));
        p.set_priority(None);
        assert_eq!(p.priority(), None);
    }
}
