/*!
Registry manager for providers.

This module keeps the ordered provider list. Priorities are 1-based and dense:
every insert and removal renumbers the whole list before the lock is released.
*/

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::config::RegistryConfig;
use crate::core::error::Result;
use crate::core::provider::Provider;
use crate::core::registry::filter::Predicate;
use crate::core::service::engine;
use crate::core::service::ServiceRecord;

/// Ordered collection of providers
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: RwLock<Vec<Arc<Provider>>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a registry from `catalog` in the configured order.
    ///
    /// Configured names missing from the catalog are skipped; catalog
    /// providers that are not configured are left out.
    pub fn from_config(config: &RegistryConfig, catalog: impl IntoIterator<Item = Arc<Provider>>) -> Result<Self> {
        config.validate()?;
        let mut available: HashMap<String, Arc<Provider>> = catalog
            .into_iter()
            .map(|provider| (provider.name().to_string(), provider))
            .collect();

        let registry = Self::new();
        for name in &config.provider_order {
            match available.remove(name) {
                Some(provider) => {
                    let position = registry.len() + 1;
                    registry.insert_at(provider, position);
                }
                None => log::warn!("Configured provider {} is not available", name),
            }
        }
        Ok(registry)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Provider>>> {
        self.providers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<Provider>>> {
        self.providers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `provider` at the 1-based `position`, returning the position it
    /// was given.
    ///
    /// Position 0 means the front of the list; other positions are clamped to
    /// `1..=len + 1`. Returns `None` if a provider with the same name is
    /// already registered.
    pub fn insert_at(&self, provider: Arc<Provider>, position: usize) -> Option<usize> {
        let mut providers = self.write();
        if providers.iter().any(|p| p.name() == provider.name()) {
            log::debug!("Provider {} is already registered", provider.name());
            return None;
        }

        let index = match position {
            0 => 0,
            n => n.clamp(1, providers.len() + 1) - 1,
        };
        log::info!("Inserting provider {} at position {}", provider, index + 1);
        providers.insert(index, provider);
        renumber(&providers);
        Some(index + 1)
    }

    /// Insert `provider` at the highest priority
    pub fn add_provider(&self, provider: Arc<Provider>) -> Option<usize> {
        self.insert_at(provider, 0)
    }

    /// Remove the provider called `name`; absent names are ignored
    pub fn remove(&self, name: &str) -> Option<Arc<Provider>> {
        let mut providers = self.write();
        let index = providers.iter().position(|p| p.name() == name)?;
        let removed = providers.remove(index);
        removed.set_priority(None);
        renumber(&providers);
        log::info!("Removed provider {}", removed);
        Some(removed)
    }

    /// The provider called `name`
    pub fn get_provider(&self, name: &str) -> Option<Arc<Provider>> {
        self.read().iter().find(|p| p.name() == name).cloned()
    }

    /// Snapshot of the providers in priority order
    pub fn providers(&self) -> Vec<Arc<Provider>> {
        self.read().clone()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no provider is registered
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// The first provider, in priority order, declaring `service_type` and
    /// `algorithm`, together with the matching record
    pub fn find_service(&self, service_type: &str, algorithm: &str) -> Option<(Arc<Provider>, Arc<ServiceRecord>)> {
        self.providers().into_iter().find_map(|provider| {
            let service = provider.get_service(service_type, algorithm)?;
            Some((provider, service))
        })
    }

    /// Providers satisfying every predicate, in priority order.
    ///
    /// Keys are `<type>.<algorithm>` (with an empty value) or
    /// `<type>.<algorithm> <attribute>` (with the requested value). An empty
    /// map selects every provider.
    pub fn filter<K, V>(&self, predicates: impl IntoIterator<Item = (K, V)>) -> Result<Vec<Arc<Provider>>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let predicates = predicates
            .into_iter()
            .map(|(key, value)| Predicate::parse(key.as_ref(), value.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.select(&predicates))
    }

    /// Providers satisfying a `<type>.<algorithm>[ <attribute>:<value>]` selector
    pub fn filter_by_selector(&self, selector: &str) -> Result<Vec<Arc<Provider>>> {
        let predicate = Predicate::parse_selector(selector)?;
        Ok(self.select(std::slice::from_ref(&predicate)))
    }

    fn select(&self, predicates: &[Predicate]) -> Vec<Arc<Provider>> {
        self.providers()
            .into_iter()
            .filter(|provider| predicates.iter().all(|predicate| predicate.is_satisfied_by(provider)))
            .collect()
    }

    /// Upper-cased names of every algorithm offered for `service_type`
    pub fn algorithms(&self, service_type: &str) -> BTreeSet<String> {
        if service_type.is_empty() {
            return BTreeSet::new();
        }
        let service_type = engine::canonical_type(service_type);
        self.providers()
            .iter()
            .flat_map(|provider| provider.services().to_vec())
            .filter(|service| service.service_type().eq_ignore_ascii_case(&service_type))
            .map(|service| service.algorithm().to_ascii_uppercase())
            .collect()
    }
}

fn renumber(providers: &[Arc<Provider>]) {
    for (index, provider) in providers.iter().enumerate() {
        provider.set_priority(Some(index + 1));
    }
}
