/*!
Provider builder.

This module provides a builder pattern for assembling providers from a
factory table, metadata and an initial set of property declarations.
*/

use crate::core::config::RegistryConfig;
use crate::core::constants::DEFAULT_MAX_PROPERTY_BYTES;
use crate::core::error::Result;
use crate::core::provider::Provider;
use crate::core::service::FactoryTable;

/// Builder for [`Provider`] instances
pub struct ProviderBuilder {
    /// Provider name
    name: String,

    /// Version string
    version: String,

    /// Description
    info: String,

    /// Class name to constructor mapping
    factories: FactoryTable,

    /// Property streams loaded after construction, in order
    declarations: Vec<Vec<u8>>,

    /// Limit applied to every property stream
    max_property_bytes: usize,
}

impl ProviderBuilder {
    /// Create a new builder for a provider called `name`
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: String::new(),
            info: String::new(),
            factories: FactoryTable::new(),
            declarations: Vec::new(),
            max_property_bytes: DEFAULT_MAX_PROPERTY_BYTES,
        }
    }

    /// Set the version string
    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Set the description
    pub fn info(mut self, info: &str) -> Self {
        self.info = info.to_string();
        self
    }

    /// Use `factories` to construct the provider's implementations
    pub fn factories(mut self, factories: FactoryTable) -> Self {
        self.factories = factories;
        self
    }

    /// Queue a property stream of service declarations
    pub fn declarations(mut self, text: impl AsRef<[u8]>) -> Self {
        self.declarations.push(text.as_ref().to_vec());
        self
    }

    /// Set the largest property stream the provider accepts
    pub fn max_property_bytes(mut self, limit: usize) -> Self {
        self.max_property_bytes = limit;
        self
    }

    /// Apply the limits of a registry configuration
    pub fn with_config(mut self, config: &RegistryConfig) -> Self {
        self.max_property_bytes = config.max_property_bytes;
        self
    }

    /// Build the provider and load the queued declarations
    pub fn build(self) -> Result<Provider> {
        let provider = Provider::assemble(
            &self.name,
            &self.version,
            &self.info,
            self.factories,
            self.max_property_bytes,
        )?;
        for text in &self.declarations {
            provider.load(text)?;
        }
        log::debug!("Built provider {}", provider);
        Ok(provider)
    }
}
