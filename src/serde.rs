/*!
Serialization support for the provider registry.

This module provides serializable snapshots of services, providers and
registries. It's only built when the `serde-support` feature is enabled.
*/

use serde::{Deserialize, Serialize};

use crate::core::provider::Provider;
use crate::core::registry::ProviderRegistry;
use crate::core::service::ServiceRecord;

/// Serializable version of ServiceRecord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerdeServiceRecord {
    /// Owning provider
    pub provider: String,
    /// Service type
    pub service_type: String,
    /// Standard algorithm name
    pub algorithm: String,
    /// Implementation class name
    pub class_name: String,
    /// Aliases
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Attributes, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
}

impl From<&ServiceRecord> for SerdeServiceRecord {
    fn from(record: &ServiceRecord) -> Self {
        Self {
            provider: record.provider_name().to_string(),
            service_type: record.service_type().to_string(),
            algorithm: record.algorithm().to_string(),
            class_name: record.class_name().to_string(),
            aliases: record.aliases().to_vec(),
            attributes: record
                .attributes()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }
}

/// Serializable snapshot of a Provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerdeProvider {
    /// Provider name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub info: String,
    /// Registry position, absent while unregistered
    pub priority: Option<usize>,
    /// Services, explicit ones first
    pub services: Vec<SerdeServiceRecord>,
}

impl From<&Provider> for SerdeProvider {
    fn from(provider: &Provider) -> Self {
        Self {
            name: provider.name().to_string(),
            version: provider.version().to_string(),
            info: provider.info().to_string(),
            priority: provider.priority(),
            services: provider.services().iter().map(|s| SerdeServiceRecord::from(s.as_ref())).collect(),
        }
    }
}

/// Snapshot every provider of `registry`, in priority order
pub fn snapshot(registry: &ProviderRegistry) -> Vec<SerdeProvider> {
    registry.providers().iter().map(|p| SerdeProvider::from(p.as_ref())).collect()
}
