/*!
Registry configuration.

This module describes which providers a registry is assembled from, in which
order, and the limits applied when providers load their property streams.
*/

use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::core::constants::{CONFIG_PROVIDER_PREFIX, DEFAULT_MAX_PROPERTY_BYTES};
use crate::core::error::{Error, Result};
use crate::core::properties::format;
use crate::invalid_argument_err;

/// Configuration for assembling a provider registry
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistryConfig {
    /// Provider names, highest priority first
    pub provider_order: Vec<String>,
    /// Largest property stream a provider accepts
    pub max_property_bytes: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            provider_order: Vec::new(),
            max_property_bytes: DEFAULT_MAX_PROPERTY_BYTES,
        }
    }
}

impl RegistryConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider at the lowest priority
    pub fn with_provider(mut self, name: impl Into<String>) -> Self {
        self.provider_order.push(name.into());
        self
    }

    /// Set the property stream limit
    pub fn with_max_property_bytes(mut self, limit: usize) -> Self {
        self.max_property_bytes = limit;
        self
    }

    /// Read the provider order from `security.provider.<n>=<name>` entries.
    ///
    /// Entries are ordered by `n`; gaps in the numbering are allowed. Other
    /// keys are ignored.
    pub fn from_properties(raw: &[u8]) -> Result<Self> {
        let mut ordered = BTreeMap::new();
        for (line, key, value) in format::parse_numbered(raw)? {
            let Some(position) = key.strip_prefix(CONFIG_PROVIDER_PREFIX) else {
                continue;
            };
            let position: usize = position.parse().map_err(|_| Error::InvalidFormat {
                line,
                reason: format!("provider position must be a number: {}", key),
            })?;
            if ordered.insert(position, value.trim().to_string()).is_some() {
                return Err(Error::InvalidFormat {
                    line,
                    reason: format!("provider position {} declared twice", position),
                });
            }
        }

        let config = Self {
            provider_order: ordered.into_values().collect(),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_property_bytes == 0 {
            return invalid_argument_err!("max_property_bytes must be positive");
        }

        let mut seen = HashSet::new();
        for name in &self.provider_order {
            if name.is_empty() {
                return invalid_argument_err!("provider names must be non-empty");
            }
            if !seen.insert(name.as_str()) {
                return invalid_argument_err!("provider {} listed more than once", name);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert!(config.provider_order.is_empty());
        assert_eq!(config.max_property_bytes, DEFAULT_MAX_PROPERTY_BYTES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_properties_orders_by_position() {
        let raw = b"security.provider.10=Late\nsecurity.provider.1=PQC\nother.key=ignored\nsecurity.provider.3=Legacy\n";
        let config = RegistryConfig::from_properties(raw).unwrap();
        assert_eq!(config.provider_order, vec!["PQC", "Legacy", "Late"]);
    }

    #[test]
    fn test_from_properties_rejects_bad_positions() {
        let raw = b"security.provider.1=PQC\nsecurity.provider.first=Legacy\n";
        match RegistryConfig::from_properties(raw) {
            Err(Error::InvalidFormat { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected InvalidFormat, got {:?}", other),
        }

        let raw = b"security.provider.1=PQC\nsecurity.provider.1=Legacy\n";
        assert!(matches!(RegistryConfig::from_properties(raw), Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let config = RegistryConfig::new().with_provider("PQC").with_provider("PQC");
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));

        let config = RegistryConfig::new().with_max_property_bytes(0);
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
    }
}
