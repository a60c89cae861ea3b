/*!
Constants for the provider registry.

This module contains the reserved property key shapes, standard attribute
names and the configurable defaults.
*/

/// Crate version, reported by the bundled provider
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Keys with this prefix are provider metadata, never service declarations
pub const PROVIDER_PREFIX: &str = "Provider.";

/// Prefix of alias declarations: `Alg.Alias.<type>.<alias> = <algorithm>`
pub const ALIAS_PREFIX: &str = "Alg.Alias.";

/// Separator between service type and algorithm in a declaration key
pub const TYPE_SEPARATOR: char = '.';

/// Separator between algorithm and attribute name in a declaration key
pub const ATTRIBUTE_SEPARATOR: char = ' ';

/// Default upper bound on a property stream accepted by `Provider::load`
pub const DEFAULT_MAX_PROPERTY_BYTES: usize = 1 << 20;

/// Prefix of provider order entries in a registry configuration stream
pub const CONFIG_PROVIDER_PREFIX: &str = "security.provider.";

/// Metadata keys seeded into every provider's properties
pub mod metadata {
    /// Provider name
    pub const NAME: &str = "Provider.id name";

    /// Provider version string
    pub const VERSION: &str = "Provider.id version";

    /// Human-readable description
    pub const INFO: &str = "Provider.id info";
}

/// Standard service attribute names
pub mod attributes {
    /// Compared numerically by provider filters (declared >= requested)
    pub const KEY_SIZE: &str = "KeySize";

    /// "Software" or "Hardware"
    pub const IMPLEMENTED_IN: &str = "ImplementedIn";

    /// `|`-separated list of key type names accepted by the service
    pub const SUPPORTED_KEY_CLASSES: &str = "SupportedKeyClasses";

    /// `|`-separated list of key encodings accepted by the service
    pub const SUPPORTED_KEY_FORMATS: &str = "SupportedKeyFormats";

    /// Separator used by the list-valued attributes above
    pub const LIST_SEPARATOR: char = '|';
}
