/*!
# PQC Provider

A pluggable cryptographic provider registry with property-driven service
discovery, and a bundled provider built on NIST's post-quantum algorithms.

## Overview

- Providers declare services either explicitly or through flat `key=value`
  properties (`<type>.<algorithm>`, `Alg.Alias.<type>.<alias>`,
  `<type>.<algorithm> <attribute>`)
- Property writes are batched and indexed lazily on the next lookup
- Explicitly registered services always take precedence over property
  declarations of the same name
- Algorithm names and aliases are matched without regard to ASCII case
- Providers are consulted in dense 1-based priority order
- Implementations are built through a class-name keyed factory table

## Example

```
use std::sync::Arc;
use pqc_provider::{EngineLookup, ProviderRegistry, providers, spi::MessageDigestSpi};

let registry = ProviderRegistry::new();
registry.add_provider(Arc::new(providers::pqc::provider()?));

let instance = EngineLookup::new(&registry).get_instance("MessageDigest", "sha256", None)?;
let mut digest = instance.downcast::<Box<dyn MessageDigestSpi>>()?;
digest.update(b"abc");
assert_eq!(digest.digest().len(), 32);
# Ok::<(), pqc_provider::Error>(())
```
*/

// Registry core
pub mod core;

// Service provider interfaces
pub mod spi;

// Bundled providers
pub mod providers;

// Serialization support (optional)
#[cfg(feature = "serde-support")]
pub mod serde;

// Re-export commonly used types for convenience
pub use self::core::config::RegistryConfig;
pub use self::core::constants::VERSION;
pub use self::core::engine::{EngineLookup, Instance};
pub use self::core::error::{CryptoError, Error, Result};
pub use self::core::index::ServiceIndex;
pub use self::core::properties::PropertyBag;
pub use self::core::provider::{Provider, ProviderBuilder};
pub use self::core::registry::{Predicate, ProviderRegistry};
pub use self::core::service::{
    CertStoreParameters, FactoryTable, KeyDescriptor, ServiceFactory, ServiceKey, ServiceRecord, SpiObject,
};
