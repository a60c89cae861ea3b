/*!
Service descriptors and their instantiation.

A [`ServiceRecord`] names one implementation of an algorithm for an engine
type. Implementations are built through the provider's [`FactoryTable`],
keyed by the record's class name.
*/

pub mod engine;
pub mod factory;
pub mod key;
pub mod record;

pub use engine::{CertStoreParameters, EngineDescription, KeyDescriptor};
pub use factory::{FactoryTable, ServiceFactory, SpiObject};
pub use key::{DeclarationKey, ServiceKey};
pub use record::{ProviderRef, ServiceRecord};
