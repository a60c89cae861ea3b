/*!
Registry of providers.

Providers are consulted in priority order; the first one declaring a
requested service wins.
*/

pub mod filter;
pub mod manager;

pub use filter::Predicate;
pub use manager::ProviderRegistry;
