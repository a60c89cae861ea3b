//! Core components of the provider registry.
//!
//! This module contains the property bag and its text format, service
//! records, the per-provider service index, providers, the provider registry
//! and engine lookup, plus configuration and error handling.

// Property storage
pub mod properties;

// Service descriptors
pub mod service;

// Per-provider index over explicit and property-derived services
pub mod index;

// Providers
pub mod provider;

// Ordered provider list
pub mod registry;

// Façade-facing lookup
pub mod engine;

// Registry configuration
pub mod config;

// Reserved keys and defaults
pub mod constants;

// Error handling
pub mod error;

// Re-exports for convenience
pub use self::config::RegistryConfig;
pub use self::constants::VERSION;
pub use self::engine::{EngineLookup, Instance};
pub use self::error::{CryptoError, Error, Result};
pub use self::properties::PropertyBag;
pub use self::provider::{Provider, ProviderBuilder};
pub use self::registry::ProviderRegistry;
pub use self::service::{ServiceKey, ServiceRecord};
