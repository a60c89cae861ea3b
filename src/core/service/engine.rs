/*!
Descriptions of the well-known engine (service) types.

The table drives type-name canonicalization and the rules for constructor
arguments and `supports_parameter` checks.
*/

use std::any::{Any, TypeId};
use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Declared constructor parameter of an engine type
#[derive(Debug, Clone, Copy)]
pub struct ConstructorParameter {
    /// Display name used in error messages
    pub name: &'static str,
    /// Runtime type an argument must have
    pub type_id: TypeId,
}

/// Static description of an engine type
#[derive(Debug, Clone, Copy)]
pub struct EngineDescription {
    /// Canonical type name
    pub name: &'static str,
    /// Whether `supports_parameter` may be used with this engine
    pub supports_parameter: bool,
    /// Parameter passed to the implementation's constructor, if any
    pub constructor_parameter: Option<ConstructorParameter>,
}

/// Parameters for `CertStore` implementations.
///
/// `CertStore` constructors receive this wrapper whatever concrete parameter
/// object the caller holds; the implementation unwraps it.
pub struct CertStoreParameters {
    inner: Box<dyn Any + Send + Sync>,
}

impl CertStoreParameters {
    /// Wrap a concrete parameter object
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self { inner: Box::new(inner) }
    }

    /// Borrow the concrete parameter object
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

/// Key metadata consulted by `supports_parameter`
pub trait KeyDescriptor {
    /// Names of the key's type and the types it can stand in for
    fn class_names(&self) -> Vec<&str>;

    /// Encoding format of the key, if it has one
    fn format(&self) -> Option<&str>;
}

fn engine(name: &'static str, supports_parameter: bool) -> EngineDescription {
    EngineDescription {
        name,
        supports_parameter,
        constructor_parameter: None,
    }
}

static ENGINES: Lazy<HashMap<String, EngineDescription>> = Lazy::new(|| {
    let mut engines = vec![
        engine("AlgorithmParameterGenerator", false),
        engine("AlgorithmParameters", false),
        engine("KeyFactory", false),
        engine("KeyPairGenerator", false),
        engine("KeyStore", false),
        engine("MessageDigest", false),
        engine("SecureRandom", false),
        engine("Signature", true),
        engine("CertificateFactory", false),
        engine("CertPathBuilder", false),
        engine("CertPathValidator", false),
        engine("Cipher", true),
        engine("ExemptionMechanism", false),
        engine("Mac", true),
        engine("KeyAgreement", true),
        engine("KeyGenerator", false),
        engine("SecretKeyFactory", false),
        engine("KEM", false),
        engine("KDF", false),
        engine("KeyManagerFactory", false),
        engine("SSLContext", false),
        engine("TrustManagerFactory", false),
    ];
    engines.push(EngineDescription {
        name: "CertStore",
        supports_parameter: false,
        constructor_parameter: Some(ConstructorParameter {
            name: "CertStoreParameters",
            type_id: TypeId::of::<CertStoreParameters>(),
        }),
    });

    engines
        .into_iter()
        .map(|description| (description.name.to_ascii_lowercase(), description))
        .collect()
});

/// Look up a well-known engine type, ignoring ASCII case
pub fn describe(service_type: &str) -> Option<&'static EngineDescription> {
    ENGINES.get(&service_type.to_ascii_lowercase())
}

/// Canonical spelling of a service type: the table's spelling for known
/// engines, the input unchanged otherwise
pub fn canonical_type(service_type: &str) -> String {
    match describe(service_type) {
        Some(description) => description.name.to_string(),
        None => service_type.to_string(),
    }
}
