/*!
Service records: one (type, algorithm) implementation offered by a provider.
*/

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::core::constants::attributes;
use crate::core::error::{Error, Result};
use crate::core::service::engine::{self, KeyDescriptor};
use crate::core::service::factory::{FactoryTable, ServiceFactory, SpiObject};
use crate::core::service::key::{self, ServiceKey};
use crate::{invalid_argument_err, invalid_parameter_err};

/// Identity of the provider owning a record, plus the table its class names
/// resolve against
#[derive(Debug, Clone)]
pub struct ProviderRef {
    name: Arc<str>,
    factories: Arc<FactoryTable>,
}

impl ProviderRef {
    pub(crate) fn new(name: &str, factories: Arc<FactoryTable>) -> Self {
        Self {
            name: Arc::from(name),
            factories,
        }
    }

    /// Provider name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Attribute name compared without regard to ASCII case
#[derive(Debug, Clone, Eq)]
struct AttributeName(String);

impl PartialEq for AttributeName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Hash for AttributeName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

/// Descriptor of one service implementation
#[derive(Clone)]
pub struct ServiceRecord {
    provider: ProviderRef,
    service_type: String,
    algorithm: String,
    class_name: String,
    aliases: Vec<String>,
    attributes: IndexMap<AttributeName, String>,
    // Resolved factory for the current class name
    factory: OnceCell<Arc<ServiceFactory>>,
}

impl ServiceRecord {
    /// Create a record owned by `provider`.
    ///
    /// The type, algorithm and class name must be non-empty.
    pub fn new(provider: &ProviderRef, service_type: &str, algorithm: &str, class_name: &str) -> Result<Self> {
        if service_type.is_empty() || algorithm.is_empty() || class_name.is_empty() {
            return invalid_argument_err!(
                "service type, algorithm and class name must be non-empty ({:?}, {:?}, {:?})",
                service_type,
                algorithm,
                class_name
            );
        }
        let mut record = Self::placeholder(provider.clone(), service_type, algorithm);
        record.class_name = class_name.to_string();
        Ok(record)
    }

    /// A record without a class name yet, as synthesized from attribute or
    /// alias declarations that arrive before the base declaration
    pub(crate) fn placeholder(provider: ProviderRef, service_type: &str, algorithm: &str) -> Self {
        Self {
            provider,
            service_type: engine::canonical_type(service_type),
            algorithm: algorithm.to_string(),
            class_name: String::new(),
            aliases: Vec::new(),
            attributes: IndexMap::new(),
            factory: OnceCell::new(),
        }
    }

    /// Builder-style alias addition
    pub fn with_alias(mut self, alias: &str) -> Result<Self> {
        self.add_alias(alias)?;
        Ok(self)
    }

    /// Builder-style attribute addition
    pub fn with_attribute(mut self, name: &str, value: &str) -> Result<Self> {
        self.put_attribute(name, value)?;
        Ok(self)
    }

    /// Owning provider
    pub fn provider(&self) -> &ProviderRef {
        &self.provider
    }

    /// Name of the owning provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Canonical service type
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// Standard algorithm name, as declared
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Implementation class name
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Aliases, as declared
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Attributes, as declared
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.0.as_str(), v.as_str()))
    }

    /// Value of attribute `name`, matched ignoring ASCII case
    pub fn attribute(&self, name: &str) -> Result<Option<&str>> {
        if name.is_empty() {
            return invalid_argument_err!("attribute name must be non-empty");
        }
        Ok(self.attributes.get(&AttributeName(name.to_string())).map(String::as_str))
    }

    /// Add an alias; duplicates (ignoring case) are ignored
    pub fn add_alias(&mut self, alias: &str) -> Result<()> {
        if alias.is_empty() {
            return invalid_argument_err!("alias must be non-empty");
        }
        self.push_alias(alias);
        Ok(())
    }

    /// Set attribute `name` to `value`
    pub fn put_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() {
            return invalid_argument_err!("attribute name must be non-empty");
        }
        self.set_attribute(name, value);
        Ok(())
    }

    pub(crate) fn push_alias(&mut self, alias: &str) {
        if !self.aliases.iter().any(|a| a.eq_ignore_ascii_case(alias)) {
            self.aliases.push(alias.to_string());
        }
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(AttributeName(name.to_string()), value.to_string());
    }

    pub(crate) fn remove_alias(&mut self, alias: &str) {
        self.aliases.retain(|a| !a.eq_ignore_ascii_case(alias));
    }

    pub(crate) fn remove_attribute(&mut self, name: &str) {
        self.attributes.shift_remove(&AttributeName(name.to_string()));
    }

    /// Point the record at a different implementation; drops the memoized
    /// factory so the next instantiation resolves the new name
    pub(crate) fn set_class_name(&mut self, class_name: &str) {
        if self.class_name != class_name {
            self.class_name = class_name.to_string();
            self.factory = OnceCell::new();
        }
    }

    /// Whether the record names an implementation
    pub(crate) fn is_complete(&self) -> bool {
        !self.class_name.is_empty()
    }

    /// Index key of the standard algorithm name
    pub fn key(&self) -> ServiceKey {
        ServiceKey::new(&self.service_type, &self.algorithm)
    }

    /// Index keys of the aliases
    pub(crate) fn alias_keys(&self) -> impl Iterator<Item = ServiceKey> + '_ {
        self.aliases.iter().map(|alias| ServiceKey::new(&self.service_type, alias))
    }

    /// The property entries that declare this record
    pub(crate) fn property_strings(&self) -> Vec<(String, String)> {
        let mut strings = Vec::with_capacity(1 + self.aliases.len() + self.attributes.len());
        strings.push((key::implementation_key(&self.service_type, &self.algorithm), self.class_name.clone()));
        for alias in &self.aliases {
            strings.push((key::alias_key(&self.service_type, alias), self.algorithm.clone()));
        }
        for (name, value) in &self.attributes {
            strings.push((key::attribute_key(&self.service_type, &self.algorithm, &name.0), value.clone()));
        }
        strings
    }

    fn resolve_factory(&self) -> Result<&Arc<ServiceFactory>> {
        self.factory.get_or_try_init(|| {
            self.provider.factories.resolve(&self.class_name).ok_or_else(|| Error::Instantiation {
                class_name: self.class_name.clone(),
                reason: format!("class not registered with provider {}", self.provider.name()),
            })
        })
    }

    fn no_such_algorithm(&self, cause: Error) -> Error {
        let cause = match cause {
            Error::Instantiation { class_name, reason } if class_name.is_empty() => Error::Instantiation {
                class_name: self.class_name.clone(),
                reason,
            },
            other => other,
        };
        Error::NoSuchAlgorithm {
            service_type: self.service_type.clone(),
            algorithm: self.algorithm.clone(),
            provider: Some(self.provider.name().to_string()),
            source: Some(Box::new(cause)),
        }
    }

    /// Construct the implementation.
    ///
    /// Known engines without a declared constructor parameter reject any
    /// argument; `CertStore` requires [`CertStoreParameters`](engine::CertStoreParameters);
    /// other types dispatch on the argument's runtime type.
    pub fn instantiate(&self, arg: Option<&dyn Any>) -> Result<SpiObject> {
        let description = engine::describe(&self.service_type);

        let parameter_type = match (description, arg) {
            (_, None) => None,
            (None, Some(arg)) => Some(Any::type_id(arg)),
            (Some(description), Some(arg)) => match description.constructor_parameter {
                None => {
                    return invalid_parameter_err!(
                        "constructor parameter not used with {} engines",
                        self.service_type
                    );
                }
                Some(parameter) if parameter.type_id != Any::type_id(arg) => {
                    return invalid_parameter_err!(
                        "parameter object not an instance of {}",
                        parameter.name
                    );
                }
                Some(parameter) => Some(parameter.type_id),
            },
        };

        let factory = self.resolve_factory().map_err(|e| self.no_such_algorithm(e))?;
        let constructed = match (parameter_type, arg) {
            (Some(parameter_type), Some(arg)) => factory.construct_with(parameter_type, arg),
            _ => factory.construct(),
        };
        constructed.map_err(|e| {
            log::warn!("Failed to instantiate {} for {}.{}: {}", self.class_name, self.service_type, self.algorithm, e);
            self.no_such_algorithm(e)
        })
    }

    /// Whether this service can use `key` as a parameter.
    ///
    /// Only engines that take keys (Signature, Cipher, Mac, KeyAgreement)
    /// answer; services without `SupportedKeyClasses`/`SupportedKeyFormats`
    /// attributes accept every key.
    pub fn supports_parameter(&self, key: Option<&dyn KeyDescriptor>) -> Result<bool> {
        match engine::describe(&self.service_type) {
            None => return Ok(true),
            Some(description) if !description.supports_parameter => {
                return invalid_parameter_err!(
                    "supports_parameter() not used with {} engines",
                    self.service_type
                );
            }
            Some(_) => {}
        }

        let classes = self.attribute(attributes::SUPPORTED_KEY_CLASSES)?;
        let formats = self.attribute(attributes::SUPPORTED_KEY_FORMATS)?;
        if classes.is_none() && formats.is_none() {
            return Ok(true);
        }
        let Some(key) = key else {
            return Ok(false);
        };

        if let (Some(formats), Some(format)) = (formats, key.format()) {
            if formats.split(attributes::LIST_SEPARATOR).any(|f| f == format) {
                return Ok(true);
            }
        }
        if let Some(classes) = classes {
            let key_classes = key.class_names();
            if classes
                .split(attributes::LIST_SEPARATOR)
                .any(|c| key_classes.contains(&c))
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl PartialEq for ServiceRecord {
    fn eq(&self, other: &Self) -> bool {
        self.provider.name() == other.provider.name()
            && self.service_type == other.service_type
            && self.algorithm == other.algorithm
            && self.class_name == other.class_name
            && self.aliases == other.aliases
            && self.attributes == other.attributes
    }
}

impl Eq for ServiceRecord {}

impl fmt::Debug for ServiceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRecord")
            .field("provider", &self.provider.name())
            .field("service_type", &self.service_type)
            .field("algorithm", &self.algorithm)
            .field("class_name", &self.class_name)
            .field("aliases", &self.aliases)
            .field("attributes", &self.attributes.iter().map(|(k, v)| (&k.0, v)).collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for ServiceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}.{} -> {}",
            self.provider.name(),
            self.service_type,
            self.algorithm,
            self.class_name
        )?;
        if !self.aliases.is_empty() {
            write!(f, " aliases: [{}]", self.aliases.join(", "))?;
        }
        if !self.attributes.is_empty() {
            let attributes: Vec<String> = self.attributes.iter().map(|(k, v)| format!("{}={}", k.0, v)).collect();
            write!(f, " attributes: {{{}}}", attributes.join(", "))?;
        }
        Ok(())
    }
}
