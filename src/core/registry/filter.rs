/*!
Provider filter predicates.

A predicate key has the shape `<type>.<algorithm>` or
`<type>.<algorithm> <attribute>`. Predicates without an attribute take an
empty value and ask only whether the provider declares the service; predicates
with an attribute compare the declared attribute value.
*/

use crate::core::constants::{attributes, ATTRIBUTE_SEPARATOR, TYPE_SEPARATOR};
use crate::core::error::Result;
use crate::core::provider::Provider;
use crate::invalid_parameter_err;

/// Requested attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
enum Requirement {
    /// Declared key size must be at least this large
    KeySize(u64),
    /// Declared value must be equal, ignoring ASCII case
    Equals(String),
}

/// One parsed filter predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    service_type: String,
    algorithm: String,
    attribute: Option<(String, Requirement)>,
}

impl Predicate {
    /// Parse a predicate map entry
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        let Some((service_type, rest)) = key.split_once(TYPE_SEPARATOR) else {
            return invalid_parameter_err!("invalid filter {:?}: missing type separator", key);
        };
        let service_type = service_type.trim();
        let rest = rest.trim();

        let (algorithm, attribute) = match rest.split_once(ATTRIBUTE_SEPARATOR) {
            Some((algorithm, attribute)) => (algorithm, Some(attribute.trim())),
            None => (rest, None),
        };
        if service_type.is_empty() || algorithm.is_empty() || attribute.is_some_and(str::is_empty) {
            return invalid_parameter_err!("invalid filter {:?}: empty component", key);
        }

        let value = value.trim();
        let attribute = match attribute {
            None if value.is_empty() => None,
            None => {
                return invalid_parameter_err!("invalid filter {:?}: value given without an attribute", key);
            }
            Some(_) if value.is_empty() => {
                return invalid_parameter_err!("invalid filter {:?}: attribute given without a value", key);
            }
            Some(name) if name.eq_ignore_ascii_case(attributes::KEY_SIZE) => {
                let Ok(size) = value.parse::<u64>() else {
                    return invalid_parameter_err!("invalid filter {:?}: key size {:?} is not a number", key, value);
                };
                Some((name.to_string(), Requirement::KeySize(size)))
            }
            Some(name) => Some((name.to_string(), Requirement::Equals(value.to_string()))),
        };

        Ok(Self {
            service_type: service_type.to_string(),
            algorithm: algorithm.to_string(),
            attribute,
        })
    }

    /// Parse a selector: `<type>.<algorithm>` or `<type>.<algorithm> <attribute>:<value>`
    pub fn parse_selector(selector: &str) -> Result<Self> {
        match selector.split_once(ATTRIBUTE_SEPARATOR) {
            None => Self::parse(selector, ""),
            Some((service, condition)) => {
                let Some((attribute, value)) = condition.split_once(':') else {
                    return invalid_parameter_err!("invalid selector {:?}: missing ':'", selector);
                };
                let key = format!("{}{}{}", service, ATTRIBUTE_SEPARATOR, attribute.trim());
                Self::parse(&key, value)
            }
        }
    }

    /// Whether `provider` satisfies the predicate
    pub fn is_satisfied_by(&self, provider: &Provider) -> bool {
        let Some(service) = provider.get_service(&self.service_type, &self.algorithm) else {
            return false;
        };
        let Some((name, requirement)) = &self.attribute else {
            return true;
        };
        let Ok(Some(declared)) = service.attribute(name) else {
            return false;
        };

        match requirement {
            Requirement::KeySize(requested) => match declared.trim().parse::<u64>() {
                Ok(declared) => declared >= *requested,
                Err(_) => {
                    log::debug!(
                        "Provider {} declares non-numeric {} {:?} for {}.{}",
                        provider.name(),
                        name,
                        declared,
                        self.service_type,
                        self.algorithm
                    );
                    false
                }
            },
            Requirement::Equals(requested) => declared.trim().eq_ignore_ascii_case(requested),
        }
    }
}
