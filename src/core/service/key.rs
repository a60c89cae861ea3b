/*!
Index keys and declaration-key parsing.
*/

use std::fmt;

use crate::core::constants::{ALIAS_PREFIX, ATTRIBUTE_SEPARATOR, PROVIDER_PREFIX, TYPE_SEPARATOR};
use crate::core::service::engine;

/// Two-part index key: canonical service type and upper-cased algorithm
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceKey {
    service_type: String,
    algorithm: String,
}

impl ServiceKey {
    /// Build a key, canonicalizing the type and upper-casing the algorithm
    pub fn new(service_type: &str, algorithm: &str) -> Self {
        Self {
            service_type: engine::canonical_type(service_type),
            algorithm: algorithm.to_ascii_uppercase(),
        }
    }

    /// Canonical service type
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// Upper-cased algorithm or alias
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service_type, self.algorithm)
    }
}

/// The shape of a service-declaring property key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationKey {
    /// `<type>.<algorithm>` = class name
    Implementation { service_type: String, algorithm: String },
    /// `Alg.Alias.<type>.<alias>` = algorithm
    Alias { service_type: String, alias: String },
    /// `<type>.<algorithm> <attribute>` = value
    Attribute { service_type: String, algorithm: String, name: String },
}

impl DeclarationKey {
    /// Classify a property key by its shape.
    ///
    /// Returns `None` for metadata keys and for keys that do not declare
    /// anything (no type separator, empty components).
    pub fn parse(key: &str) -> Option<Self> {
        if key.starts_with(PROVIDER_PREFIX) {
            return None;
        }

        if starts_with_ignore_case(key, ALIAS_PREFIX) {
            let (service_type, alias) = split_type(&key[ALIAS_PREFIX.len()..])?;
            return Some(DeclarationKey::Alias {
                service_type: engine::canonical_type(service_type),
                alias: alias.to_string(),
            });
        }

        let (service_type, rest) = split_type(key)?;
        let service_type = engine::canonical_type(service_type);
        match rest.split_once(ATTRIBUTE_SEPARATOR) {
            None => Some(DeclarationKey::Implementation {
                service_type,
                algorithm: rest.to_string(),
            }),
            Some((algorithm, name)) => {
                let name = name.trim();
                if algorithm.is_empty() || name.is_empty() {
                    log::debug!("Ignoring invalid attribute entry: {}", key);
                    return None;
                }
                Some(DeclarationKey::Attribute {
                    service_type,
                    algorithm: algorithm.to_string(),
                    name: name.to_string(),
                })
            }
        }
    }

    /// Index key of the record this declaration targets, given the entry value.
    ///
    /// For aliases the value names the target algorithm.
    pub fn target(&self, value: &str) -> ServiceKey {
        match self {
            DeclarationKey::Implementation { service_type, algorithm }
            | DeclarationKey::Attribute { service_type, algorithm, .. } => {
                ServiceKey::new(service_type, algorithm)
            }
            DeclarationKey::Alias { service_type, .. } => ServiceKey::new(service_type, value),
        }
    }

    /// Index key of the alias an alias declaration introduces
    pub fn alias_key(&self) -> Option<ServiceKey> {
        match self {
            DeclarationKey::Alias { service_type, alias } => Some(ServiceKey::new(service_type, alias)),
            _ => None,
        }
    }
}

/// Split `<type>.<rest>` at the first separator; both halves must be non-empty
fn split_type(key: &str) -> Option<(&str, &str)> {
    match key.find(TYPE_SEPARATOR) {
        Some(i) if i > 0 && i + 1 < key.len() => Some((&key[..i], &key[i + 1..])),
        _ => {
            log::debug!("Ignoring invalid entry in provider: {}", key);
            None
        }
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Property key declaring an implementation
pub fn implementation_key(service_type: &str, algorithm: &str) -> String {
    format!("{}{}{}", service_type, TYPE_SEPARATOR, algorithm)
}

/// Property key declaring an alias
pub fn alias_key(service_type: &str, alias: &str) -> String {
    format!("{}{}{}{}", ALIAS_PREFIX, service_type, TYPE_SEPARATOR, alias)
}

/// Property key declaring an attribute
pub fn attribute_key(service_type: &str, algorithm: &str, name: &str) -> String {
    format!("{}{}{}{}{}", service_type, TYPE_SEPARATOR, algorithm, ATTRIBUTE_SEPARATOR, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_case_insensitive_on_algorithm() {
        assert_eq!(ServiceKey::new("MessageDigest", "sha-1"), ServiceKey::new("MessageDigest", "SHA-1"));
        assert_eq!(ServiceKey::new("messagedigest", "SHA-1"), ServiceKey::new("MessageDigest", "SHA-1"));
        assert_eq!(ServiceKey::new("MessageDigest", "sha-1").to_string(), "MessageDigest.SHA-1");
    }

    #[test]
    fn test_parse_implementation() {
        assert_eq!(
            DeclarationKey::parse("MessageDigest.SHA-256"),
            Some(DeclarationKey::Implementation {
                service_type: "MessageDigest".into(),
                algorithm: "SHA-256".into(),
            })
        );
        // Algorithm names may contain dots (OIDs)
        assert_eq!(
            DeclarationKey::parse("Signature.1.2.840.113549.1.1.11"),
            Some(DeclarationKey::Implementation {
                service_type: "Signature".into(),
                algorithm: "1.2.840.113549.1.1.11".into(),
            })
        );
    }

    #[test]
    fn test_parse_alias_prefix_ignores_case() {
        assert_eq!(
            DeclarationKey::parse("alg.alias.MessageDigest.SHA1"),
            Some(DeclarationKey::Alias {
                service_type: "MessageDigest".into(),
                alias: "SHA1".into(),
            })
        );
    }

    #[test]
    fn test_parse_attribute() {
        assert_eq!(
            DeclarationKey::parse("Cipher.AES KeySize"),
            Some(DeclarationKey::Attribute {
                service_type: "Cipher".into(),
                algorithm: "AES".into(),
                name: "KeySize".into(),
            })
        );
    }

    #[test]
    fn test_parse_ignores_metadata_and_malformed_keys() {
        assert_eq!(DeclarationKey::parse("Provider.id name"), None);
        assert_eq!(DeclarationKey::parse("NoSeparator"), None);
        assert_eq!(DeclarationKey::parse(".SHA-1"), None);
        assert_eq!(DeclarationKey::parse("MessageDigest."), None);
        assert_eq!(DeclarationKey::parse("Alg.Alias.MessageDigest"), None);
        assert_eq!(DeclarationKey::parse("Cipher. KeySize"), None);
    }

    #[test]
    fn test_target() {
        let alias = DeclarationKey::parse("Alg.Alias.MessageDigest.MD-5").unwrap();
        assert_eq!(alias.target("md5"), ServiceKey::new("MessageDigest", "MD5"));
    }

    #[test]
    fn test_alias_key() {
        let alias = DeclarationKey::parse("Alg.Alias.MessageDigest.SHA1").unwrap();
        assert_eq!(alias.alias_key(), Some(ServiceKey::new("MessageDigest", "sha1")));
        assert_eq!(DeclarationKey::parse("MessageDigest.SHA1").unwrap().alias_key(), None);
    }

    #[test]
    fn test_key_builders() {
        assert_eq!(implementation_key("Cipher", "AES"), "Cipher.AES");
        assert_eq!(alias_key("Cipher", "Rijndael"), "Alg.Alias.Cipher.Rijndael");
        assert_eq!(attribute_key("Cipher", "AES", "KeySize"), "Cipher.AES KeySize");
    }
}
