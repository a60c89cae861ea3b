/*!
Error handling for the provider registry.

Lookup misses are not errors at this level (they surface as `None`); only the
engine lookup layer escalates a miss to [`Error::NoSuchAlgorithm`].
*/

use std::io;
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for registry operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error while bulk-loading provider properties
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No registered provider supplies the requested service, or the
    /// implementation backing it could not be constructed
    #[error("{service_type} {algorithm} not available{}", provider_suffix(.provider))]
    NoSuchAlgorithm {
        service_type: String,
        algorithm: String,
        provider: Option<String>,
        #[source]
        source: Option<Box<Error>>,
    },

    /// An explicitly named provider is not registered
    #[error("No such provider: {0}")]
    NoSuchProvider(String),

    /// Empty names, malformed keys or mismatched ownership
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed filter predicates or rejected constructor parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The implementation behind a class name could not be constructed
    #[error("Cannot instantiate {class_name}: {reason}")]
    Instantiation {
        class_name: String,
        reason: String,
    },

    /// Malformed property stream
    #[error("Invalid property format at line {line}: {reason}")]
    InvalidFormat {
        line: usize,
        reason: String,
    },

    /// Cryptographic error raised by a provider implementation
    #[error("Cryptographic operation failed")]
    Crypto(#[source] CryptoError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Cryptographic errors with limited details to prevent leaking information
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// Generic encryption error
    #[error("Encryption failed")]
    EncryptionFailed,

    /// Generic decryption error
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Key derivation error
    #[error("Key derivation failed")]
    KeyDerivationFailed,

    /// Invalid key format
    #[error("Invalid key format")]
    InvalidKeyFormat,

    /// Invalid signature format
    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    /// Nonce of the wrong length
    #[error("Invalid nonce length")]
    InvalidNonce,
}

fn provider_suffix(provider: &Option<String>) -> String {
    match provider {
        Some(name) => format!(" from provider {}", name),
        None => String::new(),
    }
}

impl Error {
    /// Build a `NoSuchAlgorithm` error for a (type, algorithm) pair
    pub fn no_such_algorithm(service_type: &str, algorithm: &str) -> Self {
        Error::NoSuchAlgorithm {
            service_type: service_type.to_string(),
            algorithm: algorithm.to_string(),
            provider: None,
            source: None,
        }
    }

    /// Attach the provider name to a `NoSuchAlgorithm` error
    pub fn with_provider(self, name: &str) -> Self {
        match self {
            Error::NoSuchAlgorithm { service_type, algorithm, source, .. } => Error::NoSuchAlgorithm {
                service_type,
                algorithm,
                provider: Some(name.to_string()),
                source,
            },
            other => other,
        }
    }
}

/// Create an invalid argument error
#[macro_export]
macro_rules! invalid_argument_err {
    ($msg:expr) => {
        Err($crate::Error::InvalidArgument($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        Err($crate::Error::InvalidArgument(format!($fmt, $($arg)*)))
    };
}

/// Create an invalid parameter error
#[macro_export]
macro_rules! invalid_parameter_err {
    ($msg:expr) => {
        Err($crate::Error::InvalidParameter($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        Err($crate::Error::InvalidParameter(format!($fmt, $($arg)*)))
    };
}

/// Create a no-such-algorithm error for a (type, algorithm) pair
#[macro_export]
macro_rules! no_such_algorithm_err {
    ($service_type:expr, $algorithm:expr) => {
        Err($crate::Error::no_such_algorithm($service_type, $algorithm))
    };
    ($service_type:expr, $algorithm:expr, $provider:expr) => {
        Err($crate::Error::no_such_algorithm($service_type, $algorithm).with_provider($provider))
    };
}

/// Create a crypto error
#[macro_export]
macro_rules! crypto_err {
    ($err:expr) => {
        Err($crate::Error::Crypto($err))
    };
}

/// Convert from Error to io::Error (for compatibility)
impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(io_error) => io_error,
            Error::InvalidFormat { .. } => io::Error::new(io::ErrorKind::InvalidData, error.to_string()),
            Error::InvalidArgument(msg) | Error::InvalidParameter(msg) => {
                io::Error::new(io::ErrorKind::InvalidInput, msg)
            }
            Error::NoSuchAlgorithm { .. } | Error::NoSuchProvider(_) => {
                io::Error::new(io::ErrorKind::NotFound, error.to_string())
            }
            Error::Crypto(_) => io::Error::new(io::ErrorKind::InvalidData, "Cryptographic error"),
            Error::Instantiation { .. } | Error::Internal(_) => io::Error::other(error.to_string()),
        }
    }
}
