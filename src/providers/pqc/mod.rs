/*!
The bundled `PQC` provider.

Services are declared through the property stream in [`DECLARATIONS`];
implementations are built from the crate's post-quantum and symmetric
primitives:

- CRYSTALS-Kyber (Kyber768) key encapsulation
- CRYSTALS-Dilithium (Dilithium3) signatures
- ChaCha20-Poly1305 authenticated encryption
- SHA-256 and SHA-512 digests
- HKDF-SHA256 key derivation
- an OS-seeded random generator
*/

pub mod cipher;
pub mod digest;
pub mod kdf;
pub mod kem;
pub mod random;
pub mod signature;

use sha2::{Sha256, Sha512};

use crate::core::config::RegistryConfig;
use crate::core::constants::VERSION;
use crate::core::error::Result;
use crate::core::provider::{Provider, ProviderBuilder};
use crate::core::service::{FactoryTable, ServiceFactory};
use crate::spi::{AeadCipherSpi, KdfSpi, KemSpi, MessageDigestSpi, SecureRandomSpi, SignatureSpi};

use self::cipher::ChaCha20Poly1305Cipher;
use self::digest::Sha2Digest;
use self::kdf::HkdfSha256;
use self::kem::Kyber768Kem;
use self::random::NativePrng;
use self::signature::Dilithium3Signature;

/// Provider name
pub const NAME: &str = "PQC";

/// Service declarations of the provider
pub const DECLARATIONS: &str = r"# Digests
MessageDigest.SHA-256=pqc.digest.Sha256
Alg.Alias.MessageDigest.SHA256=SHA-256
Alg.Alias.MessageDigest.2.16.840.1.101.3.4.2.1=SHA-256
MessageDigest.SHA-256\ ImplementedIn=Software
MessageDigest.SHA-512=pqc.digest.Sha512
Alg.Alias.MessageDigest.SHA512=SHA-512
Alg.Alias.MessageDigest.2.16.840.1.101.3.4.2.3=SHA-512
MessageDigest.SHA-512\ ImplementedIn=Software

# Authenticated encryption
Cipher.ChaCha20-Poly1305=pqc.cipher.ChaCha20Poly1305
Alg.Alias.Cipher.ChaCha20Poly1305=ChaCha20-Poly1305
Cipher.ChaCha20-Poly1305\ KeySize=256
Cipher.ChaCha20-Poly1305\ SupportedKeyFormats=RAW
Cipher.ChaCha20-Poly1305\ ImplementedIn=Software

# Key encapsulation
KEM.Kyber768=pqc.kem.Kyber768
Alg.Alias.KEM.CRYSTALS-Kyber-768=Kyber768

# Signatures
Signature.Dilithium3=pqc.signature.Dilithium3
Alg.Alias.Signature.CRYSTALS-Dilithium-3=Dilithium3

# Randomness
SecureRandom.NativePRNG=pqc.random.NativePrng
Alg.Alias.SecureRandom.DEFAULT=NativePRNG

# Key derivation
KDF.HKDF-SHA256=pqc.kdf.HkdfSha256
";

/// Factories behind the class names in [`DECLARATIONS`]
pub fn factories() -> FactoryTable {
    FactoryTable::new()
        .register(
            "pqc.digest.Sha256",
            ServiceFactory::new(|| Ok(Box::new(Sha2Digest::<Sha256>::new()) as Box<dyn MessageDigestSpi>)),
        )
        .register(
            "pqc.digest.Sha512",
            ServiceFactory::new(|| Ok(Box::new(Sha2Digest::<Sha512>::new()) as Box<dyn MessageDigestSpi>)),
        )
        .register(
            "pqc.cipher.ChaCha20Poly1305",
            ServiceFactory::new(|| Ok(Box::new(ChaCha20Poly1305Cipher::new()) as Box<dyn AeadCipherSpi>)),
        )
        .register(
            "pqc.kem.Kyber768",
            ServiceFactory::new(|| Ok(Box::new(Kyber768Kem) as Box<dyn KemSpi>)),
        )
        .register(
            "pqc.signature.Dilithium3",
            ServiceFactory::new(|| Ok(Box::new(Dilithium3Signature) as Box<dyn SignatureSpi>)),
        )
        .register(
            "pqc.random.NativePrng",
            ServiceFactory::new(|| Ok(Box::new(NativePrng::new()) as Box<dyn SecureRandomSpi>)),
        )
        .register(
            "pqc.kdf.HkdfSha256",
            ServiceFactory::new(|| Ok(Box::new(HkdfSha256) as Box<dyn KdfSpi>)),
        )
}

fn builder() -> ProviderBuilder {
    Provider::builder(NAME)
        .version(VERSION)
        .info("Post-quantum provider (Kyber768, Dilithium3, ChaCha20-Poly1305, SHA-2, HKDF)")
        .factories(factories())
        .declarations(DECLARATIONS)
}

/// Build the provider
pub fn provider() -> Result<Provider> {
    builder().build()
}

/// Build the provider with the limits of `config`
pub fn provider_with_config(config: &RegistryConfig) -> Result<Provider> {
    builder().with_config(config).build()
}
