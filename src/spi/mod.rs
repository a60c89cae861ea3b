/*!
Service provider interfaces.

These are the contracts concrete implementations satisfy for each engine
type. A provider registers its implementations boxed as the trait object
(`Box<dyn MessageDigestSpi>` and so on) so that a façade can take the
instantiated service with [`Instance::downcast`](crate::Instance::downcast)
without knowing the concrete type.
*/

use crate::core::error::Result;

/// `MessageDigest` implementations
pub trait MessageDigestSpi: Send + Sync {
    /// Feed more input
    fn update(&mut self, data: &[u8]);

    /// Complete the hash and reset for the next message
    fn digest(&mut self) -> Vec<u8>;

    /// Discard buffered input
    fn reset(&mut self);

    /// Output length in bytes
    fn digest_len(&self) -> usize;
}

/// Authenticated `Cipher` implementations
pub trait AeadCipherSpi: Send + Sync {
    /// Key the cipher
    fn init(&mut self, key: &[u8]) -> Result<()>;

    /// Encrypt `plaintext`, authenticating `aad` alongside it
    fn encrypt(&self, nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt and verify `ciphertext`
    fn decrypt(&self, nonce: &[u8], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>>;

    /// Key length in bytes
    fn key_len(&self) -> usize;

    /// Nonce length in bytes
    fn nonce_len(&self) -> usize;
}

/// `KEM` implementations
pub trait KemSpi: Send + Sync {
    /// Generate a key pair, returned as (public key, secret key)
    fn generate_keypair(&self) -> Result<(Vec<u8>, Vec<u8>)>;

    /// Create a shared secret for `public_key`, returned as (shared secret, ciphertext)
    fn encapsulate(&self, public_key: &[u8]) -> Result<(Vec<u8>, Vec<u8>)>;

    /// Recover the shared secret from `ciphertext`
    fn decapsulate(&self, ciphertext: &[u8], secret_key: &[u8]) -> Result<Vec<u8>>;
}

/// `Signature` implementations
pub trait SignatureSpi: Send + Sync {
    /// Generate a key pair, returned as (public key, secret key)
    fn generate_keypair(&self) -> Result<(Vec<u8>, Vec<u8>)>;

    /// Produce a detached signature over `data`
    fn sign(&self, data: &[u8], secret_key: &[u8]) -> Result<Vec<u8>>;

    /// Check a detached signature
    fn verify(&self, data: &[u8], signature: &[u8], public_key: &[u8]) -> Result<()>;
}

/// `SecureRandom` implementations
pub trait SecureRandomSpi: Send + Sync {
    /// Fill `out` with random bytes
    fn next_bytes(&mut self, out: &mut [u8]);

    /// Random bytes suitable for seeding another generator
    fn generate_seed(&mut self, len: usize) -> Vec<u8> {
        let mut seed = vec![0u8; len];
        self.next_bytes(&mut seed);
        seed
    }
}

/// `KDF` implementations
pub trait KdfSpi: Send + Sync {
    /// Derive `len` bytes of key material from `ikm`
    fn derive(&self, ikm: &[u8], salt: Option<&[u8]>, info: &[u8], len: usize) -> Result<Vec<u8>>;
}
