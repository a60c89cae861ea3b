/*!
HKDF key derivation.
*/

use hkdf::Hkdf;
use sha2::Sha256;

use crate::core::error::{CryptoError, Error, Result};
use crate::spi::KdfSpi;

/// HKDF with SHA-256
#[derive(Debug, Default)]
pub struct HkdfSha256;

impl KdfSpi for HkdfSha256 {
    fn derive(&self, ikm: &[u8], salt: Option<&[u8]>, info: &[u8], len: usize) -> Result<Vec<u8>> {
        let hkdf = Hkdf::<Sha256>::new(salt, ikm);
        let mut okm = vec![0u8; len];
        hkdf.expand(info, &mut okm)
            .map_err(|_e| Error::Crypto(CryptoError::KeyDerivationFailed))?;
        Ok(okm)
    }
}
