/*!
ChaCha20-Poly1305 authenticated encryption.
*/

use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit, Payload},
};

use crate::core::error::{CryptoError, Error, Result};
use crate::spi::AeadCipherSpi;
use crate::{crypto_err, invalid_argument_err};

/// Key size in bytes
pub const KEY_SIZE: usize = 32;

/// Nonce size in bytes
pub const NONCE_SIZE: usize = 12;

/// ChaCha20-Poly1305 cipher, keyed by [`AeadCipherSpi::init`]
#[derive(Default)]
pub struct ChaCha20Poly1305Cipher {
    cipher: Option<ChaCha20Poly1305>,
}

impl ChaCha20Poly1305Cipher {
    pub fn new() -> Self {
        Self::default()
    }

    fn keyed(&self) -> Result<&ChaCha20Poly1305> {
        match &self.cipher {
            Some(cipher) => Ok(cipher),
            None => invalid_argument_err!("cipher used before init"),
        }
    }
}

fn nonce(nonce: &[u8]) -> Result<&Nonce> {
    if nonce.len() != NONCE_SIZE {
        return crypto_err!(CryptoError::InvalidNonce);
    }
    Ok(Nonce::from_slice(nonce))
}

impl AeadCipherSpi for ChaCha20Poly1305Cipher {
    fn init(&mut self, key: &[u8]) -> Result<()> {
        let cipher =
            ChaCha20Poly1305::new_from_slice(key).map_err(|_| Error::Crypto(CryptoError::InvalidKeyFormat))?;
        self.cipher = Some(cipher);
        Ok(())
    }

    fn encrypt(&self, nonce_bytes: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let cipher = self.keyed()?;
        cipher
            .encrypt(nonce(nonce_bytes)?, Payload { msg: plaintext, aad })
            .map_err(|_| Error::Crypto(CryptoError::EncryptionFailed))
    }

    fn decrypt(&self, nonce_bytes: &[u8], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let cipher = self.keyed()?;
        cipher
            .decrypt(nonce(nonce_bytes)?, Payload { msg: ciphertext, aad })
            .map_err(|_| Error::Crypto(CryptoError::DecryptionFailed))
    }

    fn key_len(&self) -> usize {
        KEY_SIZE
    }

    fn nonce_len(&self) -> usize {
        NONCE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_with_aad() {
        let mut cipher = ChaCha20Poly1305Cipher::new();
        cipher.init(&[7u8; KEY_SIZE]).unwrap();
        let nonce = [1u8; NONCE_SIZE];

        let sealed = cipher.encrypt(&nonce, b"payload", b"header").unwrap();
        assert_eq!(cipher.decrypt(&nonce, &sealed, b"header").unwrap(), b"payload");
        assert!(matches!(
            cipher.decrypt(&nonce, &sealed, b"other header"),
            Err(Error::Crypto(CryptoError::DecryptionFailed))
        ));
    }

    #[test]
    fn test_rejects_bad_lengths_and_missing_key() {
        let mut cipher = ChaCha20Poly1305Cipher::new();
        assert!(matches!(cipher.encrypt(&[0u8; NONCE_SIZE], b"x", b""), Err(Error::InvalidArgument(_))));
        assert!(matches!(cipher.init(&[0u8; 16]), Err(Error::Crypto(CryptoError::InvalidKeyFormat))));
        cipher.init(&[0u8; KEY_SIZE]).unwrap();
        assert!(matches!(cipher.encrypt(&[0u8; 8], b"x", b""), Err(Error::Crypto(CryptoError::InvalidNonce))));
    }
}
