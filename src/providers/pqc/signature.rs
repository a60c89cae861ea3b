/*!
CRYSTALS-Dilithium signatures.
*/

use pqcrypto_dilithium::dilithium3::{self, DetachedSignature, PublicKey, SecretKey};
use pqcrypto_traits::sign::{DetachedSignature as _, PublicKey as _, SecretKey as _};

use crate::core::error::{CryptoError, Error, Result};
use crate::spi::SignatureSpi;

/// Dilithium3 signatures
#[derive(Debug, Default)]
pub struct Dilithium3Signature;

impl SignatureSpi for Dilithium3Signature {
    fn generate_keypair(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let (pk, sk) = dilithium3::keypair();
        Ok((pk.as_bytes().to_vec(), sk.as_bytes().to_vec()))
    }

    fn sign(&self, data: &[u8], secret_key: &[u8]) -> Result<Vec<u8>> {
        let sk = SecretKey::from_bytes(secret_key).map_err(|_| Error::Crypto(CryptoError::InvalidKeyFormat))?;
        let signature = dilithium3::detached_sign(data, &sk);
        Ok(signature.as_bytes().to_vec())
    }

    fn verify(&self, data: &[u8], signature: &[u8], public_key: &[u8]) -> Result<()> {
        let pk = PublicKey::from_bytes(public_key).map_err(|_| Error::Crypto(CryptoError::InvalidKeyFormat))?;
        let signature = DetachedSignature::from_bytes(signature)
            .map_err(|_| Error::Crypto(CryptoError::InvalidSignatureFormat))?;
        dilithium3::verify_detached_signature(&signature, data, &pk)
            .map_err(|_| Error::Crypto(CryptoError::InvalidSignatureFormat))
    }
}
