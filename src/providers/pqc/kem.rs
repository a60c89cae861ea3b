/*!
CRYSTALS-Kyber key encapsulation.
*/

use pqcrypto_kyber::kyber768::{self, Ciphertext, PublicKey, SecretKey};
use pqcrypto_traits::kem::{
    Ciphertext as _, PublicKey as _, SecretKey as _, SharedSecret as _,
};

use crate::core::error::{CryptoError, Error, Result};
use crate::spi::KemSpi;

/// Kyber768 KEM
#[derive(Debug, Default)]
pub struct Kyber768Kem;

impl KemSpi for Kyber768Kem {
    fn generate_keypair(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let (pk, sk) = kyber768::keypair();
        Ok((pk.as_bytes().to_vec(), sk.as_bytes().to_vec()))
    }

    fn encapsulate(&self, public_key: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let pk = PublicKey::from_bytes(public_key).map_err(|_| Error::Crypto(CryptoError::InvalidKeyFormat))?;
        let (ss, ct) = kyber768::encapsulate(&pk);
        Ok((ss.as_bytes().to_vec(), ct.as_bytes().to_vec()))
    }

    fn decapsulate(&self, ciphertext: &[u8], secret_key: &[u8]) -> Result<Vec<u8>> {
        let ct = Ciphertext::from_bytes(ciphertext).map_err(|_| Error::Crypto(CryptoError::InvalidKeyFormat))?;
        let sk = SecretKey::from_bytes(secret_key).map_err(|_| Error::Crypto(CryptoError::InvalidKeyFormat))?;
        let ss = kyber768::decapsulate(&ct, &sk);
        Ok(ss.as_bytes().to_vec())
    }
}
