/*!
SHA-2 message digests.
*/

use sha2::Digest;

use crate::spi::MessageDigestSpi;

/// Message digest over any `sha2` hash
#[derive(Default)]
pub struct Sha2Digest<D> {
    state: D,
}

impl<D: Digest + Default> Sha2Digest<D> {
    pub fn new() -> Self {
        Self { state: D::default() }
    }
}

impl<D> MessageDigestSpi for Sha2Digest<D>
where
    D: Digest + Default + Send + Sync,
{
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.state, data);
    }

    fn digest(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.state).finalize().to_vec()
    }

    fn reset(&mut self) {
        self.state = D::default();
    }

    fn digest_len(&self) -> usize {
        <D as Digest>::output_size()
    }
}
