/*!
Operating-system seeded random generator.
*/

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::spi::SecureRandomSpi;

/// `StdRng` seeded from the operating system
pub struct NativePrng {
    rng: StdRng,
}

impl NativePrng {
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }
}

impl Default for NativePrng {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureRandomSpi for NativePrng {
    fn next_bytes(&mut self, out: &mut [u8]) {
        self.rng.fill_bytes(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_output() {
        let mut random = NativePrng::new();
        let first = random.generate_seed(32);
        let second = random.generate_seed(32);
        assert_eq!(first.len(), 32);
        assert_ne!(first, second);
    }
}
