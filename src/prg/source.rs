use rand::{rngs::OsRng, CryptoRng, RngCore};

use crate::error::{Error, Result};

use super::PrgKey;

/// Source of true randomness, used only to key a [`BufferedPrg`](super::BufferedPrg).
///
/// Any cryptographic `rand` generator is a source: `OsRng` in production,
/// a seeded `ChaCha20Rng` when deterministic keys are wanted in tests.
pub trait RandomSource {
    /// Fill `dest` with seed material.
    fn fill_seed(&mut self, dest: &mut [u8]) -> Result<()>;
}

impl<R: RngCore + CryptoRng> RandomSource for R {
    fn fill_seed(&mut self, dest: &mut [u8]) -> Result<()> {
        self.try_fill_bytes(dest)
            .map_err(|e| Error::RandomnessFailure(e.to_string()))
    }
}

/// Draw a fresh 256-bit PRG key from `src`.
pub fn random_prg_key<S: RandomSource + ?Sized>(src: &mut S) -> Result<PrgKey> {
    let mut key = PrgKey::default();
    src.fill_seed(&mut key)?;
    Ok(key)
}

/// Draw a fresh 256-bit PRG key from the operating system.
pub fn os_prg_key() -> Result<PrgKey> {
    random_prg_key(&mut OsRng)
}
