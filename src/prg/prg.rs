use std::fmt::Debug;

use aes::cipher::{KeyIvInit, StreamCipher};

use crate::error::{Error, Result};

use super::{random_prg_key, RandomSource};

type Aes256Ctr64BE = ctr::Ctr64BE<aes::Aes256>;

/// Number of keystream bytes generated per refill.
pub const PRG_CHUNK_SIZE: usize = 65536;

/// Key for a [`BufferedPrg`].
pub type PrgKey = [u8; 32];

/// Deterministic pseudorandom generator: AES-256 in counter mode, keyed once,
/// with its keystream buffered in chunks of [`PRG_CHUNK_SIZE`] bytes.
///
/// Every draw mutates the buffer, so an instance must not be shared between
/// threads without a lock. Give each thread its own instance instead.
///
/// # Examples
///
/// ```
/// # use simplepir_rs::prg::BufferedPrg;
/// let mut a = BufferedPrg::new([7u8; 32]);
/// let mut b = BufferedPrg::new([7u8; 32]);
/// assert_eq!(a.next_u64().unwrap(), b.next_u64().unwrap());
/// assert!(a.gen_below(10).unwrap() < 10);
/// ```
pub struct BufferedPrg {
    cipher: Aes256Ctr64BE,
    buf: Box<[u8]>,
    pos: usize,
}

impl BufferedPrg {
    /// Construct a generator with a fixed key.
    ///
    /// The same key always yields the same stream. Use this for public data
    /// derived from a published seed, or for tests; private values need a
    /// key from [`BufferedPrg::from_source`].
    pub fn new(key: PrgKey) -> Self {
        let iv = [0u8; 16];
        Self {
            cipher: Aes256Ctr64BE::new(&key.into(), &iv.into()),
            buf: vec![0u8; PRG_CHUNK_SIZE].into_boxed_slice(),
            pos: PRG_CHUNK_SIZE,
        }
    }

    /// Construct a generator keyed with fresh material from `src`.
    pub fn from_source<S: RandomSource + ?Sized>(src: &mut S) -> Result<Self> {
        Ok(Self::new(random_prg_key(src)?))
    }

    /// Construct a generator keyed from the operating system's entropy.
    pub fn from_entropy() -> Result<Self> {
        Ok(Self::new(super::os_prg_key()?))
    }

    fn refill(&mut self) -> Result<()> {
        self.buf.fill(0);
        self.cipher
            .try_apply_keystream(&mut self.buf)
            .map_err(|_| Error::RandomnessFailure("PRG keystream exhausted".to_string()))?;
        self.pos = 0;
        Ok(())
    }

    /// Fill `out` with pseudorandom bytes.
    pub fn fill_bytes(&mut self, out: &mut [u8]) -> Result<()> {
        let mut written = 0;
        while written < out.len() {
            if self.pos == self.buf.len() {
                self.refill()?;
            }
            let n = (out.len() - written).min(self.buf.len() - self.pos);
            out[written..written + n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
            self.pos += n;
            written += n;
        }
        Ok(())
    }

    pub fn next_u32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn next_u64(&mut self) -> Result<u64> {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes)?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Uniform value in `[0, bound)`, for `bound` in `[1, 2^64]`.
    ///
    /// Draws are rejected above the largest multiple of `bound` that fits in
    /// 64 bits, so the output carries no modulo bias.
    pub fn gen_below(&mut self, bound: u128) -> Result<u64> {
        if bound == 0 || bound > (1u128 << 64) {
            return Err(Error::unsupported(format!(
                "sampling bound {} outside [1, 2^64]",
                bound
            )));
        }
        if bound.is_power_of_two() {
            return Ok(((self.next_u64()? as u128) & (bound - 1)) as u64);
        }

        let zone = ((1u128 << 64) / bound) * bound;
        loop {
            let v = self.next_u64()? as u128;
            if v < zone {
                return Ok((v % bound) as u64);
            }
        }
    }
}

impl Debug for BufferedPrg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedPrg")
            .field("buffered", &(self.buf.len() - self.pos))
            .finish_non_exhaustive()
    }
}
