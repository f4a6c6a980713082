use std::fmt::Debug;

use crate::{error::Result, prg::BufferedPrg};

use super::DiscreteGaussian;

/// A ring element: an unsigned machine word, with arithmetic modulo
/// `2^BITS` through wraparound.
///
/// Implemented for [`u32`] and [`u64`]. The width is fixed at compile time,
/// so per-width behavior (like which Gaussian table to sample from) is
/// resolved statically.
pub trait Elem: Copy + Default + Eq + Debug + Send + Sync + 'static {
    const BITS: u32;
    const ZERO: Self;

    /// Truncating conversion from a `u64`.
    fn from_u64(v: u64) -> Self;
    fn to_u64(self) -> u64;

    /// Embeds a signed value in twos-complement form, so `-7` becomes `2^BITS - 7`.
    fn from_i64(v: i64) -> Self;

    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;

    /// Draws one discrete Gaussian sample from the table matching this width.
    fn gauss_sample(sampler: &DiscreteGaussian, prg: &mut BufferedPrg) -> Result<i64>;

    /// The implicit modulus, `2^BITS`.
    fn modulus() -> u128 {
        1u128 << Self::BITS
    }
}

macro_rules! impl_elem {
    ($t:ty, $sample:ident) => {
        impl Elem for $t {
            const BITS: u32 = <$t>::BITS;
            const ZERO: Self = 0;

            #[inline(always)]
            fn from_u64(v: u64) -> Self {
                v as $t
            }

            #[inline(always)]
            fn to_u64(self) -> u64 {
                self as u64
            }

            #[inline(always)]
            fn from_i64(v: i64) -> Self {
                v as $t
            }

            #[inline(always)]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$t>::wrapping_add(self, rhs)
            }

            #[inline(always)]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$t>::wrapping_sub(self, rhs)
            }

            #[inline(always)]
            fn wrapping_mul(self, rhs: Self) -> Self {
                <$t>::wrapping_mul(self, rhs)
            }

            fn gauss_sample(sampler: &DiscreteGaussian, prg: &mut BufferedPrg) -> Result<i64> {
                sampler.$sample(prg)
            }
        }
    };
}

impl_elem!(u32, sample32);
impl_elem!(u64, sample64);
