//! Squishing / Unsquishing
//!
//! Allows representation of several, small true values with a single underlying database value.

use crate::error::{Error, Result};

use super::{Elem, Matrix};

/// Parameters for squishing.
///
/// `basis` * `delta` must be less than or equal to the element width.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SquishParams {
    /// The number of bits per true value.
    pub basis: u32,

    /// The number of true values to group into a single underlying database value.
    pub delta: usize,
}

impl SquishParams {
    /// Packing that leaves every value in its own element.
    pub fn identity<T: Elem>() -> SquishParams {
        SquishParams {
            basis: T::BITS,
            delta: 1,
        }
    }

    pub fn validate<T: Elem>(&self) -> Result<()> {
        if self.basis == 0 || self.delta == 0 {
            return Err(Error::unsupported("squishing basis and delta must be positive"));
        }
        if (self.basis as u64) * (self.delta as u64) > T::BITS as u64 {
            return Err(Error::unsupported(format!(
                "cannot pack {} values of {} bits into a {}-bit element",
                self.delta,
                self.basis,
                T::BITS
            )));
        }
        Ok(())
    }

    /// Mask selecting one packed value.
    pub(crate) fn mask(&self) -> u64 {
        if self.basis >= 64 {
            u64::MAX
        } else {
            (1u64 << self.basis) - 1
        }
    }
}

pub trait Squishable: Sized {
    /// Squishes the matrix, representing each group of `delta` consecutive input values,
    /// each of `basis` bits, as a single output value.
    ///
    /// Fails if any input value needs more than `basis` bits.
    fn squish(&self, squish_params: &SquishParams) -> Result<Self>;

    /// Unsquishes the matrix, taking each input value and splitting it into 'delta'
    /// consecutive values, each of 'basis' bits.
    ///
    /// `orig_cols` is the original number of columns in the matrix, before it was squished.
    fn unsquish(&self, squish_params: &SquishParams, orig_cols: usize) -> Result<Self>;
}

impl<T: Elem> Squishable for Matrix<T> {
    fn squish(&self, squish_params: &SquishParams) -> Result<Self> {
        squish_params.validate::<T>()?;
        let (delta, basis) = (squish_params.delta, squish_params.basis as u64);
        let mask = squish_params.mask();
        let mut out = Matrix::new(self.rows, (self.cols + delta - 1) / delta);

        for i in 0..out.rows {
            for j in 0..out.cols {
                let mut packed = 0u64;
                for k in 0..delta {
                    if delta * j + k < self.cols {
                        let val = self[i][delta * j + k].to_u64();
                        if val & !mask != 0 {
                            return Err(Error::unsupported(format!(
                                "value {} at ({}, {}) does not fit in {} bits",
                                val,
                                i,
                                delta * j + k,
                                basis
                            )));
                        }
                        packed |= val << ((k as u64) * basis);
                    }
                }
                out.data[i * out.cols + j] = T::from_u64(packed);
            }
        }

        Ok(out)
    }

    fn unsquish(&self, squish_params: &SquishParams, orig_cols: usize) -> Result<Self> {
        squish_params.validate::<T>()?;
        let (delta, basis) = (squish_params.delta, squish_params.basis as u64);
        if orig_cols > self.cols * delta {
            return Err(Error::dims(
                "unsquish",
                (self.rows, self.cols * delta),
                (self.rows, orig_cols),
            ));
        }

        let mut out = Matrix::new(self.rows, orig_cols);
        let mask = squish_params.mask();

        for i in 0..self.rows {
            for j in 0..self.cols {
                for k in 0..delta {
                    if j * delta + k < orig_cols {
                        out.data[i * out.cols + j * delta + k] =
                            T::from_u64((self[i][j].to_u64() >> ((k as u64) * basis)) & mask);
                    }
                }
            }
        }

        Ok(out)
    }
}
