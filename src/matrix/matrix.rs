use crate::{
    error::{Error, Result},
    prg::BufferedPrg,
};

use super::{DiscreteGaussian, Elem};

/// A packed, row-major matrix of ring elements, supporting most basic matrix
/// operations.
///
/// The element type fixes the ring: `Matrix<u32>` computes modulo `2^32`,
/// `Matrix<u64>` modulo `2^64`, by native wraparound.
///
/// # Examples
///
/// ```
/// # use simplepir_rs::{matrix::Matrix, prg::BufferedPrg};
/// let mut prg = BufferedPrg::new([0u8; 32]);
/// let mut m1 = Matrix::<u32>::new(3, 5);
/// m1.set(0, 3, 7).unwrap();
///
/// let m2 = Matrix::<u32>::random_logmod(&mut prg, 5, 2, 32).unwrap();
/// let m3 = m1.mul(&m2).unwrap();
///
/// assert_eq!(m3.rows(), m1.rows());
/// assert_eq!(m3.cols(), m2.cols());
/// ```
///
/// Each `Matrix` owns its own data, as a vector.
/// `clone()` is a deep copy.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Matrix<T: Elem> {
    pub(super) rows: usize,
    pub(super) cols: usize,
    pub(super) data: Vec<T>,
}

impl<T: Elem> Matrix<T> {
    /// Construct a new Matrix filled with zeros.
    pub fn new(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![T::ZERO; rows * cols],
        }
    }

    /// Construct a Matrix from row-major data.
    pub fn from_data(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::dims("from_data", (rows, cols), (data.len(), 1)));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Construct a column vector.
    pub fn column_vector(data: Vec<T>) -> Self {
        Matrix {
            rows: data.len(),
            cols: 1,
            data,
        }
    }

    /// Construct a new Matrix filled with uniformly random data, in the range
    /// [0, modulus).
    pub fn random_mod(prg: &mut BufferedPrg, rows: usize, cols: usize, modulus: u64) -> Result<Self> {
        Self::random_bounded(prg, rows, cols, modulus as u128)
    }

    /// Construct a new Matrix filled with uniformly random data, in the range
    /// [0, 2^logmod).
    pub fn random_logmod(prg: &mut BufferedPrg, rows: usize, cols: usize, logmod: u32) -> Result<Self> {
        if logmod == 0 || logmod > T::BITS {
            return Err(Error::unsupported(format!(
                "logmod {} is not in [1, {}]",
                logmod,
                T::BITS
            )));
        }
        Self::random_bounded(prg, rows, cols, 1u128 << logmod)
    }

    fn random_bounded(prg: &mut BufferedPrg, rows: usize, cols: usize, bound: u128) -> Result<Self> {
        if bound == 0 || bound > T::modulus() {
            return Err(Error::unsupported(format!(
                "modulus {} does not fit a {}-bit element",
                bound,
                T::BITS
            )));
        }

        let mut data = Vec::with_capacity(rows * cols);
        for _ in 0..rows * cols {
            data.push(T::from_u64(prg.gen_below(bound)?));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Construct a new Matrix filled with data sampled from the default
    /// discrete Gaussian (sigma = 6.4). Negative values are represented in
    /// the twos-complement form. For example, a value of -7 would be
    /// 2^32 - 7 in a `Matrix<u32>`.
    pub fn gaussian(prg: &mut BufferedPrg, rows: usize, cols: usize) -> Result<Self> {
        Self::gaussian_with(DiscreteGaussian::default_sampler(), prg, rows, cols)
    }

    /// Like [`Matrix::gaussian`], with an explicit sampler.
    pub fn gaussian_with(
        sampler: &DiscreteGaussian,
        prg: &mut BufferedPrg,
        rows: usize,
        cols: usize,
    ) -> Result<Self> {
        let mut data = Vec::with_capacity(rows * cols);
        for _ in 0..rows * cols {
            data.push(T::from_i64(T::gauss_sample(sampler, prg)?));
        }
        Ok(Matrix { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Get the slice of the data that the matrix contains.
    pub fn slc(&self) -> &[T] {
        &self.data
    }

    /// Get the mutable slice of the data that the matrix contains.
    pub fn mut_slc(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    fn check_index(&self, i: usize, j: usize) -> Result<()> {
        if i >= self.rows || j >= self.cols {
            return Err(Error::IndexOutOfRange {
                row: i,
                col: j,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    pub fn get(&self, i: usize, j: usize) -> Result<T> {
        self.check_index(i, j)?;
        Ok(self.data[i * self.cols + j])
    }

    pub fn set(&mut self, i: usize, j: usize, val: T) -> Result<()> {
        self.check_index(i, j)?;
        self.data[i * self.cols + j] = val;
        Ok(())
    }

    /// Apply the function to all values in the matrix.
    pub fn apply(&mut self, f: impl Fn(T) -> T) {
        for v in self.data.iter_mut() {
            *v = f(*v);
        }
    }

    /// Get a checksum of the values in the matrix.
    ///
    /// This is a simple XOR of all of the values. Useful for debugging.
    pub fn checksum(&self) -> u64 {
        self.data.iter().fold(0, |c, v| c ^ v.to_u64())
    }
}
