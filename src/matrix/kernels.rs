use std::time::Instant;

use log::debug;
use rayon::prelude::*;

use crate::error::{Error, Result};

use super::{Elem, Matrix, MatrixRef, SquishParams};

/// Below this many output rows, the parallel kernel runs sequentially.
const MIN_ROWS_PER_TASK: usize = 16;

/// A matrix multiplication kernel.
///
/// Every implementation must produce output bit-identical to the triple-sum
/// definition modulo `2^T::BITS`; kernels differ only in speed. Shapes are
/// checked by [`matrix_mul`] and [`matrix_mul_vec_packed`] before a kernel
/// runs.
pub trait MulKernel {
    /// `out += a * b`, for `a` of shape `(a_rows, a_cols)` and `b` of shape
    /// `(a_cols, b_cols)`.
    fn mat_mul_add<T: Elem>(
        a: &[T],
        b: &[T],
        out: &mut [T],
        a_rows: usize,
        a_cols: usize,
        b_cols: usize,
    );

    /// `out += unsquish(a) * b`, for a squished `a` of shape `(a_rows, a_cols)`
    /// and a column vector `b` of `a_cols * squish.delta` entries.
    fn mat_mul_vec_packed<T: Elem>(
        a: &[T],
        b: &[T],
        out: &mut [T],
        a_rows: usize,
        a_cols: usize,
        squish: &SquishParams,
    );
}

/// Sequential reference kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Naive;

/// Splits the output rows into independent chunks and runs the reference
/// loop on each with rayon.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parallel;

/// Kernel used by [`Matrix::mul`] and the PIR server when none is named.
#[cfg(feature = "parallel")]
pub type DefaultKernel = Parallel;

/// Kernel used by [`Matrix::mul`] and the PIR server when none is named.
#[cfg(not(feature = "parallel"))]
pub type DefaultKernel = Naive;

fn raw_mat_mul_add<T: Elem>(
    a: &[T],
    b: &[T],
    c: &mut [T],
    a_rows: usize,
    a_cols: usize,
    b_cols: usize,
) {
    debug_assert_eq!(a.len(), a_rows * a_cols);
    debug_assert_eq!(b.len(), a_cols * b_cols);
    debug_assert_eq!(c.len(), a_rows * b_cols);

    for i in 0..a_rows {
        for k in 0..a_cols {
            let aik = a[a_cols * i + k];
            let b_row = &b[b_cols * k..b_cols * (k + 1)];
            let c_row = &mut c[b_cols * i..b_cols * (i + 1)];
            for (cij, bkj) in c_row.iter_mut().zip(b_row) {
                *cij = cij.wrapping_add(aik.wrapping_mul(*bkj));
            }
        }
    }
}

fn raw_mat_mul_vec_packed<T: Elem>(
    a: &[T],
    b: &[T],
    out: &mut [T],
    a_rows: usize,
    a_cols: usize,
    squish: &SquishParams,
) {
    debug_assert_eq!(a.len(), a_rows * a_cols);
    debug_assert_eq!(b.len(), a_cols * squish.delta);
    debug_assert_eq!(out.len(), a_rows);

    let basis = squish.basis as u64;
    let mask = squish.mask();

    for i in 0..a_rows {
        let mut tmp = T::ZERO;
        let mut index2 = 0;
        for db in &a[i * a_cols..(i + 1) * a_cols] {
            let db = db.to_u64();
            for k in 0..squish.delta as u64 {
                let val = T::from_u64((db >> (k * basis)) & mask);
                tmp = tmp.wrapping_add(val.wrapping_mul(b[index2]));
                index2 += 1;
            }
        }
        out[i] = out[i].wrapping_add(tmp);
    }
}

impl MulKernel for Naive {
    fn mat_mul_add<T: Elem>(
        a: &[T],
        b: &[T],
        out: &mut [T],
        a_rows: usize,
        a_cols: usize,
        b_cols: usize,
    ) {
        raw_mat_mul_add(a, b, out, a_rows, a_cols, b_cols);
    }

    fn mat_mul_vec_packed<T: Elem>(
        a: &[T],
        b: &[T],
        out: &mut [T],
        a_rows: usize,
        a_cols: usize,
        squish: &SquishParams,
    ) {
        raw_mat_mul_vec_packed(a, b, out, a_rows, a_cols, squish);
    }
}

fn rows_per_task(rows: usize) -> usize {
    let per_thread = (rows + rayon::current_num_threads() - 1) / rayon::current_num_threads();
    per_thread.max(MIN_ROWS_PER_TASK)
}

impl MulKernel for Parallel {
    fn mat_mul_add<T: Elem>(
        a: &[T],
        b: &[T],
        out: &mut [T],
        a_rows: usize,
        a_cols: usize,
        b_cols: usize,
    ) {
        if a_rows <= MIN_ROWS_PER_TASK || a_cols == 0 || b_cols == 0 {
            raw_mat_mul_add(a, b, out, a_rows, a_cols, b_cols);
            return;
        }

        let chunk_rows = rows_per_task(a_rows);
        out.par_chunks_mut(chunk_rows * b_cols)
            .zip(a.par_chunks(chunk_rows * a_cols))
            .for_each(|(out_chunk, a_chunk)| {
                let rows = out_chunk.len() / b_cols;
                raw_mat_mul_add(a_chunk, b, out_chunk, rows, a_cols, b_cols);
            });
    }

    fn mat_mul_vec_packed<T: Elem>(
        a: &[T],
        b: &[T],
        out: &mut [T],
        a_rows: usize,
        a_cols: usize,
        squish: &SquishParams,
    ) {
        if a_rows <= MIN_ROWS_PER_TASK || a_cols == 0 {
            raw_mat_mul_vec_packed(a, b, out, a_rows, a_cols, squish);
            return;
        }

        let chunk_rows = rows_per_task(a_rows);
        out.par_chunks_mut(chunk_rows)
            .zip(a.par_chunks(chunk_rows * a_cols))
            .for_each(|(out_chunk, a_chunk)| {
                let rows = out_chunk.len();
                raw_mat_mul_vec_packed(a_chunk, b, out_chunk, rows, a_cols, squish);
            });
    }
}

/// Computes `a * b` modulo `2^T::BITS` with kernel `K`.
pub fn matrix_mul<K: MulKernel, T: Elem>(a: &MatrixRef<T>, b: &MatrixRef<T>) -> Result<Matrix<T>> {
    if a.cols() != b.rows() {
        return Err(Error::dims("mul", a.dims(), b.dims()));
    }

    let start = Instant::now();
    let mut out = Matrix::new(a.rows(), b.cols());
    K::mat_mul_add(
        a.slc(),
        b.slc(),
        out.mut_slc(),
        a.rows(),
        a.cols(),
        b.cols(),
    );
    debug!(
        "matrix_mul ({} x {}) * ({} x {}) took {} us",
        a.rows(),
        a.cols(),
        b.rows(),
        b.cols(),
        start.elapsed().as_micros()
    );
    Ok(out)
}

/// Computes `unsquish(a) * b` modulo `2^T::BITS` with kernel `K`, where `a`
/// was squished with `squish` and `b` is a column vector.
pub fn matrix_mul_vec_packed<K: MulKernel, T: Elem>(
    a: &MatrixRef<T>,
    b: &MatrixRef<T>,
    squish: &SquishParams,
) -> Result<Matrix<T>> {
    squish.validate::<T>()?;
    if b.cols() != 1 || a.cols() * squish.delta != b.rows() {
        return Err(Error::dims("mul_vec_packed", a.dims(), b.dims()));
    }

    let start = Instant::now();
    let mut out = Matrix::new(a.rows(), 1);
    K::mat_mul_vec_packed(a.slc(), b.slc(), out.mut_slc(), a.rows(), a.cols(), squish);
    debug!(
        "matrix_mul_vec_packed ({} x {}) took {} us",
        a.rows(),
        a.cols(),
        start.elapsed().as_micros()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::{matrix::Squishable, prg::BufferedPrg};

    use super::*;

    fn reference_mul<T: Elem>(a: &Matrix<T>, b: &Matrix<T>) -> Matrix<T> {
        let mut out = Matrix::new(a.rows(), b.cols());
        for i in 0..a.rows() {
            for j in 0..b.cols() {
                let mut sum = T::ZERO;
                for k in 0..a.cols() {
                    let prod = a.get(i, k).unwrap().wrapping_mul(b.get(k, j).unwrap());
                    sum = sum.wrapping_add(prod);
                }
                out.set(i, j, sum).unwrap();
            }
        }
        out
    }

    fn check_kernels_agree<T: Elem>(prg: &mut BufferedPrg, m: usize, n: usize, c: usize) {
        let a = Matrix::<T>::random_logmod(prg, m, n, T::BITS).unwrap();
        let b = Matrix::<T>::random_logmod(prg, n, c, T::BITS).unwrap();
        let gold = reference_mul(&a, &b);

        assert_eq!(a.mul_with::<Naive>(&b).unwrap(), gold);
        assert_eq!(a.mul_with::<Parallel>(&b).unwrap(), gold);
    }

    #[test]
    fn kernels_match_reference() {
        let mut prg = BufferedPrg::new([1u8; 32]);
        for (m, n, c) in [(1, 1, 1), (7, 5, 3), (100, 33, 2), (257, 64, 1), (40, 0, 3)] {
            check_kernels_agree::<u32>(&mut prg, m, n, c);
            check_kernels_agree::<u64>(&mut prg, m, n, c);
        }
    }

    #[test]
    fn packed_kernels_match_unpacked_mul() {
        let mut prg = BufferedPrg::new([2u8; 32]);
        let squish = SquishParams { basis: 10, delta: 3 };
        for rows in [1usize, 9, 130] {
            let db = Matrix::<u32>::random_mod(&mut prg, rows, 35, 1 << 10).unwrap();
            let packed = db.squish(&squish).unwrap();
            assert_eq!(packed.cols(), 12);

            let mut q = Matrix::<u32>::random_logmod(&mut prg, 35, 1, 32).unwrap();
            let gold = db.mul_with::<Naive>(&q).unwrap();
            q.append_zeros(1).unwrap();

            let naive =
                matrix_mul_vec_packed::<Naive, _>(&packed.as_matrix_ref(), &q.as_matrix_ref(), &squish)
                    .unwrap();
            let parallel = matrix_mul_vec_packed::<Parallel, _>(
                &packed.as_matrix_ref(),
                &q.as_matrix_ref(),
                &squish,
            )
            .unwrap();
            assert_eq!(naive, gold);
            assert_eq!(parallel, gold);
        }
    }

    #[test]
    fn packed_kernel_handles_64_bit_elements() {
        let mut prg = BufferedPrg::new([3u8; 32]);
        let squish = SquishParams { basis: 16, delta: 4 };
        let db = Matrix::<u64>::random_mod(&mut prg, 50, 20, 1 << 16).unwrap();
        let packed = db.squish(&squish).unwrap();
        let q = Matrix::<u64>::random_logmod(&mut prg, 20, 1, 64).unwrap();

        let gold = db.mul_with::<Naive>(&q).unwrap();
        let got =
            matrix_mul_vec_packed::<DefaultKernel, _>(&packed.as_matrix_ref(), &q.as_matrix_ref(), &squish)
                .unwrap();
        assert_eq!(got, gold);
    }

    #[test]
    fn packed_mul_checks_shapes() {
        let squish = SquishParams { basis: 10, delta: 3 };
        let a = Matrix::<u32>::new(4, 2);
        let q = Matrix::<u32>::new(5, 1);
        assert!(matches!(
            matrix_mul_vec_packed::<Naive, _>(&a.as_matrix_ref(), &q.as_matrix_ref(), &squish),
            Err(Error::DimensionMismatch { .. })
        ));

        let too_wide = SquishParams { basis: 11, delta: 3 };
        let q = Matrix::<u32>::new(6, 1);
        assert!(matches!(
            matrix_mul_vec_packed::<Naive, _>(&a.as_matrix_ref(), &q.as_matrix_ref(), &too_wide),
            Err(Error::UnsupportedParameter(_))
        ));
    }
}
