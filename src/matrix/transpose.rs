use super::{Elem, Matrix};

/// Side of the square tiles copied at a time.
const TILE: usize = 32;

pub trait Transpose {
    /// Transposes the matrix in-place.
    fn transpose(&mut self);

    /// Returns the transpose, leaving `self` untouched.
    fn transposed(&self) -> Self;
}

impl<T: Elem> Transpose for Matrix<T> {
    fn transpose(&mut self) {
        *self = self.transposed();
    }

    fn transposed(&self) -> Self {
        let (rows, cols) = self.dims();
        let mut data = vec![T::ZERO; rows * cols];
        for i0 in (0..rows).step_by(TILE) {
            for j0 in (0..cols).step_by(TILE) {
                for i in i0..(i0 + TILE).min(rows) {
                    for j in j0..(j0 + TILE).min(cols) {
                        data[j * rows + i] = self.data[i * cols + j];
                    }
                }
            }
        }
        Matrix {
            rows: cols,
            cols: rows,
            data,
        }
    }
}
