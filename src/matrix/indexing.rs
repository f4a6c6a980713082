use std::ops::{Index, IndexMut};

use crate::error::{Error, Result};

use super::{Elem, Matrix};

/// A read-only window onto contiguous rows of a [`Matrix`].
///
/// The view borrows the parent's storage, so the parent can be neither
/// mutated nor dropped while the view is alive. Use
/// [`MatrixRef::to_owned_matrix`] or [`Matrix::rows_deep_copy`] for an
/// independent copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixRef<'a, T: Elem> {
    rows: usize,
    cols: usize,
    data: &'a [T],
}

impl<'a, T: Elem> MatrixRef<'a, T> {
    /// View row-major `data` as a `rows`-by-`cols` matrix.
    pub fn from_slice(rows: usize, cols: usize, data: &'a [T]) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::dims("from_slice", (rows, cols), (data.len(), 1)));
        }
        Ok(MatrixRef { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn slc(&self) -> &'a [T] {
        self.data
    }

    pub fn get(&self, i: usize, j: usize) -> Result<T> {
        if i >= self.rows || j >= self.cols {
            return Err(Error::IndexOutOfRange {
                row: i,
                col: j,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.data[i * self.cols + j])
    }

    pub fn to_owned_matrix(&self) -> Matrix<T> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.to_owned(),
        }
    }

    /// A narrower view onto `num_rows` rows starting at `start_row`.
    pub fn get_rows(&self, start_row: usize, num_rows: usize) -> Result<MatrixRef<'a, T>> {
        row_window(self.data, self.rows, self.cols, start_row, num_rows)
    }
}

fn row_window<T: Elem>(
    data: &[T],
    rows: usize,
    cols: usize,
    start_row: usize,
    num_rows: usize,
) -> Result<MatrixRef<'_, T>> {
    let end_row = start_row.checked_add(num_rows).filter(|end| *end <= rows);
    let end_row = end_row.ok_or(Error::IndexOutOfRange {
        row: start_row.saturating_add(num_rows),
        col: 0,
        rows,
        cols,
    })?;
    Ok(MatrixRef {
        rows: num_rows,
        cols,
        data: &data[start_row * cols..end_row * cols],
    })
}

impl<T: Elem> Matrix<T> {
    pub fn as_matrix_ref(&self) -> MatrixRef<'_, T> {
        MatrixRef {
            rows: self.rows,
            cols: self.cols,
            data: &self.data,
        }
    }

    /// A view onto `num_rows` rows starting at `start_row`, aliasing this
    /// matrix's storage.
    pub fn get_rows(&self, start_row: usize, num_rows: usize) -> Result<MatrixRef<'_, T>> {
        row_window(&self.data, self.rows, self.cols, start_row, num_rows)
    }

    /// An owned copy of `num_rows` rows starting at `start_row`.
    pub fn rows_deep_copy(&self, start_row: usize, num_rows: usize) -> Result<Matrix<T>> {
        Ok(self.get_rows(start_row, num_rows)?.to_owned_matrix())
    }

    pub fn column(&self, col: usize) -> Result<Matrix<T>> {
        let mut out = Matrix::new(self.rows, 1);
        for i in 0..self.rows {
            out.data[i] = self.get(i, col)?;
        }
        Ok(out)
    }

    pub fn drop_last_rows(&mut self, num_rows_to_drop: usize) -> Result<()> {
        if num_rows_to_drop > self.rows {
            return Err(Error::IndexOutOfRange {
                row: num_rows_to_drop,
                col: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }

        self.rows -= num_rows_to_drop;
        self.data.truncate(self.rows * self.cols);
        Ok(())
    }

    /// Appends `n` zero rows. An empty matrix becomes an `n`-by-1 column.
    pub fn append_zeros(&mut self, n: usize) -> Result<()> {
        let cols = if self.rows == 0 && self.cols == 0 {
            1
        } else {
            self.cols
        };
        self.concat(Matrix::new(n, cols))
    }

    /// Stacks `other` below this matrix. An empty (0-by-0) matrix takes over
    /// `other`'s shape and storage.
    pub fn concat(&mut self, other: Matrix<T>) -> Result<()> {
        if self.rows == 0 && self.cols == 0 {
            *self = other;
            return Ok(());
        }

        if self.cols != other.cols {
            return Err(Error::dims("concat", self.dims(), other.dims()));
        }

        self.rows += other.rows;
        self.data.extend(other.data);
        Ok(())
    }

    pub fn concat_ref(&mut self, other: &MatrixRef<T>) -> Result<()> {
        if self.rows == 0 && self.cols == 0 {
            *self = other.to_owned_matrix();
            return Ok(());
        }

        if self.cols != other.cols {
            return Err(Error::dims("concat", self.dims(), other.dims()));
        }

        self.rows += other.rows;
        self.data.extend_from_slice(other.data);
        Ok(())
    }
}

impl<T: Elem> Index<usize> for Matrix<T> {
    type Output = [T];

    fn index(&self, index: usize) -> &Self::Output {
        let start = index * self.cols;
        &self.data[start..start + self.cols]
    }
}

impl<T: Elem> IndexMut<usize> for Matrix<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let start = index * self.cols;
        &mut self.data[start..start + self.cols]
    }
}
