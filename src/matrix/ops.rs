use crate::error::{Error, Result};

use super::{matrix_mul, DefaultKernel, Elem, Matrix, MulKernel};

// Addition

fn raw_mat_add_assign<T: Elem>(a: &mut [T], b: &[T]) {
    for (x, y) in a.iter_mut().zip(b) {
        *x = x.wrapping_add(*y);
    }
}

fn raw_mat_sub_assign<T: Elem>(a: &mut [T], b: &[T]) {
    for (x, y) in a.iter_mut().zip(b) {
        *x = x.wrapping_sub(*y);
    }
}

fn raw_add_assign_const<T: Elem>(a: &mut [T], b: T) {
    for x in a.iter_mut() {
        *x = x.wrapping_add(b);
    }
}

// Multiplication

fn raw_mul_assign_const<T: Elem>(a: &mut [T], b: T) {
    for x in a.iter_mut() {
        *x = x.wrapping_mul(b);
    }
}

fn raw_rem_assign_const<T: Elem>(a: &mut [T], b: u64) {
    for x in a.iter_mut() {
        *x = T::from_u64(x.to_u64() % b);
    }
}

impl<T: Elem> Matrix<T> {
    /// Elementwise `self += rhs`, modulo `2^T::BITS`.
    pub fn add(&mut self, rhs: &Matrix<T>) -> Result<()> {
        if self.dims() != rhs.dims() {
            return Err(Error::dims("add", self.dims(), rhs.dims()));
        }
        raw_mat_add_assign(&mut self.data, &rhs.data);
        Ok(())
    }

    /// Elementwise `self -= rhs`, modulo `2^T::BITS`.
    pub fn sub(&mut self, rhs: &Matrix<T>) -> Result<()> {
        if self.dims() != rhs.dims() {
            return Err(Error::dims("sub", self.dims(), rhs.dims()));
        }
        raw_mat_sub_assign(&mut self.data, &rhs.data);
        Ok(())
    }

    pub fn add_const(&mut self, c: T) {
        raw_add_assign_const(&mut self.data, c);
    }

    pub fn mul_const(&mut self, c: T) {
        raw_mul_assign_const(&mut self.data, c);
    }

    /// Reduces every entry into `[0, p)`.
    ///
    /// Only needed when the working modulus is smaller than `2^T::BITS`;
    /// otherwise wraparound already reduces.
    pub fn reduce_mod(&mut self, p: u64) -> Result<()> {
        if p == 0 {
            return Err(Error::unsupported("cannot reduce modulo 0"));
        }
        raw_rem_assign_const(&mut self.data, p);
        Ok(())
    }

    /// Matrix product `self * rhs`, modulo `2^T::BITS`, with the default kernel.
    pub fn mul(&self, rhs: &Matrix<T>) -> Result<Matrix<T>> {
        self.mul_with::<DefaultKernel>(rhs)
    }

    /// Matrix product with the kernel `K`.
    pub fn mul_with<K: MulKernel>(&self, rhs: &Matrix<T>) -> Result<Matrix<T>> {
        matrix_mul::<K, T>(&self.as_matrix_ref(), &rhs.as_matrix_ref())
    }
}
