use std::{marker::PhantomData, time::Instant};

use log::{debug, info};

use crate::{
    error::{Error, Result},
    matrix::{matrix_mul, matrix_mul_vec_packed, DefaultKernel, Elem, Matrix, MulKernel, Squishable},
    params::Params,
    prg::{BufferedPrg, PrgKey},
};

use super::{Answer, Hint, Query};

/// Re-derives the public matrix `A` (M x N) from a published seed.
pub fn derive_public_matrix<T: Elem>(params: &Params, seed: PrgKey) -> Result<Matrix<T>> {
    params.check_width::<T>()?;
    let mut prg = BufferedPrg::new(seed);
    Matrix::random_logmod(&mut prg, params.m, params.n, params.logmod)
}

/// Holds one database snapshot, its public matrix and its hint.
///
/// `answer` takes `&self`, so one server can answer many queries
/// concurrently.
pub struct Server<T: Elem, K: MulKernel = DefaultKernel> {
    params: Params,
    db: Matrix<T>,
    db_rows: usize,
    a: Matrix<T>,
    hint: Hint<T>,
    _kernel: PhantomData<fn() -> K>,
}

impl<T: Elem, K: MulKernel> Server<T, K> {
    /// Samples a fresh public matrix and preprocesses `db`, which must have
    /// `params.m` columns and entries below `params.p`.
    pub fn setup(params: Params, db: Matrix<T>, prg: &mut BufferedPrg) -> Result<Self> {
        Self::check_db(&params, &db)?;
        let a = Matrix::random_logmod(prg, params.m, params.n, params.logmod)?;
        Self::with_public_matrix(params, db, a)
    }

    /// Like `setup`, but derives the public matrix from `seed` so clients
    /// can rebuild it with [`derive_public_matrix`].
    pub fn setup_from_seed(params: Params, db: Matrix<T>, seed: PrgKey) -> Result<Self> {
        Self::check_db(&params, &db)?;
        let a = derive_public_matrix(&params, seed)?;
        Self::with_public_matrix(params, db, a)
    }

    fn check_db(params: &Params, db: &Matrix<T>) -> Result<()> {
        params.check_width::<T>()?;
        if db.cols() != params.m {
            return Err(Error::dims("setup", db.dims(), (db.rows(), params.m)));
        }
        if let Some(idx) = db.slc().iter().position(|v| v.to_u64() >= params.p) {
            return Err(Error::unsupported(format!(
                "database entry at ({}, {}) is not below p = {}",
                idx / db.cols(),
                idx % db.cols(),
                params.p
            )));
        }
        Ok(())
    }

    fn with_public_matrix(params: Params, db: Matrix<T>, a: Matrix<T>) -> Result<Self> {
        let start = Instant::now();
        let mut hint = db.mul_with::<K>(&a)?;
        params.reduce(&mut hint)?;
        debug!("hint computation took {} us", start.elapsed().as_micros());

        let db_rows = db.rows();
        let db = if params.squishing > 1 {
            db.squish(&params.squish_params::<T>())?
        } else {
            db
        };

        info!(
            "server ready: {} x {} database, hint is {} x {}, stored db is {} x {}",
            db_rows,
            params.m,
            hint.rows(),
            hint.cols(),
            db.rows(),
            db.cols()
        );
        Ok(Server {
            params,
            db,
            db_rows,
            a,
            hint: Hint(hint),
            _kernel: PhantomData,
        })
    }

    /// Computes `D * q` mod Q.
    pub fn answer(&self, query: &Query<T>) -> Result<Answer<T>> {
        let q = query.as_matrix();
        if q.dims() != (self.params.padded_m(), 1) {
            return Err(Error::dims("answer", q.dims(), (self.params.padded_m(), 1)));
        }

        let start = Instant::now();
        let mut ans = if self.params.squishing > 1 {
            matrix_mul_vec_packed::<K, T>(
                &self.db.as_matrix_ref(),
                &q.as_matrix_ref(),
                &self.params.squish_params::<T>(),
            )?
        } else {
            matrix_mul::<K, T>(&self.db.as_matrix_ref(), &q.as_matrix_ref())?
        };
        self.params.reduce(&mut ans)?;
        debug!("answer took {} us", start.elapsed().as_micros());

        Ok(Answer(ans))
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn public_matrix(&self) -> &Matrix<T> {
        &self.a
    }

    pub fn hint(&self) -> &Hint<T> {
        &self.hint
    }

    /// Number of database rows, and so of answer entries.
    pub fn db_rows(&self) -> usize {
        self.db_rows
    }
}
