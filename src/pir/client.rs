use std::time::Instant;

use log::debug;

use crate::{
    error::{Error, Result},
    matrix::{DiscreteGaussian, Elem, Matrix, DEFAULT_SIGMA},
    params::Params,
    prg::BufferedPrg,
};

use super::{Answer, Hint, Query, Secret};

/// Client side of the protocol: holds the public matrix and the hint for one
/// database snapshot, builds queries and decodes answers.
#[derive(Debug, Clone)]
pub struct Client<T: Elem> {
    pub(super) params: Params,
    a: Matrix<T>,
    hint: Hint<T>,
    sampler: DiscreteGaussian,
}

impl<T: Elem> Client<T> {
    pub fn new(params: Params, a: Matrix<T>, hint: Hint<T>) -> Result<Self> {
        params.check_width::<T>()?;
        if a.dims() != (params.m, params.n) {
            return Err(Error::dims("client", a.dims(), (params.m, params.n)));
        }
        if hint.as_matrix().cols() != params.n {
            return Err(Error::dims(
                "client",
                hint.as_matrix().dims(),
                (hint.as_matrix().rows(), params.n),
            ));
        }
        let sampler = if params.sigma == DEFAULT_SIGMA {
            DiscreteGaussian::default_sampler().clone()
        } else {
            DiscreteGaussian::new(params.sigma)?
        };
        Ok(Client {
            params,
            a,
            hint,
            sampler,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn hint(&self) -> &Hint<T> {
        &self.hint
    }

    /// Encrypts the column vector `x` (M x 1, entries in Z_p).
    pub fn query(&self, x: &Matrix<T>, prg: &mut BufferedPrg) -> Result<(Secret<T>, Query<T>)> {
        let (s, query) = self.encode(x, prg)?;
        Ok((
            Secret {
                s,
                query: query.clone(),
            },
            Query(query),
        ))
    }

    /// Query for database column `i`.
    pub fn query_index(&self, i: usize, prg: &mut BufferedPrg) -> Result<(Secret<T>, Query<T>)> {
        if i >= self.params.m {
            return Err(Error::IndexOutOfRange {
                row: i,
                col: 0,
                rows: self.params.m,
                cols: 1,
            });
        }
        let mut x = Matrix::new(self.params.m, 1);
        x.set(i, 0, T::from_u64(1))?;
        self.query(&x, prg)
    }

    /// Decodes `answer` into the plaintext column `D * x`, one entry per
    /// database row.
    pub fn recover(&self, secret: Secret<T>, answer: &Answer<T>) -> Result<Matrix<T>> {
        self.decode(&secret.s, answer)
    }

    pub(super) fn encode(&self, x: &Matrix<T>, prg: &mut BufferedPrg) -> Result<(Matrix<T>, Matrix<T>)> {
        let params = &self.params;
        if params.ne != 1 {
            return Err(Error::unsupported(format!("ne = {} is not supported", params.ne)));
        }
        if params.l >= 64 || (1u64 << params.l) > params.p {
            return Err(Error::unsupported(format!(
                "2^{} entries do not fit in Z_{}",
                params.l, params.p
            )));
        }
        if x.dims() != (params.m, 1) {
            return Err(Error::dims("query", x.dims(), (params.m, 1)));
        }

        let start = Instant::now();
        let s = Matrix::random_logmod(prg, params.n, 1, params.logmod)?;
        let e = Matrix::gaussian_with(&self.sampler, prg, params.m, 1)?;

        let mut query = self.a.mul(&s)?;
        query.add(&e)?;
        let mut scaled = x.clone();
        scaled.mul_const(T::from_u64(params.delta()));
        query.add(&scaled)?;
        params.reduce(&mut query)?;

        let pad = params.padded_m() - params.m;
        if pad > 0 {
            query.append_zeros(pad)?;
        }
        debug!("query took {} us", start.elapsed().as_micros());

        Ok((s, query))
    }

    pub(super) fn decode(&self, s: &Matrix<T>, answer: &Answer<T>) -> Result<Matrix<T>> {
        let params = &self.params;
        if params.ne != 1 {
            return Err(Error::unsupported(format!("ne = {} is not supported", params.ne)));
        }
        let hint = self.hint.as_matrix();
        if answer.as_matrix().dims() != (hint.rows(), 1) {
            return Err(Error::dims("recover", answer.as_matrix().dims(), (hint.rows(), 1)));
        }

        let start = Instant::now();
        let mut out = answer.as_matrix().clone();
        out.sub(&hint.mul(s)?)?;
        params.reduce(&mut out)?;
        out.apply(|v| T::from_u64(params.round(v.to_u64())));
        debug!("recover took {} us", start.elapsed().as_micros());

        Ok(out)
    }
}
