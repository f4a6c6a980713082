//! Linearly homomorphic use of the query path: the server's answer decodes to
//! `D * x mod p` for an arbitrary plaintext vector `x`.
//!
//! Requires `p` to be a power of two, so that `p` divides `Q` and the sums
//! wrap consistently.

use crate::{
    error::{Error, Result},
    matrix::{Elem, Matrix},
    prg::BufferedPrg,
};

use super::{Answer, Client, Query, SecretLhe};

impl<T: Elem> Client<T> {
    pub fn query_lhe(&self, x: &Matrix<T>, prg: &mut BufferedPrg) -> Result<(SecretLhe<T>, Query<T>)> {
        if !self.params.p_is_power_of_two() {
            return Err(Error::unsupported(format!(
                "homomorphic queries need a power-of-two p, got {}",
                self.params.p
            )));
        }
        let (s, query) = self.encode(x, prg)?;
        Ok((
            SecretLhe {
                s,
                query: query.clone(),
                plaintext: x.clone(),
            },
            Query(query),
        ))
    }

    pub fn recover_lhe(&self, secret: &SecretLhe<T>, answer: &Answer<T>) -> Result<Matrix<T>> {
        let mut out = self.decode(&secret.s, answer)?;
        out.reduce_mod(self.params.p)?;
        Ok(out)
    }
}
