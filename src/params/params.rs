use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    arith::{bits_for_modulus, round_raw},
    error::{Error, Result},
    matrix::{Elem, Matrix, SquishParams, DEFAULT_SIGMA},
};

fn default_ne() -> usize {
    1
}

fn default_squishing() -> usize {
    1
}

fn default_sigma() -> f64 {
    DEFAULT_SIGMA
}

/// Protocol parameters, published alongside the hint as a small
/// configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub n: usize, // LWE secret dimension
    pub m: usize, // DB width: entries per DB row, and the query length

    pub l: u32,      // bits per DB entry
    pub p: u64,      // plaintext modulus
    pub logmod: u32, // (logarithm of) ciphertext modulus

    /// Number of Z_p elems per DB entry. Only 1 is supported.
    #[serde(default = "default_ne")]
    pub ne: usize,

    /// Number of DB entries packed into one stored element.
    #[serde(default = "default_squishing")]
    pub squishing: usize,

    /// LWE error distribution stddev.
    #[serde(default = "default_sigma")]
    pub sigma: f64,
}

impl Params {
    pub fn new(n: usize, m: usize, l: u32, p: u64, logmod: u32, squishing: usize) -> Result<Self> {
        let params = Params {
            n,
            m,
            l,
            p,
            logmod,
            ne: 1,
            squishing,
            sigma: DEFAULT_SIGMA,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn with_ne(mut self, ne: usize) -> Result<Self> {
        self.ne = ne;
        self.validate()?;
        Ok(self)
    }

    pub fn with_sigma(mut self, sigma: f64) -> Result<Self> {
        self.sigma = sigma;
        self.validate()?;
        Ok(self)
    }

    /// Checks the width-independent invariants.
    pub fn validate(&self) -> Result<()> {
        if self.n == 0 || self.m == 0 {
            return Err(Error::unsupported("n and m must be positive"));
        }
        if self.logmod == 0 || self.logmod > 64 {
            return Err(Error::unsupported(format!(
                "logmod {} is not in [1, 64]",
                self.logmod
            )));
        }
        if self.p < 2 || (self.p as u128) >= self.q() {
            return Err(Error::unsupported(format!(
                "plaintext modulus {} is not in [2, 2^{})",
                self.p, self.logmod
            )));
        }
        if self.ne == 0 || self.squishing == 0 {
            return Err(Error::unsupported("ne and squishing must be positive"));
        }
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(Error::unsupported(format!("bad sigma {}", self.sigma)));
        }
        Ok(())
    }

    /// Checks that ring elements of type `T` can carry these parameters.
    pub fn check_width<T: Elem>(&self) -> Result<()> {
        self.validate()?;
        if self.logmod > T::BITS {
            return Err(Error::unsupported(format!(
                "logmod {} does not fit a {}-bit element",
                self.logmod,
                T::BITS
            )));
        }
        self.squish_params::<T>().validate::<T>()
    }

    /// Ciphertext modulus, `2^logmod`.
    pub fn q(&self) -> u128 {
        1u128 << self.logmod
    }

    /// Scaling factor, `floor(Q / P)`.
    pub fn delta(&self) -> u64 {
        (self.q() / self.p as u128) as u64
    }

    /// Decodes a noisy value in `[0, Q)` to `round(x / Delta) mod P`.
    pub fn round(&self, x: u64) -> u64 {
        round_raw(x, self.p, self.delta())
    }

    /// Whether the linearly homomorphic variant is usable (P divides Q).
    pub fn p_is_power_of_two(&self) -> bool {
        self.p.is_power_of_two()
    }

    pub fn plaintext_bits(&self) -> u32 {
        bits_for_modulus(self.p)
    }

    /// Packing used for the stored database.
    pub fn squish_params<T: Elem>(&self) -> SquishParams {
        if self.squishing == 1 {
            SquishParams::identity::<T>()
        } else {
            SquishParams {
                basis: self.plaintext_bits(),
                delta: self.squishing,
            }
        }
    }

    /// Query length: `m` rounded up to a multiple of the squishing factor.
    pub fn padded_m(&self) -> usize {
        (self.m + self.squishing - 1) / self.squishing * self.squishing
    }

    /// Reduces `m` modulo Q, when Q is smaller than the element modulus.
    pub fn reduce<T: Elem>(&self, m: &mut Matrix<T>) -> Result<()> {
        if self.logmod < T::BITS {
            m.reduce_mod(1u64 << self.logmod)?;
        }
        Ok(())
    }

    pub fn from_json(cfg: &str) -> Result<Self> {
        let params: Params = serde_json::from_str(cfg)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Choose parameters for a database with rows of `m` entries. The free
    /// variable is `p`.
    ///
    /// Picks the largest power-of-two `p` for which the answer noise, bounded
    /// by `p * sigma * sqrt(m)` standard deviations scaled by the Gaussian
    /// tail bound for `fail_prob`, stays below `Delta / 2`.
    pub fn pick(n: usize, m: usize, logmod: u32, squishing: usize, fail_prob: f64) -> Result<Self> {
        if !(fail_prob > 0.0 && fail_prob < 1.0) {
            return Err(Error::unsupported(format!(
                "failure probability {} is not in (0, 1)",
                fail_prob
            )));
        }
        let tail = (2.0 * (2.0 / fail_prob).ln()).sqrt();
        let noise_per_p = DEFAULT_SIGMA * (m as f64).sqrt() * tail;

        let q = if logmod > 0 && logmod <= 64 {
            (1u128 << logmod) as f64
        } else {
            return Err(Error::unsupported(format!("logmod {} is not in [1, 64]", logmod)));
        };

        let mut best = None;
        let mut p = 2u64;
        while (p as f64) * (p as f64) * noise_per_p * 2.0 < q {
            best = Some(p);
            match p.checked_mul(2) {
                Some(next) if (next as u128) < (1u128 << logmod) => p = next,
                _ => break,
            }
        }

        let p = best.ok_or_else(|| {
            Error::unsupported(format!(
                "no plaintext modulus decodes correctly with m = {}, logmod = {}",
                m, logmod
            ))
        })?;
        let params = Params::new(n, m, bits_for_modulus(p), p, logmod, squishing)?;
        info!("picked params: {:?}", params);
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_values() {
        let params = Params::new(1024, 8, 1, 2, 32, 1).unwrap();
        assert_eq!(params.q(), 1 << 32);
        assert_eq!(params.delta(), 1 << 31);

        let params = Params::new(1024, 8, 9, 991, 32, 1).unwrap();
        assert_eq!(params.delta(), (1u64 << 32) / 991);
        assert_eq!(params.plaintext_bits(), 10);

        let params = Params::new(1024, 8, 8, 256, 64, 1).unwrap();
        assert_eq!(params.delta(), 1 << 56);
    }

    #[test]
    fn round_inverts_scaling() {
        for (p, logmod) in [(2u64, 32u32), (256, 32), (991, 32), (1 << 10, 64), (3, 20)] {
            let params = Params::new(16, 8, 1, p, logmod, 1).unwrap();
            let q = params.q();
            for x in 0..p.min(2048) {
                let scaled = ((params.delta() as u128 * x as u128) % q) as u64;
                assert_eq!(params.round(scaled), x, "p = {}, x = {}", p, x);
            }
        }
    }

    #[test]
    fn round_handles_wraparound() {
        let params = Params::new(16, 8, 1, 2, 32, 1).unwrap();
        let q_minus_1 = (params.q() - 1) as u64;
        assert_eq!(params.round(q_minus_1), 0);
        assert_eq!(params.round(params.delta() - 1), 1);
        assert_eq!(params.round(params.delta() / 2 - 1), 0);

        let params = Params::new(16, 8, 8, 256, 64, 1).unwrap();
        assert_eq!(params.round(u64::MAX), 0);
        assert_eq!(params.round(255 * params.delta() + 1000), 255);
    }

    #[test]
    fn bad_params_are_rejected() {
        assert!(Params::new(0, 8, 1, 2, 32, 1).is_err());
        assert!(Params::new(16, 8, 1, 1, 32, 1).is_err());
        assert!(Params::new(16, 8, 1, 2, 65, 1).is_err());
        assert!(Params::new(16, 8, 1, 1 << 20, 20, 1).is_err());
        assert!(Params::new(16, 8, 1, 2, 32, 0).is_err());
        let params = Params::new(16, 8, 1, 2, 32, 1).unwrap();
        assert!(params.with_ne(0).is_err());
        assert!(params.with_sigma(-1.0).is_err());
    }

    #[test]
    fn width_checks() {
        let params = Params::new(16, 8, 8, 256, 64, 1).unwrap();
        assert!(params.check_width::<u64>().is_ok());
        assert!(matches!(
            params.check_width::<u32>(),
            Err(Error::UnsupportedParameter(_))
        ));

        let params = Params::new(16, 8, 10, 1 << 10, 32, 3).unwrap();
        assert!(params.check_width::<u32>().is_ok());
        let params = Params::new(16, 8, 11, 1 << 11, 32, 3).unwrap();
        assert!(params.check_width::<u32>().is_err());
        assert!(params.check_width::<u64>().is_ok());
        let params = Params::new(16, 8, 11, 1 << 11, 64, 6).unwrap();
        assert!(params.check_width::<u64>().is_err());
    }

    #[test]
    fn padded_m_rounds_up() {
        assert_eq!(Params::new(16, 8, 1, 2, 32, 1).unwrap().padded_m(), 8);
        assert_eq!(Params::new(16, 8, 1, 2, 32, 3).unwrap().padded_m(), 9);
        assert_eq!(Params::new(16, 9, 1, 2, 32, 3).unwrap().padded_m(), 9);
    }

    #[test]
    fn reduce_only_below_width() {
        let mut m = Matrix::<u32>::from_data(1, 2, vec![u32::MAX, 5]).unwrap();
        Params::new(16, 8, 1, 2, 32, 1).unwrap().reduce(&mut m).unwrap();
        assert_eq!(m.slc(), &[u32::MAX, 5]);
        Params::new(16, 8, 1, 2, 20, 1).unwrap().reduce(&mut m).unwrap();
        assert_eq!(m.slc(), &[(1 << 20) - 1, 5]);
    }

    #[test]
    fn json_round_trip_and_defaults() {
        let params = Params::new(1024, 4096, 8, 256, 32, 3).unwrap();
        let back = Params::from_json(&params.to_json().unwrap()).unwrap();
        assert_eq!(back, params);

        let cfg = r#"{"n": 1024, "m": 8, "l": 1, "p": 2, "logmod": 32}"#;
        let params = Params::from_json(cfg).unwrap();
        assert_eq!(params.ne, 1);
        assert_eq!(params.squishing, 1);
        assert_eq!(params.sigma, DEFAULT_SIGMA);

        assert!(matches!(Params::from_json("{"), Err(Error::Config(_))));
        let cfg = r#"{"n": 1024, "m": 8, "l": 1, "p": 1, "logmod": 32}"#;
        assert!(matches!(
            Params::from_json(cfg),
            Err(Error::UnsupportedParameter(_))
        ));
    }

    #[test]
    fn pick_finds_largest_safe_modulus() {
        let params = Params::pick(1024, 1 << 10, 32, 1, 1e-6).unwrap();
        assert!(params.p.is_power_of_two());
        assert_eq!(params.l, params.plaintext_bits());

        let bound = |p: u64| (p as f64).powi(2) * DEFAULT_SIGMA * 32.0 * 2.0 * (2.0 * (2e6f64).ln()).sqrt();
        assert!(bound(params.p) < (1u64 << 32) as f64);
        assert!(bound(params.p * 2) >= (1u64 << 32) as f64);

        let bigger_db = Params::pick(1024, 1 << 20, 32, 1, 1e-6).unwrap();
        assert!(bigger_db.p < params.p);

        let wide = Params::pick(1024, 1 << 20, 64, 1, 1e-6).unwrap();
        assert!(wide.p > params.p);

        assert!(Params::pick(1024, 1 << 20, 8, 1, 1e-6).is_err());
        assert!(Params::pick(1024, 8, 32, 1, 0.0).is_err());
    }
}
