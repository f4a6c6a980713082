use std::sync::OnceLock;

use subtle::{ConditionallySelectable, ConstantTimeGreater};

use crate::{
    error::{Error, Result},
    prg::BufferedPrg,
};

/// Standard deviation of the LWE error distribution.
pub const DEFAULT_SIGMA: f64 = 6.4;

/// The table covers `[-ceil(sigma * TAIL_CUT), ceil(sigma * TAIL_CUT)]`.
pub const TAIL_CUT: f64 = 8.0;

/// Discrete Gaussian sampler over the integers, centered at 0, by inversion
/// of a precomputed cumulative distribution table.
///
/// Two tables are kept: one scaled by `2^32` and one scaled by `2^64`, so
/// 32-bit ring elements consume one `u32` draw per sample and 64-bit ring
/// elements one `u64` draw.
#[derive(Debug, Clone)]
pub struct DiscreteGaussian {
    sigma: f64,
    max_val: i64,
    cdf32: Vec<u32>,
    cdf64: Vec<u64>,
}

impl DiscreteGaussian {
    /// Build the tables for standard deviation `sigma`.
    pub fn new(sigma: f64) -> Result<Self> {
        if !sigma.is_finite() || sigma <= 0.0 || sigma > 1e6 {
            return Err(Error::unsupported(format!(
                "gaussian standard deviation {} must be positive and finite",
                sigma
            )));
        }
        Ok(Self::build(sigma))
    }

    /// The shared sampler for [`DEFAULT_SIGMA`]. Its tables are built once
    /// and never mutated.
    pub fn default_sampler() -> &'static DiscreteGaussian {
        static DEFAULT: OnceLock<DiscreteGaussian> = OnceLock::new();
        DEFAULT.get_or_init(|| Self::build(DEFAULT_SIGMA))
    }

    fn build(sigma: f64) -> Self {
        let max_val = (sigma * TAIL_CUT).ceil() as i64;

        // assign discrete probabilities to each possible integer output
        let mut table = Vec::with_capacity((2 * max_val + 1) as usize);
        let mut total = 0.0;
        for i in -max_val..max_val + 1 {
            let p_val = f64::exp(-f64::powi(i as f64, 2) / (2.0 * sigma * sigma));
            table.push(p_val);
            total += p_val;
        }

        // float-to-int casts saturate, so a cumulative probability of 1.0
        // maps to the type's max
        let mut cdf32 = Vec::with_capacity(table.len());
        let mut cdf64 = Vec::with_capacity(table.len());
        let mut cum_prob = 0.0;
        for p_val in table {
            cum_prob += p_val / total;
            cdf32.push((cum_prob * (u32::MAX as f64)).round() as u32);
            cdf64.push((cum_prob * (u64::MAX as f64)).round() as u64);
        }
        if let Some(last) = cdf32.last_mut() {
            *last = u32::MAX;
        }
        if let Some(last) = cdf64.last_mut() {
            *last = u64::MAX;
        }

        Self {
            sigma,
            max_val,
            cdf32,
            cdf64,
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Largest magnitude this sampler can output.
    pub fn max_val(&self) -> i64 {
        self.max_val
    }

    /// Sample using a single `u32` draw.
    pub fn sample32(&self, prg: &mut BufferedPrg) -> Result<i64> {
        let draw = prg.next_u32()?;
        Ok(invert_cdf(&self.cdf32, draw, self.max_val))
    }

    /// Sample using a single `u64` draw.
    pub fn sample64(&self, prg: &mut BufferedPrg) -> Result<i64> {
        let draw = prg.next_u64()?;
        Ok(invert_cdf(&self.cdf64, draw, self.max_val))
    }
}

/// Returns the smallest output whose cumulative probability is at least
/// `draw`. Every table entry is visited, with no branch on `draw`.
fn invert_cdf<U: ConstantTimeGreater>(cdf: &[U], draw: U, max_val: i64) -> i64 {
    let mut to_output = 0i64;
    for i in (0..cdf.len()).rev() {
        let out_val = (i as i64) - max_val;
        // if draw <= cdf[i], set to_output := out_val
        let cmp = !(draw.ct_gt(&cdf[i]));
        to_output.conditional_assign(&out_val, cmp);
    }
    to_output
}
