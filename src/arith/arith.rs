/// Recovers the mod-p value from a noisy value by dividing by `delta`
/// and rounding to the nearest integer.
///
/// Computed in 128 bits, so a value within `delta / 2` of the ciphertext
/// modulus rounds up to `p` and wraps to 0 rather than overflowing.
pub fn round_raw(x: u64, p: u64, delta: u64) -> u64 {
    let delta = delta as u128;
    let v = (x as u128 + delta / 2) / delta;
    (v % p as u128) as u64
}

/// Number of bits needed to represent every value in `[0, p)`.
pub fn bits_for_modulus(p: u64) -> u32 {
    if p <= 1 {
        0
    } else {
        64 - (p - 1).leading_zeros()
    }
}
