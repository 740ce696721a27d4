//! Number comparison, hashing and rendering.

use std::cmp::Ordering;

/// Total order over doubles in which `0` and `-0` are equal.
pub(crate) fn compare(a: f64, b: f64) -> Ordering {
    if a == b {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

/// Bits to hash for `n`, consistent with [`compare`].
pub(crate) fn hash_bits(n: f64) -> u64 {
    if n == 0.0 {
        0
    } else if n.is_nan() {
        f64::NAN.to_bits()
    } else {
        n.to_bits()
    }
}

/// Integral values print without a fractional part.
pub(crate) fn format(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
