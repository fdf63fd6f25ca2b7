//! Number coercions applied to host arguments before they reach the accessor.
//!
//! Host numbers are `f64`. The narrowing rules follow the usual script-engine
//! conversions so that wide puts truncate and wrap instead of failing.
use crate::error::PointerError;

const TWO_POW_32: f64 = 4_294_967_296.0;

/// ToUint32: truncate, then wrap modulo 2^32. Non-finite values become 0.
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(TWO_POW_32) as u32
}

/// ToInt32: ToUint32 reinterpreted as two's complement.
pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// Truncates toward zero, saturating at the `i64` range. NaN becomes 0.
pub fn to_integer(n: f64) -> i64 {
    n as i64
}

/// Range check for the 8-bit kinds, applied to the truncated number before any
/// wrapping. Reports the number as the host passed it.
pub fn check_byte(kind: &'static str, n: f64, min: f64, max: f64) -> Result<f64, PointerError> {
    let truncated = n.trunc();
    if truncated >= min && truncated <= max {
        Ok(truncated)
    } else {
        Err(PointerError::Range { kind, value: n })
    }
}

/// Range check for the wide integer kinds, applied only with the
/// `strict-range` feature. `min` and `max` are the kind's inclusive bounds.
pub fn check_wide(kind: &'static str, n: f64, min: f64, max: f64) -> Result<f64, PointerError> {
    if cfg!(feature = "strict-range") {
        // `max + 1.0` rounds to 2^63 / 2^64 for the 64-bit kinds, which is the
        // exclusive bound we want there too.
        let in_range = n >= min && n < max + 1.0;
        if !in_range {
            return Err(PointerError::Range { kind, value: n });
        }
    }
    Ok(n)
}
