//! Deterministic handling of `f64` values used as hash input or sort keys.

use core::cmp::Ordering;

/// Folds `-0.0` into `0.0` and every NaN payload into one NaN, so equal
/// coordinates always produce equal bit patterns.
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Total order over canonicalized floats. Used to break ties between hit
/// distances the same way on every run.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

#[cfg(test)]
mod tests {
    use super::{canonical_f64, stable_total_cmp_f64};
    use core::cmp::Ordering;

    #[test]
    fn signed_zeros_share_bits() {
        assert_eq!(canonical_f64(-0.0).to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn nan_payloads_collapse() {
        let odd_nan = f64::from_bits(0x7ff8_0000_0000_0001);
        assert_eq!(canonical_f64(odd_nan).to_bits(), f64::NAN.to_bits());
        assert_eq!(stable_total_cmp_f64(odd_nan, f64::NAN), Ordering::Equal);
    }

    #[test]
    fn ordering_matches_numeric_order() {
        assert_eq!(stable_total_cmp_f64(-0.0, 0.0), Ordering::Equal);
        assert_eq!(stable_total_cmp_f64(1.0, 2.5), Ordering::Less);
        assert_eq!(stable_total_cmp_f64(f64::INFINITY, 1e300), Ordering::Greater);
    }
}
