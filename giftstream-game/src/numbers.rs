//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// 2^63, the first f64 above every i64.
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn saturate_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    if value >= I64_UPPER {
        return i64::MAX;
    }
    if value < -I64_UPPER {
        return i64::MIN;
    }
    cast::<f64, i64>(value).unwrap_or(0)
}

/// Round a f64 half away from zero, saturating at the i64 range and returning 0 for NaN.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    saturate_to_i64(value.round())
}

/// Floor a f64, saturating at the i64 range and returning 0 for NaN.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    saturate_to_i64(value.floor())
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert a u64 millisecond count to f64.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Convert a non-negative f64 to u64 milliseconds, rounding and saturating.
#[must_use]
pub fn f64_to_u64_saturating(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    cast::<f64, u64>(value.round()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_f64_to_i64(1.5), 2);
        assert_eq!(round_f64_to_i64(-1.5), -2);
        assert_eq!(round_f64_to_i64(f64::NAN), 0);
        assert_eq!(round_f64_to_i64(f64::INFINITY), i64::MAX);
    }

    #[test]
    fn floor_handles_non_finite() {
        assert_eq!(floor_f64_to_i64(3.99), 3);
        assert_eq!(floor_f64_to_i64(-0.5), -1);
        assert_eq!(floor_f64_to_i64(f64::NAN), 0);
    }

    #[test]
    fn out_of_range_values_saturate() {
        assert_eq!(round_f64_to_i64(1e30), i64::MAX);
        assert_eq!(round_f64_to_i64(-1e30), i64::MIN);
        assert_eq!(round_f64_to_i64(f64::NEG_INFINITY), i64::MIN);
        assert_eq!(floor_f64_to_i64(f64::INFINITY), i64::MAX);
        assert_eq!(floor_f64_to_i64(-1e19), i64::MIN);
        assert_eq!(round_f64_to_i64(9_007_199_254_740_992.0), 9_007_199_254_740_992);
    }

    #[test]
    fn millisecond_conversions_saturate() {
        assert_eq!(f64_to_u64_saturating(-4.0), 0);
        assert_eq!(f64_to_u64_saturating(29.6), 30);
        assert!((u64_to_f64(1_200) - 1_200.0).abs() < f64::EPSILON);
    }
}
