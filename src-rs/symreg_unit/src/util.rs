//! Floating point helpers shared by the unit model

const TOLERANCE: f64 = 1e-10;

/// Checks if two floating point numbers are close to each other.
///
/// This uses a combined relative and absolute tolerance, both fixed
/// at 1e-10. Infinite and NaN values are only close to themselves
/// when they compare equal.
#[must_use]
pub const fn is_close(a: f64, b: f64) -> bool {
    #[expect(
        clippy::float_cmp,
        reason = "this is a part of implementing better floating point comparison"
    )]
    if a == b {
        return true;
    }

    if a.is_infinite() || b.is_infinite() {
        return false;
    }

    if a.is_nan() || b.is_nan() {
        return false;
    }

    let difference = (a - b).abs();
    let relative_tolerance = TOLERANCE * f64::min(a.abs(), b.abs());
    let absolute_tolerance = TOLERANCE;

    difference <= relative_tolerance || difference <= absolute_tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_values() {
        assert!(is_close(1.0, 1.0 + 1e-12));
        assert!(is_close(1000.0, 1000.0 + 1e-8));
        assert!(!is_close(1.0, 1.001));
    }

    #[test]
    fn non_finite_values() {
        assert!(is_close(f64::INFINITY, f64::INFINITY));
        assert!(!is_close(f64::INFINITY, 1.0));
        assert!(!is_close(f64::NAN, f64::NAN));
    }
}
