use crate::{EfError, EfResult};

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute/relative tolerance pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-6,
            rel: 1e-8,
        }
    }
}

impl Tolerances {
    /// Error weight for a component whose magnitude is `scale`.
    #[inline]
    pub fn weight(&self, scale: Real) -> Real {
        self.abs + self.rel * scale.abs()
    }
}

/// Relative deviation of `value` from `reference`, with `floor` guarding
/// against a zero reference.
pub fn relative_drift(value: Real, reference: Real, floor: Real) -> Real {
    (value - reference).abs() / reference.abs().max(floor)
}

pub fn ensure_finite(v: Real, what: &'static str) -> EfResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EfError::NonFinite { what, value: v })
    }
}

/// Finite and `>= 0`.
pub fn ensure_non_negative(v: Real, what: &'static str) -> EfResult<Real> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(EfError::Negative { what, value: v });
    }
    Ok(v)
}

/// Finite and `> 0`.
pub fn ensure_positive(v: Real, what: &'static str) -> EfResult<Real> {
    let v = ensure_finite(v, what)?;
    if v <= 0.0 {
        return Err(EfError::NonPositive { what, value: v });
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_non_negative_allows_zero() {
        assert_eq!(ensure_non_negative(0.0, "s0").unwrap(), 0.0);
        let err = ensure_non_negative(-1.0, "s0").unwrap_err();
        assert_eq!(err.what(), "s0");
        assert!(matches!(err, EfError::Negative { .. }));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_infinity() {
        assert!(ensure_positive(0.0, "abs_tol").is_err());
        assert!(matches!(
            ensure_positive(Real::INFINITY, "abs_tol"),
            Err(EfError::NonFinite { .. })
        ));
        assert!(ensure_positive(1e-9, "abs_tol").is_ok());
    }

    #[test]
    fn relative_drift_uses_floor_for_zero_reference() {
        assert_eq!(relative_drift(0.0, 0.0, 1e-6), 0.0);
        assert!((relative_drift(1e-6, 0.0, 1e-6) - 1.0).abs() < 1e-12);
        assert!((relative_drift(101.0, 100.0, 1e-6) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn tolerance_weight_grows_with_magnitude() {
        let tol = Tolerances::default();
        assert!(tol.weight(1e6) > tol.weight(1.0));
        assert_eq!(tol.weight(0.0), tol.abs);
    }
}
