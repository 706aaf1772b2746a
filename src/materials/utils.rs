//! Helper functions for materials
//!
//! Math and utility functions that different materials can use.

use crate::math::{Matrix, Real, matrix_trace};

/// Exact zero check inverse (prevents NaN from division by zero)
#[inline(always)]
pub fn inv_exact(e: Real) -> Real {
    if e == 0.0 { 0.0 } else { 1.0 / e }
}

/// Average pressure carried by a stress tensor
#[inline]
pub fn mean_pressure(stress: &Matrix) -> Real {
    -matrix_trace(stress) / 3.0
}

/// Physics parameter conversions
pub mod physics {
    use crate::math::Real;

    /// Lamé parameters (lambda, mu) from Young's modulus and Poisson ratio
    #[inline]
    pub fn lame_lambda_mu(young_modulus: Real, poisson_ratio: Real) -> (Real, Real) {
        let lambda =
            young_modulus * poisson_ratio / ((1.0 + poisson_ratio) * (1.0 - 2.0 * poisson_ratio));
        let mu = shear_modulus(young_modulus, poisson_ratio);
        (lambda, mu)
    }

    /// Shear modulus (mu) from Young's modulus and Poisson ratio
    #[inline]
    pub fn shear_modulus(young_modulus: Real, poisson_ratio: Real) -> Real {
        young_modulus / (2.0 * (1.0 + poisson_ratio))
    }
}

/// Check if material properties make sense
pub mod check {
    use crate::math::Real;

    #[inline]
    pub fn stiffness_ok(stiffness: Real) -> bool {
        stiffness >= 0.0 && stiffness.is_finite()
    }

    #[inline]
    pub fn exponent_ok(power: Real) -> bool {
        power > 0.0 && power < 16.0 && power.is_finite()
    }

    #[inline]
    pub fn viscosity_ok(viscosity: Real) -> bool {
        viscosity >= 0.0 && viscosity < 1e6 && viscosity.is_finite()
    }

    /// Lamé parameters of a stable isotropic solid
    #[inline]
    pub fn lame_ok(lambda: Real, mu: Real) -> bool {
        mu > 0.0 && mu.is_finite() && lambda.is_finite() && 3.0 * lambda + 2.0 * mu > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inv_exact_guards_zero() {
        assert_eq!(inv_exact(0.0), 0.0);
        assert_eq!(inv_exact(4.0), 0.25);
    }

    #[test]
    fn lame_parameters_from_young_poisson() {
        let (lambda, mu) = physics::lame_lambda_mu(1000.0, 0.25);
        assert!((lambda - 400.0).abs() < 1e-2);
        assert!((mu - 400.0).abs() < 1e-2);
        assert!(check::lame_ok(lambda, mu));
        assert!(!check::lame_ok(lambda, 0.0));
    }
}
