//! Weakly-compressible fluid
//!
//! Equation-of-state pressure plus a Newtonian viscous term.

use crate::materials::families::FluidParams;
use crate::math::{DecomposedTensor, Matrix, Real, diagonal_from_value, strain_rate};

/// EOS pressure. Only compression produces pressure: an expanded fluid is
/// left to gravity, which keeps free surfaces from pulling apart.
#[inline]
pub fn eos_pressure(density: Real, rest_density: Real, fluid: &FluidParams) -> Real {
    let ratio = density / rest_density;
    fluid.eos_stiffness * (ratio.powf(fluid.eos_power) - 1.0).max(0.0)
}

/// Cauchy stress of a fluid particle.
///
/// `affine_momentum_matrix` is the APIC `C` matrix, which approximates the
/// local velocity gradient.
pub fn calculate_stress(
    affine_momentum_matrix: &Matrix,
    density: Real,
    rest_density: Real,
    fluid: &FluidParams,
) -> Matrix {
    let pressure = eos_pressure(density, rest_density, fluid);
    let deviatoric_strain =
        DecomposedTensor::decompose(&strain_rate(affine_momentum_matrix)).deviatoric_part;

    diagonal_from_value(-pressure) + deviatoric_strain * (2.0 * fluid.dynamic_viscosity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::utils::mean_pressure;
    use crate::math::{matrix_trace, zero_matrix};
    use bevy::math::{Mat3, Vec3};

    #[test]
    fn pressure_vanishes_at_rest_density() {
        let fluid = FluidParams::water();
        assert_eq!(eos_pressure(296.0, 296.0, &fluid), 0.0);
        assert!(calculate_stress(&zero_matrix(), 296.0, 296.0, &fluid).abs_diff_eq(Mat3::ZERO, 1e-6));
    }

    #[test]
    fn compression_pushes_and_expansion_is_free() {
        let fluid = FluidParams::water();
        let compressed = calculate_stress(&zero_matrix(), 1.1, 1.0, &fluid);
        assert!(mean_pressure(&compressed) > 0.0);
        let expected = fluid.eos_stiffness * (1.1f32.powf(fluid.eos_power) - 1.0);
        assert!((mean_pressure(&compressed) - expected).abs() < 1e-4);

        let expanded = calculate_stress(&zero_matrix(), 0.5, 1.0, &fluid);
        assert_eq!(mean_pressure(&expanded), 0.0);
    }

    #[test]
    fn viscous_stress_is_traceless_and_symmetric() {
        let fluid = FluidParams::water();
        let c = Mat3::from_cols(
            Vec3::new(0.3, 1.0, 0.0),
            Vec3::new(-0.2, 0.1, 0.4),
            Vec3::new(0.0, 0.5, 0.9),
        );
        let stress = calculate_stress(&c, 1.0, 1.0, &fluid);
        assert!(matrix_trace(&stress).abs() < 1e-6);
        assert!(stress.abs_diff_eq(stress.transpose(), 1e-6));
    }

    #[test]
    fn rigid_rotation_carries_no_viscous_stress() {
        let fluid = FluidParams::water();
        let spin = Mat3::from_cols(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::ZERO,
        );
        let stress = calculate_stress(&spin, 1.0, 1.0, &fluid);
        assert!(stress.abs_diff_eq(Mat3::ZERO, 1e-6));
    }
}
