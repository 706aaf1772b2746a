//! Hyperelastic solids
//!
//! Kirchhoff stress `τ = P Fᵀ` for the two supported energies. Multiplied by
//! the rest volume this is exactly the quantity the P2G force pass needs.

use crate::materials::families::{ElasticModel, ElasticParams};
use crate::math::{
    Matrix, Real, diagonal_from_value, identity_matrix, matrix_determinant, polar_decomposition,
};

/// Smallest Jacobian fed to the Neo-Hookean logarithm.
const MIN_JACOBIAN: Real = 1e-6;

pub fn kirchhoff_stress(deformation_gradient: &Matrix, elastic: &ElasticParams) -> Matrix {
    match elastic.model {
        ElasticModel::FixedCorotated => fixed_corotated_stress(deformation_gradient, elastic),
        ElasticModel::NeoHookean => neo_hookean_stress(deformation_gradient, elastic),
    }
}

/// `τ = 2μ (F − R) Fᵀ + λ (J − 1) J I`, `R` from the polar decomposition of `F`.
pub fn fixed_corotated_stress(f: &Matrix, elastic: &ElasticParams) -> Matrix {
    let (rotation, _) = polar_decomposition(f);
    let j = matrix_determinant(f);

    (*f - rotation) * f.transpose() * (2.0 * elastic.mu)
        + diagonal_from_value(elastic.lambda * (j - 1.0) * j)
}

/// `τ = μ (F Fᵀ − I) + λ ln(J) I`.
pub fn neo_hookean_stress(f: &Matrix, elastic: &ElasticParams) -> Matrix {
    let j = matrix_determinant(f).max(MIN_JACOBIAN);

    (*f * f.transpose() - identity_matrix()) * elastic.mu
        + diagonal_from_value(elastic.lambda * j.ln())
}
