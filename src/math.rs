use bevy::math::{IVec3, Mat3, Vec3};
use nalgebra::Matrix3;

pub type Real = f32;
pub const DIM: usize = 3;

pub type Vector = Vec3;
pub type Matrix = Mat3;
pub type Coord = IVec3;

#[inline(always)]
pub fn zero_vector() -> Vector {
    Vec3::ZERO
}

#[inline(always)]
pub fn zero_matrix() -> Matrix {
    Mat3::ZERO
}

#[inline(always)]
pub fn identity_matrix() -> Matrix {
    Mat3::IDENTITY
}

#[inline(always)]
pub fn matrix_trace(m: &Matrix) -> Real {
    m.x_axis.x + m.y_axis.y + m.z_axis.z
}

#[inline(always)]
pub fn matrix_determinant(m: &Matrix) -> Real {
    m.determinant()
}

#[inline(always)]
pub fn diagonal_from_value(value: Real) -> Matrix {
    Matrix::from_diagonal(Vec3::splat(value))
}

#[inline(always)]
pub fn matrix_is_finite(m: &Matrix) -> bool {
    m.x_axis.is_finite() && m.y_axis.is_finite() && m.z_axis.is_finite()
}

/// `a ⊗ b`, i.e. the matrix whose column `j` is `a * b[j]`.
#[inline(always)]
pub fn outer_product(a: Vector, b: Vector) -> Matrix {
    Mat3::from_cols(a * b.x, a * b.y, a * b.z)
}

/// Symmetric part of a velocity gradient.
#[inline]
pub fn strain_rate(velocity_gradient: &Matrix) -> Matrix {
    (*velocity_gradient + velocity_gradient.transpose()) * 0.5
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DecomposedTensor {
    pub deviatoric_part: Matrix,
    pub spherical_part: Real,
}

impl DecomposedTensor {
    pub fn decompose(tensor: &Matrix) -> Self {
        let spherical_part = matrix_trace(tensor) / (DIM as Real);
        Self {
            deviatoric_part: *tensor - diagonal_from_value(spherical_part),
            spherical_part,
        }
    }

    pub fn recompose(&self) -> Matrix {
        self.deviatoric_part + diagonal_from_value(self.spherical_part)
    }
}

#[inline]
fn to_na(m: &Matrix) -> Matrix3<Real> {
    Matrix3::from_column_slice(&m.to_cols_array())
}

#[inline]
fn from_na(m: &Matrix3<Real>) -> Matrix {
    Mat3::from_cols_slice(m.as_slice())
}

/// Polar decomposition `F = R S` with `R` a proper rotation and `S`
/// symmetric, computed from the SVD `F = U Σ Vᵀ`.
///
/// When `det(U Vᵀ) < 0` the column of `U` paired with the smallest singular
/// value is negated so that `R` never contains a reflection.
pub fn polar_decomposition(f: &Matrix) -> (Matrix, Matrix) {
    let svd = to_na(f).svd(true, true);
    let (Some(mut u), Some(v_t)) = (svd.u, svd.v_t) else {
        return (identity_matrix(), *f);
    };
    let mut sigma = svd.singular_values;

    if (u * v_t).determinant() < 0.0 {
        let smallest = sigma.imin();
        sigma[smallest] = -sigma[smallest];
        let mut column = u.column_mut(smallest);
        column.neg_mut();
    }

    let rotation = u * v_t;
    let stretch = v_t.transpose() * Matrix3::from_diagonal(&sigma) * v_t;
    (from_na(&rotation), from_na(&stretch))
}
