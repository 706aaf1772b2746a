//! Material particles for MPM simulation
//!
//! Particles carry position, velocity, the APIC affine matrix and mass.
//! Elastic runs additionally track a deformation gradient.

use crate::math::{
    Matrix, Real, Vector, identity_matrix, matrix_determinant, matrix_is_finite, zero_matrix,
    zero_vector,
};

use super::domain::SimulationDomain;

/// Per-particle state of an elastic solid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElasticState {
    pub deformation_gradient: Matrix,
    /// Volume at rest, measured from the grid right after seeding.
    pub rest_volume: Real,
}

impl ElasticState {
    pub fn new(rest_volume: Real) -> Self {
        Self {
            deformation_gradient: identity_matrix(),
            rest_volume,
        }
    }

    #[inline(always)]
    pub fn jacobian(&self) -> Real {
        matrix_determinant(&self.deformation_gradient)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Seeding index, preserved across sorts.
    pub id: u32,
    pub position: Vector,
    pub velocity: Vector,
    pub affine_momentum_matrix: Matrix, // APIC affine velocity field (C matrix)
    pub mass: Real,
    pub elastic: Option<ElasticState>,

    // Health tracking
    pub failed: bool,
}

impl Particle {
    pub fn new(id: u32, position: Vector, mass: Real) -> Self {
        Self {
            id,
            position,
            velocity: zero_vector(),
            affine_momentum_matrix: zero_matrix(),
            mass,
            elastic: None,
            failed: false,
        }
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_affine_momentum(mut self, affine: Matrix) -> Self {
        self.affine_momentum_matrix = affine;
        self
    }

    pub fn with_elastic(mut self, state: ElasticState) -> Self {
        self.elastic = Some(state);
        self
    }

    #[inline(always)]
    pub fn momentum(&self) -> Vector {
        self.velocity * self.mass
    }

    /// `det F` for elastic particles.
    #[inline(always)]
    pub fn jacobian(&self) -> Option<Real> {
        self.elastic.as_ref().map(ElasticState::jacobian)
    }

    #[inline(always)]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && matrix_is_finite(&self.affine_momentum_matrix)
            && self
                .elastic
                .as_ref()
                .is_none_or(|state| matrix_is_finite(&state.deformation_gradient))
    }

    /// Finite state and, for elastic particles, a finite `det F`.
    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.is_finite() && self.jacobian().is_none_or(Real::is_finite)
    }

    /// Flags the particle when its state is invalid or its position has no
    /// grid cell.
    #[inline(always)]
    pub fn update_health(&mut self, domain: &SimulationDomain) {
        self.failed = !self.is_valid() || domain.cell_of(self.position).is_none();
    }

    /// Puts a failed particle back into a usable state: position clamped into
    /// the domain (non-finite components to the centre), at rest, undeformed.
    pub fn recover(&mut self, domain: &SimulationDomain) {
        self.position = domain.clamp_position(self.position);
        self.velocity = zero_vector();
        self.affine_momentum_matrix = zero_matrix();
        if let Some(state) = self.elastic.as_mut() {
            state.deformation_gradient = identity_matrix();
        }
        self.failed = false;
    }
}
