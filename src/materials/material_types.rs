//! Material types for simulation

use crate::core::Particle;
use crate::error::MpmError;
use crate::materials::families::{ElasticParams, FluidParams};
use crate::materials::{elastic, fluid, utils};
use crate::math::{Matrix, Real, zero_matrix};

/// Constitutive model shared by every particle of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialModel {
    Fluid(FluidParams),
    Elastic(ElasticParams),
}

impl MaterialModel {
    pub fn water() -> Self {
        Self::Fluid(FluidParams::water())
    }

    pub fn jelly() -> Self {
        Self::Elastic(ElasticParams::jelly())
    }

    pub fn is_elastic(&self) -> bool {
        matches!(self, Self::Elastic(_))
    }

    pub fn material_name(&self) -> &'static str {
        match self {
            Self::Fluid(fluid) => fluid.name,
            Self::Elastic(elastic) => elastic.name,
        }
    }

    pub fn validate(&self) -> Result<(), MpmError> {
        match self {
            Self::Fluid(fluid) => fluid.validate(),
            Self::Elastic(elastic) => elastic.validate(),
        }
    }

    /// Volume and stress used to scatter a particle's internal force.
    ///
    /// Fluids return their current volume (mass over the grid-estimated
    /// density) with the Cauchy stress; solids return their rest volume with
    /// the Kirchhoff stress, which is the same product `V σ`.
    pub fn particle_stress(
        &self,
        particle: &Particle,
        density: Real,
        rest_density: Real,
    ) -> (Real, Matrix) {
        match self {
            Self::Fluid(params) => {
                let volume = particle.mass * utils::inv_exact(density);
                let stress = fluid::calculate_stress(
                    &particle.affine_momentum_matrix,
                    density,
                    rest_density,
                    params,
                );
                (volume, stress)
            }
            Self::Elastic(params) => match &particle.elastic {
                Some(state) => (
                    state.rest_volume,
                    elastic::kirchhoff_stress(&state.deformation_gradient, params),
                ),
                None => (0.0, zero_matrix()),
            },
        }
    }
}

impl Default for MaterialModel {
    fn default() -> Self {
        Self::water()
    }
}
