use bevy::prelude::*;

use crate::config::constants;
use crate::config::Quality;
use crate::core::BoundaryHandling;
use crate::error::MpmError;
use crate::materials::{ElasticParams, FluidParams, MaterialModel};
use crate::math::{Real, Vector};

/// How cursor motion is turned into a force on the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionParams {
    /// Multiplier from cursor velocity to grid velocity change.
    pub force_scale: Real,
    /// Distance from the pointer ray beyond which the force vanishes.
    pub force_range: Real,
}

impl Default for InteractionParams {
    fn default() -> Self {
        Self {
            force_scale: constants::POINTER_FORCE,
            force_range: constants::POINTER_FORCE_RANGE,
        }
    }
}

/// Solver parameters for controlling MPM simulation behavior.
///
/// Passed explicitly to every stage; changing anything that affects the grid
/// or the seeded particles requires [`MpmState::reinitialize`](crate::MpmState::reinitialize).
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct SolverParams {
    /// Resolution preset, selects the grid spacing.
    pub quality: Quality,
    /// Requested world-space size of the simulated box, centred on the origin.
    /// The actual box is rounded up to a whole number of cells.
    pub domain_extent: Vector,
    /// Lower corner of the region filled with particles at start.
    pub seed_min: Vector,
    /// Upper corner of the region filled with particles at start.
    pub seed_max: Vector,
    /// Particles per cell along each axis (2 gives 8 particles per cell).
    pub particles_per_axis: u32,
    pub particle_mass: Real,
    /// Random offset applied to seeded positions, as a fraction of the
    /// sub-cell slot. Zero seeds an exact lattice.
    pub seed_jitter: Real,
    pub gravity: Vector,
    /// Fixed step size.
    pub dt: Real,
    pub material: MaterialModel,
    pub interaction: InteractionParams,
    pub boundary: BoundaryHandling,
    /// Number of node layers along each wall where the boundary condition applies.
    pub boundary_margin: u32,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self::fluid()
    }
}

impl SolverParams {
    /// Weakly-compressible fluid: a block of liquid on one side of the box.
    pub fn fluid() -> Self {
        Self {
            quality: Quality::Medium,
            domain_extent: Vec3::new(12.0, 8.0, 8.0),
            seed_min: Vec3::new(-5.6, -3.6, -3.6),
            seed_max: Vec3::new(-1.2, 2.0, 3.6),
            particles_per_axis: constants::PARTICLES_PER_AXIS_PER_CELL,
            particle_mass: constants::PARTICLE_MASS,
            seed_jitter: 0.0,
            gravity: constants::GRAVITY,
            dt: constants::FLUID_DT,
            material: MaterialModel::Fluid(FluidParams::default()),
            interaction: InteractionParams::default(),
            boundary: BoundaryHandling::Slip,
            boundary_margin: constants::BOUNDARY_MARGIN,
        }
    }

    /// Elastic solid: a cube dropped in the middle of the box.
    pub fn elastic() -> Self {
        Self {
            domain_extent: Vec3::new(6.0, 6.0, 6.0),
            seed_min: Vec3::new(-1.0, -0.4, -1.0),
            seed_max: Vec3::new(1.0, 1.6, 1.0),
            dt: constants::ELASTIC_DT,
            material: MaterialModel::Elastic(ElasticParams::default()),
            ..Self::fluid()
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_domain_extent(mut self, extent: Vector) -> Self {
        self.domain_extent = extent;
        self
    }

    pub fn with_seed_region(mut self, min: Vector, max: Vector) -> Self {
        self.seed_min = min;
        self.seed_max = max;
        self
    }

    pub fn with_gravity(mut self, gravity: Vector) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_dt(mut self, dt: Real) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_particle_mass(mut self, mass: Real) -> Self {
        self.particle_mass = mass;
        self
    }

    pub fn with_material(mut self, material: MaterialModel) -> Self {
        self.material = material;
        self
    }

    pub fn with_interaction(mut self, interaction: InteractionParams) -> Self {
        self.interaction = interaction;
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryHandling) -> Self {
        self.boundary = boundary;
        self
    }

    /// Set seed jitter (0.0 to 1.0)
    pub fn with_seed_jitter(mut self, jitter: Real) -> Self {
        self.seed_jitter = jitter.clamp(0.0, 1.0);
        self
    }

    pub fn grid_spacing(&self) -> Real {
        self.quality.grid_spacing()
    }

    pub fn particles_per_cell(&self) -> u32 {
        self.particles_per_axis.pow(3)
    }

    /// Density of a region filled at the seeding lattice density.
    pub fn rest_density(&self) -> Real {
        self.particles_per_cell() as Real * self.particle_mass / self.grid_spacing().powi(3)
    }

    /// Reject configurations that would lead to a degenerate grid or a
    /// meaningless material before anything gets allocated.
    pub fn validate(&self) -> Result<(), MpmError> {
        let spacing = self.grid_spacing();
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(MpmError::InvalidGridSpacing(spacing));
        }
        if !self.domain_extent.is_finite() || self.domain_extent.min_element() <= 0.0 {
            return Err(MpmError::InvalidDomainExtent(self.domain_extent));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(MpmError::InvalidTimeStep(self.dt));
        }
        if !(self.particle_mass.is_finite() && self.particle_mass > 0.0) {
            return Err(MpmError::InvalidParticleMass(self.particle_mass));
        }
        if self.particles_per_axis == 0
            || !self.seed_min.is_finite()
            || !self.seed_max.is_finite()
            || self.seed_max.cmple(self.seed_min).any()
        {
            return Err(MpmError::EmptySeedRegion {
                min: self.seed_min,
                max: self.seed_max,
            });
        }
        if !self.gravity.is_finite() {
            return Err(MpmError::InvalidMaterial {
                name: "gravity",
                value: self.gravity.length(),
            });
        }
        self.material.validate()
    }
}
