pub mod domain;
pub mod grid;
pub mod kernel;
pub mod mpm_state;
pub mod particle;
pub mod particle_set;
pub mod prefix_sum;
pub mod sort;

pub use domain::SimulationDomain;
pub use grid::{BoundaryHandling, Grid, GridNode, apply_boundary_conditions};
pub use kernel::{GridInterpolation, KERNEL_SIZE, NEIGHBOR_COUNT, NEIGHBOR_OFFSETS, inv_d};
pub use mpm_state::{MpmState, StepReport};
pub use particle::{ElasticState, Particle};
pub use particle_set::{ParticleBuffers, seed_particles, seeded_particle_count};
pub use prefix_sum::exclusive_prefix_sum;
pub use sort::{CellRange, GridSort, INVALID_CELL, SortStats};
