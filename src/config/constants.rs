// Physical constants and defaults for MPM simulation
use bevy::math::Vec3;

// Global physics
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.8, 0.0);

// Particle seeding
pub const PARTICLE_MASS: f32 = 1.0;
pub const PARTICLES_PER_AXIS_PER_CELL: u32 = 2;

// Equation of state parameters
pub const EOS_STIFFNESS: f32 = 10.0;
pub const EOS_POWER: f32 = 4.0;
pub const DYNAMIC_VISCOSITY: f32 = 0.1;

// Elastic material constants
pub const ELASTIC_LAMBDA: f32 = 10.0;
pub const ELASTIC_MU: f32 = 20.0;

// Fixed step sizes; the elastic model needs the smaller step for a stable
// deformation gradient integration
pub const FLUID_DT: f32 = 1.0 / 60.0;
pub const ELASTIC_DT: f32 = 1.0 / 250.0;

// Interactive force
pub const POINTER_FORCE: f32 = 1.32;
pub const POINTER_FORCE_RANGE: f32 = 2.25;

// Grid walls
pub const BOUNDARY_MARGIN: u32 = 2;

// Rendering hint
pub const POINT_SIZE_FACTOR: f32 = 0.8;
