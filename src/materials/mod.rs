//! Materials for MPM simulation
//!
//! Two families:
//!
//! * `fluid` - weakly-compressible liquid (EOS pressure + viscosity)
//! * `elastic` - hyperelastic solids driven by the deformation gradient

pub mod elastic;
pub mod families;
pub mod fluid;
pub mod material_types;
pub mod utils;

pub use families::{ElasticModel, ElasticParams, FluidParams};
pub use material_types::MaterialModel;

pub use utils::check;
pub use utils::physics;
