//! Configuration and parameters
//!
//! Constants, quality presets and solver settings.

pub mod constants;
pub mod quality;
pub mod solver_params;

pub use constants::*;
pub use quality::Quality;
pub use solver_params::*;
