//! Per-step solver stages. Each stage is a plain function over the state it
//! reads and writes; [`MpmState::step`](crate::MpmState::step) runs them in order.

pub mod g2p;
pub mod grid_update;
pub mod interaction;
pub mod p2g;
pub mod render;

pub use g2p::{advect_particles, grid_to_particle, recover_failed_particles};
pub use grid_update::update_grid_velocities;
pub use interaction::{PointerForce, PointerInput, PointerTracker, cursor_plane_from_screen};
pub use p2g::{
    apply_stress_forces, compute_stress_forces, initialize_rest_volumes, particle_density,
    transfer_mass_momentum,
};
pub use render::RenderBuffer;
