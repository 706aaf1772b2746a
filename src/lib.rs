//! Real-time 3D MLS-MPM solver for weakly-compressible fluids and elastic
//! solids, packaged as a bevy plugin.
//!
//! Each step sorts particles by grid cell, transfers mass, momentum and stress
//! to a dense grid, applies gravity, the pointer force and wall conditions on
//! the grid, then gathers velocities back and advects the particles.

use bevy::prelude::*;

pub mod config;
pub mod core;
pub mod error;
pub mod materials;
pub mod math;
pub mod solver;

pub use crate::config::{InteractionParams, Quality, SolverParams};
pub use crate::core::{
    BoundaryHandling, ElasticState, Grid, GridNode, GridSort, MpmState, Particle,
    SimulationDomain, StepReport,
};
pub use error::MpmError;
pub use materials::{ElasticModel, ElasticParams, FluidParams, MaterialModel};
pub use solver::{PointerForce, PointerInput, PointerTracker, RenderBuffer, cursor_plane_from_screen};

/// Set `params` to rebuild the solver on the next frame.
#[derive(Resource, Clone, Debug, Default)]
pub struct RestartRequest {
    pub params: Option<SolverParams>,
}

impl RestartRequest {
    pub fn restart(&mut self, params: SolverParams) {
        self.params = Some(params);
    }
}

#[derive(Default)]
pub struct MpmPlugin {
    pub params: SolverParams,
}

impl MpmPlugin {
    pub fn new(params: SolverParams) -> Self {
        Self { params }
    }
}

impl Plugin for MpmPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.params.clone())
            .init_resource::<RestartRequest>()
            .init_resource::<PointerInput>()
            .init_resource::<PointerTracker>();

        match MpmState::new(self.params.clone()) {
            Ok(state) => {
                app.insert_resource(state);
            }
            Err(err) => error!("mpm: cannot build solver state: {err}"),
        }

        app.add_systems(
            Update,
            (apply_restart_requests, update_pointer_force, step_simulation).chain(),
        );
    }
}

/// Swaps in a freshly built state when a restart was requested. A failed
/// rebuild keeps the running simulation.
pub fn apply_restart_requests(
    mut commands: Commands,
    mut request: ResMut<RestartRequest>,
    mut params: ResMut<SolverParams>,
    mut tracker: ResMut<PointerTracker>,
    state: Option<ResMut<MpmState>>,
) {
    let Some(requested) = request.params.take() else {
        return;
    };

    let result = match state {
        Some(mut state) => state.reinitialize(requested.clone()),
        None => MpmState::new(requested.clone()).map(|state| {
            commands.insert_resource(state);
        }),
    };

    match result {
        Ok(()) => {
            info!("mpm: restarted ({})", requested.quality.name());
            *params = requested;
            tracker.reset();
        }
        Err(err) => error!("mpm: restart rejected: {err}"),
    }
}

/// Cursor motion since the previous frame, measured over one solver step.
pub fn update_pointer_force(
    input: Res<PointerInput>,
    mut tracker: ResMut<PointerTracker>,
    state: Option<ResMut<MpmState>>,
) {
    let Some(mut state) = state else {
        return;
    };
    let params = state.params();
    let force = tracker.sample(&input, params.dt, &params.interaction);
    state.set_pointer_force(force);
}

pub fn step_simulation(state: Option<ResMut<MpmState>>) {
    if let Some(mut state) = state {
        state.step();
    }
}
