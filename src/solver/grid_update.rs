use rayon::prelude::*;

use crate::config::SolverParams;
use crate::core::{Grid, apply_boundary_conditions};

use super::interaction::PointerForce;

/// Grid update stage: gravity, pointer impulse and wall conditions on every
/// node that received mass. Massless nodes are left untouched.
pub fn update_grid_velocities(grid: &mut Grid, params: &SolverParams, pointer: &PointerForce) {
    let domain = *grid.domain();
    let dims = domain.dims();
    let gravity_step = params.gravity * params.dt;
    let pointer_active = pointer.is_active();

    grid.nodes_mut()
        .par_iter_mut()
        .enumerate()
        .filter(|(_, node)| node.has_mass())
        .for_each(|(index, node)| {
            let coord = domain.coord_of(index);
            node.velocity += gravity_step;
            if pointer_active {
                node.velocity += pointer.force_at(domain.node_position(coord));
            }
            apply_boundary_conditions(
                &mut node.velocity,
                coord,
                dims,
                params.boundary_margin,
                params.boundary,
            );
        });
}
