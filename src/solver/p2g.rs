//! Particle-to-Grid (P2G) transfer operations
//!
//! Three passes separated by full barriers:
//! 1. every node gathers mass and APIC momentum from the particles of the
//!    27 surrounding cells, found through the sort index;
//! 2. every particle reads its density back from the grid and stores
//!    `-dt * V * invD * stress`;
//! 3. every node gathers those stress terms and turns momentum into velocity.
//!
//! Passes 1 and 3 write each node from exactly one work item, so no atomics
//! are needed on the grid.
//!
//! Stencils of particles in the outer cells reach one node past the walls.
//! Those ghost nodes alias onto the outer layer: the outer node gathers their
//! weight too, and the particle-side passes read them through
//! [`Grid::node_clamped`]. Every particle therefore hands out its full mass.

use rayon::prelude::*;

use crate::config::SolverParams;
use crate::core::kernel::{GridInterpolation, NEIGHBOR_COUNT, NEIGHBOR_OFFSETS, inv_d, node_weight};
use crate::core::{Grid, GridNode, GridSort, Particle, SimulationDomain};
use crate::materials::utils;
use crate::math::{Coord, Matrix, Real, Vector, matrix_is_finite, zero_matrix, zero_vector};

/// Calls `f` for every sorted particle living in the 3x3x3 block of cells
/// around `coord`.
#[inline(always)]
fn for_each_nearby_particle(
    domain: &SimulationDomain,
    sort: &GridSort,
    coord: Coord,
    mut f: impl FnMut(usize),
) {
    for offset in NEIGHBOR_OFFSETS {
        let cell = coord + offset;
        if !domain.contains_coord(cell) {
            continue;
        }
        let range = sort.cell_range(domain.linear_index(cell));
        for slot in range.range() {
            f(slot);
        }
    }
}

/// World positions of `coord` and of the ghost nodes that alias onto it.
/// Interior nodes have a single entry.
#[inline(always)]
fn aliased_node_positions(
    domain: &SimulationDomain,
    coord: Coord,
) -> ([Vector; NEIGHBOR_COUNT], usize) {
    let last = domain.dims().as_ivec3() - 1;
    let mut candidates = [[0i32; 3]; 3];
    let mut lens = [0usize; 3];
    for axis in 0..3 {
        let c = coord[axis];
        let axis_candidates = &mut candidates[axis];
        axis_candidates[0] = c;
        lens[axis] = 1;
        if c == 0 {
            axis_candidates[lens[axis]] = -1;
            lens[axis] += 1;
        }
        if c == last[axis] {
            axis_candidates[lens[axis]] = c + 1;
            lens[axis] += 1;
        }
    }

    let mut positions = [zero_vector(); NEIGHBOR_COUNT];
    let mut count = 0;
    for &z in &candidates[2][..lens[2]] {
        for &y in &candidates[1][..lens[1]] {
            for &x in &candidates[0][..lens[0]] {
                positions[count] = domain.node_position(Coord::new(x, y, z));
                count += 1;
            }
        }
    }
    (positions, count)
}

/// Pass 1: node mass and momentum.
pub fn transfer_mass_momentum(grid: &mut Grid, particles: &[Particle], sort: &GridSort) {
    let domain = *grid.domain();
    let inv_spacing = domain.inv_spacing();

    grid.nodes_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(index, node)| {
            let coord = domain.coord_of(index);
            let (positions, count) = aliased_node_positions(&domain, coord);
            let node_positions = &positions[..count];
            let mut mass = 0.0;
            let mut momentum = zero_vector();

            for_each_nearby_particle(&domain, sort, coord, |slot| {
                let particle = &particles[slot];
                for &node_position in node_positions {
                    let distance = node_position - particle.position;
                    let weight = node_weight(distance * inv_spacing);
                    if weight > 0.0 {
                        let mass_contribution = weight * particle.mass;
                        mass += mass_contribution;
                        momentum += mass_contribution
                            * (particle.velocity + particle.affine_momentum_matrix * distance);
                    }
                }
            });

            *node = GridNode {
                velocity: momentum,
                mass,
            };
        });
}

/// Grid mass density at a particle, `Σ w m_i / h³`.
#[inline]
pub fn particle_density(particle: &Particle, grid: &Grid) -> Real {
    let domain = grid.domain();
    let interpolation = GridInterpolation::compute_for_particle(particle.position, domain);
    let mass: Real = interpolation
        .iter_neighbors()
        .map(|(coord, weight, _)| grid.node_clamped(coord).mass * weight)
        .sum();
    mass * domain.inv_spacing().powi(3)
}

/// Pass 2: per-particle stress term. Particles outside the sorted range get a
/// zero term, and so does any term that overflowed.
pub fn compute_stress_forces(
    stress_forces: &mut [Matrix],
    particles: &[Particle],
    grid: &Grid,
    sorted_len: usize,
    params: &SolverParams,
) {
    let scale = -params.dt * inv_d(grid.domain().spacing());
    let rest_density = params.rest_density();
    let material = &params.material;

    stress_forces
        .par_iter_mut()
        .zip(particles.par_iter())
        .enumerate()
        .for_each(|(slot, (stress_force, particle))| {
            *stress_force = if slot < sorted_len {
                let density = particle_density(particle, grid);
                let (volume, stress) = material.particle_stress(particle, density, rest_density);
                let stress_force = stress * (scale * volume);
                if matrix_is_finite(&stress_force) {
                    stress_force
                } else {
                    zero_matrix()
                }
            } else {
                zero_matrix()
            };
        });
}

/// Pass 3: stress forces onto nodes, then momentum to velocity. Massless nodes
/// end with zero velocity.
pub fn apply_stress_forces(
    grid: &mut Grid,
    particles: &[Particle],
    stress_forces: &[Matrix],
    sort: &GridSort,
) {
    let domain = *grid.domain();
    let inv_spacing = domain.inv_spacing();

    grid.nodes_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(index, node)| {
            if !node.has_mass() {
                node.velocity = zero_vector();
                return;
            }
            let coord = domain.coord_of(index);
            let (positions, count) = aliased_node_positions(&domain, coord);
            let node_positions = &positions[..count];
            let mut force: Vector = zero_vector();

            for_each_nearby_particle(&domain, sort, coord, |slot| {
                for &node_position in node_positions {
                    let distance = node_position - particles[slot].position;
                    let weight = node_weight(distance * inv_spacing);
                    if weight > 0.0 {
                        force += stress_forces[slot] * distance * weight;
                    }
                }
            });

            node.velocity = (node.velocity + force) * utils::inv_exact(node.mass);
        });
}

/// One-time pass after seeding: elastic rest volumes from the first grid
/// mass accumulation. Particles that see no grid mass get `fallback_volume`.
pub fn initialize_rest_volumes(particles: &mut [Particle], grid: &Grid, fallback_volume: Real) {
    particles.par_iter_mut().for_each(|particle| {
        let density = particle_density(particle, grid);
        let rest_volume = if density > 0.0 {
            particle.mass / density
        } else {
            fallback_volume
        };
        if let Some(state) = particle.elastic.as_mut() {
            state.rest_volume = rest_volume;
        }
    });
}
