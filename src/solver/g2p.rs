//! Grid-to-Particle (G2P) transfer operations
//!
//! Gathers velocities and velocity gradients from grid nodes back to particles,
//! advances deformation, advects, and recovers particles that blew up or left
//! the grid.

use rayon::prelude::*;

use crate::core::kernel::{GridInterpolation, inv_d};
use crate::core::{Grid, Particle, SimulationDomain};
use crate::math::{Real, identity_matrix, outer_product, zero_matrix, zero_vector};

/// Velocity and affine matrix from the grid; `F ← (I + dt C) F` for elastic
/// particles. The previous particle velocity is discarded.
///
/// Only meant for particles that took part in the transfers, i.e. the sorted
/// prefix of the buffer.
pub fn grid_to_particle(particles: &mut [Particle], grid: &Grid, dt: Real) {
    let domain = grid.domain();
    let inv_d = inv_d(domain.spacing());

    particles.par_iter_mut().for_each(|particle| {
        let interpolation = GridInterpolation::compute_for_particle(particle.position, domain);
        let mut velocity = zero_vector();
        let mut velocity_gradient = zero_matrix();

        for (coord, weight, cell_distance) in interpolation.iter_neighbors() {
            let weighted_velocity = grid.node_clamped(coord).velocity * weight;
            velocity += weighted_velocity;
            velocity_gradient += outer_product(weighted_velocity, cell_distance);
        }

        particle.velocity = velocity;
        particle.affine_momentum_matrix = velocity_gradient * inv_d;

        if let Some(state) = particle.elastic.as_mut() {
            let deformation_update = identity_matrix() + particle.affine_momentum_matrix * dt;
            state.deformation_gradient = deformation_update * state.deformation_gradient;
        }
    });
}

/// `x += dt v`. No clamping: walls act through the grid velocities.
pub fn advect_particles(particles: &mut [Particle], dt: Real) {
    particles.par_iter_mut().for_each(|particle| {
        particle.position += particle.velocity * dt;
    });
}

/// Flags particles with invalid state or without a grid cell and puts them
/// back into the box at rest. Returns how many were recovered.
pub fn recover_failed_particles(particles: &mut [Particle], domain: &SimulationDomain) -> usize {
    particles
        .par_iter_mut()
        .map(|particle| {
            particle.update_health(domain);
            if particle.failed {
                particle.recover(domain);
                1
            } else {
                0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ElasticState, GridNode};
    use bevy::math::{Mat3, Vec3};

    /// Grid whose node velocities follow `v(x) = a + B x`.
    fn linear_field_grid(a: Vec3, b: Mat3) -> Grid {
        let domain = SimulationDomain::new(0.25, Vec3::splat(2.0)).unwrap();
        let mut grid = Grid::new(domain).unwrap();
        for (index, node) in grid.nodes_mut().iter_mut().enumerate() {
            let position = domain.node_position(domain.coord_of(index));
            *node = GridNode {
                velocity: a + b * position,
                mass: 1.0,
            };
        }
        grid
    }

    #[test]
    fn linear_velocity_field_is_reproduced() {
        let a = Vec3::new(0.5, -1.0, 0.2);
        let b = Mat3::from_cols(
            Vec3::new(0.1, 0.0, 0.3),
            Vec3::new(-0.2, 0.4, 0.0),
            Vec3::new(0.0, 0.1, -0.5),
        );
        let grid = linear_field_grid(a, b);
        let position = Vec3::new(0.13, -0.31, 0.42);
        let mut particles = vec![Particle::new(0, position, 1.0)];

        grid_to_particle(&mut particles, &grid, 0.01);
        let particle = &particles[0];
        assert!((particle.velocity - (a + b * position)).abs().max_element() < 1e-4);
        assert!(particle.affine_momentum_matrix.abs_diff_eq(b, 1e-3));
    }

    #[test]
    fn deformation_gradient_follows_velocity_gradient() {
        let b = Mat3::from_diagonal(Vec3::new(1.0, 0.0, 0.0));
        let grid = linear_field_grid(Vec3::ZERO, b);
        let mut particles =
            vec![Particle::new(0, Vec3::new(0.1, 0.0, 0.0), 1.0).with_elastic(ElasticState::new(0.1))];

        grid_to_particle(&mut particles, &grid, 0.1);
        let jacobian = particles[0].jacobian().unwrap();
        assert!((jacobian - 1.1).abs() < 1e-3);
    }

    #[test]
    fn advection_moves_by_velocity() {
        let mut particles = vec![Particle::new(0, Vec3::ZERO, 1.0).with_velocity(Vec3::new(1.0, 2.0, 3.0))];
        advect_particles(&mut particles, 0.5);
        assert_eq!(particles[0].position, Vec3::new(0.5, 1.0, 1.5));
    }

    #[test]
    fn recovery_counts_and_resets_failed_particles() {
        let domain = SimulationDomain::new(0.5, Vec3::splat(2.0)).unwrap();
        let mut particles = vec![
            Particle::new(0, Vec3::ZERO, 1.0),
            Particle::new(1, Vec3::new(Real::NAN, 0.0, 0.0), 1.0),
            Particle::new(2, Vec3::ZERO, 1.0).with_velocity(Vec3::splat(Real::INFINITY)),
        ];
        assert_eq!(recover_failed_particles(&mut particles, &domain), 2);
        assert!(particles.iter().all(|p| p.is_finite() && !p.failed));
    }

    #[test]
    fn recovery_brings_escaped_particles_back() {
        let domain = SimulationDomain::new(0.5, Vec3::splat(2.0)).unwrap();
        let mut particles = vec![
            Particle::new(0, Vec3::new(0.2, -0.3, 0.1), 1.0).with_velocity(Vec3::X),
            Particle::new(1, Vec3::new(0.0, -1.7, 0.0), 1.0).with_velocity(Vec3::NEG_Y * 50.0),
        ];
        assert_eq!(recover_failed_particles(&mut particles, &domain), 1);
        assert_eq!(particles[0].velocity, Vec3::X);
        assert!(domain.cell_of(particles[1].position).is_some());
        assert_eq!(particles[1].velocity, Vec3::ZERO);
    }

    #[test]
    fn wall_particle_reads_ghost_nodes_from_outer_layer() {
        let velocity = Vec3::new(0.3, 0.0, -0.1);
        let domain = SimulationDomain::new(0.25, Vec3::splat(2.0)).unwrap();
        let mut grid = Grid::new(domain).unwrap();
        for node in grid.nodes_mut() {
            *node = GridNode { velocity, mass: 1.0 };
        }
        let mut particles = vec![Particle::new(0, domain.min() + Vec3::splat(0.02), 1.0)];

        grid_to_particle(&mut particles, &grid, 0.01);
        assert!((particles[0].velocity - velocity).abs().max_element() < 1e-5);
        assert!(particles[0].affine_momentum_matrix.abs_diff_eq(Mat3::ZERO, 1e-4));
    }
}
