//! Sort and transfer properties checked through the public API.

use bevy::math::Vec3;
use mpm3d::core::{GridSort, SimulationDomain, seed_particles};
use mpm3d::{MpmState, Particle, Quality, SolverParams};
use rand::Rng;

fn random_particles_inside(domain: &SimulationDomain, count: usize, max_speed: f32) -> Vec<Particle> {
    let mut rng = rand::rng();
    let margin = Vec3::splat(domain.spacing());
    let (min, max) = (domain.min() + margin, domain.max() - margin);
    (0..count)
        .map(|id| {
            let position = Vec3::new(
                rng.random_range(min.x..max.x),
                rng.random_range(min.y..max.y),
                rng.random_range(min.z..max.z),
            );
            let velocity = Vec3::new(
                rng.random_range(-max_speed..max_speed),
                rng.random_range(-max_speed..max_speed),
                rng.random_range(-max_speed..max_speed),
            );
            Particle::new(id as u32, position, rng.random_range(0.5..2.0)).with_velocity(velocity)
        })
        .collect()
}

/// The sorted buffer holds every particle exactly once and every cell range
/// only holds particles of that cell.
#[test]
fn test_sort_is_a_permutation_grouped_by_cell() {
    let params = SolverParams::fluid().with_quality(Quality::Low);
    let domain = SimulationDomain::from_params(&params).unwrap();
    let src = random_particles_inside(&domain, 5000, 1.0);
    let mut dst = src.clone();
    let mut sort = GridSort::new(src.len(), domain.cell_count()).unwrap();

    let stats = sort.sort(&domain, &src, &mut dst);
    assert_eq!(stats.sorted as usize, src.len());
    assert_eq!(stats.dropped, 0);

    let mut ids: Vec<u32> = dst.iter().map(|p| p.id).collect();
    ids.sort_unstable();
    assert!(
        ids.iter().enumerate().all(|(i, &id)| id == i as u32),
        "Sorted output must contain every particle exactly once"
    );

    for (cell, range) in sort.ranges().iter().enumerate() {
        let coord = domain.coord_of(cell);
        for particle in &dst[range.range()] {
            let owner = domain.cell_of(particle.position).unwrap();
            assert_eq!(owner, coord, "Particle {} is in the wrong cell run", particle.id);
            // The whole 3x3x3 node block around the owner cell lies within
            // 1.5 spacings of the particle on every axis.
            let offset = (domain.node_position(coord) - particle.position).abs();
            assert!(offset.max_element() <= 0.5 * domain.spacing() + 1e-5);
        }
    }
}

#[test]
fn test_sort_is_stable_for_repeated_runs() {
    let params = SolverParams::fluid().with_quality(Quality::Medium);
    let domain = SimulationDomain::from_params(&params).unwrap();
    let src = seed_particles(&params, &domain).unwrap();
    let mut first = src.clone();
    let mut second = src.clone();
    let mut sort = GridSort::new(src.len(), domain.cell_count()).unwrap();

    sort.sort(&domain, &src, &mut first);
    let ranges = sort.ranges().to_vec();
    sort.sort(&domain, &src, &mut second);

    // Slot order inside a cell may differ, the cell runs may not.
    assert_eq!(ranges, sort.ranges());
}

#[test]
fn test_grid_mass_matches_particle_mass() {
    let params = SolverParams::fluid()
        .with_quality(Quality::Low)
        .with_gravity(Vec3::ZERO);
    let domain = SimulationDomain::from_params(&params).unwrap();
    let particles = random_particles_inside(&domain, 4000, 2.0);
    let mut state = MpmState::from_particles(params, particles).unwrap();

    let report = state.step();
    assert_eq!(report.dropped, 0);

    let particle_mass = state.total_particle_mass();
    let grid_mass = state.total_grid_mass();
    assert!(
        ((grid_mass - particle_mass) / particle_mass).abs() < 1e-4,
        "Grid mass {grid_mass} should equal particle mass {particle_mass}"
    );
}

#[test]
fn test_seeded_fluid_mass_is_conserved_every_step() {
    let mut state = MpmState::new(SolverParams::fluid().with_quality(Quality::Low)).unwrap();
    let particle_mass = state.total_particle_mass();
    for _ in 0..10 {
        state.step();
        let grid_mass = state.total_grid_mass();
        assert!(((grid_mass - particle_mass) / particle_mass).abs() < 1e-4);
    }
}

#[test]
fn test_uniform_motion_is_transferred_exactly() {
    let velocity = Vec3::new(0.3, -0.2, 0.1);
    let params = SolverParams::fluid()
        .with_quality(Quality::Low)
        .with_gravity(Vec3::ZERO)
        .with_seed_region(Vec3::new(-2.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
    let mut state = MpmState::new(params).unwrap();
    for particle in state.particles_mut() {
        particle.velocity = velocity;
    }

    state.step();
    for particle in state.particles() {
        assert!(
            (particle.velocity - velocity).abs().max_element() < 1e-3,
            "Particle {} velocity drifted to {:?}",
            particle.id,
            particle.velocity
        );
    }
}

/// Particles anywhere inside the box, including the outermost half cell,
/// hand their whole mass to the grid.
#[test]
fn test_grid_mass_matches_particle_mass_up_to_the_walls() {
    let params = SolverParams::fluid()
        .with_quality(Quality::Low)
        .with_domain_extent(Vec3::splat(4.0))
        .with_gravity(Vec3::ZERO);
    let domain = SimulationDomain::from_params(&params).unwrap();
    let h = domain.spacing();
    let (min, max) = (domain.min(), domain.max());
    let positions = [
        min + Vec3::splat(0.1 * h),
        max - Vec3::splat(0.1 * h),
        Vec3::new(min.x + 0.05 * h, 0.0, max.z - 0.3 * h),
        Vec3::new(0.2, min.y + 0.01 * h, 0.1),
    ];
    let particles = positions
        .iter()
        .enumerate()
        .map(|(id, &position)| Particle::new(id as u32, position, 1.0))
        .collect();
    let mut state = MpmState::from_particles(params, particles).unwrap();

    let report = state.step();
    assert_eq!(report.dropped, 0);
    assert!(
        (state.total_grid_mass() - 4.0).abs() < 1e-4,
        "Grid mass {} should equal particle mass 4",
        state.total_grid_mass()
    );
}
