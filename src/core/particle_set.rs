//! Particle storage and initial seeding.

use rand::Rng;

use crate::config::SolverParams;
use crate::error::MpmError;
use crate::math::{Real, Vector};

use super::domain::SimulationDomain;
use super::particle::{ElasticState, Particle};

/// Two particle buffers of equal length. One holds the live particles, the
/// other receives them when they are sorted; [`swap`](Self::swap) flips roles.
pub struct ParticleBuffers {
    slots: [Vec<Particle>; 2],
    current: usize,
}

impl ParticleBuffers {
    pub fn new(particles: Vec<Particle>) -> Result<Self, MpmError> {
        let len = particles.len();
        let mut scratch = Vec::new();
        scratch
            .try_reserve_exact(len)
            .map_err(|_| MpmError::Allocation {
                what: "particle scratch buffer",
                len,
            })?;
        scratch.extend_from_slice(&particles);
        Ok(Self {
            slots: [particles, scratch],
            current: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.slots[self.current].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn particles(&self) -> &[Particle] {
        &self.slots[self.current]
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.slots[self.current]
    }

    /// Live buffer and the other one, for sorting from one into the other.
    pub fn split(&mut self) -> (&[Particle], &mut [Particle]) {
        let [first, second] = &mut self.slots;
        if self.current == 0 {
            (first, second)
        } else {
            (second, first)
        }
    }

    pub fn swap(&mut self) {
        self.current = 1 - self.current;
    }
}

/// Slack for seed corners that land on a cell boundary up to rounding.
const LATTICE_EPS: Real = 1e-4;

/// Region actually filled with particles: the lower corner snapped up to a
/// cell boundary, both corners clipped to the domain.
fn seed_lattice(params: &SolverParams, domain: &SimulationDomain) -> (Vector, [u32; 3]) {
    let spacing = domain.spacing();
    let grid_min = domain.min();
    let snapped = ((params.seed_min - grid_min) / spacing - LATTICE_EPS).ceil();
    let lower = (grid_min + snapped * spacing).max(grid_min);
    let upper = params.seed_max.min(domain.max());

    let cells = ((upper - lower) / spacing + LATTICE_EPS).floor().max(Vector::ZERO);
    let per_axis = params.particles_per_axis;
    (
        lower,
        [
            cells.x as u32 * per_axis,
            cells.y as u32 * per_axis,
            cells.z as u32 * per_axis,
        ],
    )
}

/// Number of particles [`seed_particles`] would create.
pub fn seeded_particle_count(params: &SolverParams, domain: &SimulationDomain) -> u64 {
    let (_, counts) = seed_lattice(params, domain);
    counts.iter().map(|&c| c as u64).product()
}

/// Fills the seed region with `particles_per_axis³` particles per cell on a
/// regular sub-cell lattice, optionally jittered.
pub fn seed_particles(
    params: &SolverParams,
    domain: &SimulationDomain,
) -> Result<Vec<Particle>, MpmError> {
    let (lower, counts) = seed_lattice(params, domain);
    let total = seeded_particle_count(params, domain);
    if total == 0 {
        return Err(MpmError::EmptySeedRegion {
            min: params.seed_min,
            max: params.seed_max,
        });
    }
    let total = usize::try_from(total)
        .ok()
        .filter(|&n| n < u32::MAX as usize)
        .ok_or(MpmError::Allocation {
            what: "particles",
            len: usize::MAX,
        })?;

    let slot = domain.spacing() / params.particles_per_axis as Real;
    let jitter = params.seed_jitter.clamp(0.0, 1.0) * slot;
    let mut rng = rand::rng();
    let elastic = params.material.is_elastic();

    let mut particles = Vec::new();
    particles
        .try_reserve_exact(total)
        .map_err(|_| MpmError::Allocation {
            what: "particles",
            len: total,
        })?;

    for z in 0..counts[2] {
        for y in 0..counts[1] {
            for x in 0..counts[0] {
                let lattice = Vector::new(x as Real, y as Real, z as Real) + 0.5;
                let mut position = lower + lattice * slot;
                if jitter > 0.0 {
                    position += Vector::new(
                        rng.random_range(-0.5..0.5),
                        rng.random_range(-0.5..0.5),
                        rng.random_range(-0.5..0.5),
                    ) * jitter;
                }

                let mut particle =
                    Particle::new(particles.len() as u32, position, params.particle_mass);
                if elastic {
                    particle = particle.with_elastic(ElasticState::new(0.0));
                }
                particles.push(particle);
            }
        }
    }

    Ok(particles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Quality;
    use bevy::math::Vec3;

    fn block_params() -> SolverParams {
        SolverParams::fluid()
            .with_quality(Quality::High)
            .with_domain_extent(Vec3::splat(3.0))
            .with_seed_region(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn seeds_eight_particles_per_cell_on_snapped_lattice() {
        let params = block_params();
        let domain = SimulationDomain::from_params(&params).unwrap();
        let particles = seed_particles(&params, &domain).unwrap();

        // [-1, 1] snaps to [-0.9, 0.9]: 6 cells per axis, 2 particles per cell.
        assert_eq!(particles.len(), 12 * 12 * 12);
        assert_eq!(seeded_particle_count(&params, &domain), particles.len() as u64);

        let first = particles[0].position;
        assert!((first - Vec3::splat(-0.9 + 0.075)).abs().max_element() < 1e-4);

        let mut cell_counts = vec![0u32; domain.cell_count()];
        for particle in &particles {
            let cell = domain.cell_of(particle.position).unwrap();
            cell_counts[domain.linear_index(cell)] += 1;
        }
        assert!(cell_counts.iter().all(|&c| c == 0 || c == 8));

        let centre: Vec3 = particles.iter().map(|p| p.position).sum::<Vec3>()
            / particles.len() as Real;
        assert!(centre.abs().max_element() < 1e-4);
    }

    #[test]
    fn ids_are_sequential_and_elastic_state_follows_material() {
        let params = block_params();
        let domain = SimulationDomain::from_params(&params).unwrap();
        let particles = seed_particles(&params, &domain).unwrap();
        assert!(particles.iter().enumerate().all(|(i, p)| p.id == i as u32));
        assert!(particles.iter().all(|p| p.elastic.is_none()));

        let params = SolverParams::elastic();
        let domain = SimulationDomain::from_params(&params).unwrap();
        let particles = seed_particles(&params, &domain).unwrap();
        assert!(particles.iter().all(|p| p.jacobian() == Some(1.0)));
    }

    #[test]
    fn jitter_stays_inside_the_sub_cell_slot() {
        let params = block_params().with_seed_jitter(1.0);
        let domain = SimulationDomain::from_params(&params).unwrap();
        let lattice = seed_particles(&block_params(), &domain).unwrap();
        let jittered = seed_particles(&params, &domain).unwrap();
        assert_eq!(lattice.len(), jittered.len());

        let half_slot = domain.spacing() / 4.0;
        for (a, b) in lattice.iter().zip(&jittered) {
            assert!((a.position - b.position).abs().max_element() <= half_slot + 1e-5);
        }
    }

    #[test]
    fn seed_region_outside_domain_is_empty() {
        let params = block_params().with_seed_region(Vec3::splat(4.0), Vec3::splat(5.0));
        let domain = SimulationDomain::from_params(&params).unwrap();
        assert!(matches!(
            seed_particles(&params, &domain),
            Err(MpmError::EmptySeedRegion { .. })
        ));
    }

    #[test]
    fn split_and_swap_alternate_buffers() {
        let particles = vec![
            Particle::new(0, Vec3::ZERO, 1.0),
            Particle::new(1, Vec3::ONE, 1.0),
        ];
        let mut buffers = ParticleBuffers::new(particles).unwrap();
        {
            let (src, dst) = buffers.split();
            dst[0] = src[1];
            dst[1] = src[0];
        }
        buffers.swap();
        assert_eq!(buffers.particles()[0].id, 1);
        assert_eq!(buffers.len(), 2);
    }
}
