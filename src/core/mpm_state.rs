use std::time::Instant;

use bevy::prelude::*;
use rayon::prelude::*;

use crate::config::{Quality, SolverParams};
use crate::error::{MpmError, try_alloc};
use crate::math::{Matrix, Real, Vector, zero_matrix, zero_vector};
use crate::solver::{
    PointerForce, RenderBuffer, advect_particles, apply_stress_forces, compute_stress_forces,
    grid_to_particle, initialize_rest_volumes, recover_failed_particles, transfer_mass_momentum,
    update_grid_velocities,
};

use super::domain::SimulationDomain;
use super::grid::Grid;
use super::particle::{ElasticState, Particle};
use super::particle_set::{ParticleBuffers, seed_particles};
use super::sort::GridSort;

/// Wall-clock time spent in each stage of one step, in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepTimings {
    pub sort: f32,
    pub p2g: f32,
    pub grid: f32,
    pub g2p: f32,
}

impl StepTimings {
    pub fn total(&self) -> f32 {
        self.sort + self.p2g + self.grid + self.g2p
    }
}

/// Outcome of one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Particles that took part in the transfers.
    pub sorted: u32,
    /// Particles left out of the transfers (outside the grid or non-finite).
    pub dropped: u32,
    /// Particles put back into the box at rest: non-finite state, or no grid
    /// cell after advection.
    pub recovered: u32,
    pub timings: StepTimings,
}

#[inline]
fn elapsed_ms(since: Instant) -> f32 {
    since.elapsed().as_secs_f32() * 1000.0
}

/// Aggregate simulation state for the solver.
///
/// Owns every buffer sized by the particle count or the grid. Rebuilding for
/// a new configuration goes through [`reinitialize`](Self::reinitialize),
/// which swaps the whole state at once.
#[derive(Resource)]
pub struct MpmState {
    params: SolverParams,
    domain: SimulationDomain,
    grid: Grid,
    particles: ParticleBuffers,
    sort: GridSort,
    stress_forces: Vec<Matrix>,
    render: RenderBuffer,
    pointer: PointerForce,
    step_count: u64,
    last_report: StepReport,
}

impl MpmState {
    pub fn new(params: SolverParams) -> Result<Self, MpmError> {
        params.validate()?;
        let domain = SimulationDomain::from_params(&params)?;
        let particles = seed_particles(&params, &domain)?;
        Self::with_particles(params, domain, particles)
    }

    /// State over a caller-provided particle set instead of the seed region.
    /// Particle ids are reassigned to their index; elastic runs give every
    /// particle an undeformed state if it has none.
    pub fn from_particles(params: SolverParams, particles: Vec<Particle>) -> Result<Self, MpmError> {
        params.validate()?;
        let domain = SimulationDomain::from_params(&params)?;
        if particles.is_empty() {
            return Err(MpmError::EmptySeedRegion {
                min: params.seed_min,
                max: params.seed_max,
            });
        }
        let elastic = params.material.is_elastic();
        let particles = particles
            .into_iter()
            .enumerate()
            .map(|(index, particle)| Particle {
                id: index as u32,
                elastic: particle
                    .elastic
                    .or_else(|| elastic.then(|| ElasticState::new(0.0))),
                ..particle
            })
            .collect();
        Self::with_particles(params, domain, particles)
    }

    fn with_particles(
        params: SolverParams,
        domain: SimulationDomain,
        particles: Vec<Particle>,
    ) -> Result<Self, MpmError> {
        let count = particles.len();
        let mut state = Self {
            grid: Grid::new(domain)?,
            sort: GridSort::new(count, domain.cell_count())?,
            stress_forces: try_alloc("stress forces", count, zero_matrix)?,
            render: RenderBuffer::new(count, domain.spacing())?,
            particles: ParticleBuffers::new(particles)?,
            domain,
            params,
            pointer: PointerForce::none(),
            step_count: 0,
            last_report: StepReport::default(),
        };

        if state.params.material.is_elastic() {
            state.initialize_rest_volumes();
        }
        state.render.project(state.particles.particles());

        let dims = domain.dims();
        info!(
            "mpm: {} {} particles, grid {}x{}x{} (spacing {:.2}, {})",
            count,
            state.params.material.material_name(),
            dims.x,
            dims.y,
            dims.z,
            domain.spacing(),
            state.params.quality.name(),
        );
        Ok(state)
    }

    /// Rest volumes from the first grid mass accumulation after seeding.
    fn initialize_rest_volumes(&mut self) {
        let (src, dst) = self.particles.split();
        self.sort.sort(&self.domain, src, dst);
        self.particles.swap();
        transfer_mass_momentum(&mut self.grid, self.particles.particles(), &self.sort);

        let fallback_volume =
            self.domain.spacing().powi(3) / self.params.particles_per_cell() as Real;
        initialize_rest_volumes(self.particles.particles_mut(), &self.grid, fallback_volume);
        self.grid.zero();
    }

    /// Rebuilds everything for `params`. On error the current state is kept.
    pub fn reinitialize(&mut self, params: SolverParams) -> Result<(), MpmError> {
        *self = Self::new(params)?;
        Ok(())
    }

    pub fn set_quality(&mut self, quality: Quality) -> Result<(), MpmError> {
        let params = self.params.clone().with_quality(quality);
        self.reinitialize(params)
    }

    /// Force applied on the following steps until replaced.
    pub fn set_pointer_force(&mut self, pointer: PointerForce) {
        self.pointer = pointer;
    }

    /// Advances the simulation by one `dt`: sort, P2G, grid update, G2P,
    /// advection, recovery and render projection.
    pub fn step(&mut self) -> StepReport {
        let dt = self.params.dt;

        let start = Instant::now();
        let (src, dst) = self.particles.split();
        let sort_stats = self.sort.sort(&self.domain, src, dst);
        self.particles.swap();
        let sort_ms = elapsed_ms(start);

        let start = Instant::now();
        let particles = self.particles.particles();
        transfer_mass_momentum(&mut self.grid, particles, &self.sort);
        compute_stress_forces(
            &mut self.stress_forces,
            particles,
            &self.grid,
            self.sort.sorted_len(),
            &self.params,
        );
        apply_stress_forces(&mut self.grid, particles, &self.stress_forces, &self.sort);
        let p2g_ms = elapsed_ms(start);

        let start = Instant::now();
        update_grid_velocities(&mut self.grid, &self.params, &self.pointer);
        let grid_ms = elapsed_ms(start);

        let start = Instant::now();
        let sorted_len = self.sort.sorted_len();
        let particles = self.particles.particles_mut();
        grid_to_particle(&mut particles[..sorted_len], &self.grid, dt);
        advect_particles(&mut particles[..sorted_len], dt);
        let recovered = recover_failed_particles(particles, &self.domain);
        self.render.project(self.particles.particles());
        let g2p_ms = elapsed_ms(start);

        let report = StepReport {
            sorted: sort_stats.sorted,
            dropped: sort_stats.dropped,
            recovered: recovered as u32,
            timings: StepTimings {
                sort: sort_ms,
                p2g: p2g_ms,
                grid: grid_ms,
                g2p: g2p_ms,
            },
        };

        if report.dropped > 0 {
            warn!(
                "mpm step {}: {} particles outside the grid were left out of the transfers",
                self.step_count, report.dropped
            );
        }
        if report.recovered > 0 {
            warn!(
                "mpm step {}: recovered {} invalid or escaped particles",
                self.step_count, report.recovered
            );
        }
        debug!(
            "mpm step {}: sort {:.3}ms p2g {:.3}ms grid {:.3}ms g2p {:.3}ms",
            self.step_count, sort_ms, p2g_ms, grid_ms, g2p_ms
        );

        self.step_count += 1;
        self.last_report = report;
        report
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    pub fn domain(&self) -> &SimulationDomain {
        &self.domain
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Particles in the order of the last sort.
    pub fn particles(&self) -> &[Particle] {
        self.particles.particles()
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        self.particles.particles_mut()
    }

    pub fn sort_index(&self) -> &GridSort {
        &self.sort
    }

    pub fn render_buffer(&self) -> &RenderBuffer {
        &self.render
    }

    pub fn pointer_force(&self) -> &PointerForce {
        &self.pointer
    }

    pub fn last_report(&self) -> &StepReport {
        &self.last_report
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn grid_cell_count(&self) -> usize {
        self.domain.cell_count()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn total_particle_mass(&self) -> Real {
        self.particles().par_iter().map(|p| p.mass).sum()
    }

    /// Node mass left by the last step's first transfer pass.
    pub fn total_grid_mass(&self) -> Real {
        self.grid.total_mass()
    }

    pub fn total_momentum(&self) -> Vector {
        self.particles()
            .par_iter()
            .map(Particle::momentum)
            .reduce(zero_vector, |a, b| a + b)
    }

    pub fn kinetic_energy(&self) -> Real {
        self.particles()
            .par_iter()
            .map(|p| 0.5 * p.mass * p.velocity.length_squared())
            .sum()
    }

    pub fn center_of_mass(&self) -> Vector {
        let weighted = self
            .particles()
            .par_iter()
            .map(|p| p.position * p.mass)
            .reduce(zero_vector, |a, b| a + b);
        let mass = self.total_particle_mass();
        if mass > 0.0 { weighted / mass } else { zero_vector() }
    }
}
