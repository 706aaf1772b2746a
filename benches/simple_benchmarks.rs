/// Simple custom benchmarking without criterion
use std::time::Instant;

use bevy::prelude::*;
use mpm3d::core::{GridSort, SimulationDomain, exclusive_prefix_sum};
use mpm3d::solver::transfer_mass_momentum;
use mpm3d::{Grid, MpmState, Particle, Quality, SolverParams};
use rand::Rng;

fn time_it<F: FnMut()>(name: &str, iterations: usize, mut f: F) {
    // Warmup
    for _ in 0..5 {
        f();
    }

    let start = Instant::now();
    for _ in 0..iterations {
        f();
    }
    let elapsed = start.elapsed();

    let avg_ms = elapsed.as_secs_f64() * 1000.0 / iterations as f64;
    println!("{}: {:.3}ms avg ({} iterations)", name, avg_ms, iterations);
}

fn create_test_particles(domain: &SimulationDomain, count: usize) -> Vec<Particle> {
    let mut rng = rand::rng();
    let (min, max) = (domain.min(), domain.max());
    (0..count)
        .map(|id| {
            let position = Vec3::new(
                rng.random_range(min.x..max.x),
                rng.random_range(min.y..max.y),
                rng.random_range(min.z..max.z),
            );
            Particle::new(id as u32, position, 1.0).with_velocity(Vec3::new(1.0, -2.0, 0.5))
        })
        .collect()
}

fn main() {
    println!("\n=== MPM3D Benchmarks ===\n");

    println!("--- Prefix Sum ---");
    for &len in &[10_000usize, 100_000, 1_000_000] {
        let counts: Vec<u32> = (0..len).map(|i| (i % 7) as u32).collect();
        let mut scratch = counts.clone();
        time_it(&format!("exclusive_prefix_sum (n={})", len), 50, || {
            scratch.copy_from_slice(&counts);
            exclusive_prefix_sum(&mut scratch);
        });
    }

    println!("\n--- Particle Sort ---");
    let domain = SimulationDomain::new(Quality::Medium.grid_spacing(), Vec3::new(12.0, 8.0, 8.0))
        .expect("benchmark domain");
    for &count in &[10_000usize, 50_000, 200_000] {
        let src = create_test_particles(&domain, count);
        let mut dst = src.clone();
        let mut sort = GridSort::new(count, domain.cell_count()).expect("sort buffers");

        time_it(&format!("counting sort (n={})", count), 20, || {
            sort.sort(&domain, &src, &mut dst);
        });

        let mut grid = Grid::new(domain).expect("grid");
        time_it(&format!("p2g mass/momentum (n={})", count), 20, || {
            transfer_mass_momentum(&mut grid, &dst, &sort);
        });
    }

    println!("\n--- Full Step ---");
    for quality in Quality::ALL {
        for (label, params) in [
            ("fluid", SolverParams::fluid()),
            ("elastic", SolverParams::elastic()),
        ] {
            let mut state =
                MpmState::new(params.with_quality(quality)).expect("benchmark state");
            time_it(
                &format!(
                    "step {} {} (n={})",
                    label,
                    quality.name(),
                    state.particle_count()
                ),
                10,
                || {
                    state.step();
                },
            );
        }
    }

    println!("\n=== Benchmark Complete ===\n");
}
