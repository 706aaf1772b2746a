//! Quadratic B-spline transfer kernel.
//!
//! Every particle interacts with the 3x3x3 block of nodes around its cell.

use bevy::math::{IVec3, Vec3};

use crate::math::{Coord, Real, Vector};

use super::domain::SimulationDomain;

/// MPM kernel size along one axis
pub const KERNEL_SIZE: usize = 3;
/// Number of nodes touched by one particle
pub const NEIGHBOR_COUNT: usize = KERNEL_SIZE * KERNEL_SIZE * KERNEL_SIZE;

/// Offsets of the 27 neighbouring cells, x fastest.
pub const NEIGHBOR_OFFSETS: [IVec3; NEIGHBOR_COUNT] = neighbor_offsets();

const fn neighbor_offsets() -> [IVec3; NEIGHBOR_COUNT] {
    let mut offsets = [IVec3::ZERO; NEIGHBOR_COUNT];
    let mut i = 0;
    while i < NEIGHBOR_COUNT {
        offsets[i] = IVec3::new(
            (i % 3) as i32 - 1,
            ((i / 3) % 3) as i32 - 1,
            (i / 9) as i32 - 1,
        );
        i += 1;
    }
    offsets
}

/// Compute the inverse dimension factor used by MLS-MPM kernels.
#[inline]
pub fn inv_d(cell_width: Real) -> Real {
    4.0 / (cell_width * cell_width)
}

/// One-dimensional quadratic B-spline, `d` in node units.
#[inline(always)]
pub fn bspline_weight(d: Real) -> Real {
    let a = d.abs();
    if a < 0.5 {
        0.75 - a * a
    } else if a < 1.5 {
        let t = 1.5 - a;
        0.5 * t * t
    } else {
        0.0
    }
}

/// Tensor-product weight for an offset between a node and a particle, in
/// node units.
#[inline(always)]
pub fn node_weight(offset: Vector) -> Real {
    bspline_weight(offset.x) * bspline_weight(offset.y) * bspline_weight(offset.z)
}

#[inline(always)]
fn axis_weights(fx: Real) -> [Real; 3] {
    let a = 1.5 - fx;
    let b = fx - 1.0;
    let c = fx - 0.5;
    [0.5 * a * a, 0.75 - b * b, 0.5 * c * c]
}

/// Weights and node offsets of one particle, computed once and reused by the
/// particle-centric passes.
pub struct GridInterpolation {
    /// Lowest corner of the 3x3x3 block.
    pub base_cell: Coord,
    /// B-spline weights per axis for the three nodes of the block.
    pub weights: [Vec3; KERNEL_SIZE],
    /// `node_position - particle_position` for every neighbour, world units.
    pub cell_distances: [Vector; NEIGHBOR_COUNT],
}

impl GridInterpolation {
    #[inline(always)]
    pub fn compute_for_particle(position: Vector, domain: &SimulationDomain) -> Self {
        let local = domain.to_node_space(position);
        let base = (local + 0.5).floor() - 1.0;
        let fx = local - base;

        let wx = axis_weights(fx.x);
        let wy = axis_weights(fx.y);
        let wz = axis_weights(fx.z);
        let weights = [
            Vec3::new(wx[0], wy[0], wz[0]),
            Vec3::new(wx[1], wy[1], wz[1]),
            Vec3::new(wx[2], wy[2], wz[2]),
        ];

        let spacing = domain.spacing();
        let mut cell_distances = [Vec3::ZERO; NEIGHBOR_COUNT];
        for (distance, offset) in cell_distances.iter_mut().zip(NEIGHBOR_OFFSETS.iter()) {
            *distance = ((*offset + 1).as_vec3() - fx) * spacing;
        }

        // Far-away or non-finite positions saturate; keep neighbour math in range.
        let base_cell = base
            .as_ivec3()
            .clamp(IVec3::splat(i32::MIN / 2), IVec3::splat(i32::MAX / 2));

        Self {
            base_cell,
            weights,
            cell_distances,
        }
    }

    #[inline(always)]
    pub fn weight_for_neighbor(&self, neighbor_idx: usize) -> Real {
        let gx = neighbor_idx % KERNEL_SIZE;
        let gy = (neighbor_idx / KERNEL_SIZE) % KERNEL_SIZE;
        let gz = neighbor_idx / (KERNEL_SIZE * KERNEL_SIZE);
        self.weights[gx].x * self.weights[gy].y * self.weights[gz].z
    }

    #[inline(always)]
    pub fn neighbor_coord(&self, neighbor_idx: usize) -> Coord {
        self.base_cell + 1 + NEIGHBOR_OFFSETS[neighbor_idx]
    }

    /// Iterator over (coordinate, weight, distance) tuples.
    #[inline(always)]
    pub fn iter_neighbors(&self) -> impl Iterator<Item = (Coord, Real, Vector)> + '_ {
        (0..NEIGHBOR_COUNT).map(move |idx| {
            (
                self.neighbor_coord(idx),
                self.weight_for_neighbor(idx),
                self.cell_distances[idx],
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_form_partition_of_unity() {
        let domain = SimulationDomain::new(0.4, Vec3::splat(4.0)).unwrap();
        for position in [
            Vec3::ZERO,
            Vec3::new(0.13, -0.71, 1.05),
            Vec3::new(-1.19, 0.2, 0.6),
        ] {
            let interpolation = GridInterpolation::compute_for_particle(position, &domain);
            let total: Real = interpolation.iter_neighbors().map(|(_, w, _)| w).sum();
            assert!((total - 1.0).abs() < 1e-5);

            // Linear fields are reproduced exactly.
            let first_moment: Vec3 = interpolation
                .iter_neighbors()
                .map(|(_, w, d)| d * w)
                .sum();
            assert!(first_moment.abs().max_element() < 1e-5);
        }
    }

    #[test]
    fn cached_weights_match_direct_evaluation() {
        let domain = SimulationDomain::new(0.5, Vec3::splat(4.0)).unwrap();
        let position = Vec3::new(0.37, -0.12, 0.9);
        let interpolation = GridInterpolation::compute_for_particle(position, &domain);
        for (coord, weight, distance) in interpolation.iter_neighbors() {
            let node = domain.node_position(coord);
            assert!((node - position - distance).abs().max_element() < 1e-5);
            let direct = node_weight((node - position) * domain.inv_spacing());
            assert!((direct - weight).abs() < 1e-5);
        }
    }

    #[test]
    fn centre_of_block_is_particle_cell() {
        let domain = SimulationDomain::new(0.5, Vec3::splat(4.0)).unwrap();
        let position = Vec3::new(0.74, 0.26, -0.99);
        let interpolation = GridInterpolation::compute_for_particle(position, &domain);
        assert_eq!(interpolation.neighbor_coord(13), domain.cell_of(position).unwrap());
    }

    #[test]
    fn bspline_support() {
        assert_eq!(bspline_weight(0.0), 0.75);
        assert_eq!(bspline_weight(1.5), 0.0);
        assert_eq!(bspline_weight(-2.0), 0.0);
        assert!((bspline_weight(1.0) - 0.125).abs() < 1e-6);
    }
}
