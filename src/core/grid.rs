//! Background grid for MPM simulation
//!
//! Dense node array covering the whole domain, rebuilt from scratch every step.

use bevy::math::UVec3;
use rayon::prelude::*;

use crate::error::{MpmError, try_alloc};
use crate::math::{Coord, Real, Vector, zero_vector};

use super::domain::SimulationDomain;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridNode {
    /// Momentum during the first transfer pass, velocity afterwards.
    pub velocity: Vector,
    pub mass: Real,
}

impl GridNode {
    #[inline(always)]
    pub fn zeroed() -> Self {
        Self {
            velocity: zero_vector(),
            mass: 0.0,
        }
    }

    #[inline(always)]
    pub fn zero(&mut self) {
        self.velocity = zero_vector();
        self.mass = 0.0;
    }

    #[inline(always)]
    pub fn has_mass(&self) -> bool {
        self.mass > 0.0
    }
}

pub struct Grid {
    domain: SimulationDomain,
    nodes: Vec<GridNode>,
}

impl Grid {
    pub fn new(domain: SimulationDomain) -> Result<Self, MpmError> {
        let nodes = try_alloc("grid nodes", domain.cell_count(), GridNode::zeroed)?;
        Ok(Self { domain, nodes })
    }

    /// Node at `coord` snapped into the grid. Kernel stencils of particles in
    /// the outer cells reach one node past the walls; that weight lands on the
    /// outer layer so the transfers stay a partition of unity.
    #[inline(always)]
    pub fn node_clamped(&self, coord: Coord) -> &GridNode {
        &self.nodes[self.domain.linear_index(self.domain.clamp_coord(coord))]
    }

    pub fn domain(&self) -> &SimulationDomain {
        &self.domain
    }

    pub fn nodes(&self) -> &[GridNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [GridNode] {
        &mut self.nodes
    }

    /// Node at `coord`, `None` outside the grid.
    #[inline(always)]
    pub fn node(&self, coord: Coord) -> Option<&GridNode> {
        if self.domain.contains_coord(coord) {
            self.nodes.get(self.domain.linear_index(coord))
        } else {
            None
        }
    }

    pub fn zero(&mut self) {
        self.nodes.par_iter_mut().for_each(GridNode::zero);
    }

    pub fn total_mass(&self) -> Real {
        self.nodes.par_iter().map(|node| node.mass).sum()
    }

    /// Sum of `mass * velocity` over all nodes.
    pub fn total_momentum(&self) -> Vector {
        self.nodes
            .par_iter()
            .map(|node| node.velocity * node.mass)
            .reduce(zero_vector, |a, b| a + b)
    }
}

/// What happens to grid velocity in the layers of nodes along the walls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundaryHandling {
    /// Wall nodes lose all velocity.
    Stick,
    /// Only the component pointing into the wall is removed.
    #[default]
    Slip,
    /// The component pointing into the wall is mirrored.
    Reflect,
    /// Open box. Particles that leave the grid are put back inside at rest.
    None,
}

/// Applies `mode` to a node velocity when the node lies within `margin`
/// layers of a wall.
#[inline(always)]
pub fn apply_boundary_conditions(
    velocity: &mut Vector,
    coord: Coord,
    dims: UVec3,
    margin: u32,
    mode: BoundaryHandling,
) {
    let margin = margin as i32;
    let upper = dims.as_ivec3() - margin;
    let near_min = coord.cmplt(Coord::splat(margin));
    let near_max = coord.cmpge(upper);
    if !(near_min.any() || near_max.any()) {
        return;
    }

    match mode {
        BoundaryHandling::Stick => *velocity = zero_vector(),
        BoundaryHandling::Slip => {
            for axis in 0..3 {
                if (near_min.test(axis) && velocity[axis] < 0.0)
                    || (near_max.test(axis) && velocity[axis] > 0.0)
                {
                    velocity[axis] = 0.0;
                }
            }
        }
        BoundaryHandling::Reflect => {
            for axis in 0..3 {
                if (near_min.test(axis) && velocity[axis] < 0.0)
                    || (near_max.test(axis) && velocity[axis] > 0.0)
                {
                    velocity[axis] = -velocity[axis];
                }
            }
        }
        BoundaryHandling::None => {}
    }
}
