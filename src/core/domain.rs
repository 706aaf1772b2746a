//! Simulation box and the mapping between world space and grid cells.
//!
//! Grid nodes sit at cell centres: node `i` along an axis is at
//! `min + (i + 0.5) * spacing`, so the cell containing a particle is also the
//! node nearest to it.

use bevy::math::{IVec3, UVec3, Vec3};

use crate::config::SolverParams;
use crate::error::MpmError;
use crate::math::{Coord, Real, Vector};

/// Tolerance used when rounding extents to a whole number of cells, so that
/// e.g. `3.0 / 0.3` does not turn into 11 cells.
const CELL_ROUNDING_EPS: Real = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationDomain {
    spacing: Real,
    inv_spacing: Real,
    min: Vector,
    max: Vector,
    dims: UVec3,
}

impl SimulationDomain {
    /// Box of at least `extent` centred on the origin, rounded up to whole cells.
    pub fn new(spacing: Real, extent: Vector) -> Result<Self, MpmError> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(MpmError::InvalidGridSpacing(spacing));
        }
        if !extent.is_finite() || extent.min_element() <= 0.0 {
            return Err(MpmError::InvalidDomainExtent(extent));
        }

        let cells = (extent / spacing - CELL_ROUNDING_EPS).ceil().max(Vec3::ONE);
        if !cells.is_finite() || cells.max_element() > u32::MAX as Real {
            return Err(MpmError::GridTooLarge(u64::MAX));
        }
        let dims = cells.as_uvec3();
        let cell_count = (dims.x as u64)
            .checked_mul(dims.y as u64)
            .and_then(|count| count.checked_mul(dims.z as u64))
            .ok_or(MpmError::GridTooLarge(u64::MAX))?;
        if cell_count >= u32::MAX as u64 {
            return Err(MpmError::GridTooLarge(cell_count));
        }

        let size = dims.as_vec3() * spacing;
        Ok(Self {
            spacing,
            inv_spacing: 1.0 / spacing,
            min: -size * 0.5,
            max: size * 0.5,
            dims,
        })
    }

    pub fn from_params(params: &SolverParams) -> Result<Self, MpmError> {
        Self::new(params.grid_spacing(), params.domain_extent)
    }

    pub fn spacing(&self) -> Real {
        self.spacing
    }

    pub fn inv_spacing(&self) -> Real {
        self.inv_spacing
    }

    pub fn min(&self) -> Vector {
        self.min
    }

    pub fn max(&self) -> Vector {
        self.max
    }

    pub fn size(&self) -> Vector {
        self.max - self.min
    }

    pub fn center(&self) -> Vector {
        (self.min + self.max) * 0.5
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Below `u32::MAX`, checked in [`new`](Self::new).
    pub fn cell_count(&self) -> usize {
        self.dims.x as usize * self.dims.y as usize * self.dims.z as usize
    }

    /// Cell containing `position`, or `None` when the position is not finite
    /// or lies outside the grid.
    #[inline]
    pub fn cell_of(&self, position: Vector) -> Option<Coord> {
        if !position.is_finite() {
            return None;
        }
        let cell = ((position - self.min) * self.inv_spacing).floor();
        if cell.min_element() < 0.0 || cell.cmpge(self.dims.as_vec3()).any() {
            return None;
        }
        Some(cell.as_ivec3())
    }

    #[inline]
    pub fn contains_coord(&self, coord: Coord) -> bool {
        coord.min_element() >= 0 && coord.as_uvec3().cmplt(self.dims).all()
    }

    /// Flattened index, x fastest.
    #[inline]
    pub fn linear_index(&self, coord: Coord) -> usize {
        let dx = self.dims.x as usize;
        let dy = self.dims.y as usize;
        coord.x as usize + dx * (coord.y as usize + dy * coord.z as usize)
    }

    #[inline]
    pub fn coord_of(&self, index: usize) -> Coord {
        let dx = self.dims.x as usize;
        let dy = self.dims.y as usize;
        IVec3::new(
            (index % dx) as i32,
            ((index / dx) % dy) as i32,
            (index / (dx * dy)) as i32,
        )
    }

    /// Nearest node inside the grid.
    #[inline]
    pub fn clamp_coord(&self, coord: Coord) -> Coord {
        coord.clamp(IVec3::ZERO, self.dims.as_ivec3() - 1)
    }

    #[inline]
    pub fn node_position(&self, coord: Coord) -> Vector {
        self.min + (coord.as_vec3() + 0.5) * self.spacing
    }

    /// Position expressed in node units: node `i` sits at `i`.
    #[inline]
    pub fn to_node_space(&self, position: Vector) -> Vector {
        (position - self.min) * self.inv_spacing - 0.5
    }

    /// Brings a position back into the box, just inside the upper faces so
    /// the result always has a cell. Non-finite components are replaced by the
    /// matching component of the box centre.
    pub fn clamp_position(&self, position: Vector) -> Vector {
        let center = self.center();
        let sanitized = Vec3::select(position.is_finite_mask(), position, center);
        let upper = self.max - Vec3::splat(self.spacing * 1e-3);
        sanitized.clamp(self.min, upper)
    }
}
