//! Parallel counting sort of particles by grid cell.
//!
//! Each step the particles are reordered so that every cell owns a contiguous
//! run of the particle buffer. The passes are:
//!
//! 1. compute the cell key of every particle,
//! 2. count particles per cell with atomic increments,
//! 3. exclusive prefix sum of the counts into cell start offsets,
//! 4. claim a destination slot per particle with an atomic cursor,
//! 5. gather the particles into the destination buffer.
//!
//! Particles without a valid key (outside the grid, or with any non-finite
//! state) are appended after every valid run, so the output is always a
//! permutation of the input and they take no part in the transfers.

use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use crate::error::{MpmError, try_alloc};

use super::domain::SimulationDomain;
use super::particle::Particle;
use super::prefix_sum::exclusive_prefix_sum;

/// Key of a particle that does not belong to any cell.
pub const INVALID_CELL: u32 = u32::MAX;

/// Contiguous run of sorted particles living in one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellRange {
    pub start: u32,
    pub count: u32,
}

impl CellRange {
    #[inline(always)]
    pub fn range(&self) -> Range<usize> {
        self.start as usize..(self.start + self.count) as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Particles placed in a cell run.
    pub sorted: u32,
    /// Particles moved to the trailing range.
    pub dropped: u32,
}

pub struct GridSort {
    keys: Vec<u32>,
    order: Vec<AtomicU32>,
    cursors: Vec<AtomicU32>,
    starts: Vec<u32>,
    ranges: Vec<CellRange>,
    sorted_len: u32,
}

impl GridSort {
    pub fn new(particle_count: usize, cell_count: usize) -> Result<Self, MpmError> {
        if particle_count >= INVALID_CELL as usize {
            return Err(MpmError::Allocation {
                what: "sort keys",
                len: particle_count,
            });
        }
        Ok(Self {
            keys: try_alloc("sort keys", particle_count, || INVALID_CELL)?,
            order: try_alloc("sort order", particle_count, || AtomicU32::new(0))?,
            cursors: try_alloc("cell cursors", cell_count, || AtomicU32::new(0))?,
            starts: try_alloc("cell starts", cell_count, || 0)?,
            ranges: try_alloc("cell ranges", cell_count, CellRange::default)?,
            sorted_len: 0,
        })
    }

    /// Sorts `src` into `dst` by cell and rebuilds the per-cell index.
    pub fn sort(
        &mut self,
        domain: &SimulationDomain,
        src: &[Particle],
        dst: &mut [Particle],
    ) -> SortStats {
        debug_assert_eq!(src.len(), dst.len());
        debug_assert_eq!(src.len(), self.keys.len());
        debug_assert_eq!(domain.cell_count(), self.cursors.len());

        self.keys
            .par_iter_mut()
            .zip(src.par_iter())
            .for_each(|(key, particle)| *key = cell_key(domain, particle));

        self.cursors
            .par_iter()
            .for_each(|cursor| cursor.store(0, Ordering::Relaxed));
        let cursors = &self.cursors;
        self.keys
            .par_iter()
            .filter(|&&key| key != INVALID_CELL)
            .for_each(|&key| {
                cursors[key as usize].fetch_add(1, Ordering::Relaxed);
            });

        self.starts
            .par_iter_mut()
            .zip(self.cursors.par_iter())
            .for_each(|(start, count)| *start = count.load(Ordering::Relaxed));
        let sorted = exclusive_prefix_sum(&mut self.starts);

        self.ranges
            .par_iter_mut()
            .zip(self.starts.par_iter())
            .zip(self.cursors.par_iter())
            .for_each(|((range, &start), cursor)| {
                *range = CellRange {
                    start,
                    count: cursor.load(Ordering::Relaxed),
                };
                cursor.store(start, Ordering::Relaxed);
            });

        let dropped_cursor = AtomicU32::new(sorted);
        let order = &self.order;
        self.keys.par_iter().enumerate().for_each(|(index, &key)| {
            let slot = if key == INVALID_CELL {
                dropped_cursor.fetch_add(1, Ordering::Relaxed)
            } else {
                cursors[key as usize].fetch_add(1, Ordering::Relaxed)
            };
            order[slot as usize].store(index as u32, Ordering::Relaxed);
        });

        dst.par_iter_mut()
            .zip(self.order.par_iter())
            .for_each(|(particle, source)| {
                *particle = src[source.load(Ordering::Relaxed) as usize];
            });

        self.sorted_len = sorted;
        SortStats {
            sorted,
            dropped: src.len() as u32 - sorted,
        }
    }

    /// Per-cell runs, indexed like the grid nodes.
    pub fn ranges(&self) -> &[CellRange] {
        &self.ranges
    }

    #[inline(always)]
    pub fn cell_range(&self, cell: usize) -> CellRange {
        self.ranges[cell]
    }

    /// Number of particles at the front of the sorted buffer that belong to a cell.
    pub fn sorted_len(&self) -> usize {
        self.sorted_len as usize
    }

    /// Source index of the particle now stored at `slot`.
    pub fn source_index(&self, slot: usize) -> usize {
        self.order[slot].load(Ordering::Relaxed) as usize
    }
}

#[inline(always)]
fn cell_key(domain: &SimulationDomain, particle: &Particle) -> u32 {
    if !particle.is_valid() {
        return INVALID_CELL;
    }
    domain
        .cell_of(particle.position)
        .map_or(INVALID_CELL, |cell| domain.linear_index(cell) as u32)
}
