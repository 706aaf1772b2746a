//! Blocked parallel exclusive scan.
//!
//! The input is split into fixed-size blocks; each block is summed in
//! parallel, the block totals are scanned sequentially and the blocks are then
//! rescanned in parallel starting from their offset.

use rayon::prelude::*;

/// Elements per block. Inputs up to this size are scanned sequentially.
pub const SCAN_BLOCK_SIZE: usize = 4096;

/// Replaces every value with the sum of the values before it and returns
/// the total.
pub fn exclusive_prefix_sum(values: &mut [u32]) -> u32 {
    if values.len() <= SCAN_BLOCK_SIZE {
        return scan_block(values, 0);
    }

    let block_totals: Vec<u32> = values
        .par_chunks(SCAN_BLOCK_SIZE)
        .map(|block| block.iter().sum())
        .collect();

    let mut running = 0u32;
    let block_offsets: Vec<u32> = block_totals
        .iter()
        .map(|&total| {
            let offset = running;
            running += total;
            offset
        })
        .collect();

    values
        .par_chunks_mut(SCAN_BLOCK_SIZE)
        .zip(block_offsets.par_iter())
        .for_each(|(block, &offset)| {
            scan_block(block, offset);
        });

    running
}

#[inline]
fn scan_block(block: &mut [u32], offset: u32) -> u32 {
    let mut running = offset;
    for value in block.iter_mut() {
        let count = *value;
        *value = running;
        running += count;
    }
    running
}
