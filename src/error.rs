//! Errors surfaced to the host when the solver cannot be (re)built.
//!
//! Numerical trouble during a step is not an error: it is detected, counted
//! in the step report and recovered so the simulation keeps running.

use crate::math::{Real, Vector};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MpmError {
    /// Grid spacing is zero, negative or not finite.
    #[error("grid spacing must be positive and finite (got {0})")]
    InvalidGridSpacing(Real),
    /// Domain extent has a non-finite or non-positive component.
    #[error("domain extent must be positive and finite on every axis (got {0:?})")]
    InvalidDomainExtent(Vector),
    /// Time step is zero, negative or not finite.
    #[error("time step must be positive and finite (got {0})")]
    InvalidTimeStep(Real),
    /// Particle mass is zero, negative or not finite.
    #[error("particle mass must be positive and finite (got {0})")]
    InvalidParticleMass(Real),
    /// A material parameter is outside its admissible range.
    #[error("invalid material parameter `{name}` = {value}")]
    InvalidMaterial { name: &'static str, value: Real },
    /// The seed region does not produce a single particle.
    #[error("seed region {min:?}..{max:?} does not contain any particle")]
    EmptySeedRegion { min: Vector, max: Vector },
    /// Grid has more cells than the sort index can address.
    #[error("grid of {0} cells exceeds the addressable cell range")]
    GridTooLarge(u64),
    /// Buffer allocation failed.
    #[error("failed to allocate {what} ({len} elements)")]
    Allocation { what: &'static str, len: usize },
}

/// Allocates a buffer of `len` elements, reporting allocation failure
/// instead of aborting.
pub fn try_alloc<T>(
    what: &'static str,
    len: usize,
    mut init: impl FnMut() -> T,
) -> Result<Vec<T>, MpmError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| MpmError::Allocation { what, len })?;
    buffer.extend(std::iter::repeat_with(&mut init).take(len));
    Ok(buffer)
}
