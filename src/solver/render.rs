//! Hand-off buffer for an external point renderer.

use bevy::math::Vec4;
use rayon::prelude::*;

use crate::config::constants::POINT_SIZE_FACTOR;
use crate::core::Particle;
use crate::error::{MpmError, try_alloc};
use crate::math::Real;

/// `(position, speed)` per particle, refreshed once per step after all
/// physics stages.
#[derive(Clone, Debug, Default)]
pub struct RenderBuffer {
    points: Vec<Vec4>,
    point_size: Real,
}

impl RenderBuffer {
    pub fn new(particle_count: usize, grid_spacing: Real) -> Result<Self, MpmError> {
        Ok(Self {
            points: try_alloc("render buffer", particle_count, || Vec4::ZERO)?,
            point_size: grid_spacing * POINT_SIZE_FACTOR,
        })
    }

    pub fn points(&self) -> &[Vec4] {
        &self.points
    }

    pub fn particle_count(&self) -> usize {
        self.points.len()
    }

    pub fn point_size(&self) -> Real {
        self.point_size
    }

    pub fn project(&mut self, particles: &[Particle]) {
        self.points
            .par_iter_mut()
            .zip(particles.par_iter())
            .for_each(|(point, particle)| {
                *point = particle.position.extend(particle.velocity.length());
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec3;

    #[test]
    fn packs_position_and_speed() {
        let particles = [
            Particle::new(0, Vec3::new(1.0, 2.0, 3.0), 1.0).with_velocity(Vec3::new(3.0, 4.0, 0.0)),
            Particle::new(1, Vec3::ZERO, 1.0),
        ];
        let mut buffer = RenderBuffer::new(particles.len(), 0.5).unwrap();
        buffer.project(&particles);

        assert_eq!(buffer.particle_count(), 2);
        assert_eq!(buffer.points()[0], Vec4::new(1.0, 2.0, 3.0, 5.0));
        assert_eq!(buffer.points()[1], Vec4::ZERO);
        assert!((buffer.point_size() - 0.4).abs() < 1e-6);
    }
}
