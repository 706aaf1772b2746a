//! Cursor-driven force applied to the grid.
//!
//! The host reduces mouse input to a world-space ray and a cursor position on
//! a camera-facing plane. Cursor motion on that plane becomes a velocity
//! impulse on every node close to the ray.

use bevy::math::{Vec2, Vec3};
use bevy::prelude::Resource;

use crate::config::InteractionParams;
use crate::math::{Real, Vector, zero_vector};

#[inline]
fn smoothstep(edge0: Real, edge1: Real, x: Real) -> Real {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Velocity impulse around a ray, fading to zero at `range`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerForce {
    pub ray_origin: Vector,
    /// Unit direction, zero when no ray is available.
    pub ray_direction: Vector,
    pub force: Vector,
    pub range: Real,
}

impl Default for PointerForce {
    fn default() -> Self {
        Self::none()
    }
}

impl PointerForce {
    pub fn new(ray_origin: Vector, ray_direction: Vector, force: Vector, range: Real) -> Self {
        Self {
            ray_origin,
            ray_direction: ray_direction.normalize_or_zero(),
            force,
            range,
        }
    }

    pub fn none() -> Self {
        Self {
            ray_origin: zero_vector(),
            ray_direction: zero_vector(),
            force: zero_vector(),
            range: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.range > 0.0
            && self.ray_direction != Vec3::ZERO
            && self.force != Vec3::ZERO
            && self.force.is_finite()
            && self.ray_origin.is_finite()
    }

    #[inline]
    pub fn distance_to_ray(&self, position: Vector) -> Real {
        self.ray_direction.cross(position - self.ray_origin).length()
    }

    /// Velocity change for a node at `position`.
    #[inline]
    pub fn force_at(&self, position: Vector) -> Vector {
        if !self.is_active() {
            return zero_vector();
        }
        let falloff = 1.0 - smoothstep(0.0, self.range, self.distance_to_ray(position));
        self.force * falloff
    }
}

/// Raw pointer state written by the host each frame.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    pub ray_origin: Vec3,
    pub ray_direction: Vec3,
    /// Cursor on the camera-facing plane, see [`cursor_plane_from_screen`].
    pub cursor_plane: Vec2,
    pub camera_right: Vec3,
    pub camera_up: Vec3,
    /// While a button is held the camera is being dragged, not the fluid.
    pub any_button_pressed: bool,
}

impl Default for PointerInput {
    fn default() -> Self {
        Self {
            ray_origin: Vec3::ZERO,
            ray_direction: Vec3::NEG_Z,
            cursor_plane: Vec2::ZERO,
            camera_right: Vec3::X,
            camera_up: Vec3::Y,
            any_button_pressed: false,
        }
    }
}

/// Remembers the previous cursor sample to turn positions into velocities.
#[derive(Resource, Clone, Debug, Default)]
pub struct PointerTracker {
    last_plane: Option<Vec2>,
}

impl PointerTracker {
    /// Force for this frame, with cursor velocity taken over one `step_dt`.
    /// Zero on the first sample and while a button is held.
    pub fn sample(
        &mut self,
        input: &PointerInput,
        step_dt: Real,
        interaction: &InteractionParams,
    ) -> PointerForce {
        let velocity = match self.last_plane {
            Some(last) if !input.any_button_pressed && step_dt > 0.0 => {
                (input.cursor_plane - last) / step_dt
            }
            _ => Vec2::ZERO,
        };
        self.last_plane = Some(input.cursor_plane);

        let axis = input.camera_right * velocity.x + input.camera_up * velocity.y;
        PointerForce::new(
            input.ray_origin,
            input.ray_direction,
            axis * interaction.force_scale,
            interaction.force_range,
        )
    }

    pub fn reset(&mut self) {
        self.last_plane = None;
    }
}

/// Cursor position on the plane facing the camera at `orbit_distance`.
///
/// `cursor` is in pixels from the bottom-left corner of a `screen`-sized
/// viewport; the result is centred on the view axis.
pub fn cursor_plane_from_screen(
    cursor: Vec2,
    screen: Vec2,
    vertical_fov: Real,
    orbit_distance: Real,
) -> Vec2 {
    if screen.min_element() <= 0.0 {
        return Vec2::ZERO;
    }
    let height = (vertical_fov * 0.5).tan() * 2.0;
    let width = height * screen.x / screen.y;
    (cursor / screen - 0.5) * Vec2::new(width, height) * orbit_distance
}
