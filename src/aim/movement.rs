//! Stick input to world movement direction.

use crate::aim::{AimRequest, AimSourceResolver, RaycastService};
use crate::config::MovementConfig;
use crate::spatial::{project_on_horizontal, SpatialSourceProvider, DIRECTION_EPSILON, UP};
use glam::{Vec2, Vec3};

/// Forward/back deflection above which a small sideways deflection is dropped.
const DEADZONE_MIN_Y: f32 = 0.05;

/// Apply the X deadzone and forward priority to raw stick input.
pub fn shape_stick(stick: Vec2, config: &MovementConfig) -> Vec2 {
    let mut shaped = stick;
    let (abs_x, abs_y) = (stick.x.abs(), stick.y.abs());

    if abs_x <= config.x_axis_deadzone && abs_y > DEADZONE_MIN_Y {
        shaped.x = 0.0;
    }

    if abs_y > config.forward_priority_min_y && abs_y >= abs_x * config.forward_priority_ratio {
        shaped.x = 0.0;
    }

    shaped
}

/// World-space movement direction for `stick`, or `Vec3::ZERO` when the stick is idle.
///
/// Forward comes from the aim resolver flattened onto the ground; right is
/// `up × forward`. The result is clamped to unit length when analog magnitude
/// is enabled and normalized otherwise.
pub fn movement_direction<P>(
    resolver: &AimSourceResolver,
    provider: &P,
    config: &MovementConfig,
    stick: Vec2,
) -> Vec3
where
    P: SpatialSourceProvider + RaycastService + ?Sized,
{
    if !stick.is_finite() || stick.length_squared() < DIRECTION_EPSILON {
        return Vec3::ZERO;
    }

    let stick = shape_stick(stick, config);
    let forward = movement_forward(resolver, provider, config);
    let right = UP.cross(forward);
    let direction = forward * stick.y + right * stick.x;

    if direction.length_squared() < DIRECTION_EPSILON {
        return Vec3::ZERO;
    }

    if config.use_analog_magnitude {
        direction.clamp_length_max(1.0)
    } else {
        direction.normalize()
    }
}

/// Ground-plane forward used for movement.
pub fn movement_forward<P>(resolver: &AimSourceResolver, provider: &P, config: &MovementConfig) -> Vec3
where
    P: SpatialSourceProvider + RaycastService + ?Sized,
{
    let request = AimRequest::new(
        config.direction_source,
        config.camera_grip,
        config.raycast_distance.max(1.0),
    )
    .projected(true);

    let forward = project_on_horizontal(resolver.resolve(provider, &request).direction);
    if forward.length_squared() < DIRECTION_EPSILON {
        return provider.resolved_base_forward();
    }
    forward.normalize()
}
