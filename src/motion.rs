use glam::Vec2;

use crate::body::{Body, UNBOUNDED_VELOCITY};

/// Advance one velocity component by `dt`.
///
/// Acceleration wins over drag; drag pulls toward zero without crossing it.
/// The cap applies unless `max` is [`UNBOUNDED_VELOCITY`].
pub fn compute_velocity(velocity: f32, acceleration: f32, drag: f32, max: f32, dt: f32) -> f32 {
    let mut v = velocity;
    if acceleration != 0.0 {
        v += acceleration * dt;
    } else if drag != 0.0 {
        let d = drag * dt;
        if v - d > 0.0 {
            v -= d;
        } else if v + d < 0.0 {
            v += d;
        } else {
            v = 0.0;
        }
    }
    if v != 0.0 && max != UNBOUNDED_VELOCITY {
        if v > max {
            v = max;
        } else if v < -max {
            v = -max;
        }
    }
    v
}

/// Integrate `body` over `dt` and refresh its hulls.
///
/// Clears the per-tick contact outputs (`on_floor`, `touching`) first, so
/// they only ever report this tick's resolution.
pub fn integrate(body: &mut Body, dt: f32) {
    if !body.moves {
        return;
    }
    body.on_floor = false;
    body.touching = Default::default();

    body.velocity = Vec2::new(
        compute_velocity(body.velocity.x, body.acceleration.x, body.drag.x, body.max_velocity.x, dt),
        compute_velocity(body.velocity.y, body.acceleration.y, body.drag.y, body.max_velocity.y, dt),
    );
    let delta = body.velocity * dt;
    body.position += delta;
    body.displacement = delta;

    if body.solid {
        body.refresh_hulls();
    }
}
