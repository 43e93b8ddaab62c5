// Kinematic integrator for the pet body

use crate::core::math::{clamp, snap_to_zero};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Position and velocity of the pet body
///
/// Physics space is y-up with the floor at `y = 0`. `position` is the
/// bottom-left corner of the character's footprint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhysicsState {
    /// Surface pixels
    pub position: Vec2,
    /// Pixels per second
    pub velocity: Vec2,
}

impl PhysicsState {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }

    pub fn at_rest(position: Vec2) -> Self {
        Self::new(position, Vec2::ZERO)
    }
}

/// Area the body's position may occupy: `[0, width] x [0, height]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }
}

/// Integrator constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Vertical acceleration in px/s² (negative pulls toward the floor)
    pub gravity: f32,
    /// Per-frame velocity multiplier
    pub drag: f32,
    /// Velocity components below this magnitude snap to zero
    pub min_velocity: f32,
    /// Per-axis velocity limit
    pub max_velocity: f32,
    /// Energy kept when reflecting off a side wall
    pub bounce_damping: f32,
}

pub const DEFAULT_PHYSICS: PhysicsParams = PhysicsParams {
    gravity: -1000.0,
    drag: 0.98,
    min_velocity: 5.0,
    max_velocity: 2000.0,
    bounce_damping: 0.7,
};

impl Default for PhysicsParams {
    fn default() -> Self {
        DEFAULT_PHYSICS
    }
}

/// Advance the body by `dt` seconds.
///
/// Must only be called while the pet is not held; the caller owns that check.
pub fn step(state: PhysicsState, dt: f32, bounds: Bounds, params: &PhysicsParams) -> PhysicsState {
    let mut velocity = state.velocity;

    velocity.y += params.gravity * dt;

    velocity *= params.drag;

    velocity.x = snap_to_zero(velocity.x, params.min_velocity);
    velocity.y = snap_to_zero(velocity.y, params.min_velocity);

    velocity.x = clamp(velocity.x, -params.max_velocity, params.max_velocity);
    velocity.y = clamp(velocity.y, -params.max_velocity, params.max_velocity);

    let mut position = state.position + velocity * dt;

    // Side walls reflect with damping
    if position.x < 0.0 {
        position.x = 0.0;
        velocity.x = -velocity.x * params.bounce_damping;
    } else if position.x > bounds.width {
        position.x = bounds.width;
        velocity.x = -velocity.x * params.bounce_damping;
    }

    // Floor and ceiling absorb all vertical motion
    if position.y < 0.0 {
        position.y = 0.0;
        velocity.y = 0.0;
    } else if position.y > bounds.height {
        position.y = bounds.height;
        velocity.y = 0.0;
    }

    PhysicsState { position, velocity }
}
