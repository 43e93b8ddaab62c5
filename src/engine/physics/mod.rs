// Physics for the pet body: a small explicit integrator with wall and floor
// collision against the surface bounds.

pub mod integrator;

pub use integrator::{step, Bounds, PhysicsParams, PhysicsState, DEFAULT_PHYSICS};
