//! Pointer-trail particle effect: pool simulation, camera, and renderer.

mod camera;
mod pool;
mod renderer;

pub use camera::OrthoCamera;
pub use pool::{ParticleSlot, TrailPool, MAX_PARTICLES};
pub use renderer::{TrailInstance, TrailMap, TRAIL_FORMAT};

/// WGSL shader source for the instanced trail sprites.
pub const TRAIL_SHADER_WGSL: &str = include_str!("../../shaders/trail.wgsl");
