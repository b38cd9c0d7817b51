//! trailmap - Pointer-trail displacement map renderer
//!
//! As the pointer moves across a canvas, circular sprites are emitted along
//! the movement path, scale up, and fade out, accumulating into an offscreen
//! texture. Downstream passes sample that texture as a displacement map.
//!
//! The crate splits into a pure CPU particle pool ([`trail::TrailPool`]), the
//! wgpu renderer that drives it ([`TrailMap`]), and an optional compositing
//! pass that consumes the result ([`displace::DisplacementPass`]).

pub mod config;
pub mod displace;
pub mod error;
pub mod gpu;
pub mod trail;

pub use config::{CanvasSize, Config};
pub use error::{Result, TrailmapError};
pub use trail::TrailMap;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
