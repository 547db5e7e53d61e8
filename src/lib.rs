//! Frame-rendering core of a real-time 3D engine.
//!
//! The crate draws a [`Scene`](scene::Scene) through a fixed multi-pass
//! deferred pipeline: cascaded shadow maps for the first directional light,
//! a G-buffer geometry pass, a physically-based lighting pass with optional
//! image-based lighting, a skybox pass, particles, and finally a handoff to an
//! external post-processing chain.
//!
//! The renderer talks to the GPU exclusively through the
//! [`GraphicsServer`](renderer::framework::server::GraphicsServer) trait, so it
//! can be driven by any backend. A bookkeeping-only
//! [`HeadlessGraphicsServer`](renderer::framework::headless::HeadlessGraphicsServer)
//! is provided for tests and diagnostics.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod color;
pub mod math;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use nalgebra as algebra;
