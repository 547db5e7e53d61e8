//! Particle emitters.
//!
//! Simulation is the host's concern; an emitter here is the render-side
//! snapshot of particle state for the current frame.

use crate::{color::Color, renderer::framework::gpu_texture::SharedGpuTexture};
use nalgebra::Vector3;

/// A single alive particle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Particle {
    /// Position relative to the emitter.
    pub position: Vector3<f32>,
    /// Half-size of the camera-facing quad, in world units.
    pub size: f32,
    /// Per-particle opacity multiplier.
    pub alpha: f32,
}

/// A particle emitter: a world-space origin plus the current set of alive
/// particles, rendered as additively blended camera-facing quads.
#[derive(Clone)]
pub struct ParticleEmitter {
    /// World-space position of the emitter origin.
    pub position: Vector3<f32>,
    /// Alive particles, positions relative to `position`.
    pub particles: Vec<Particle>,
    /// Particle texture; a soft round sprite when absent.
    pub texture: Option<SharedGpuTexture>,
    /// Tint color applied to every particle.
    pub color: Color,
}

impl ParticleEmitter {
    /// Creates an emitter at the given position with no particles.
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            particles: Vec::new(),
            texture: None,
            color: Color::WHITE,
        }
    }
}
