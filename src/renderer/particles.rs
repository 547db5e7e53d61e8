//! Particle pass.
//!
//! Emitters render after lighting as camera-facing quads with additive
//! blending; depth testing is on but depth writes are off, and the fragment
//! shader fades particles out near scene geometry using the G-buffer depth.

use crate::{
    math::Rect,
    renderer::{
        error::RendererError,
        framework::{
            framebuffer::{BlendFunc, CompareFunc, DrawParameters, SharedFrameBuffer},
            geometry_buffer::SharedGeometryBuffer,
            gpu_program::{SharedGpuProgram, UniformLocation, UniformValue},
            gpu_texture::{GpuTextureDescriptor, GpuTextureKind, PixelKind, SharedGpuTexture},
            server::SharedGraphicsServer,
        },
        RenderPassStatistics,
    },
    scene::{camera::Camera, mesh::SurfaceData, particles::ParticleEmitter},
};
use nalgebra::Vector3;

/// Renders particle emitters.
pub struct ParticleRenderer {
    quad: SharedGeometryBuffer,
    program: SharedGpuProgram,
    fallback_sprite: SharedGpuTexture,
    view_projection: UniformLocation,
    particle_position: UniformLocation,
    camera_right: UniformLocation,
    camera_up: UniformLocation,
    particle_size: UniformLocation,
    diffuse_texture: UniformLocation,
    depth_texture: UniformLocation,
    color: UniformLocation,
    alpha: UniformLocation,
    inv_far_minus_near: UniformLocation,
}

impl ParticleRenderer {
    /// Uploads the particle quad and compiles the program.
    pub fn new(server: &SharedGraphicsServer) -> Result<Self, RendererError> {
        let quad = server.create_geometry_buffer(&SurfaceData::make_unit_xy_quad())?;
        let fallback_sprite = server.create_texture(GpuTextureDescriptor {
            kind: GpuTextureKind::Rectangle {
                width: 1,
                height: 1,
            },
            pixel_kind: PixelKind::RGBA8,
            data: Some(&[255u8; 4]),
            anisotropy: 1.0,
        })?;
        let program = server.create_program(
            "ParticleShader",
            include_str!("shaders/particle_vs.glsl"),
            include_str!("shaders/particle_fs.glsl"),
        )?;
        Ok(Self {
            view_projection: program.uniform_location("viewProjection")?,
            particle_position: program.uniform_location("particlePosition")?,
            camera_right: program.uniform_location("cameraRight")?,
            camera_up: program.uniform_location("cameraUp")?,
            particle_size: program.uniform_location("particleSize")?,
            diffuse_texture: program.uniform_location("diffuseTexture")?,
            depth_texture: program.uniform_location("depthTexture")?,
            color: program.uniform_location("color")?,
            alpha: program.uniform_location("alpha")?,
            inv_far_minus_near: program.uniform_location("invFarMinusNear")?,
            quad,
            program,
            fallback_sprite,
        })
    }

    /// Draws every particle of every emitter into the target.
    pub fn render(
        &self,
        target: &SharedFrameBuffer,
        viewport: Rect,
        camera: &Camera,
        emitters: &[std::rc::Rc<ParticleEmitter>],
        scene_depth: &SharedGpuTexture,
    ) -> Result<RenderPassStatistics, RendererError> {
        let mut statistics = RenderPassStatistics::default();

        let view = camera.view_matrix();
        // Rows of the view rotation are the camera basis in world space.
        let right = Vector3::new(view[(0, 0)], view[(0, 1)], view[(0, 2)]);
        let up = Vector3::new(view[(1, 0)], view[(1, 1)], view[(1, 2)]);
        let inv_far_minus_near = 1.0 / (camera.z_far() - camera.z_near()).max(f32::EPSILON);

        let draw_parameters = DrawParameters {
            cull_face: None,
            depth_write: false,
            depth_test: Some(CompareFunc::Less),
            blend: Some(BlendFunc::additive()),
            ..Default::default()
        };

        for emitter in emitters {
            let texture = emitter
                .texture
                .clone()
                .unwrap_or_else(|| self.fallback_sprite.clone());

            for particle in emitter.particles.iter() {
                statistics += target.draw(
                    &self.quad,
                    viewport,
                    &self.program,
                    &draw_parameters,
                    &[
                        (
                            self.view_projection.clone(),
                            UniformValue::Matrix4(camera.view_projection_matrix()),
                        ),
                        (
                            self.particle_position.clone(),
                            UniformValue::Vector3(emitter.position + particle.position),
                        ),
                        (self.camera_right.clone(), UniformValue::Vector3(right)),
                        (self.camera_up.clone(), UniformValue::Vector3(up)),
                        (
                            self.particle_size.clone(),
                            UniformValue::Float(particle.size),
                        ),
                        (
                            self.diffuse_texture.clone(),
                            UniformValue::Sampler {
                                index: 0,
                                texture: texture.clone(),
                            },
                        ),
                        (
                            self.depth_texture.clone(),
                            UniformValue::Sampler {
                                index: 1,
                                texture: scene_depth.clone(),
                            },
                        ),
                        (
                            self.color.clone(),
                            UniformValue::Vector4(emitter.color.as_frgba()),
                        ),
                        (self.alpha.clone(), UniformValue::Float(particle.alpha)),
                        (
                            self.inv_far_minus_near.clone(),
                            UniformValue::Float(inv_far_minus_near),
                        ),
                    ],
                );
            }
        }

        Ok(statistics)
    }
}
