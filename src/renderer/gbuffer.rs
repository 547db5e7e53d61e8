//! Geometry pass.
//!
//! Fills the G-buffer: albedo (with metallic in alpha), world-space normal
//! (with roughness in alpha), emissive, and depth-stencil. Alpha-blended
//! surfaces have no meaningful G-buffer entry and are skipped; transparency
//! is covered by the particle pass.

use crate::{
    color::Color,
    math::{aabb::AxisAlignedBoundingBox, Rect},
    renderer::{
        cache::GeometryCache,
        error::RendererError,
        framework::{
            framebuffer::{
                Attachment, AttachmentKind, CompareFunc, CullFace, DrawParameters,
                SharedFrameBuffer,
            },
            gpu_program::{SharedGpuProgram, UniformLocation, UniformValue},
            gpu_texture::{GpuTextureDescriptor, GpuTextureKind, PixelKind, SharedGpuTexture},
            server::SharedGraphicsServer,
        },
        RenderPassStatistics, SurfaceInstance,
    },
    scene::{
        camera::Camera,
        material::{AlphaMode, FallbackTextures, MaterialSlots},
    },
};
use nalgebra::Point3;

/// The G-buffer and the geometry pass that fills it.
pub struct GBuffer {
    framebuffer: SharedFrameBuffer,
    color_texture: SharedGpuTexture,
    normal_texture: SharedGpuTexture,
    emissive_texture: SharedGpuTexture,
    depth_texture: SharedGpuTexture,
    program: SharedGpuProgram,
    world_matrix: UniformLocation,
    world_view_projection: UniformLocation,
    alpha_mask: UniformLocation,
    material_slots: MaterialSlots,
    width: usize,
    height: usize,
}

impl GBuffer {
    /// Allocates the render targets and the geometry program at the given
    /// resolution.
    pub fn new(
        server: &SharedGraphicsServer,
        width: usize,
        height: usize,
    ) -> Result<Self, RendererError> {
        let rectangle = GpuTextureKind::Rectangle { width, height };

        let color_texture =
            server.create_texture(GpuTextureDescriptor::render_target(rectangle, PixelKind::RGBA8))?;
        let normal_texture = server
            .create_texture(GpuTextureDescriptor::render_target(rectangle, PixelKind::RGBA16F))?;
        let emissive_texture = server
            .create_texture(GpuTextureDescriptor::render_target(rectangle, PixelKind::RGB16F))?;
        let depth_texture = server
            .create_texture(GpuTextureDescriptor::render_target(rectangle, PixelKind::D24S8))?;

        let framebuffer = server.create_frame_buffer(
            Some(Attachment {
                kind: AttachmentKind::DepthStencil,
                texture: depth_texture.clone(),
            }),
            vec![
                Attachment {
                    kind: AttachmentKind::Color,
                    texture: color_texture.clone(),
                },
                Attachment {
                    kind: AttachmentKind::Color,
                    texture: normal_texture.clone(),
                },
                Attachment {
                    kind: AttachmentKind::Color,
                    texture: emissive_texture.clone(),
                },
            ],
        )?;

        let program = server.create_program(
            "GBufferShader",
            include_str!("shaders/gbuffer_vs.glsl"),
            include_str!("shaders/gbuffer_fs.glsl"),
        )?;

        let material_slots = MaterialSlots {
            base_color: program.uniform_location("baseColor")?,
            diffuse_texture: (program.uniform_location("diffuseTexture")?, 0),
            normal_texture: (program.uniform_location("normalTexture")?, 1),
            orm_texture: (program.uniform_location("ormTexture")?, 2),
            emissive_texture: (program.uniform_location("emissiveTexture")?, 3),
            emissive_strength: program.uniform_location("emissiveStrength")?,
        };

        Ok(Self {
            world_matrix: program.uniform_location("worldMatrix")?,
            world_view_projection: program.uniform_location("worldViewProjection")?,
            alpha_mask: program.uniform_location("alphaMask")?,
            framebuffer,
            color_texture,
            normal_texture,
            emissive_texture,
            depth_texture,
            program,
            material_slots,
            width,
            height,
        })
    }

    /// The framebuffer, the depth blit source for later passes.
    pub fn framebuffer(&self) -> &SharedFrameBuffer {
        &self.framebuffer
    }

    /// Albedo + metallic target.
    pub fn color_texture(&self) -> &SharedGpuTexture {
        &self.color_texture
    }

    /// Normal + roughness target.
    pub fn normal_texture(&self) -> &SharedGpuTexture {
        &self.normal_texture
    }

    /// Emissive target.
    pub fn emissive_texture(&self) -> &SharedGpuTexture {
        &self.emissive_texture
    }

    /// Depth-stencil target.
    pub fn depth_texture(&self) -> &SharedGpuTexture {
        &self.depth_texture
    }

    fn viewport(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Clears the targets and draws every visible opaque/masked surface with
    /// full material bindings. Surfaces are frustum-culled against the camera
    /// using their world-space bounds.
    pub fn fill(
        &self,
        camera: &Camera,
        instances: &[SurfaceInstance],
        geometry_cache: &mut GeometryCache,
        fallback: &FallbackTextures,
    ) -> Result<RenderPassStatistics, RendererError> {
        let mut statistics = RenderPassStatistics::default();

        let viewport = self.viewport();
        self.framebuffer
            .clear(viewport, Some(Color::TRANSPARENT), Some(1.0), Some(0));

        let frustum = camera.frustum();
        let view_projection = camera.view_projection_matrix();

        for instance in instances {
            if instance.material.alpha_mode == AlphaMode::Blend {
                continue;
            }

            let local_corners = instance.data.bounding_box().corners();
            let world_bounds = AxisAlignedBoundingBox::from_points(
                &local_corners
                    .map(|corner| instance.world.transform_point(&Point3::from(corner)).coords),
            );
            if !frustum.is_intersects_aabb(&world_bounds) {
                continue;
            }

            let mut uniforms = vec![
                (
                    self.world_matrix.clone(),
                    UniformValue::Matrix4(instance.world),
                ),
                (
                    self.world_view_projection.clone(),
                    UniformValue::Matrix4(view_projection * instance.world),
                ),
                (
                    self.alpha_mask.clone(),
                    UniformValue::Bool(instance.material.alpha_mode == AlphaMode::Mask),
                ),
            ];
            instance
                .material
                .apply_to(&self.material_slots, fallback, &mut uniforms);

            let geometry = geometry_cache.get(&instance.data)?;
            statistics += self.framebuffer.draw(
                &geometry,
                viewport,
                &self.program,
                &DrawParameters {
                    cull_face: if instance.material.double_sided {
                        None
                    } else {
                        Some(CullFace::Back)
                    },
                    depth_write: true,
                    depth_test: Some(CompareFunc::Less),
                    ..Default::default()
                },
                &uniforms,
            );
        }

        Ok(statistics)
    }
}
