//! Single-map shadow strategy.
//!
//! One depth map covering a fixed-radius orthographic volume around the world
//! origin. Much cheaper than cascades and good enough for small scenes where
//! everything interesting sits near the origin.

use crate::{
    math::Rect,
    renderer::{
        cache::GeometryCache,
        error::RendererError,
        framework::{
            framebuffer::{
                Attachment, AttachmentKind, ColorMask, CompareFunc, CullFace, DrawParameters,
                SharedFrameBuffer,
            },
            gpu_program::{SharedGpuProgram, UniformLocation, UniformValue},
            gpu_texture::{GpuTextureDescriptor, GpuTextureKind, PixelKind, SharedGpuTexture},
            server::SharedGraphicsServer,
        },
        RenderPassStatistics, SurfaceInstance,
    },
    scene::light::DirectionalLight,
};
use nalgebra::{Matrix4, Point3};

use super::csm::light_up_vector;

/// An immutable snapshot of the rendered single shadow map.
#[derive(Clone)]
pub struct SingleShadowMap {
    /// Light view-projection the map was rendered with.
    pub view_projection: Matrix4<f32>,
    /// Depth texture holding the map.
    pub texture: SharedGpuTexture,
}

/// Renders one directional shadow map over a fixed world-space volume.
pub struct ShadowMapRenderer {
    framebuffer: SharedFrameBuffer,
    texture: SharedGpuTexture,
    program: SharedGpuProgram,
    world_view_projection: UniformLocation,
    size: usize,
}

impl ShadowMapRenderer {
    /// Allocates the depth target and program.
    pub fn new(server: &SharedGraphicsServer, size: usize) -> Result<Self, RendererError> {
        let size = size.max(2);
        let texture = server.create_texture(GpuTextureDescriptor::render_target(
            GpuTextureKind::Rectangle {
                width: size,
                height: size,
            },
            PixelKind::D32F,
        ))?;
        let framebuffer = server.create_frame_buffer(
            Some(Attachment {
                kind: AttachmentKind::Depth,
                texture: texture.clone(),
            }),
            Vec::new(),
        )?;
        let program = server.create_program(
            "ShadowMapShader",
            include_str!("../shaders/shadow_map_vs.glsl"),
            include_str!("../shaders/shadow_map_fs.glsl"),
        )?;
        let world_view_projection = program.uniform_location("worldViewProjection")?;

        Ok(Self {
            framebuffer,
            texture,
            program,
            world_view_projection,
            size,
        })
    }

    /// The depth texture the map is rendered into, for diagnostic display.
    pub fn texture(&self) -> &SharedGpuTexture {
        &self.texture
    }

    /// Renders the map. The light observes the origin from
    /// `-direction * world_radius`; the orthographic volume is a cube of half
    /// extent `world_radius`. Geometry filtering matches the cascaded pass.
    pub fn render(
        &self,
        light: &DirectionalLight,
        instances: &[SurfaceInstance],
        geometry_cache: &mut GeometryCache,
        world_radius: f32,
    ) -> Result<(SingleShadowMap, RenderPassStatistics), RendererError> {
        let mut statistics = RenderPassStatistics::default();

        let r = world_radius.max(f32::EPSILON);
        let direction = light.direction();
        let view = Matrix4::look_at_rh(
            &Point3::from(-direction * r),
            &Point3::origin(),
            &light_up_vector(direction),
        );
        let projection = Matrix4::new_orthographic(-r, r, -r, r, 0.0, 2.0 * r);
        let view_projection = projection * view;

        let viewport = Rect::new(0, 0, self.size as i32, self.size as i32);
        self.framebuffer.clear(viewport, None, Some(1.0), None);

        for instance in instances {
            if !instance.material.casts_shadows() {
                continue;
            }

            let geometry = geometry_cache.get(&instance.data)?;
            statistics += self.framebuffer.draw(
                &geometry,
                viewport,
                &self.program,
                &DrawParameters {
                    cull_face: if instance.material.double_sided {
                        None
                    } else {
                        Some(CullFace::Front)
                    },
                    color_write: ColorMask::all(false),
                    depth_write: true,
                    depth_test: Some(CompareFunc::Less),
                    stencil_test: None,
                    blend: None,
                },
                &[(
                    self.world_view_projection.clone(),
                    UniformValue::Matrix4(view_projection * instance.world),
                )],
            );
        }

        Ok((
            SingleShadowMap {
                view_projection,
                texture: self.texture.clone(),
            },
            statistics,
        ))
    }
}
