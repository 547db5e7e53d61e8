//! Skybox pass.

use crate::{
    math::Rect,
    renderer::{
        error::RendererError,
        framework::{
            framebuffer::{CompareFunc, DrawParameters, SharedFrameBuffer},
            geometry_buffer::SharedGeometryBuffer,
            gpu_program::{SharedGpuProgram, UniformLocation, UniformValue},
            server::SharedGraphicsServer,
        },
        RenderPassStatistics,
    },
    scene::{camera::Camera, environment::Environment, mesh::SurfaceData},
};

/// Renders the environment cubemap on a unit cube behind all geometry. The
/// camera translation is stripped from the view-projection so the box never
/// gets closer; depth test `LessOrEqual` with depth writes off lets it fill
/// exactly the pixels the lighting pass skipped.
pub struct SkyboxRenderer {
    cube: SharedGeometryBuffer,
    program: SharedGpuProgram,
    world_view_projection: UniformLocation,
    cubemap_texture: UniformLocation,
}

impl SkyboxRenderer {
    /// Uploads the cube and compiles the skybox program.
    pub fn new(server: &SharedGraphicsServer) -> Result<Self, RendererError> {
        let cube = server.create_geometry_buffer(&SurfaceData::make_cube())?;
        let program = server.create_program(
            "SkyboxShader",
            include_str!("shaders/skybox_vs.glsl"),
            include_str!("shaders/skybox_fs.glsl"),
        )?;
        Ok(Self {
            world_view_projection: program.uniform_location("worldViewProjection")?,
            cubemap_texture: program.uniform_location("cubemapTexture")?,
            cube,
            program,
        })
    }

    /// Draws the skybox into the target.
    pub fn render(
        &self,
        target: &SharedFrameBuffer,
        viewport: Rect,
        camera: &Camera,
        environment: &Environment,
    ) -> Result<RenderPassStatistics, RendererError> {
        let mut statistics = RenderPassStatistics::default();

        statistics += target.draw(
            &self.cube,
            viewport,
            &self.program,
            &DrawParameters {
                cull_face: None,
                depth_write: false,
                depth_test: Some(CompareFunc::LessOrEqual),
                ..Default::default()
            },
            &[
                (
                    self.world_view_projection.clone(),
                    UniformValue::Matrix4(camera.view_projection_without_translation()),
                ),
                (
                    self.cubemap_texture.clone(),
                    UniformValue::Sampler {
                        index: 0,
                        texture: environment.skybox.clone(),
                    },
                ),
            ],
        );

        Ok(statistics)
    }
}
