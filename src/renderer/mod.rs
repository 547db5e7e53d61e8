//! Frame rendering pipeline.
//!
//! [`SceneRenderer::render`] runs a fixed sequence of passes over a scene:
//! per-frame data collection, the shadow pass, the geometry (G-buffer) pass,
//! deferred lighting, the skybox, particles, and finally the post-process
//! handoff. Passes never reorder; each consumes only the outputs of earlier
//! ones.

pub mod cache;
pub mod error;
pub mod framework;
pub mod gbuffer;
pub mod light;
pub mod particles;
pub mod postprocess;
pub mod shadow;
pub mod skybox;

use crate::{
    color::Color,
    math::Rect,
    renderer::{
        cache::GeometryCache,
        error::RendererError,
        framework::{
            framebuffer::{Attachment, AttachmentKind, DrawCallStatistics, SharedFrameBuffer},
            gpu_texture::{GpuTextureDescriptor, GpuTextureKind, PixelKind, SharedGpuTexture},
            server::SharedGraphicsServer,
        },
        gbuffer::GBuffer,
        light::{DeferredLightRenderer, LightingInput},
        particles::ParticleRenderer,
        postprocess::PostProcessChain,
        shadow::{csm::CsmRenderer, map::ShadowMapRenderer, ShadowMap},
        skybox::SkyboxRenderer,
    },
    scene::{
        camera::Camera,
        environment::Environment,
        light::{DirectionalLight, PointLight, SpotLight},
        material::{FallbackTextures, Material},
        mesh::SurfaceData,
        model::Model,
        particles::ParticleEmitter,
        Scene, SceneComponent,
    },
    settings::{QualitySettings, ShadowMapStrategy},
};
use nalgebra::Matrix4;
use std::{ops::AddAssign, rc::Rc};

/// Counters accumulated by one render pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderPassStatistics {
    /// Draw calls submitted.
    pub draw_calls: usize,
    /// Triangles submitted.
    pub triangles_rendered: usize,
}

impl AddAssign<DrawCallStatistics> for RenderPassStatistics {
    fn add_assign(&mut self, rhs: DrawCallStatistics) {
        self.draw_calls += 1;
        self.triangles_rendered += rhs.triangles;
    }
}

impl AddAssign for RenderPassStatistics {
    fn add_assign(&mut self, rhs: Self) {
        self.draw_calls += rhs.draw_calls;
        self.triangles_rendered += rhs.triangles_rendered;
    }
}

/// Per-pass counters for the last rendered frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Shadow pass.
    pub shadow: RenderPassStatistics,
    /// Geometry pass.
    pub geometry: RenderPassStatistics,
    /// Lighting pass.
    pub lighting: RenderPassStatistics,
    /// Skybox pass.
    pub skybox: RenderPassStatistics,
    /// Particle pass.
    pub particles: RenderPassStatistics,
    /// Frames rendered since construction.
    pub frames_rendered: usize,
}

impl Statistics {
    /// Sum over all passes of the last frame.
    pub fn total(&self) -> RenderPassStatistics {
        let mut total = RenderPassStatistics::default();
        total += self.shadow;
        total += self.geometry;
        total += self.lighting;
        total += self.skybox;
        total += self.particles;
        total
    }
}

/// One drawable surface flattened out of a model tree: shared geometry, the
/// accumulated world transform and the material.
pub struct SurfaceInstance {
    /// Geometry.
    pub data: Rc<SurfaceData>,
    /// World transform of the owning node.
    pub world: Matrix4<f32>,
    /// Material of the surface.
    pub material: Material,
}

/// Everything collected from the scene for the current frame. Fully cleared
/// at the start of every frame, so nothing can leak from the previous one.
#[derive(Default)]
struct FrameData {
    camera: Option<Camera>,
    directional_lights: Vec<DirectionalLight>,
    point_lights: Vec<PointLight>,
    spot_lights: Vec<SpotLight>,
    environment: Option<Environment>,
    instances: Vec<SurfaceInstance>,
    emitters: Vec<Rc<ParticleEmitter>>,
}

impl FrameData {
    fn clear(&mut self) {
        self.camera = None;
        self.directional_lights.clear();
        self.point_lights.clear();
        self.spot_lights.clear();
        self.environment = None;
        self.instances.clear();
        self.emitters.clear();
    }

    fn collect(&mut self, scene: &Scene) {
        for component in scene.components() {
            match component {
                SceneComponent::Camera(camera) => {
                    if self.camera.is_some() {
                        log::warn!("scene contains multiple cameras, using the last one");
                    }
                    self.camera = Some(camera.clone());
                }
                SceneComponent::DirectionalLight(light) => {
                    self.directional_lights.push(light.clone());
                }
                SceneComponent::PointLight(light) => self.point_lights.push(light.clone()),
                SceneComponent::SpotLight(light) => self.spot_lights.push(light.clone()),
                SceneComponent::Environment(environment) => {
                    self.environment = Some(environment.clone());
                }
                SceneComponent::Model(model) => self.flatten_model(model),
                SceneComponent::ParticleEmitter(emitter) => self.emitters.push(emitter.clone()),
            }
        }
    }

    fn flatten_model(&mut self, model: &Model) {
        for (node, world) in model.traverse() {
            for surface in node.surfaces.iter() {
                self.instances.push(SurfaceInstance {
                    data: surface.data.clone(),
                    world,
                    material: surface.material.clone(),
                });
            }
        }
    }
}

enum ShadowRenderer {
    Cascaded(CsmRenderer),
    Single(ShadowMapRenderer),
}

/// The multi-pass deferred renderer. Construction acquires every GPU resource
/// the pipeline needs (render targets, programs, the BRDF LUT); dropping the
/// renderer, or calling [`destroy`](Self::destroy), releases them.
pub struct SceneRenderer {
    server: SharedGraphicsServer,
    settings: QualitySettings,
    frame_data: FrameData,
    geometry_cache: GeometryCache,
    shadow_renderer: ShadowRenderer,
    gbuffer: GBuffer,
    light_renderer: DeferredLightRenderer,
    skybox_renderer: SkyboxRenderer,
    particle_renderer: ParticleRenderer,
    fallback_textures: FallbackTextures,
    frame_buffer: SharedFrameBuffer,
    frame_texture: SharedGpuTexture,
    post_process_chain: Option<Box<dyn PostProcessChain>>,
    statistics: Statistics,
    width: usize,
    height: usize,
}

fn make_fallback_texture(
    server: &SharedGraphicsServer,
    pixel: [u8; 4],
    anisotropy: f32,
) -> Result<SharedGpuTexture, RendererError> {
    Ok(server.create_texture(GpuTextureDescriptor {
        kind: GpuTextureKind::Rectangle {
            width: 1,
            height: 1,
        },
        pixel_kind: PixelKind::RGBA8,
        data: Some(&pixel),
        anisotropy,
    })?)
}

impl SceneRenderer {
    /// Creates a renderer for the given output resolution. All framebuffers
    /// and shader programs are allocated here and the BRDF integration LUT is
    /// baked; rendering allocates nothing except geometry on first sight.
    pub fn new(
        server: SharedGraphicsServer,
        width: usize,
        height: usize,
        settings: QualitySettings,
    ) -> Result<Self, RendererError> {
        log::info!("creating scene renderer, output {width}x{height}");

        let shadow_renderer = match settings.shadow_strategy {
            ShadowMapStrategy::Cascaded => {
                ShadowRenderer::Cascaded(CsmRenderer::new(&server, &settings.csm_settings)?)
            }
            ShadowMapStrategy::Single => {
                ShadowRenderer::Single(ShadowMapRenderer::new(&server, settings.shadow_map_size)?)
            }
        };

        let gbuffer = GBuffer::new(&server, width, height)?;
        let light_renderer = DeferredLightRenderer::new(&server)?;
        let skybox_renderer = SkyboxRenderer::new(&server)?;
        let particle_renderer = ParticleRenderer::new(&server)?;

        let fallback_textures = FallbackTextures {
            white: make_fallback_texture(&server, [255, 255, 255, 255], settings.anisotropy)?,
            normal: make_fallback_texture(&server, [128, 128, 255, 255], settings.anisotropy)?,
            orm: make_fallback_texture(&server, [255, 255, 0, 255], settings.anisotropy)?,
            black: make_fallback_texture(&server, [0, 0, 0, 255], settings.anisotropy)?,
        };

        let frame_texture = server.create_texture(GpuTextureDescriptor::render_target(
            GpuTextureKind::Rectangle { width, height },
            PixelKind::RGBA16F,
        ))?;
        let frame_depth = server.create_texture(GpuTextureDescriptor::render_target(
            GpuTextureKind::Rectangle { width, height },
            PixelKind::D24S8,
        ))?;
        let frame_buffer = server.create_frame_buffer(
            Some(Attachment {
                kind: AttachmentKind::DepthStencil,
                texture: frame_depth,
            }),
            vec![Attachment {
                kind: AttachmentKind::Color,
                texture: frame_texture.clone(),
            }],
        )?;

        Ok(Self {
            geometry_cache: GeometryCache::new(server.clone()),
            server,
            settings,
            frame_data: FrameData::default(),
            shadow_renderer,
            gbuffer,
            light_renderer,
            skybox_renderer,
            particle_renderer,
            fallback_textures,
            frame_buffer,
            frame_texture,
            post_process_chain: None,
            statistics: Statistics::default(),
            width,
            height,
        })
    }

    /// Installs a post-process chain; the final HDR texture is forwarded to
    /// it after every frame.
    pub fn set_post_process_chain(&mut self, chain: Box<dyn PostProcessChain>) {
        self.post_process_chain = Some(chain);
    }

    /// The G-buffer, for diagnostics.
    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    /// Depth textures of the shadow pass, for diagnostics: one per cascade
    /// (near to far), or a single one under
    /// [`ShadowMapStrategy::Single`](crate::settings::ShadowMapStrategy).
    pub fn shadow_textures(&self) -> Vec<SharedGpuTexture> {
        match &self.shadow_renderer {
            ShadowRenderer::Cascaded(csm) => csm.cascade_textures(),
            ShadowRenderer::Single(single) => vec![single.texture().clone()],
        }
    }

    /// The graphics server the renderer was built on, e.g. to inspect
    /// [`alive_resources`](crate::renderer::framework::server::GraphicsServer::alive_resources).
    pub fn server(&self) -> &SharedGraphicsServer {
        &self.server
    }

    /// The final HDR color texture.
    pub fn frame_texture(&self) -> &SharedGpuTexture {
        &self.frame_texture
    }

    /// Counters of the last rendered frame.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Settings the renderer was built with.
    pub fn settings(&self) -> &QualitySettings {
        &self.settings
    }

    fn viewport(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Renders one frame of the scene.
    ///
    /// Fails with [`RendererError::NoCamera`] before submitting any GPU work
    /// when the scene contains no camera. Every other absence degrades
    /// gracefully: no lights means an emissive-only image, no directional
    /// light means no shadow pass, no environment means no skybox or IBL.
    pub fn render(&mut self, scene: &Scene) -> Result<Statistics, RendererError> {
        self.frame_data.clear();
        self.frame_data.collect(scene);

        let camera = self.frame_data.camera.clone().ok_or(RendererError::NoCamera)?;

        let mut statistics = Statistics {
            frames_rendered: self.statistics.frames_rendered + 1,
            ..Default::default()
        };

        let shadow_map = match self.frame_data.directional_lights.first() {
            Some(light) => Some(match &self.shadow_renderer {
                ShadowRenderer::Cascaded(csm) => {
                    let (map, stats) = csm.render(
                        &camera,
                        light,
                        &self.frame_data.instances,
                        &mut self.geometry_cache,
                        &self.settings.csm_settings,
                    )?;
                    statistics.shadow = stats;
                    ShadowMap::Cascaded(map)
                }
                ShadowRenderer::Single(single) => {
                    let (map, stats) = single.render(
                        light,
                        &self.frame_data.instances,
                        &mut self.geometry_cache,
                        self.settings.shadow_world_radius,
                    )?;
                    statistics.shadow = stats;
                    ShadowMap::Single(map)
                }
            }),
            None => None,
        };

        statistics.geometry = self.gbuffer.fill(
            &camera,
            &self.frame_data.instances,
            &mut self.geometry_cache,
            &self.fallback_textures,
        )?;

        let viewport = self.viewport();
        self.frame_buffer
            .clear(viewport, Some(Color::BLACK), Some(1.0), Some(0));

        statistics.lighting = self.light_renderer.render(LightingInput {
            target: &self.frame_buffer,
            viewport,
            gbuffer: &self.gbuffer,
            camera: &camera,
            directional_lights: &self.frame_data.directional_lights,
            point_lights: &self.frame_data.point_lights,
            spot_lights: &self.frame_data.spot_lights,
            environment: self.frame_data.environment.as_ref(),
            shadow_map: shadow_map.as_ref(),
        })?;

        if let Some(environment) = self.frame_data.environment.as_ref() {
            statistics.skybox =
                self.skybox_renderer
                    .render(&self.frame_buffer, viewport, &camera, environment)?;
        }

        if !self.frame_data.emitters.is_empty() {
            statistics.particles = self.particle_renderer.render(
                &self.frame_buffer,
                viewport,
                &camera,
                &self.frame_data.emitters,
                self.gbuffer.depth_texture(),
            )?;
        }

        if let Some(chain) = self.post_process_chain.as_mut() {
            chain.process(&self.frame_texture)?;
        }

        self.geometry_cache.update();

        self.statistics = statistics;
        Ok(statistics)
    }

    /// Releases every GPU resource the renderer holds. Taking the renderer by
    /// value makes releasing twice impossible; plain `drop` has the same
    /// effect.
    pub fn destroy(self) {
        log::info!("destroying scene renderer");
        drop(self);
        // Shared resources the host still references (scene textures) stay
        // alive; everything renderer-owned is gone with the last Rc.
    }
}
