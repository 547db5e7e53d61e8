//! Deferred lighting pass.
//!
//! A single full-screen quad draw that consumes the G-buffer, the shadow map
//! snapshot and the IBL cubemaps, evaluates PBR shading for every light and
//! writes HDR color into the final frame buffer. Scene depth is blitted into
//! the target first so later passes depth-test against real geometry.

use crate::{
    renderer::{
        error::RendererError,
        framework::{
            framebuffer::{
                Attachment, AttachmentKind, CompareFunc, DrawParameters, SharedFrameBuffer,
            },
            geometry_buffer::SharedGeometryBuffer,
            gpu_program::{SharedGpuProgram, UniformLocation, UniformValue},
            gpu_texture::{GpuTextureDescriptor, GpuTextureKind, PixelKind, SharedGpuTexture},
            server::SharedGraphicsServer,
        },
        gbuffer::GBuffer,
        shadow::{csm::NUM_CASCADES, ShadowMap},
        RenderPassStatistics,
    },
    math::Rect,
    scene::{
        camera::Camera,
        environment::Environment,
        light::{DirectionalLight, PointLight, SpotLight},
        mesh::SurfaceData,
    },
};
use nalgebra::Matrix4;

/// Directional lights the shader can evaluate in one frame.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
/// Point lights the shader can evaluate in one frame.
pub const MAX_POINT_LIGHTS: usize = 16;
/// Spot lights the shader can evaluate in one frame.
pub const MAX_SPOT_LIGHTS: usize = 8;

const BRDF_LUT_SIZE: usize = 512;

struct DirectionalLightSlots {
    direction: UniformLocation,
    color: UniformLocation,
    intensity: UniformLocation,
}

struct PointLightSlots {
    position: UniformLocation,
    color: UniformLocation,
    intensity: UniformLocation,
    radius: UniformLocation,
}

struct SpotLightSlots {
    position: UniformLocation,
    direction: UniformLocation,
    color: UniformLocation,
    intensity: UniformLocation,
    distance: UniformLocation,
    hotspot_cos: UniformLocation,
    falloff_cos: UniformLocation,
}

struct ShadowSlots {
    shadows_enabled: UniformLocation,
    cascaded_shadows: UniformLocation,
    cascade_textures: Vec<UniformLocation>,
    cascade_view_projections: Vec<UniformLocation>,
    cascade_distances: Vec<UniformLocation>,
    map_texture: UniformLocation,
    map_view_projection: UniformLocation,
}

/// Everything the lighting pass needs from the current frame.
pub struct LightingInput<'a> {
    /// Target framebuffer (the final HDR frame).
    pub target: &'a SharedFrameBuffer,
    /// Target viewport.
    pub viewport: Rect,
    /// Filled G-buffer.
    pub gbuffer: &'a GBuffer,
    /// Frame camera.
    pub camera: &'a Camera,
    /// Directional lights of the frame.
    pub directional_lights: &'a [DirectionalLight],
    /// Point lights of the frame.
    pub point_lights: &'a [PointLight],
    /// Spot lights of the frame.
    pub spot_lights: &'a [SpotLight],
    /// Scene environment, if any.
    pub environment: Option<&'a Environment>,
    /// Shadow pass output, if a directional light produced one.
    pub shadow_map: Option<&'a ShadowMap>,
}

/// Renders deferred lighting. All uniform locations, including every
/// light-array element, are resolved once here at construction; per-frame
/// work only writes values into them.
pub struct DeferredLightRenderer {
    server: SharedGraphicsServer,
    program: SharedGpuProgram,
    quad: SharedGeometryBuffer,
    brdf_lut: SharedGpuTexture,
    fallback_cube: SharedGpuTexture,
    fallback_shadow: SharedGpuTexture,

    depth_texture: UniformLocation,
    color_texture: UniformLocation,
    normal_texture: UniformLocation,
    emissive_texture: UniformLocation,
    brdf_lut_location: UniformLocation,
    use_ibl: UniformLocation,
    irradiance_cube: UniformLocation,
    prefiltered_cube: UniformLocation,
    world_view_projection: UniformLocation,
    inv_view_proj: UniformLocation,
    camera_position: UniformLocation,
    camera_forward: UniformLocation,

    shadow_slots: ShadowSlots,

    directional_light_count: UniformLocation,
    directional_lights: Vec<DirectionalLightSlots>,
    point_light_count: UniformLocation,
    point_lights: Vec<PointLightSlots>,
    spot_light_count: UniformLocation,
    spot_lights: Vec<SpotLightSlots>,
}

fn bake_brdf_lut(
    server: &SharedGraphicsServer,
    quad: &SharedGeometryBuffer,
) -> Result<SharedGpuTexture, RendererError> {
    let lut = server.create_texture(GpuTextureDescriptor::render_target(
        GpuTextureKind::Rectangle {
            width: BRDF_LUT_SIZE,
            height: BRDF_LUT_SIZE,
        },
        PixelKind::RG16F,
    ))?;

    // The bake framebuffer and program live only for this one draw.
    let framebuffer = server.create_frame_buffer(
        None,
        vec![Attachment {
            kind: AttachmentKind::Color,
            texture: lut.clone(),
        }],
    )?;
    let program = server.create_program(
        "BrdfLutShader",
        include_str!("shaders/fullscreen_vs.glsl"),
        include_str!("shaders/brdf_lut_fs.glsl"),
    )?;

    let viewport = Rect::new(0, 0, BRDF_LUT_SIZE as i32, BRDF_LUT_SIZE as i32);
    framebuffer.draw(
        quad,
        viewport,
        &program,
        &DrawParameters {
            cull_face: None,
            depth_write: false,
            depth_test: None,
            ..Default::default()
        },
        &[(
            program.uniform_location("worldViewProjection")?,
            UniformValue::Matrix4(Matrix4::new_scaling(2.0)),
        )],
    );

    Ok(lut)
}

impl DeferredLightRenderer {
    /// Compiles the lighting program, resolves every uniform slot and bakes
    /// the BRDF integration lookup table.
    pub fn new(server: &SharedGraphicsServer) -> Result<Self, RendererError> {
        let quad = server.create_geometry_buffer(&SurfaceData::make_unit_xy_quad())?;
        let brdf_lut = bake_brdf_lut(server, &quad)?;

        let fallback_cube = server.create_texture(GpuTextureDescriptor {
            kind: GpuTextureKind::Cube { size: 1 },
            pixel_kind: PixelKind::RGBA8,
            data: Some(&[0u8; 24]),
            anisotropy: 1.0,
        })?;
        let fallback_shadow = server.create_texture(GpuTextureDescriptor {
            kind: GpuTextureKind::Rectangle {
                width: 1,
                height: 1,
            },
            pixel_kind: PixelKind::RGBA8,
            data: Some(&[255u8; 4]),
            anisotropy: 1.0,
        })?;

        let program = server.create_program(
            "DeferredLightShader",
            include_str!("shaders/fullscreen_vs.glsl"),
            include_str!("shaders/deferred_light_fs.glsl"),
        )?;

        let directional_lights = (0..MAX_DIRECTIONAL_LIGHTS)
            .map(|i| {
                Ok(DirectionalLightSlots {
                    direction: program
                        .uniform_location(&format!("directionalLights[{i}].direction"))?,
                    color: program.uniform_location(&format!("directionalLights[{i}].color"))?,
                    intensity: program
                        .uniform_location(&format!("directionalLights[{i}].intensity"))?,
                })
            })
            .collect::<Result<Vec<_>, RendererError>>()?;

        let point_lights = (0..MAX_POINT_LIGHTS)
            .map(|i| {
                Ok(PointLightSlots {
                    position: program.uniform_location(&format!("pointLights[{i}].position"))?,
                    color: program.uniform_location(&format!("pointLights[{i}].color"))?,
                    intensity: program.uniform_location(&format!("pointLights[{i}].intensity"))?,
                    radius: program.uniform_location(&format!("pointLights[{i}].radius"))?,
                })
            })
            .collect::<Result<Vec<_>, RendererError>>()?;

        let spot_lights = (0..MAX_SPOT_LIGHTS)
            .map(|i| {
                Ok(SpotLightSlots {
                    position: program.uniform_location(&format!("spotLights[{i}].position"))?,
                    direction: program.uniform_location(&format!("spotLights[{i}].direction"))?,
                    color: program.uniform_location(&format!("spotLights[{i}].color"))?,
                    intensity: program.uniform_location(&format!("spotLights[{i}].intensity"))?,
                    distance: program.uniform_location(&format!("spotLights[{i}].distance"))?,
                    hotspot_cos: program
                        .uniform_location(&format!("spotLights[{i}].hotspotCos"))?,
                    falloff_cos: program
                        .uniform_location(&format!("spotLights[{i}].falloffCos"))?,
                })
            })
            .collect::<Result<Vec<_>, RendererError>>()?;

        let shadow_slots = ShadowSlots {
            shadows_enabled: program.uniform_location("shadowsEnabled")?,
            cascaded_shadows: program.uniform_location("cascadedShadows")?,
            cascade_textures: (0..NUM_CASCADES)
                .map(|i| program.uniform_location(&format!("shadowCascade{i}")))
                .collect::<Result<Vec<_>, _>>()?,
            cascade_view_projections: (0..NUM_CASCADES)
                .map(|i| program.uniform_location(&format!("cascadeViewProjection[{i}]")))
                .collect::<Result<Vec<_>, _>>()?,
            cascade_distances: (0..NUM_CASCADES)
                .map(|i| program.uniform_location(&format!("cascadeDistances[{i}]")))
                .collect::<Result<Vec<_>, _>>()?,
            map_texture: program.uniform_location("shadowMapTexture")?,
            map_view_projection: program.uniform_location("shadowMapViewProjection")?,
        };

        let directional_light_count = program.uniform_location("directionalLightCount")?;
        let point_light_count = program.uniform_location("pointLightCount")?;
        let spot_light_count = program.uniform_location("spotLightCount")?;

        Ok(Self {
            depth_texture: program.uniform_location("depthTexture")?,
            color_texture: program.uniform_location("colorTexture")?,
            normal_texture: program.uniform_location("normalTexture")?,
            emissive_texture: program.uniform_location("emissiveTexture")?,
            brdf_lut_location: program.uniform_location("brdfLut")?,
            use_ibl: program.uniform_location("useIbl")?,
            irradiance_cube: program.uniform_location("irradianceCube")?,
            prefiltered_cube: program.uniform_location("prefilteredCube")?,
            world_view_projection: program.uniform_location("worldViewProjection")?,
            inv_view_proj: program.uniform_location("invViewProj")?,
            camera_position: program.uniform_location("cameraPosition")?,
            camera_forward: program.uniform_location("cameraForward")?,
            server: server.clone(),
            program,
            quad,
            brdf_lut,
            fallback_cube,
            fallback_shadow,
            shadow_slots,
            directional_light_count,
            directional_lights,
            point_light_count,
            point_lights,
            spot_light_count,
            spot_lights,
        })
    }

    /// Blits scene depth into the target, then shades the whole frame with
    /// one quad draw. The quad sits on the far plane, so depth test
    /// `NotEqual` against the cleared value skips exactly the pixels no
    /// geometry touched.
    pub fn render(&self, input: LightingInput<'_>) -> Result<RenderPassStatistics, RendererError> {
        let mut statistics = RenderPassStatistics::default();

        self.server
            .blit_depth(input.gbuffer.framebuffer(), input.target);

        let mut uniforms: Vec<(UniformLocation, UniformValue)> = vec![
            (
                self.world_view_projection.clone(),
                UniformValue::Matrix4(Matrix4::new_scaling(2.0)),
            ),
            (
                self.depth_texture.clone(),
                UniformValue::Sampler {
                    index: 0,
                    texture: input.gbuffer.depth_texture().clone(),
                },
            ),
            (
                self.color_texture.clone(),
                UniformValue::Sampler {
                    index: 1,
                    texture: input.gbuffer.color_texture().clone(),
                },
            ),
            (
                self.normal_texture.clone(),
                UniformValue::Sampler {
                    index: 2,
                    texture: input.gbuffer.normal_texture().clone(),
                },
            ),
            (
                self.emissive_texture.clone(),
                UniformValue::Sampler {
                    index: 3,
                    texture: input.gbuffer.emissive_texture().clone(),
                },
            ),
            (
                self.brdf_lut_location.clone(),
                UniformValue::Sampler {
                    index: 4,
                    texture: self.brdf_lut.clone(),
                },
            ),
            (
                self.inv_view_proj.clone(),
                UniformValue::Matrix4(input.camera.inverted_view_projection_matrix()),
            ),
            (
                self.camera_position.clone(),
                UniformValue::Vector3(input.camera.position()),
            ),
            (
                self.camera_forward.clone(),
                UniformValue::Vector3(input.camera.look_direction()),
            ),
        ];

        self.write_environment(input.environment, &mut uniforms);
        self.write_shadow_map(input.shadow_map, &mut uniforms);
        self.write_lights(&input, &mut uniforms);

        statistics += input.target.draw(
            &self.quad,
            input.viewport,
            &self.program,
            &DrawParameters {
                cull_face: None,
                depth_write: false,
                depth_test: Some(CompareFunc::NotEqual),
                ..Default::default()
            },
            &uniforms,
        );

        Ok(statistics)
    }

    fn write_environment(
        &self,
        environment: Option<&Environment>,
        uniforms: &mut Vec<(UniformLocation, UniformValue)>,
    ) {
        let (use_ibl, irradiance, prefiltered) = match environment {
            Some(environment) => (
                true,
                environment
                    .irradiance
                    .clone()
                    .unwrap_or_else(|| environment.skybox.clone()),
                environment
                    .prefiltered
                    .clone()
                    .unwrap_or_else(|| environment.skybox.clone()),
            ),
            None => (false, self.fallback_cube.clone(), self.fallback_cube.clone()),
        };

        uniforms.push((self.use_ibl.clone(), UniformValue::Bool(use_ibl)));
        uniforms.push((
            self.irradiance_cube.clone(),
            UniformValue::Sampler {
                index: 5,
                texture: irradiance,
            },
        ));
        uniforms.push((
            self.prefiltered_cube.clone(),
            UniformValue::Sampler {
                index: 6,
                texture: prefiltered,
            },
        ));
    }

    fn write_shadow_map(
        &self,
        shadow_map: Option<&ShadowMap>,
        uniforms: &mut Vec<(UniformLocation, UniformValue)>,
    ) {
        let slots = &self.shadow_slots;

        uniforms.push((
            slots.shadows_enabled.clone(),
            UniformValue::Bool(shadow_map.is_some()),
        ));
        uniforms.push((
            slots.cascaded_shadows.clone(),
            UniformValue::Bool(matches!(shadow_map, Some(ShadowMap::Cascaded(_)))),
        ));

        // Every sampler gets a binding even when unused.
        let mut cascade_textures =
            vec![self.fallback_shadow.clone(); slots.cascade_textures.len()];
        let mut map_texture = self.fallback_shadow.clone();

        match shadow_map {
            Some(ShadowMap::Cascaded(map)) => {
                for (i, cascade) in map.cascades().iter().enumerate() {
                    cascade_textures[i] = cascade.texture.clone();
                    uniforms.push((
                        slots.cascade_view_projections[i].clone(),
                        UniformValue::Matrix4(cascade.view_projection),
                    ));
                    uniforms.push((
                        slots.cascade_distances[i].clone(),
                        UniformValue::Float(cascade.z_far),
                    ));
                }
            }
            Some(ShadowMap::Single(map)) => {
                map_texture = map.texture.clone();
                uniforms.push((
                    slots.map_view_projection.clone(),
                    UniformValue::Matrix4(map.view_projection),
                ));
            }
            None => {}
        }

        for (i, texture) in cascade_textures.into_iter().enumerate() {
            uniforms.push((
                slots.cascade_textures[i].clone(),
                UniformValue::Sampler {
                    index: 7 + i as u32,
                    texture,
                },
            ));
        }
        uniforms.push((
            slots.map_texture.clone(),
            UniformValue::Sampler {
                index: 11,
                texture: map_texture,
            },
        ));
    }

    fn write_lights(
        &self,
        input: &LightingInput<'_>,
        uniforms: &mut Vec<(UniformLocation, UniformValue)>,
    ) {
        if input.directional_lights.len() > MAX_DIRECTIONAL_LIGHTS
            || input.point_lights.len() > MAX_POINT_LIGHTS
            || input.spot_lights.len() > MAX_SPOT_LIGHTS
        {
            log::warn!(
                "too many lights ({} directional, {} point, {} spot), extra ones are ignored",
                input.directional_lights.len(),
                input.point_lights.len(),
                input.spot_lights.len()
            );
        }

        let directional = &input.directional_lights
            [..input.directional_lights.len().min(MAX_DIRECTIONAL_LIGHTS)];
        uniforms.push((
            self.directional_light_count.clone(),
            UniformValue::Int(directional.len() as i32),
        ));
        for (light, slots) in directional.iter().zip(self.directional_lights.iter()) {
            uniforms.push((
                slots.direction.clone(),
                UniformValue::Vector3(light.direction()),
            ));
            uniforms.push((
                slots.color.clone(),
                UniformValue::Vector4(light.color.as_frgba()),
            ));
            uniforms.push((slots.intensity.clone(), UniformValue::Float(light.intensity)));
        }

        let point = &input.point_lights[..input.point_lights.len().min(MAX_POINT_LIGHTS)];
        uniforms.push((
            self.point_light_count.clone(),
            UniformValue::Int(point.len() as i32),
        ));
        for (light, slots) in point.iter().zip(self.point_lights.iter()) {
            uniforms.push((
                slots.position.clone(),
                UniformValue::Vector3(light.position),
            ));
            uniforms.push((
                slots.color.clone(),
                UniformValue::Vector4(light.color.as_frgba()),
            ));
            uniforms.push((slots.intensity.clone(), UniformValue::Float(light.intensity)));
            uniforms.push((slots.radius.clone(), UniformValue::Float(light.radius)));
        }

        let spot = &input.spot_lights[..input.spot_lights.len().min(MAX_SPOT_LIGHTS)];
        uniforms.push((
            self.spot_light_count.clone(),
            UniformValue::Int(spot.len() as i32),
        ));
        for (light, slots) in spot.iter().zip(self.spot_lights.iter()) {
            uniforms.push((
                slots.position.clone(),
                UniformValue::Vector3(light.position),
            ));
            uniforms.push((
                slots.direction.clone(),
                UniformValue::Vector3(light.direction()),
            ));
            uniforms.push((
                slots.color.clone(),
                UniformValue::Vector4(light.color.as_frgba()),
            ));
            uniforms.push((slots.intensity.clone(), UniformValue::Float(light.intensity)));
            uniforms.push((slots.distance.clone(), UniformValue::Float(light.distance)));
            uniforms.push((
                slots.hotspot_cos.clone(),
                UniformValue::Float(light.hotspot_cos()),
            ));
            uniforms.push((
                slots.falloff_cos.clone(),
                UniformValue::Float(light.falloff_cos()),
            ));
        }
    }
}

#[cfg(test)]
mod test {
    #[test]
    fn test_fullscreen_quad_is_pinned_to_far_plane() {
        // The NotEqual depth trick only skips untouched pixels when quad
        // fragments arrive exactly at the clear depth, the same far-plane
        // trick the skybox vertex shader uses.
        assert!(include_str!("shaders/fullscreen_vs.glsl").contains(".xyww"));
    }

    #[test]
    fn test_cascades_select_by_view_depth() {
        // Split boundaries are view-space depths, so the shader must compare
        // against the projection of the fragment onto the camera forward
        // axis, not its radial distance.
        let source = include_str!("shaders/deferred_light_fs.glsl");
        assert!(source.contains("dot(worldPosition - cameraPosition, cameraForward)"));
    }
}
