//! Cascaded shadow maps for directional lights.
//!
//! The camera frustum is split into depth slices with the practical split
//! scheme, each slice gets its own light-space orthographic projection and a
//! depth-only render target; near slices get finer textures than far ones.

use crate::{
    math::{aabb::AxisAlignedBoundingBox, frustum::Frustum, sphere::BoundingSphere, Rect},
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
    scene::{camera::Camera, light::DirectionalLight},
    settings::{CsmSettings, FrustumBoundStrategy, ShadowMapPrecision},
};
use nalgebra::{Matrix4, Point3, Vector3};

/// Number of cascades. The split scheme, the per-cascade resolutions and the
/// lighting shader all assume exactly this many.
pub const NUM_CASCADES: usize = 4;

/// Computes `count + 1` split distances from `z_near` to `z_far` using the
/// practical split scheme: a `lambda`-weighted blend of uniform and
/// logarithmic splits. The result is strictly increasing and its last value
/// is exactly `z_far`; a non-positive `z_near` is clamped to a small epsilon.
pub fn compute_split_values(count: usize, z_near: f32, z_far: f32, lambda: f32) -> Vec<f32> {
    let z_near = z_near.max(1e-3);
    let lambda = lambda.clamp(0.0, 1.0);

    let mut values = Vec::with_capacity(count + 1);
    for i in 0..=count {
        let t = i as f32 / count as f32;
        let logarithmic = z_near * (z_far / z_near).powf(t);
        let uniform = z_near + (z_far - z_near) * t;
        values.push(lambda * logarithmic + (1.0 - lambda) * uniform);
    }
    // powf drifts; the last boundary must match the camera exactly.
    values[count] = z_far;
    values
}

pub(super) fn light_up_vector(direction: Vector3<f32>) -> Vector3<f32> {
    if direction.y.abs() > 0.99 {
        Vector3::z()
    } else {
        Vector3::y()
    }
}

/// Builds the light view matrix observing `center` along `direction`.
pub fn build_light_view_matrix(center: Vector3<f32>, direction: Vector3<f32>) -> Matrix4<f32> {
    Matrix4::look_at_rh(
        &Point3::from(center - direction),
        &Point3::from(center),
        &light_up_vector(direction),
    )
}

/// Builds the light view-projection matrix for one cascade covering the
/// camera depth range `[z_near; z_far]`. The sub-frustum corners are bounded
/// in light space either by a tight AABB or by a rotation-stable sphere, and
/// the orthographic projection is matched exactly to the bound extents.
/// Returns `None` when the sub-frustum is degenerate.
pub fn build_cascade_projection(
    camera: &Camera,
    z_near: f32,
    z_far: f32,
    light_direction: Vector3<f32>,
    strategy: FrustumBoundStrategy,
) -> Option<Matrix4<f32>> {
    let projection = camera.projection_with_depth_range(z_near, z_far);
    let frustum = Frustum::from_view_projection_matrix(projection * camera.view_matrix())?;

    let light_view = build_light_view_matrix(frustum.center(), light_direction);

    let light_space_corners: Vec<Vector3<f32>> = frustum
        .corners()
        .iter()
        .map(|corner| light_view.transform_point(&Point3::from(*corner)).coords)
        .collect();

    let (left, right, bottom, top, ortho_near, mut ortho_far) = match strategy {
        FrustumBoundStrategy::Aabb => {
            let aabb = AxisAlignedBoundingBox::from_points(&light_space_corners);
            // Light space looks down -Z, so depth extents flip sign.
            (
                aabb.min.x, aabb.max.x, aabb.min.y, aabb.max.y, -aabb.max.z, -aabb.min.z,
            )
        }
        FrustumBoundStrategy::Sphere => {
            let sphere = BoundingSphere::from_points(&light_space_corners);
            let c = sphere.center;
            let r = sphere.radius;
            (
                c.x - r,
                c.x + r,
                c.y - r,
                c.y + r,
                -(c.z + r),
                -(c.z - r),
            )
        }
    };

    if right <= left || top <= bottom {
        return None;
    }
    if ortho_far <= ortho_near {
        // Flat slice; push the far plane out so the projection stays valid.
        ortho_far = ortho_near + 10.0 * f32::EPSILON * ortho_near.abs().max(1.0);
    }

    let ortho = Matrix4::new_orthographic(left, right, bottom, top, ortho_near, ortho_far);
    Some(ortho * light_view)
}

/// An immutable snapshot of one rendered cascade, consumed by the lighting
/// pass.
#[derive(Clone)]
pub struct ShadowCascade {
    /// Camera-space depth where this cascade ends.
    pub z_far: f32,
    /// Light view-projection the cascade was rendered with.
    pub view_projection: Matrix4<f32>,
    /// Depth texture holding the cascade.
    pub texture: SharedGpuTexture,
}

/// A full set of rendered cascades.
#[derive(Clone)]
pub struct CascadedShadowMap {
    cascades: Vec<ShadowCascade>,
}

impl CascadedShadowMap {
    /// Wraps rendered cascades.
    ///
    /// # Panics
    ///
    /// Panics when `cascades` does not contain exactly [`NUM_CASCADES`]
    /// entries; producing a partial set is a programming error, not a runtime
    /// condition.
    pub fn new(cascades: Vec<ShadowCascade>) -> Self {
        assert_eq!(cascades.len(), NUM_CASCADES);
        Self { cascades }
    }

    /// The cascades, near to far.
    pub fn cascades(&self) -> &[ShadowCascade] {
        &self.cascades
    }
}

struct Cascade {
    framebuffer: SharedFrameBuffer,
    texture: SharedGpuTexture,
    size: usize,
}

impl Cascade {
    fn new(
        server: &SharedGraphicsServer,
        size: usize,
        precision: ShadowMapPrecision,
    ) -> Result<Self, RendererError> {
        let pixel_kind = match precision {
            ShadowMapPrecision::Half => PixelKind::D16,
            ShadowMapPrecision::Full => PixelKind::D32F,
        };
        let texture = server.create_texture(GpuTextureDescriptor::render_target(
            GpuTextureKind::Rectangle {
                width: size,
                height: size,
            },
            pixel_kind,
        ))?;
        let framebuffer = server.create_frame_buffer(
            Some(Attachment {
                kind: AttachmentKind::Depth,
                texture: texture.clone(),
            }),
            Vec::new(),
        )?;
        Ok(Self {
            framebuffer,
            texture,
            size,
        })
    }
}

/// Renders the cascaded shadow map for the first directional light of a
/// frame.
pub struct CsmRenderer {
    cascades: Vec<Cascade>,
    program: SharedGpuProgram,
    world_view_projection: UniformLocation,
}

impl CsmRenderer {
    /// Allocates the per-cascade render targets and the depth-only program.
    /// The base texture size halves towards the far cascades.
    pub fn new(server: &SharedGraphicsServer, settings: &CsmSettings) -> Result<Self, RendererError> {
        let program = server.create_program(
            "ShadowMapShader",
            include_str!("../shaders/shadow_map_vs.glsl"),
            include_str!("../shaders/shadow_map_fs.glsl"),
        )?;
        let world_view_projection = program.uniform_location("worldViewProjection")?;

        let base = settings.size.max(2);
        let sizes = [base, base / 2, base / 4, base / 4];
        debug_assert_eq!(sizes.len(), NUM_CASCADES);

        let cascades = sizes
            .iter()
            .map(|size| Cascade::new(server, *size, settings.precision))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            cascades,
            program,
            world_view_projection,
        })
    }

    /// Depth textures of the cascades, near to far, for diagnostic display.
    pub fn cascade_textures(&self) -> Vec<SharedGpuTexture> {
        self.cascades
            .iter()
            .map(|cascade| cascade.texture.clone())
            .collect()
    }

    /// Renders every cascade and returns the snapshot for the lighting pass.
    /// Alpha-blended surfaces are skipped; everything else is drawn with
    /// front-face culling (both faces for double-sided materials).
    pub fn render(
        &self,
        camera: &Camera,
        light: &DirectionalLight,
        instances: &[SurfaceInstance],
        geometry_cache: &mut GeometryCache,
        settings: &CsmSettings,
    ) -> Result<(CascadedShadowMap, RenderPassStatistics), RendererError> {
        let mut statistics = RenderPassStatistics::default();

        let splits = compute_split_values(
            NUM_CASCADES,
            camera.z_near(),
            camera.z_far(),
            settings.split_lambda,
        );

        let mut snapshots = Vec::with_capacity(NUM_CASCADES);
        for (i, cascade) in self.cascades.iter().enumerate() {
            let view_projection = build_cascade_projection(
                camera,
                splits[i],
                splits[i + 1],
                light.direction(),
                settings.bound_strategy,
            )
            .unwrap_or_else(|| {
                log::warn!("degenerate sub-frustum for cascade {i}, rendering empty cascade");
                Matrix4::identity()
            });

            let viewport = Rect::new(0, 0, cascade.size as i32, cascade.size as i32);
            cascade.framebuffer.clear(viewport, None, Some(1.0), None);

            for instance in instances {
                if !instance.material.casts_shadows() {
                    continue;
                }

                let geometry = geometry_cache.get(&instance.data)?;
                statistics += cascade.framebuffer.draw(
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

            snapshots.push(ShadowCascade {
                z_far: splits[i + 1],
                view_projection,
                texture: cascade.texture.clone(),
            });
        }

        Ok((CascadedShadowMap::new(snapshots), statistics))
    }
}
