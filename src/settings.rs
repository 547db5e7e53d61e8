//! Renderer configuration.
//!
//! Settings are plain immutable data constructed once by the host and passed
//! by reference into [`SceneRenderer::new`](crate::renderer::SceneRenderer::new).
//! There is no global settings object.

use serde::{Deserialize, Serialize};

/// Shadow map pixel precision, a compromise between quality and memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShadowMapPrecision {
    /// 16-bit depth. Half the memory, but "shadow acne" may occur.
    Half,
    /// 32-bit depth. Highest quality.
    Full,
}

/// Which shadow-mapping strategy the shadow pass uses for the first
/// directional light.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShadowMapStrategy {
    /// Four cascades, each covering a depth sub-range of the camera frustum.
    Cascaded,
    /// A single map fit to a fixed-radius orthographic volume around the
    /// origin. Cheaper, suitable for small scenes.
    Single,
}

/// How a cascade's light-space bound is fit around its sub-frustum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrustumBoundStrategy {
    /// Axis-aligned box in light space. Tightest bound, but its size changes
    /// as the camera rotates, which can make shadow edges shimmer.
    Aabb,
    /// Bounding sphere. Rotation-invariant, slightly looser.
    Sphere,
}

/// Cascaded shadow map settings.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CsmSettings {
    /// Base size of the nearest cascade's depth texture; farther cascades get
    /// progressively smaller textures.
    pub size: usize,
    /// Depth texture precision.
    pub precision: ShadowMapPrecision,
    /// Fitting policy for cascade bounds.
    pub bound_strategy: FrustumBoundStrategy,
    /// Blend factor between uniform (0.0) and logarithmic (1.0) frustum
    /// splits.
    pub split_lambda: f32,
}

impl Default for CsmSettings {
    fn default() -> Self {
        Self {
            size: 2048,
            precision: ShadowMapPrecision::Full,
            bound_strategy: FrustumBoundStrategy::Aabb,
            split_lambda: 0.75,
        }
    }
}

/// Quality settings for the frame pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualitySettings {
    /// Shadow-mapping strategy for the directional light.
    pub shadow_strategy: ShadowMapStrategy,
    /// Cascaded shadow map settings, used when `shadow_strategy` is
    /// [`ShadowMapStrategy::Cascaded`].
    pub csm_settings: CsmSettings,
    /// Size of the square depth texture used by the single-map strategy.
    pub shadow_map_size: usize,
    /// Radius of the orthographic volume of the single-map strategy, in world
    /// units.
    pub shadow_world_radius: f32,
    /// Anisotropic filtering level requested for material textures.
    pub anisotropy: f32,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            shadow_strategy: ShadowMapStrategy::Cascaded,
            csm_settings: Default::default(),
            shadow_map_size: 2048,
            shadow_world_radius: 50.0,
            anisotropy: 16.0,
        }
    }
}
