//! Shadow map rendering.
//!
//! Two strategies, selected by
//! [`QualitySettings::shadow_strategy`](crate::settings::QualitySettings):
//! cascaded maps for large scenes and a single fixed-volume map for small
//! ones. Both produce a [`ShadowMap`] snapshot the lighting pass consumes.

pub mod csm;
pub mod map;

use crate::renderer::shadow::{csm::CascadedShadowMap, map::SingleShadowMap};

/// Output of the shadow pass, whichever strategy produced it. `None` at the
/// pipeline level means the frame has no directional light and therefore no
/// shadows at all.
#[derive(Clone)]
pub enum ShadowMap {
    /// Four cascades over the camera frustum.
    Cascaded(CascadedShadowMap),
    /// One map over a fixed world volume.
    Single(SingleShadowMap),
}
