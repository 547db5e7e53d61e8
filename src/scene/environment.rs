//! Image-based lighting environment.

use crate::renderer::framework::gpu_texture::SharedGpuTexture;

/// Environment of a scene: the skybox cubemap plus optional pre-convolved
/// cubemaps for image-based lighting. Textures are shared handles, so cloning
/// an environment is cheap.
#[derive(Clone)]
pub struct Environment {
    /// Skybox cubemap, also the specular source when `prefiltered` is absent.
    pub skybox: SharedGpuTexture,
    /// Irradiance cubemap for diffuse IBL.
    pub irradiance: Option<SharedGpuTexture>,
    /// Pre-filtered specular cubemap with roughness in mip levels.
    pub prefiltered: Option<SharedGpuTexture>,
}

impl Environment {
    /// Creates an environment with only a skybox; IBL cubemaps can be added
    /// by the host when available.
    pub fn from_skybox(skybox: SharedGpuTexture) -> Self {
        Self {
            skybox,
            irradiance: None,
            prefiltered: None,
        }
    }
}
