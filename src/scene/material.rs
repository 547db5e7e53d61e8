//! PBR surface material.

use crate::{
    color::Color,
    renderer::framework::{
        gpu_program::{UniformLocation, UniformValue},
        gpu_texture::SharedGpuTexture,
    },
};

/// How the alpha channel of the base color is interpreted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AlphaMode {
    /// Alpha is ignored; the surface is fully opaque.
    Opaque,
    /// Texels below the cutoff are discarded in the shader; the surface still
    /// writes depth and casts shadows.
    Mask,
    /// Alpha blending. Blended surfaces neither write to the G-buffer depth
    /// usefully nor cast shadows.
    Blend,
}

/// Uniform locations (and sampler indices for textures) a material writes its
/// bindings into. Resolved once per program by the geometry pass.
pub struct MaterialSlots {
    /// Base color factor, RGBA.
    pub base_color: UniformLocation,
    /// Albedo texture.
    pub diffuse_texture: (UniformLocation, u32),
    /// Tangent-space normal map.
    pub normal_texture: (UniformLocation, u32),
    /// Occlusion-roughness-metallic texture.
    pub orm_texture: (UniformLocation, u32),
    /// Emissive color texture.
    pub emissive_texture: (UniformLocation, u32),
    /// Emissive strength multiplier.
    pub emissive_strength: UniformLocation,
}

/// One-texel stand-ins bound when a material leaves a slot empty, so shaders
/// never sample an unbound unit.
pub struct FallbackTextures {
    /// Opaque white, for the albedo slot.
    pub white: SharedGpuTexture,
    /// Flat `(0.5, 0.5, 1.0)` tangent-space normal.
    pub normal: SharedGpuTexture,
    /// `(occlusion, roughness, metallic) = (1, 1, 0)`.
    pub orm: SharedGpuTexture,
    /// Black, for the emissive slot.
    pub black: SharedGpuTexture,
}

/// Material of a mesh surface: base color, PBR texture set and transparency
/// policy.
#[derive(Clone)]
pub struct Material {
    /// Base color factor multiplied with the albedo texture.
    pub base_color: Color,
    /// Albedo texture.
    pub diffuse_texture: Option<SharedGpuTexture>,
    /// Tangent-space normal map.
    pub normal_texture: Option<SharedGpuTexture>,
    /// Occlusion-roughness-metallic texture.
    pub orm_texture: Option<SharedGpuTexture>,
    /// Emissive texture.
    pub emissive_texture: Option<SharedGpuTexture>,
    /// Emissive strength multiplier.
    pub emissive_strength: f32,
    /// Transparency policy.
    pub alpha_mode: AlphaMode,
    /// When set, the surface is rendered without back-face culling.
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Color::WHITE,
            diffuse_texture: None,
            normal_texture: None,
            orm_texture: None,
            emissive_texture: None,
            emissive_strength: 1.0,
            alpha_mode: AlphaMode::Opaque,
            double_sided: false,
        }
    }
}

impl Material {
    /// Whether the surface participates in shadow map rendering. Blended
    /// surfaces have no meaningful depth and are skipped.
    #[inline]
    pub fn casts_shadows(&self) -> bool {
        self.alpha_mode != AlphaMode::Blend
    }

    /// Appends this material's uniform bindings to a draw call's uniform
    /// list, substituting fallback textures for empty slots.
    pub fn apply_to(
        &self,
        slots: &MaterialSlots,
        fallback: &FallbackTextures,
        uniforms: &mut Vec<(UniformLocation, UniformValue)>,
    ) {
        let texture_of = |slot: &Option<SharedGpuTexture>, default: &SharedGpuTexture| {
            slot.as_ref().unwrap_or(default).clone()
        };

        uniforms.push((
            slots.base_color.clone(),
            UniformValue::Vector4(self.base_color.as_frgba()),
        ));
        uniforms.push((
            slots.diffuse_texture.0.clone(),
            UniformValue::Sampler {
                index: slots.diffuse_texture.1,
                texture: texture_of(&self.diffuse_texture, &fallback.white),
            },
        ));
        uniforms.push((
            slots.normal_texture.0.clone(),
            UniformValue::Sampler {
                index: slots.normal_texture.1,
                texture: texture_of(&self.normal_texture, &fallback.normal),
            },
        ));
        uniforms.push((
            slots.orm_texture.0.clone(),
            UniformValue::Sampler {
                index: slots.orm_texture.1,
                texture: texture_of(&self.orm_texture, &fallback.orm),
            },
        ));
        uniforms.push((
            slots.emissive_texture.0.clone(),
            UniformValue::Sampler {
                index: slots.emissive_texture.1,
                texture: texture_of(&self.emissive_texture, &fallback.black),
            },
        ));
        uniforms.push((
            slots.emissive_strength.clone(),
            UniformValue::Float(self.emissive_strength),
        ));
    }
}
