//! Post-process handoff.

use crate::renderer::{error::RendererError, framework::gpu_texture::SharedGpuTexture};

/// A chain of post-processing stages (bloom, tonemapping, FXAA and the like)
/// installed by the host. The renderer hands it the final HDR color texture
/// after every frame; what the chain does with it, and where the result ends
/// up, is the chain's business.
///
/// Stages are expected to learn the target resolution at construction; the
/// renderer does not re-negotiate it per frame.
pub trait PostProcessChain {
    /// Processes the frame's HDR color output.
    fn process(&mut self, hdr_frame: &SharedGpuTexture) -> Result<(), RendererError>;
}
