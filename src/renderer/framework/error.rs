//! Graphics framework error type.

use thiserror::Error;

/// An error that can occur while creating or using GPU resources.
#[derive(Debug, Error)]
pub enum FrameworkError {
    /// Vertex or fragment shader failed to compile.
    #[error("failed to compile {shader_name} shader: {error_message}")]
    ShaderCompilationFailed {
        /// Name of the shader.
        shader_name: String,
        /// Compiler output.
        error_message: String,
    },
    /// Shader program failed to link.
    #[error("failed to link program {0}")]
    ShaderLinkingFailed(String),
    /// A uniform required by the renderer is missing from the program, most
    /// often because the compiler optimized an unused one out.
    #[error("unable to find uniform {0}")]
    UnableToFindShaderUniform(String),
    /// Texture data does not match the declared kind/pixel format.
    #[error("invalid texture data: expected {expected} bytes, got {actual}")]
    InvalidTextureData {
        /// Byte size implied by the descriptor.
        expected: usize,
        /// Byte size actually provided.
        actual: usize,
    },
    /// Framebuffer attachments are inconsistent (e.g. mismatched sizes).
    #[error("invalid frame buffer: {0}")]
    InvalidFrameBuffer(String),
    /// Backend-specific failure.
    #[error("{0}")]
    Custom(String),
}
