//! Renderer error type.

use crate::renderer::framework::error::FrameworkError;
use thiserror::Error;

/// An error that can occur while constructing the renderer or rendering a
/// frame.
#[derive(Debug, Error)]
pub enum RendererError {
    /// The scene has no camera; a frame cannot be rendered without an
    /// observer. Raised before any GPU work is submitted.
    #[error("scene contains no camera")]
    NoCamera,
    /// A graphics resource operation failed.
    #[error(transparent)]
    Framework(#[from] FrameworkError),
}
