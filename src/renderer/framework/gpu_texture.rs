//! GPU texture interface.

use crate::renderer::framework::error::FrameworkError;
use std::{any::Any, rc::Rc};

/// Shape of a texture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GpuTextureKind {
    /// A 2D texture.
    Rectangle {
        /// Width in pixels.
        width: usize,
        /// Height in pixels.
        height: usize,
    },
    /// A cube map with six square faces.
    Cube {
        /// Edge size of each face in pixels.
        size: usize,
    },
}

/// Pixel storage format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PixelKind {
    /// 8-bit single channel.
    R8,
    /// 8-bit RGB.
    RGB8,
    /// 8-bit RGBA.
    RGBA8,
    /// 16-bit float two channels.
    RG16F,
    /// 16-bit float RGB.
    RGB16F,
    /// 16-bit float RGBA.
    RGBA16F,
    /// 16-bit depth.
    D16,
    /// 32-bit float depth.
    D32F,
    /// 24-bit depth packed with 8-bit stencil.
    D24S8,
}

impl PixelKind {
    /// Bytes per pixel.
    pub fn size_in_bytes(self) -> usize {
        match self {
            Self::R8 => 1,
            Self::RGB8 => 3,
            Self::RGBA8 | Self::RG16F | Self::D32F | Self::D24S8 => 4,
            Self::RGB16F => 6,
            Self::RGBA16F => 8,
            Self::D16 => 2,
        }
    }

    /// Whether this format can back a depth attachment.
    pub fn is_depth(self) -> bool {
        matches!(self, Self::D16 | Self::D32F | Self::D24S8)
    }
}

/// Everything needed to create a texture.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GpuTextureDescriptor<'a> {
    /// Shape and size.
    pub kind: GpuTextureKind,
    /// Pixel format.
    pub pixel_kind: PixelKind,
    /// Initial pixel data; `None` leaves the contents undefined, which is
    /// what render targets want.
    pub data: Option<&'a [u8]>,
    /// Requested anisotropic filtering level; `1.0` disables it.
    pub anisotropy: f32,
}

impl<'a> GpuTextureDescriptor<'a> {
    /// Descriptor for a render target: no data, no anisotropy.
    pub fn render_target(kind: GpuTextureKind, pixel_kind: PixelKind) -> Self {
        Self {
            kind,
            pixel_kind,
            data: None,
            anisotropy: 1.0,
        }
    }

    /// Byte size the descriptor's data must have when present.
    pub fn expected_data_size(&self) -> usize {
        let pixel_count = match self.kind {
            GpuTextureKind::Rectangle { width, height } => width * height,
            GpuTextureKind::Cube { size } => 6 * size * size,
        };
        pixel_count * self.pixel_kind.size_in_bytes()
    }

    /// Validates `data` against the declared shape and format.
    pub fn validate(&self) -> Result<(), FrameworkError> {
        if let Some(data) = self.data {
            let expected = self.expected_data_size();
            if data.len() != expected {
                return Err(FrameworkError::InvalidTextureData {
                    expected,
                    actual: data.len(),
                });
            }
        }
        Ok(())
    }
}

/// A texture living on the server.
pub trait GpuTexture: Any {
    /// Shape and size.
    fn kind(&self) -> GpuTextureKind;
    /// Pixel format.
    fn pixel_kind(&self) -> PixelKind;
    /// Backend-specific self access.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a texture.
pub type SharedGpuTexture = Rc<dyn GpuTexture>;
