//! Frame buffer interface and per-draw pipeline state.
//!
//! Every draw call carries its complete pipeline state in [`DrawParameters`],
//! so no state can leak from one pass into the next.

use crate::{
    color::Color,
    math::Rect,
    renderer::framework::{
        geometry_buffer::SharedGeometryBuffer,
        gpu_program::{SharedGpuProgram, UniformLocation, UniformValue},
        gpu_texture::SharedGpuTexture,
    },
};
use std::{any::Any, rc::Rc};

/// Which triangle faces are discarded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CullFace {
    /// Discard back faces.
    Back,
    /// Discard front faces.
    Front,
}

/// Per-channel color write mask.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColorMask {
    /// Write red.
    pub red: bool,
    /// Write green.
    pub green: bool,
    /// Write blue.
    pub blue: bool,
    /// Write alpha.
    pub alpha: bool,
}

impl ColorMask {
    /// Mask with every channel set to `value`.
    pub fn all(value: bool) -> Self {
        Self {
            red: value,
            green: value,
            blue: value,
            alpha: value,
        }
    }
}

impl Default for ColorMask {
    fn default() -> Self {
        Self::all(true)
    }
}

/// Comparison function for depth and stencil tests.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    /// Never passes.
    Never,
    /// Passes when incoming < stored.
    Less,
    /// Passes when incoming == stored.
    Equal,
    /// Passes when incoming <= stored.
    LessOrEqual,
    /// Passes when incoming > stored.
    Greater,
    /// Passes when incoming != stored.
    NotEqual,
    /// Passes when incoming >= stored.
    GreaterOrEqual,
    /// Always passes.
    Always,
}

/// Blend factor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// Zero.
    Zero,
    /// One.
    One,
    /// Source alpha.
    SrcAlpha,
    /// One minus source alpha.
    OneMinusSrcAlpha,
}

/// Source and destination blend factors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlendFunc {
    /// Factor applied to the incoming color.
    pub sfactor: BlendFactor,
    /// Factor applied to the stored color.
    pub dfactor: BlendFactor,
}

impl BlendFunc {
    /// Additive blending: `src * 1 + dst * 1`.
    pub fn additive() -> Self {
        Self {
            sfactor: BlendFactor::One,
            dfactor: BlendFactor::One,
        }
    }

    /// Standard alpha blending.
    pub fn alpha() -> Self {
        Self {
            sfactor: BlendFactor::SrcAlpha,
            dfactor: BlendFactor::OneMinusSrcAlpha,
        }
    }
}

/// Stencil test configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StencilFunc {
    /// Comparison function.
    pub func: CompareFunc,
    /// Reference value.
    pub ref_value: u32,
    /// Bit mask applied to both sides of the comparison.
    pub mask: u32,
}

impl Default for StencilFunc {
    fn default() -> Self {
        Self {
            func: CompareFunc::Always,
            ref_value: 0,
            mask: u32::MAX,
        }
    }
}

/// Complete pipeline state for one draw call.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawParameters {
    /// Face culling; `None` renders both faces.
    pub cull_face: Option<CullFace>,
    /// Color channel write mask.
    pub color_write: ColorMask,
    /// Whether the draw writes depth.
    pub depth_write: bool,
    /// Depth test function; `None` disables the test entirely.
    pub depth_test: Option<CompareFunc>,
    /// Stencil test; `None` disables it.
    pub stencil_test: Option<StencilFunc>,
    /// Blending; `None` overwrites the destination.
    pub blend: Option<BlendFunc>,
}

impl Default for DrawParameters {
    fn default() -> Self {
        Self {
            cull_face: Some(CullFace::Back),
            color_write: ColorMask::default(),
            depth_write: true,
            depth_test: Some(CompareFunc::Less),
            stencil_test: None,
            blend: None,
        }
    }
}

/// Role of a framebuffer attachment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    /// Color target.
    Color,
    /// Depth-only target.
    Depth,
    /// Combined depth-stencil target.
    DepthStencil,
}

/// A texture attached to a framebuffer.
#[derive(Clone)]
pub struct Attachment {
    /// Role of the attachment.
    pub kind: AttachmentKind,
    /// Backing texture.
    pub texture: SharedGpuTexture,
}

/// What a single draw call amounted to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawCallStatistics {
    /// Triangles submitted.
    pub triangles: usize,
}

/// A render target living on the server.
pub trait FrameBuffer: Any {
    /// Color attachments in attachment order.
    fn color_attachments(&self) -> Vec<Attachment>;
    /// Depth(-stencil) attachment, if any.
    fn depth_attachment(&self) -> Option<Attachment>;
    /// Clears the given viewport region. `None` leaves a channel untouched.
    fn clear(
        &self,
        viewport: Rect,
        color: Option<Color>,
        depth: Option<f32>,
        stencil: Option<i32>,
    );
    /// Draws geometry with the given program, complete pipeline state and
    /// uniform bindings.
    fn draw(
        &self,
        geometry: &SharedGeometryBuffer,
        viewport: Rect,
        program: &SharedGpuProgram,
        params: &DrawParameters,
        uniforms: &[(UniformLocation, UniformValue)],
    ) -> DrawCallStatistics;
    /// Backend-specific self access.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a framebuffer.
pub type SharedFrameBuffer = Rc<dyn FrameBuffer>;
