//! Graphics server interface: the single entry point through which the
//! renderer acquires GPU resources.

use crate::{
    renderer::framework::{
        error::FrameworkError,
        framebuffer::{Attachment, SharedFrameBuffer},
        geometry_buffer::SharedGeometryBuffer,
        gpu_program::SharedGpuProgram,
        gpu_texture::{GpuTextureDescriptor, SharedGpuTexture},
    },
    scene::mesh::SurfaceData,
};
use std::rc::Rc;

/// Per-kind count of resources currently alive on a server.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerResourceUsage {
    /// Alive textures.
    pub textures: usize,
    /// Alive framebuffers.
    pub framebuffers: usize,
    /// Alive programs.
    pub programs: usize,
    /// Alive geometry buffers.
    pub geometry_buffers: usize,
}

impl ServerResourceUsage {
    /// Total alive resources of all kinds.
    pub fn total(&self) -> usize {
        self.textures + self.framebuffers + self.programs + self.geometry_buffers
    }
}

/// Abstract graphics backend. A real implementation wraps a GPU API; the
/// [headless server](crate::renderer::framework::headless::HeadlessGraphicsServer)
/// implements it with pure bookkeeping so the whole pipeline runs in tests.
///
/// Resources are released when the last shared handle drops; the server only
/// tracks their counts.
pub trait GraphicsServer {
    /// Creates a texture.
    fn create_texture(
        &self,
        descriptor: GpuTextureDescriptor,
    ) -> Result<SharedGpuTexture, FrameworkError>;

    /// Creates a framebuffer from attachments.
    fn create_frame_buffer(
        &self,
        depth_attachment: Option<Attachment>,
        color_attachments: Vec<Attachment>,
    ) -> Result<SharedFrameBuffer, FrameworkError>;

    /// Compiles and links a shader program.
    fn create_program(
        &self,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<SharedGpuProgram, FrameworkError>;

    /// Uploads mesh geometry.
    fn create_geometry_buffer(
        &self,
        data: &SurfaceData,
    ) -> Result<SharedGeometryBuffer, FrameworkError>;

    /// Copies the depth(-stencil) contents of `source` into `destination`.
    fn blit_depth(&self, source: &SharedFrameBuffer, destination: &SharedFrameBuffer);

    /// Counts of currently alive resources, for diagnostics and leak checks.
    fn alive_resources(&self) -> ServerResourceUsage;
}

/// Shared handle to a graphics server.
pub type SharedGraphicsServer = Rc<dyn GraphicsServer>;
