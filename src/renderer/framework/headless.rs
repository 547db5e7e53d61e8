//! Bookkeeping-only graphics server.
//!
//! Implements [`GraphicsServer`] without touching any GPU API: resources are
//! ids, draw calls are recorded into an ordered operation log. The renderer
//! runs against it unchanged, which makes the whole frame pipeline executable
//! and assertable in plain tests.

use crate::{
    color::Color,
    math::Rect,
    renderer::framework::{
        error::FrameworkError,
        framebuffer::{
            Attachment, DrawCallStatistics, DrawParameters, FrameBuffer, SharedFrameBuffer,
        },
        geometry_buffer::{GeometryBuffer, SharedGeometryBuffer},
        gpu_program::{GpuProgram, SharedGpuProgram, UniformLocation, UniformValue},
        gpu_texture::{GpuTexture, GpuTextureDescriptor, GpuTextureKind, PixelKind, SharedGpuTexture},
        server::{GraphicsServer, ServerResourceUsage},
    },
    scene::mesh::SurfaceData,
};
use nalgebra::{Matrix4, Vector2, Vector3, Vector4};
use std::{
    any::Any,
    cell::RefCell,
    rc::Rc,
};

/// A uniform value snapshotted into the op log. Samplers are recorded by
/// texture id, never by handle, so the log cannot extend resource lifetimes.
#[derive(Clone, Debug)]
pub enum RecordedUniformValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i32),
    /// Single float.
    Float(f32),
    /// Two-component vector.
    Vector2(Vector2<f32>),
    /// Three-component vector.
    Vector3(Vector3<f32>),
    /// Four-component vector.
    Vector4(Vector4<f32>),
    /// 4x4 matrix.
    Matrix4(Matrix4<f32>),
    /// Texture bound to a sampler unit.
    Sampler {
        /// Texture unit index.
        index: u32,
        /// Id of the bound [`HeadlessTexture`].
        texture: u64,
    },
}

impl From<&UniformValue> for RecordedUniformValue {
    fn from(value: &UniformValue) -> Self {
        match value {
            UniformValue::Bool(v) => Self::Bool(*v),
            UniformValue::Int(v) => Self::Int(*v),
            UniformValue::Float(v) => Self::Float(*v),
            UniformValue::Vector2(v) => Self::Vector2(*v),
            UniformValue::Vector3(v) => Self::Vector3(*v),
            UniformValue::Vector4(v) => Self::Vector4(*v),
            UniformValue::Matrix4(v) => Self::Matrix4(*v),
            UniformValue::Sampler { index, texture } => Self::Sampler {
                index: *index,
                texture: texture
                    .as_any()
                    .downcast_ref::<HeadlessTexture>()
                    .map(HeadlessTexture::id)
                    .unwrap_or_default(),
            },
        }
    }
}

/// One recorded draw call with its full state snapshot.
#[derive(Clone, Debug)]
pub struct RecordedDrawCall {
    /// Id of the target framebuffer.
    pub framebuffer: u64,
    /// Viewport of the draw.
    pub viewport: Rect,
    /// Name of the program used.
    pub program: String,
    /// Id of the [`SurfaceData`] behind the drawn geometry.
    pub geometry: u64,
    /// Triangles submitted.
    pub triangles: usize,
    /// Complete pipeline state of the call.
    pub parameters: DrawParameters,
    /// Uniform bindings, resolved back to names.
    pub uniforms: Vec<(String, RecordedUniformValue)>,
}

impl RecordedDrawCall {
    /// Looks up a uniform binding by name.
    pub fn uniform(&self, name: &str) -> Option<&RecordedUniformValue> {
        self.uniforms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// A single operation submitted to the server, in submission order.
#[derive(Clone, Debug)]
pub enum GraphicsOp {
    /// A framebuffer clear.
    Clear {
        /// Id of the cleared framebuffer.
        framebuffer: u64,
        /// Cleared region.
        viewport: Rect,
        /// Color clear value, if the color buffer was cleared.
        color: Option<Color>,
        /// Depth clear value, if the depth buffer was cleared.
        depth: Option<f32>,
        /// Stencil clear value, if the stencil buffer was cleared.
        stencil: Option<i32>,
    },
    /// A draw call.
    Draw(RecordedDrawCall),
    /// A depth blit between framebuffers.
    BlitDepth {
        /// Source framebuffer id.
        source: u64,
        /// Destination framebuffer id.
        destination: u64,
    },
}

#[derive(Default)]
struct ServerState {
    next_id: u64,
    usage: ServerResourceUsage,
    ops: Vec<GraphicsOp>,
}

impl ServerState {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

type SharedState = Rc<RefCell<ServerState>>;

/// Headless texture: shape and format, no storage.
pub struct HeadlessTexture {
    id: u64,
    kind: GpuTextureKind,
    pixel_kind: PixelKind,
    state: SharedState,
}

impl HeadlessTexture {
    /// Server-unique id of the texture.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl GpuTexture for HeadlessTexture {
    fn kind(&self) -> GpuTextureKind {
        self.kind
    }

    fn pixel_kind(&self) -> PixelKind {
        self.pixel_kind
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessTexture {
    fn drop(&mut self) {
        self.state.borrow_mut().usage.textures -= 1;
    }
}

/// Headless program: interns uniform names, accepts any of them.
pub struct HeadlessProgram {
    name: String,
    uniform_names: RefCell<Vec<String>>,
    state: SharedState,
}

impl HeadlessProgram {
    fn uniform_name(&self, location: &UniformLocation) -> Option<String> {
        self.uniform_names.borrow().get(location.id).cloned()
    }
}

impl GpuProgram for HeadlessProgram {
    fn name(&self) -> &str {
        &self.name
    }

    fn uniform_location(&self, name: &str) -> Result<UniformLocation, FrameworkError> {
        let mut names = self.uniform_names.borrow_mut();
        let id = names
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| {
                names.push(name.to_owned());
                names.len() - 1
            });
        Ok(UniformLocation { id })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessProgram {
    fn drop(&mut self) {
        self.state.borrow_mut().usage.programs -= 1;
    }
}

/// Headless geometry buffer: remembers its source data id and triangle count.
pub struct HeadlessGeometryBuffer {
    data_id: u64,
    triangle_count: usize,
    state: SharedState,
}

impl GeometryBuffer for HeadlessGeometryBuffer {
    fn data_id(&self) -> u64 {
        self.data_id
    }

    fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessGeometryBuffer {
    fn drop(&mut self) {
        self.state.borrow_mut().usage.geometry_buffers -= 1;
    }
}

/// Headless framebuffer: records clears and draws into the server op log.
pub struct HeadlessFrameBuffer {
    id: u64,
    depth_attachment: Option<Attachment>,
    color_attachments: Vec<Attachment>,
    state: SharedState,
}

impl HeadlessFrameBuffer {
    /// Server-unique id of the framebuffer.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl FrameBuffer for HeadlessFrameBuffer {
    fn color_attachments(&self) -> Vec<Attachment> {
        self.color_attachments.clone()
    }

    fn depth_attachment(&self) -> Option<Attachment> {
        self.depth_attachment.clone()
    }

    fn clear(
        &self,
        viewport: Rect,
        color: Option<Color>,
        depth: Option<f32>,
        stencil: Option<i32>,
    ) {
        self.state.borrow_mut().ops.push(GraphicsOp::Clear {
            framebuffer: self.id,
            viewport,
            color,
            depth,
            stencil,
        });
    }

    fn draw(
        &self,
        geometry: &SharedGeometryBuffer,
        viewport: Rect,
        program: &SharedGpuProgram,
        params: &DrawParameters,
        uniforms: &[(UniformLocation, UniformValue)],
    ) -> DrawCallStatistics {
        let headless_program = program.as_any().downcast_ref::<HeadlessProgram>();
        let resolved = uniforms
            .iter()
            .map(|(location, value)| {
                let name = headless_program
                    .and_then(|p| p.uniform_name(location))
                    .unwrap_or_else(|| format!("location{}", location.id));
                (name, RecordedUniformValue::from(value))
            })
            .collect();

        let statistics = DrawCallStatistics {
            triangles: geometry.triangle_count(),
        };

        self.state
            .borrow_mut()
            .ops
            .push(GraphicsOp::Draw(RecordedDrawCall {
                framebuffer: self.id,
                viewport,
                program: program.name().to_owned(),
                geometry: geometry.data_id(),
                triangles: statistics.triangles,
                parameters: params.clone(),
                uniforms: resolved,
            }));

        statistics
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HeadlessFrameBuffer {
    fn drop(&mut self) {
        self.state.borrow_mut().usage.framebuffers -= 1;
    }
}

/// The bookkeeping server. Cloning shares the underlying state, so a test can
/// keep one handle while the renderer owns another.
#[derive(Clone, Default)]
pub struct HeadlessGraphicsServer {
    state: SharedState,
}

impl HeadlessGraphicsServer {
    /// Creates a server with an empty op log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every operation submitted so far, in order.
    pub fn ops(&self) -> Vec<GraphicsOp> {
        self.state.borrow().ops.clone()
    }

    /// Recorded draw calls only, in order.
    pub fn draws(&self) -> Vec<RecordedDrawCall> {
        self.state
            .borrow()
            .ops
            .iter()
            .filter_map(|op| match op {
                GraphicsOp::Draw(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }

    /// Clears the op log. Resource usage counters are unaffected.
    pub fn reset_ops(&self) {
        self.state.borrow_mut().ops.clear();
    }
}

impl GraphicsServer for HeadlessGraphicsServer {
    fn create_texture(
        &self,
        descriptor: GpuTextureDescriptor,
    ) -> Result<SharedGpuTexture, FrameworkError> {
        descriptor.validate()?;
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.usage.textures += 1;
        Ok(Rc::new(HeadlessTexture {
            id,
            kind: descriptor.kind,
            pixel_kind: descriptor.pixel_kind,
            state: self.state.clone(),
        }))
    }

    fn create_frame_buffer(
        &self,
        depth_attachment: Option<Attachment>,
        color_attachments: Vec<Attachment>,
    ) -> Result<SharedFrameBuffer, FrameworkError> {
        if let Some(depth) = depth_attachment.as_ref() {
            if !depth.texture.pixel_kind().is_depth() {
                return Err(FrameworkError::InvalidFrameBuffer(
                    "depth attachment texture has a color pixel format".to_owned(),
                ));
            }
        }
        for attachment in color_attachments.iter() {
            if attachment.texture.pixel_kind().is_depth() {
                return Err(FrameworkError::InvalidFrameBuffer(
                    "color attachment texture has a depth pixel format".to_owned(),
                ));
            }
        }

        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.usage.framebuffers += 1;
        Ok(Rc::new(HeadlessFrameBuffer {
            id,
            depth_attachment,
            color_attachments,
            state: self.state.clone(),
        }))
    }

    fn create_program(
        &self,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<SharedGpuProgram, FrameworkError> {
        if vertex_source.trim().is_empty() || fragment_source.trim().is_empty() {
            return Err(FrameworkError::ShaderCompilationFailed {
                shader_name: name.to_owned(),
                error_message: "empty shader source".to_owned(),
            });
        }
        let mut state = self.state.borrow_mut();
        state.next_id();
        state.usage.programs += 1;
        Ok(Rc::new(HeadlessProgram {
            name: name.to_owned(),
            uniform_names: RefCell::new(Vec::new()),
            state: self.state.clone(),
        }))
    }

    fn create_geometry_buffer(
        &self,
        data: &SurfaceData,
    ) -> Result<SharedGeometryBuffer, FrameworkError> {
        let mut state = self.state.borrow_mut();
        state.next_id();
        state.usage.geometry_buffers += 1;
        Ok(Rc::new(HeadlessGeometryBuffer {
            data_id: data.id(),
            triangle_count: data.triangles().len(),
            state: self.state.clone(),
        }))
    }

    fn blit_depth(&self, source: &SharedFrameBuffer, destination: &SharedFrameBuffer) {
        let source_id = source
            .as_any()
            .downcast_ref::<HeadlessFrameBuffer>()
            .map(|fb| fb.id)
            .unwrap_or_default();
        let destination_id = destination
            .as_any()
            .downcast_ref::<HeadlessFrameBuffer>()
            .map(|fb| fb.id)
            .unwrap_or_default();
        self.state.borrow_mut().ops.push(GraphicsOp::BlitDepth {
            source: source_id,
            destination: destination_id,
        });
    }

    fn alive_resources(&self) -> ServerResourceUsage {
        self.state.borrow().usage
    }
}

#[cfg(test)]
mod test {
    use super::{GraphicsOp, HeadlessGraphicsServer, HeadlessTexture, RecordedUniformValue};
    use crate::{
        math::Rect,
        renderer::framework::{
            framebuffer::{Attachment, AttachmentKind, DrawParameters},
            gpu_program::UniformValue,
            gpu_texture::{GpuTextureDescriptor, GpuTextureKind, PixelKind},
            server::GraphicsServer,
        },
        scene::mesh::SurfaceData,
    };

    fn rectangle(size: usize) -> GpuTextureKind {
        GpuTextureKind::Rectangle {
            width: size,
            height: size,
        }
    }

    #[test]
    fn test_resource_counting() {
        let server = HeadlessGraphicsServer::new();
        assert_eq!(server.alive_resources().total(), 0);

        let texture = server
            .create_texture(GpuTextureDescriptor::render_target(
                rectangle(16),
                PixelKind::RGBA8,
            ))
            .unwrap();
        let geometry = server
            .create_geometry_buffer(&SurfaceData::make_unit_xy_quad())
            .unwrap();
        assert_eq!(server.alive_resources().textures, 1);
        assert_eq!(server.alive_resources().geometry_buffers, 1);

        drop(texture);
        drop(geometry);
        assert_eq!(server.alive_resources().total(), 0);
    }

    #[test]
    fn test_rejects_color_texture_as_depth_attachment() {
        let server = HeadlessGraphicsServer::new();
        let color = server
            .create_texture(GpuTextureDescriptor::render_target(
                rectangle(16),
                PixelKind::RGBA8,
            ))
            .unwrap();
        assert!(server
            .create_frame_buffer(
                Some(Attachment {
                    kind: AttachmentKind::Depth,
                    texture: color,
                }),
                Vec::new(),
            )
            .is_err());
    }

    #[test]
    fn test_rejects_empty_shader_source() {
        let server = HeadlessGraphicsServer::new();
        assert!(server.create_program("bad", "", "void main() {}").is_err());
    }

    #[test]
    fn test_draw_is_recorded_with_uniform_names() {
        let server = HeadlessGraphicsServer::new();
        let depth = server
            .create_texture(GpuTextureDescriptor::render_target(
                rectangle(16),
                PixelKind::D24S8,
            ))
            .unwrap();
        let framebuffer = server
            .create_frame_buffer(
                Some(Attachment {
                    kind: AttachmentKind::DepthStencil,
                    texture: depth,
                }),
                Vec::new(),
            )
            .unwrap();
        let program = server
            .create_program("test", "void main() {}", "void main() {}")
            .unwrap();
        let geometry = server
            .create_geometry_buffer(&SurfaceData::make_unit_xy_quad())
            .unwrap();

        let location = program.uniform_location("strength").unwrap();
        let viewport = Rect::new(0, 0, 16, 16);
        framebuffer.clear(viewport, None, Some(1.0), None);
        let stats = framebuffer.draw(
            &geometry,
            viewport,
            &program,
            &DrawParameters::default(),
            &[(location, UniformValue::Float(0.5))],
        );
        assert_eq!(stats.triangles, 2);

        let ops = server.ops();
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], GraphicsOp::Clear { depth: Some(_), .. }));
        let draws = server.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].program, "test");
        assert!(matches!(
            draws[0].uniform("strength"),
            Some(RecordedUniformValue::Float(v)) if *v == 0.5
        ));
    }

    #[test]
    fn test_op_log_does_not_pin_sampler_textures() {
        let server = HeadlessGraphicsServer::new();
        let depth = server
            .create_texture(GpuTextureDescriptor::render_target(
                rectangle(16),
                PixelKind::D24S8,
            ))
            .unwrap();
        let framebuffer = server
            .create_frame_buffer(
                Some(Attachment {
                    kind: AttachmentKind::DepthStencil,
                    texture: depth,
                }),
                Vec::new(),
            )
            .unwrap();
        let program = server
            .create_program("test", "void main() {}", "void main() {}")
            .unwrap();
        let geometry = server
            .create_geometry_buffer(&SurfaceData::make_unit_xy_quad())
            .unwrap();

        let texture = server
            .create_texture(GpuTextureDescriptor::render_target(
                rectangle(8),
                PixelKind::RGBA8,
            ))
            .unwrap();
        let texture_id = texture
            .as_any()
            .downcast_ref::<HeadlessTexture>()
            .unwrap()
            .id();

        let location = program.uniform_location("diffuseTexture").unwrap();
        framebuffer.draw(
            &geometry,
            Rect::new(0, 0, 16, 16),
            &program,
            &DrawParameters::default(),
            &[(
                location,
                UniformValue::Sampler {
                    index: 0,
                    texture: texture.clone(),
                },
            )],
        );

        // The draw is remembered by id only; dropping the handle must release
        // the texture even while the log is still around.
        drop(texture);
        assert_eq!(server.alive_resources().textures, 1);

        let draws = server.draws();
        assert!(matches!(
            draws[0].uniform("diffuseTexture"),
            Some(RecordedUniformValue::Sampler { index: 0, texture }) if *texture == texture_id
        ));
    }
}
