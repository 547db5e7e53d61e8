//! GPU geometry buffer interface.

use std::{any::Any, rc::Rc};

/// Uploaded mesh geometry living on the server.
pub trait GeometryBuffer: Any {
    /// Id of the [`SurfaceData`](crate::scene::mesh::SurfaceData) this buffer
    /// was created from; the geometry cache key.
    fn data_id(&self) -> u64;
    /// Number of triangles.
    fn triangle_count(&self) -> usize;
    /// Backend-specific self access.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a geometry buffer.
pub type SharedGeometryBuffer = Rc<dyn GeometryBuffer>;
