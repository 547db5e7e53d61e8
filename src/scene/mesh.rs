//! Mesh geometry shared between surfaces.

use crate::math::aabb::AxisAlignedBoundingBox;
use nalgebra::{Vector2, Vector3, Vector4};
use std::sync::atomic::{AtomicU64, Ordering};

/// A single mesh vertex.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    /// Local-space position.
    pub position: Vector3<f32>,
    /// Local-space normal.
    pub normal: Vector3<f32>,
    /// Tangent; `w` stores the bitangent handedness sign.
    pub tangent: Vector4<f32>,
    /// Texture coordinates.
    pub tex_coord: Vector2<f32>,
}

impl Vertex {
    fn from_pos_uv(position: Vector3<f32>, tex_coord: Vector2<f32>, normal: Vector3<f32>) -> Self {
        Self {
            position,
            normal,
            tangent: Vector4::new(1.0, 0.0, 0.0, 1.0),
            tex_coord,
        }
    }
}

/// A triangle as three vertex indices.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TriangleDefinition(pub [u32; 3]);

static SURFACE_DATA_ID: AtomicU64 = AtomicU64::new(0);

/// Immutable geometry of a surface. Identified by a process-unique id so the
/// renderer can cache the GPU-side buffer and share it between every surface
/// holding the same `Rc<SurfaceData>`.
#[derive(Clone, Debug)]
pub struct SurfaceData {
    id: u64,
    vertices: Vec<Vertex>,
    triangles: Vec<TriangleDefinition>,
    bounding_box: AxisAlignedBoundingBox,
}

impl SurfaceData {
    /// Creates surface data from raw vertices and triangles; the local
    /// bounding box is computed here once.
    pub fn new(vertices: Vec<Vertex>, triangles: Vec<TriangleDefinition>) -> Self {
        let mut bounding_box = AxisAlignedBoundingBox::default();
        for vertex in vertices.iter() {
            bounding_box.add_point(vertex.position);
        }
        Self {
            id: SURFACE_DATA_ID.fetch_add(1, Ordering::Relaxed),
            vertices,
            triangles,
            bounding_box,
        }
    }

    /// Process-unique id, the geometry cache key.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Vertex list.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Triangle list.
    #[inline]
    pub fn triangles(&self) -> &[TriangleDefinition] {
        &self.triangles
    }

    /// Local-space bounding box.
    #[inline]
    pub fn bounding_box(&self) -> AxisAlignedBoundingBox {
        self.bounding_box
    }

    /// Creates an XY-plane quad spanning `[-0.5; 0.5]`, facing +Z. Used for
    /// full-screen passes and camera-facing particles.
    pub fn make_unit_xy_quad() -> Self {
        let normal = Vector3::z();
        Self::new(
            vec![
                Vertex::from_pos_uv(Vector3::new(-0.5, -0.5, 0.0), Vector2::new(0.0, 1.0), normal),
                Vertex::from_pos_uv(Vector3::new(0.5, -0.5, 0.0), Vector2::new(1.0, 1.0), normal),
                Vertex::from_pos_uv(Vector3::new(0.5, 0.5, 0.0), Vector2::new(1.0, 0.0), normal),
                Vertex::from_pos_uv(Vector3::new(-0.5, 0.5, 0.0), Vector2::new(0.0, 0.0), normal),
            ],
            vec![TriangleDefinition([0, 1, 2]), TriangleDefinition([0, 2, 3])],
        )
    }

    /// Creates a unit cube centered at the origin. Also serves as the skybox
    /// geometry.
    pub fn make_cube() -> Self {
        let positions = [
            // -Z face
            ([-0.5, -0.5, -0.5], [0.0, 0.0, -1.0]),
            ([-0.5, 0.5, -0.5], [0.0, 0.0, -1.0]),
            ([0.5, 0.5, -0.5], [0.0, 0.0, -1.0]),
            ([0.5, -0.5, -0.5], [0.0, 0.0, -1.0]),
            // +Z face
            ([-0.5, -0.5, 0.5], [0.0, 0.0, 1.0]),
            ([0.5, -0.5, 0.5], [0.0, 0.0, 1.0]),
            ([0.5, 0.5, 0.5], [0.0, 0.0, 1.0]),
            ([-0.5, 0.5, 0.5], [0.0, 0.0, 1.0]),
            // -X face
            ([-0.5, -0.5, -0.5], [-1.0, 0.0, 0.0]),
            ([-0.5, -0.5, 0.5], [-1.0, 0.0, 0.0]),
            ([-0.5, 0.5, 0.5], [-1.0, 0.0, 0.0]),
            ([-0.5, 0.5, -0.5], [-1.0, 0.0, 0.0]),
            // +X face
            ([0.5, -0.5, -0.5], [1.0, 0.0, 0.0]),
            ([0.5, 0.5, -0.5], [1.0, 0.0, 0.0]),
            ([0.5, 0.5, 0.5], [1.0, 0.0, 0.0]),
            ([0.5, -0.5, 0.5], [1.0, 0.0, 0.0]),
            // -Y face
            ([-0.5, -0.5, -0.5], [0.0, -1.0, 0.0]),
            ([0.5, -0.5, -0.5], [0.0, -1.0, 0.0]),
            ([0.5, -0.5, 0.5], [0.0, -1.0, 0.0]),
            ([-0.5, -0.5, 0.5], [0.0, -1.0, 0.0]),
            // +Y face
            ([-0.5, 0.5, -0.5], [0.0, 1.0, 0.0]),
            ([-0.5, 0.5, 0.5], [0.0, 1.0, 0.0]),
            ([0.5, 0.5, 0.5], [0.0, 1.0, 0.0]),
            ([0.5, 0.5, -0.5], [0.0, 1.0, 0.0]),
        ];

        let uvs = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, (p, n))| {
                Vertex::from_pos_uv(
                    Vector3::new(p[0], p[1], p[2]),
                    uvs[i % 4],
                    Vector3::new(n[0], n[1], n[2]),
                )
            })
            .collect();

        let triangles = (0..6u32)
            .flat_map(|face| {
                let base = face * 4;
                [
                    TriangleDefinition([base, base + 1, base + 2]),
                    TriangleDefinition([base, base + 2, base + 3]),
                ]
            })
            .collect();

        Self::new(vertices, triangles)
    }
}

#[cfg(test)]
mod test {
    use super::SurfaceData;
    use nalgebra::Vector3;

    #[test]
    fn test_ids_are_unique() {
        let a = SurfaceData::make_unit_xy_quad();
        let b = SurfaceData::make_unit_xy_quad();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_quad_bounds() {
        let quad = SurfaceData::make_unit_xy_quad();
        let aabb = quad.bounding_box();
        assert_eq!(aabb.min, Vector3::new(-0.5, -0.5, 0.0));
        assert_eq!(aabb.max, Vector3::new(0.5, 0.5, 0.0));
        assert_eq!(quad.triangles().len(), 2);
    }

    #[test]
    fn test_cube_geometry() {
        let cube = SurfaceData::make_cube();
        assert_eq!(cube.vertices().len(), 24);
        assert_eq!(cube.triangles().len(), 12);
        let aabb = cube.bounding_box();
        assert_eq!(aabb.min, Vector3::repeat(-0.5));
        assert_eq!(aabb.max, Vector3::repeat(0.5));
        // Every index must be in range.
        for triangle in cube.triangles() {
            for index in triangle.0 {
                assert!((index as usize) < cube.vertices().len());
            }
        }
    }
}
