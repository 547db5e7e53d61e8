//! View frustum extracted from a view-projection matrix.

use crate::math::{aabb::AxisAlignedBoundingBox, plane::Plane};
use nalgebra::{Matrix4, Vector3};

/// A truncated pyramid bounded by six planes, with its eight corner points
/// precomputed. Corners are ordered far plane first (left-top, left-bottom,
/// right-bottom, right-top), then the near plane in the same winding.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frustum {
    planes: [Plane; 6],
    corners: [Vector3<f32>; 8],
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_view_projection_matrix(Matrix4::new_perspective(
            1.0,
            std::f32::consts::FRAC_PI_2,
            0.01,
            1024.0,
        ))
        .unwrap()
    }
}

impl Frustum {
    const LEFT: usize = 0;
    const RIGHT: usize = 1;
    const TOP: usize = 2;
    const BOTTOM: usize = 3;
    const FAR: usize = 4;
    const NEAR: usize = 5;

    /// Extracts the frustum from a view-projection matrix (Gribb-Hartmann).
    /// Fails on degenerate matrices.
    pub fn from_view_projection_matrix(m: Matrix4<f32>) -> Option<Self> {
        let planes = [
            // Left
            Plane::from_abcd(m[3] + m[0], m[7] + m[4], m[11] + m[8], m[15] + m[12])?,
            // Right
            Plane::from_abcd(m[3] - m[0], m[7] - m[4], m[11] - m[8], m[15] - m[12])?,
            // Top
            Plane::from_abcd(m[3] - m[1], m[7] - m[5], m[11] - m[9], m[15] - m[13])?,
            // Bottom
            Plane::from_abcd(m[3] + m[1], m[7] + m[5], m[11] + m[9], m[15] + m[13])?,
            // Far
            Plane::from_abcd(m[3] - m[2], m[7] - m[6], m[11] - m[10], m[15] - m[14])?,
            // Near
            Plane::from_abcd(m[3] + m[2], m[7] + m[6], m[11] + m[10], m[15] + m[14])?,
        ];

        let corners = [
            planes[Self::LEFT].intersection_point(&planes[Self::TOP], &planes[Self::FAR]),
            planes[Self::LEFT].intersection_point(&planes[Self::BOTTOM], &planes[Self::FAR]),
            planes[Self::RIGHT].intersection_point(&planes[Self::BOTTOM], &planes[Self::FAR]),
            planes[Self::RIGHT].intersection_point(&planes[Self::TOP], &planes[Self::FAR]),
            planes[Self::LEFT].intersection_point(&planes[Self::TOP], &planes[Self::NEAR]),
            planes[Self::LEFT].intersection_point(&planes[Self::BOTTOM], &planes[Self::NEAR]),
            planes[Self::RIGHT].intersection_point(&planes[Self::BOTTOM], &planes[Self::NEAR]),
            planes[Self::RIGHT].intersection_point(&planes[Self::TOP], &planes[Self::NEAR]),
        ];

        Some(Self { planes, corners })
    }

    /// Returns the six bounding planes.
    #[inline]
    pub fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    /// Returns the eight corner points.
    #[inline]
    pub fn corners(&self) -> &[Vector3<f32>; 8] {
        &self.corners
    }

    /// Arithmetic mean of the corner points.
    #[inline]
    pub fn center(&self) -> Vector3<f32> {
        self.corners
            .iter()
            .fold(Vector3::default(), |acc, corner| acc + *corner)
            .scale(1.0 / 8.0)
    }

    /// Checks whether the point lies inside the frustum.
    #[inline]
    pub fn is_contains_point(&self, pt: Vector3<f32>) -> bool {
        self.planes.iter().all(|plane| plane.dot(&pt) > 0.0)
    }

    /// Checks whether at least one point of the cloud is on the inner side of
    /// every plane.
    #[inline]
    pub fn is_intersects_point_cloud(&self, points: &[Vector3<f32>]) -> bool {
        for plane in self.planes.iter() {
            if points.iter().all(|point| plane.dot(point) <= 0.0) {
                // All points are behind this plane.
                return false;
            }
        }
        true
    }

    /// Conservative frustum/AABB intersection test.
    #[inline]
    pub fn is_intersects_aabb(&self, aabb: &AxisAlignedBoundingBox) -> bool {
        if self.is_intersects_point_cloud(&aabb.corners()) {
            return true;
        }

        self.corners
            .iter()
            .any(|corner| aabb.is_contains_point(*corner))
    }

    /// Frustum/sphere intersection test.
    #[inline]
    pub fn is_intersects_sphere(&self, center: Vector3<f32>, radius: f32) -> bool {
        for plane in self.planes.iter() {
            let d = plane.dot(&center);
            if d < -radius {
                return false;
            }
            if d.abs() < radius {
                return true;
            }
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::Frustum;
    use crate::math::aabb::AxisAlignedBoundingBox;
    use nalgebra::{Matrix4, Vector3};

    fn unit_frustum() -> Frustum {
        // Identity view-projection gives the [-1; 1] cube.
        Frustum::from_view_projection_matrix(Matrix4::identity()).unwrap()
    }

    #[test]
    fn test_corners_of_identity_frustum() {
        let f = unit_frustum();
        assert_eq!(
            *f.corners(),
            [
                Vector3::new(-1.0, 1.0, 1.0),
                Vector3::new(-1.0, -1.0, 1.0),
                Vector3::new(1.0, -1.0, 1.0),
                Vector3::new(1.0, 1.0, 1.0),
                Vector3::new(-1.0, 1.0, -1.0),
                Vector3::new(-1.0, -1.0, -1.0),
                Vector3::new(1.0, -1.0, -1.0),
                Vector3::new(1.0, 1.0, -1.0),
            ]
        );
        assert_eq!(f.center(), Vector3::zeros());
    }

    #[test]
    fn test_contains_point() {
        let f = unit_frustum();
        assert!(f.is_contains_point(Vector3::zeros()));
        assert!(!f.is_contains_point(Vector3::new(10.0, 10.0, 10.0)));
    }

    #[test]
    fn test_intersects_point_cloud() {
        let f = unit_frustum();
        assert!(f.is_intersects_point_cloud(&[
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
        ]));
        assert!(!f.is_intersects_point_cloud(&[Vector3::new(-1.0, -2.0, 1.0)]));
    }

    #[test]
    fn test_intersects_aabb() {
        let f = unit_frustum();
        assert!(f.is_intersects_aabb(&AxisAlignedBoundingBox::unit()));
        assert!(!f.is_intersects_aabb(&AxisAlignedBoundingBox::from_min_max(
            Vector3::new(5.0, 5.0, 5.0),
            Vector3::new(15.0, 15.0, 15.0)
        )));
    }

    #[test]
    fn test_intersects_sphere() {
        let f = unit_frustum();
        assert!(f.is_intersects_sphere(Vector3::zeros(), 1.0));
        assert!(!f.is_intersects_sphere(Vector3::new(10.0, 10.0, 10.0), 1.0));
    }

    #[test]
    fn test_perspective_frustum_contains_scene_point() {
        let view = Matrix4::look_at_rh(
            &nalgebra::Point3::new(0.0, 0.0, 5.0),
            &nalgebra::Point3::origin(),
            &Vector3::y_axis(),
        );
        let proj = Matrix4::new_perspective(1.0, std::f32::consts::FRAC_PI_3, 0.1, 100.0);
        let f = Frustum::from_view_projection_matrix(proj * view).unwrap();
        assert!(f.is_contains_point(Vector3::zeros()));
        assert!(!f.is_contains_point(Vector3::new(0.0, 0.0, 6.0)));
    }
}
