//! Axis-aligned bounding box.

use nalgebra::Vector3;

/// Axis-aligned bounding box defined by its extreme points.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisAlignedBoundingBox {
    /// Minimum corner.
    pub min: Vector3<f32>,
    /// Maximum corner.
    pub max: Vector3<f32>,
}

impl Default for AxisAlignedBoundingBox {
    fn default() -> Self {
        Self {
            min: Vector3::repeat(f32::MAX),
            max: Vector3::repeat(-f32::MAX),
        }
    }
}

impl AxisAlignedBoundingBox {
    /// A box spanning `[-1; 1]` on every axis.
    pub fn unit() -> Self {
        Self::from_min_max(Vector3::repeat(-1.0), Vector3::repeat(1.0))
    }

    /// Creates a box directly from its extreme points.
    pub fn from_min_max(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Creates the tightest box containing every given point. Returns the
    /// inverted-degenerate default if the slice is empty.
    pub fn from_points(points: &[Vector3<f32>]) -> Self {
        let mut aabb = Self::default();
        for point in points {
            aabb.add_point(*point);
        }
        aabb
    }

    /// Grows the box to contain the point.
    #[inline]
    pub fn add_point(&mut self, a: Vector3<f32>) {
        self.min = self.min.inf(&a);
        self.max = self.max.sup(&a);
    }

    /// Center of the box.
    #[inline]
    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max).scale(0.5)
    }

    /// Half of the box extents on each axis.
    #[inline]
    pub fn half_extents(&self) -> Vector3<f32> {
        (self.max - self.min).scale(0.5)
    }

    /// True when `max` is not greater than `min` on at least one axis.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y || self.min.z >= self.max.z
    }

    /// Checks whether the point lies inside (or on the boundary of) the box.
    #[inline]
    pub fn is_contains_point(&self, point: Vector3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Returns the eight corner points of the box.
    #[inline]
    pub fn corners(&self) -> [Vector3<f32>; 8] {
        [
            Vector3::new(self.min.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.min.z),
        ]
    }
}

#[cfg(test)]
mod test {
    use super::AxisAlignedBoundingBox;
    use nalgebra::Vector3;

    #[test]
    fn test_from_points() {
        let aabb = AxisAlignedBoundingBox::from_points(&[
            Vector3::new(1.0, -2.0, 3.0),
            Vector3::new(-1.0, 2.0, -3.0),
        ]);
        assert_eq!(aabb.min, Vector3::new(-1.0, -2.0, -3.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.center(), Vector3::zeros());
        assert_eq!(aabb.half_extents(), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_contains_point() {
        let aabb = AxisAlignedBoundingBox::unit();
        assert!(aabb.is_contains_point(Vector3::zeros()));
        assert!(aabb.is_contains_point(Vector3::repeat(1.0)));
        assert!(!aabb.is_contains_point(Vector3::repeat(1.1)));
    }

    #[test]
    fn test_degenerate() {
        assert!(AxisAlignedBoundingBox::default().is_degenerate());
        assert!(!AxisAlignedBoundingBox::unit().is_degenerate());
    }

    #[test]
    fn test_contains_own_corners() {
        let aabb = AxisAlignedBoundingBox::from_min_max(
            Vector3::new(-2.0, 0.5, 1.0),
            Vector3::new(3.0, 4.0, 9.0),
        );
        for corner in aabb.corners() {
            assert!(aabb.is_contains_point(corner));
        }
    }
}
