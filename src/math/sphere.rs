//! Bounding sphere of a point set.
//!
//! Used as the rotation-invariant cascade bound: a sphere fitted around a
//! sub-frustum keeps the same size no matter how the camera rotates, which
//! keeps shadow texel density stable and avoids edge shimmering.

use nalgebra::Vector3;

/// A sphere defined by center and radius.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingSphere {
    /// Center of the sphere.
    pub center: Vector3<f32>,
    /// Radius of the sphere.
    pub radius: f32,
}

impl BoundingSphere {
    /// Fits a sphere around the given points: centered at their arithmetic
    /// mean with radius reaching the farthest point. Not minimal, but
    /// deterministic and stable, which matters more for cascade fitting.
    pub fn from_points(points: &[Vector3<f32>]) -> Self {
        if points.is_empty() {
            return Self {
                center: Vector3::zeros(),
                radius: 0.0,
            };
        }

        let center = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p)
            .scale(1.0 / points.len() as f32);

        let radius = points
            .iter()
            .map(|p| (p - center).norm())
            .fold(0.0f32, f32::max);

        Self { center, radius }
    }

    /// Checks whether the point lies inside the sphere, with a relative
    /// tolerance for points sitting exactly on the surface.
    #[inline]
    pub fn is_contains_point(&self, point: Vector3<f32>) -> bool {
        (point - self.center).norm() <= self.radius * (1.0 + f32::EPSILON * 8.0)
    }
}

#[cfg(test)]
mod test {
    use super::BoundingSphere;
    use nalgebra::Vector3;

    #[test]
    fn test_empty_point_set() {
        let sphere = BoundingSphere::from_points(&[]);
        assert_eq!(sphere.radius, 0.0);
    }

    #[test]
    fn test_contains_all_input_points() {
        let points = [
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(-4.0, 0.0, 1.0),
            Vector3::new(0.5, -2.5, 8.0),
            Vector3::new(0.0, 0.0, 0.0),
        ];
        let sphere = BoundingSphere::from_points(&points);
        for point in points {
            assert!(sphere.is_contains_point(point));
        }
    }

    #[test]
    fn test_symmetric_points() {
        let sphere = BoundingSphere::from_points(&[
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
        ]);
        assert_eq!(sphere.center, Vector3::zeros());
        assert_eq!(sphere.radius, 1.0);
    }
}
