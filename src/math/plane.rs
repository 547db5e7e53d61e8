//! Infinite oriented plane in Hessian normal form.

use nalgebra::Vector3;

/// A plane defined by a unit normal and a signed distance to the origin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal of the plane.
    pub normal: Vector3<f32>,
    /// Signed distance coefficient of the plane equation.
    pub d: f32,
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            normal: Vector3::new(0.0, 1.0, 0.0),
            d: 0.0,
        }
    }
}

impl Plane {
    /// Creates a plane from the coefficients of the plane equation
    /// `Ax + By + Cz + D = 0`. Fails if the normal is degenerate.
    #[inline]
    pub fn from_abcd(a: f32, b: f32, c: f32, d: f32) -> Option<Self> {
        let normal = Vector3::new(a, b, c);
        let len = normal.norm();
        if len == 0.0 {
            None
        } else {
            let coeff = 1.0 / len;
            Some(Self {
                normal: normal.scale(coeff),
                d: d * coeff,
            })
        }
    }

    /// Creates a plane from a point lying on it and a normal at that point.
    #[inline]
    pub fn from_normal_and_point(normal: &Vector3<f32>, point: &Vector3<f32>) -> Option<Self> {
        normal.try_normalize(f32::EPSILON).map(|normal| Self {
            d: -point.dot(&normal),
            normal,
        })
    }

    /// Signed distance from the point to the plane.
    #[inline]
    pub fn dot(&self, point: &Vector3<f32>) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// Intersection point of three planes.
    /// <http://geomalgorithms.com/a05-_intersect-1.html>
    pub fn intersection_point(&self, b: &Plane, c: &Plane) -> Vector3<f32> {
        let f = -1.0 / self.normal.dot(&b.normal.cross(&c.normal));

        let v1 = b.normal.cross(&c.normal).scale(self.d);
        let v2 = c.normal.cross(&self.normal).scale(b.d);
        let v3 = self.normal.cross(&b.normal).scale(c.d);

        (v1 + v2 + v3).scale(f)
    }
}

#[cfg(test)]
mod test {
    use super::Plane;
    use nalgebra::Vector3;

    #[test]
    fn test_from_normal_and_point() {
        let plane =
            Plane::from_normal_and_point(&Vector3::new(0.0, 10.0, 0.0), &Vector3::new(0.0, 3.0, 0.0))
                .unwrap();
        assert_eq!(plane.normal, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(plane.d, -3.0);
    }

    #[test]
    fn test_degenerate_normal() {
        assert!(Plane::from_abcd(0.0, 0.0, 0.0, 0.0).is_none());
        assert!(
            Plane::from_normal_and_point(&Vector3::zeros(), &Vector3::new(1.0, 1.0, 1.0)).is_none()
        );
    }

    #[test]
    fn test_signed_distance() {
        let plane = Plane::from_abcd(0.0, 1.0, 0.0, -2.0).unwrap();
        assert_eq!(plane.dot(&Vector3::new(0.0, 5.0, 0.0)), 3.0);
        assert_eq!(plane.dot(&Vector3::new(0.0, -1.0, 0.0)), -3.0);
    }
}
