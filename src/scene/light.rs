//! Light sources.
//!
//! All three kinds are plain data; the deferred lighting pass reads them into
//! uniform arrays, and the shadow pass uses the first directional light as the
//! shadow caster.

use crate::color::Color;
use nalgebra::Vector3;

/// Infinitely distant light source, like the sun. Defined by direction only;
/// position is irrelevant.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    direction: Vector3<f32>,
    /// Light color.
    pub color: Color,
    /// Linear intensity multiplier.
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vector3::new(0.0, -1.0, 0.0),
            color: Color::WHITE,
            intensity: 1.0,
        }
    }
}

impl DirectionalLight {
    /// Creates a light shining along the given direction.
    pub fn new(direction: Vector3<f32>, color: Color, intensity: f32) -> Self {
        Self {
            direction: direction.try_normalize(f32::EPSILON).unwrap_or_else(|| -Vector3::y()),
            color,
            intensity,
        }
    }

    /// Unit direction the light travels along.
    #[inline]
    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    /// Sets the light direction; the vector is normalized, a zero vector falls
    /// back to straight down.
    pub fn set_direction(&mut self, direction: Vector3<f32>) -> &mut Self {
        self.direction = direction.try_normalize(f32::EPSILON).unwrap_or_else(|| -Vector3::y());
        self
    }
}

/// Omnidirectional light with a finite radius of influence.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    /// World-space position.
    pub position: Vector3<f32>,
    /// Light color.
    pub color: Color,
    /// Linear intensity multiplier.
    pub intensity: f32,
    /// Influence radius in world units; attenuation reaches zero here.
    pub radius: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            color: Color::WHITE,
            intensity: 1.0,
            radius: 10.0,
        }
    }
}

/// Cone-shaped light.
#[derive(Clone, Debug, PartialEq)]
pub struct SpotLight {
    /// World-space position of the cone apex.
    pub position: Vector3<f32>,
    direction: Vector3<f32>,
    /// Light color.
    pub color: Color,
    /// Linear intensity multiplier.
    pub intensity: f32,
    /// Influence distance along the cone axis.
    pub distance: f32,
    /// Full angle of the inner (full brightness) cone, in radians.
    pub hotspot_cone_angle: f32,
    /// Extra angle added to the hotspot over which brightness falls to zero.
    pub falloff_angle_delta: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            direction: Vector3::new(0.0, -1.0, 0.0),
            color: Color::WHITE,
            intensity: 1.0,
            distance: 10.0,
            hotspot_cone_angle: 90.0f32.to_radians(),
            falloff_angle_delta: 5.0f32.to_radians(),
        }
    }
}

impl SpotLight {
    /// Unit direction of the cone axis.
    #[inline]
    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    /// Sets the cone axis; the vector is normalized, a zero vector falls back
    /// to straight down.
    pub fn set_direction(&mut self, direction: Vector3<f32>) -> &mut Self {
        self.direction = direction.try_normalize(f32::EPSILON).unwrap_or_else(|| -Vector3::y());
        self
    }

    /// Cosine of the half-angle at which attenuation starts.
    #[inline]
    pub fn hotspot_cos(&self) -> f32 {
        (self.hotspot_cone_angle * 0.5).cos()
    }

    /// Cosine of the half-angle at which attenuation reaches zero.
    #[inline]
    pub fn falloff_cos(&self) -> f32 {
        ((self.hotspot_cone_angle + self.falloff_angle_delta) * 0.5).cos()
    }
}

#[cfg(test)]
mod test {
    use super::{DirectionalLight, SpotLight};
    use crate::color::Color;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_directional_light_direction_is_normalized() {
        let light = DirectionalLight::new(Vector3::new(0.0, -10.0, 0.0), Color::WHITE, 1.0);
        assert_relative_eq!(light.direction().norm(), 1.0);
    }

    #[test]
    fn test_zero_direction_falls_back() {
        let light = DirectionalLight::new(Vector3::zeros(), Color::WHITE, 1.0);
        assert_eq!(light.direction(), -Vector3::y());
    }

    #[test]
    fn test_spot_cone_cosines_ordering() {
        let spot = SpotLight::default();
        // The falloff cone is wider, so its cosine is smaller.
        assert!(spot.falloff_cos() < spot.hotspot_cos());
    }
}
