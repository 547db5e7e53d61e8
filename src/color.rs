//! 8-bit RGBA color used for clear values and light colors.

use nalgebra::{Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// 8-bit RGBA color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red component.
    pub r: u8,
    /// Green component.
    pub g: u8,
    /// Blue component.
    pub b: u8,
    /// Alpha component.
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::from_rgba(0, 0, 0, 0);

    /// Creates an opaque color from red/green/blue components.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Creates a color from all four components.
    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the color as normalized `[0.0; 1.0]` RGB vector.
    pub fn as_frgb(self) -> Vector3<f32> {
        Vector3::new(
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }

    /// Returns the color as normalized `[0.0; 1.0]` RGBA vector.
    pub fn as_frgba(self) -> Vector4<f32> {
        Vector4::new(
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        )
    }
}

#[cfg(test)]
mod test {
    use super::Color;
    use nalgebra::Vector4;

    #[test]
    fn test_float_conversion() {
        assert_eq!(
            Color::from_rgba(255, 0, 255, 0).as_frgba(),
            Vector4::new(1.0, 0.0, 1.0, 0.0)
        );
        assert_eq!(Color::WHITE.as_frgb(), nalgebra::Vector3::new(1.0, 1.0, 1.0));
    }
}
