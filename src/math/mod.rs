//! Geometric primitives used by the renderer: planes, frusta and bounding
//! volumes for cascade fitting, plus a small integer rectangle for viewports.

pub mod aabb;
pub mod frustum;
pub mod plane;
pub mod sphere;

/// Axis-aligned integer rectangle, used for viewports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Horizontal position of the left-bottom corner.
    pub x: i32,
    /// Vertical position of the left-bottom corner.
    pub y: i32,
    /// Width of the rectangle.
    pub w: i32,
    /// Height of the rectangle.
    pub h: i32,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

#[cfg(test)]
mod test {
    use super::Rect;

    #[test]
    fn test_rect() {
        let r = Rect::new(0, 0, 1024, 768);
        assert_eq!(r.w, 1024);
        assert_eq!(r.h, 768);
    }
}
