//! Look-at camera with lazily recomputed derived matrices.

use crate::math::frustum::Frustum;
use nalgebra::{Matrix4, Point3, Vector3};
use std::cell::{Cell, RefCell};

#[derive(Clone, Debug)]
struct DerivedMatrices {
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    view_projection: Matrix4<f32>,
    inv_view_projection: Matrix4<f32>,
    frustum: Frustum,
}

impl Default for DerivedMatrices {
    fn default() -> Self {
        Self {
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            view_projection: Matrix4::identity(),
            inv_view_projection: Matrix4::identity(),
            frustum: Frustum::default(),
        }
    }
}

/// Perspective camera. Derived matrices (view, projection, combined and
/// inverted view-projection, frustum) are recomputed lazily on first access
/// after any position/orientation/projection change, so
/// `view_projection() == projection() * view()` holds at every observation
/// point.
#[derive(Clone, Debug)]
pub struct Camera {
    position: Vector3<f32>,
    target: Vector3<f32>,
    up: Vector3<f32>,
    fov: f32,
    aspect: f32,
    z_near: f32,
    z_far: f32,
    dirty: Cell<bool>,
    cache: RefCell<DerivedMatrices>,
}

impl Camera {
    /// Creates a camera at the origin looking down negative Z.
    pub fn new(fov: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            position: Vector3::zeros(),
            target: -Vector3::z(),
            up: Vector3::y(),
            fov,
            aspect,
            z_near,
            z_far,
            dirty: Cell::new(true),
            cache: RefCell::new(DerivedMatrices::default()),
        }
    }

    /// Moves the camera to the given position.
    pub fn set_position(&mut self, position: Vector3<f32>) -> &mut Self {
        self.position = position;
        self.dirty.set(true);
        self
    }

    /// Points the camera at the given target.
    pub fn set_target(&mut self, target: Vector3<f32>) -> &mut Self {
        self.target = target;
        self.dirty.set(true);
        self
    }

    /// Sets the camera up vector.
    pub fn set_up(&mut self, up: Vector3<f32>) -> &mut Self {
        self.up = up;
        self.dirty.set(true);
        self
    }

    /// Sets the aspect ratio (width / height) of the projection.
    pub fn set_aspect(&mut self, aspect: f32) -> &mut Self {
        self.aspect = aspect;
        self.dirty.set(true);
        self
    }

    /// Sets near and far clip plane distances.
    pub fn set_depth_range(&mut self, z_near: f32, z_far: f32) -> &mut Self {
        self.z_near = z_near;
        self.z_far = z_far;
        self.dirty.set(true);
        self
    }

    /// World-space position of the camera.
    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// Unit vector from the camera position towards its target. Falls back to
    /// negative Z when the two coincide.
    pub fn look_direction(&self) -> Vector3<f32> {
        (self.target - self.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vector3::z())
    }

    /// Vertical field of view, in radians.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Near clip plane distance.
    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    /// Far clip plane distance.
    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    fn update_cache(&self) {
        if !self.dirty.get() {
            return;
        }

        let view = Matrix4::look_at_rh(
            &Point3::from(self.position),
            &Point3::from(self.target),
            &self.up,
        );
        let projection =
            Matrix4::new_perspective(self.aspect, self.fov, self.z_near, self.z_far);
        let view_projection = projection * view;
        let inv_view_projection = view_projection.try_inverse().unwrap_or_else(Matrix4::identity);
        let frustum =
            Frustum::from_view_projection_matrix(view_projection).unwrap_or_default();

        *self.cache.borrow_mut() = DerivedMatrices {
            view,
            projection,
            view_projection,
            inv_view_projection,
            frustum,
        };
        self.dirty.set(false);
    }

    /// View matrix.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.update_cache();
        self.cache.borrow().view
    }

    /// Projection matrix.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.update_cache();
        self.cache.borrow().projection
    }

    /// Combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.update_cache();
        self.cache.borrow().view_projection
    }

    /// Inverse of the combined view-projection matrix, used to reconstruct
    /// world positions from depth.
    pub fn inverted_view_projection_matrix(&self) -> Matrix4<f32> {
        self.update_cache();
        self.cache.borrow().inv_view_projection
    }

    /// View-projection with the camera translation removed; the skybox is
    /// rendered with this so it never moves with the camera.
    pub fn view_projection_without_translation(&self) -> Matrix4<f32> {
        self.update_cache();
        let cache = self.cache.borrow();
        let mut view = cache.view;
        view[(0, 3)] = 0.0;
        view[(1, 3)] = 0.0;
        view[(2, 3)] = 0.0;
        cache.projection * view
    }

    /// View frustum of the camera.
    pub fn frustum(&self) -> Frustum {
        self.update_cache();
        self.cache.borrow().frustum
    }

    /// Rebuilds the camera projection with a custom depth range, keeping fov
    /// and aspect. Used to derive cascade sub-frusta.
    pub fn projection_with_depth_range(&self, z_near: f32, z_far: f32) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, z_near, z_far)
    }
}

#[cfg(test)]
mod test {
    use super::Camera;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn make_camera() -> Camera {
        let mut camera = Camera::new(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 1.0, 100.0);
        camera
            .set_position(Vector3::new(0.0, 2.0, 5.0))
            .set_target(Vector3::zeros());
        camera
    }

    #[test]
    fn test_view_projection_invariant() {
        let camera = make_camera();
        let expected = camera.projection_matrix() * camera.view_matrix();
        assert_relative_eq!(camera.view_projection_matrix(), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_invariant_holds_after_moves() {
        let mut camera = make_camera();
        camera.set_position(Vector3::new(10.0, -3.0, 7.0));
        let expected = camera.projection_matrix() * camera.view_matrix();
        assert_relative_eq!(camera.view_projection_matrix(), expected, epsilon = 1e-6);

        camera.set_depth_range(0.5, 250.0);
        assert_relative_eq!(
            camera.view_projection_matrix(),
            camera.projection_matrix() * camera.view_matrix(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_inverted_view_projection() {
        let camera = make_camera();
        let product = camera.view_projection_matrix() * camera.inverted_view_projection_matrix();
        assert_relative_eq!(product, nalgebra::Matrix4::identity(), epsilon = 1e-4);
    }

    #[test]
    fn test_translation_free_view_projection() {
        // Two cameras with the same orientation but different positions must
        // agree once translation is stripped.
        let mut reference = Camera::new(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 1.0, 100.0);
        reference
            .set_position(Vector3::new(50.0, 2.0, 5.0))
            .set_target(Vector3::new(50.0, 0.0, 0.0));
        let mut moved = reference.clone();
        moved
            .set_position(Vector3::new(-20.0, 2.0, 5.0))
            .set_target(Vector3::new(-20.0, 0.0, 0.0));
        assert_relative_eq!(
            reference.view_projection_without_translation(),
            moved.view_projection_without_translation(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_look_direction_is_normalized() {
        let camera = make_camera();
        let direction = camera.look_direction();
        assert_relative_eq!(direction.norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(
            direction,
            Vector3::new(0.0, -2.0, -5.0).normalize(),
            epsilon = 1e-6
        );

        let mut degenerate = make_camera();
        degenerate.set_target(degenerate.position());
        assert_relative_eq!(degenerate.look_direction(), -Vector3::z());
    }

    #[test]
    fn test_frustum_tracks_camera() {
        let mut camera = make_camera();
        assert!(camera.frustum().is_contains_point(Vector3::zeros()));
        camera.set_target(Vector3::new(0.0, 0.0, 1000.0));
        camera.set_position(Vector3::new(0.0, 0.0, 500.0));
        assert!(!camera.frustum().is_contains_point(Vector3::zeros()));
    }
}
