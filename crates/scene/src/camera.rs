use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

/// Perspective camera looking from `position` at `target`.
///
/// Matrices are derived on every call, so edits to `fov`, `near`, `far` or
/// `aspect` take effect on the next frame without an explicit refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(50.0, 1.0, 0.1, 2000.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or(Vec3::X)
    }

    /// Camera-space up, orthogonal to forward and right.
    pub fn camera_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let fov = self.fov.clamp(0.01, 179.9).to_radians();
        let aspect = if self.aspect.is_finite() && self.aspect > 0.0 {
            self.aspect
        } else {
            1.0
        };
        let near = self.near.max(1e-4);
        let far = self.far.max(near + 1e-4);
        Mat4::perspective_rh(fov, aspect, near, far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Depth along the view direction; positive in front of the camera.
    pub fn view_depth(&self, point: Vec3) -> f32 {
        -(self.view_matrix() * point.extend(1.0)).z
    }

    /// Project a world point to pixel coordinates (origin top-left).
    ///
    /// Returns the pixel position and the view depth, or `None` behind the camera.
    pub fn project(&self, point: Vec3, viewport: Vec2) -> Option<(Vec2, f32)> {
        let depth = self.view_depth(point);
        if depth <= self.near.max(1e-4) {
            return None;
        }
        let clip = self.view_projection() * point.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        let x = (ndc.x * 0.5 + 0.5) * viewport.x;
        let y = (0.5 - ndc.y * 0.5) * viewport.y;
        Some((Vec2::new(x, y), depth))
    }

    /// Pixels covered by one world unit at the given view depth.
    pub fn pixels_per_unit(&self, depth: f32, viewport_height: f32) -> f32 {
        let half_fov = self.fov.clamp(0.01, 179.9).to_radians() * 0.5;
        viewport_height / (2.0 * half_fov.tan() * depth.max(1e-4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_camera() -> PerspectiveCamera {
        let mut cam = PerspectiveCamera::new(85.0, 2.0, 0.1, 100.0);
        cam.position = Vec3::new(0.0, 10.0, 20.0);
        cam.target = Vec3::new(0.0, 5.0, 0.0);
        cam
    }

    #[test]
    fn view_projection_is_finite() {
        let vp = demo_camera().view_projection();
        assert!(vp.is_finite());
    }

    #[test]
    fn target_projects_to_viewport_center() {
        let cam = demo_camera();
        let (px, depth) = cam.project(cam.target, Vec2::new(800.0, 400.0)).unwrap();
        assert!(px.abs_diff_eq(Vec2::new(400.0, 200.0), 1e-2));
        assert!((depth - (cam.target - cam.position).length()).abs() < 1e-3);
    }

    #[test]
    fn points_behind_are_not_projected() {
        let cam = demo_camera();
        assert!(cam.project(Vec3::new(0.0, 10.0, 40.0), Vec2::splat(100.0)).is_none());
    }

    #[test]
    fn degenerate_parameters_do_not_produce_nan() {
        let mut cam = demo_camera();
        cam.fov = 180.0;
        cam.aspect = 0.0;
        cam.near = 5.0;
        cam.far = 5.0;
        assert!(cam.projection_matrix().is_finite());
    }

    #[test]
    fn basis_is_orthonormal() {
        let cam = demo_camera();
        let (f, r, u) = (cam.forward(), cam.right(), cam.camera_up());
        assert!(f.dot(r).abs() < 1e-5);
        assert!(f.dot(u).abs() < 1e-5);
        assert!((u.length() - 1.0).abs() < 1e-5);
        assert!(u.y > 0.0);
    }

    #[test]
    fn pixels_per_unit_halves_with_double_depth() {
        let cam = demo_camera();
        let a = cam.pixels_per_unit(10.0, 600.0);
        let b = cam.pixels_per_unit(20.0, 600.0);
        assert!((a / b - 2.0).abs() < 1e-4);
    }
}
