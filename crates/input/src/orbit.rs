use crate::action::Action;
use glam::{Vec2, Vec3};
use stagecraft_scene::PerspectiveCamera;
use std::f32::consts::PI;

const EPS: f32 = 1e-6;

/// Orbit camera controller around a target point, with optional damping.
///
/// Input accumulates into pending deltas; [`OrbitControls::update`] applies
/// them to the camera once per frame. With damping enabled only a fraction
/// of each pending delta is applied per update and the rest decays away, so
/// the camera keeps gliding after the pointer stops.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enabled: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    // (theta, phi) pending rotation
    spherical_delta: Vec2,
    pan_offset: Vec3,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enabled: true,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            spherical_delta: Vec2::ZERO,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn with_damping(mut self, factor: f32) -> Self {
        self.enable_damping = true;
        self.damping_factor = factor;
        self
    }

    /// Queue the effect of an input action.
    pub fn apply(&mut self, action: Action, camera: &PerspectiveCamera, viewport_height: f32) {
        if !self.enabled {
            return;
        }
        match action {
            Action::Rotate(delta) => self.rotate(delta, viewport_height),
            Action::Pan(delta) => self.pan(delta, camera, viewport_height),
            Action::Dolly(steps) => self.dolly(steps),
            Action::Noop => {}
        }
    }

    /// A full viewport-height drag turns the camera once around.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        let angle = 2.0 * PI * delta * self.rotate_speed / h;
        self.spherical_delta.x -= angle.x;
        self.spherical_delta.y -= angle.y;
    }

    /// Pan in the camera plane so the point under the cursor follows it at the target depth.
    pub fn pan(&mut self, delta: Vec2, camera: &PerspectiveCamera, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        let distance = (camera.position - self.target).length();
        let target_distance = distance * (camera.fov.to_radians() * 0.5).tan();
        let dx = 2.0 * delta.x * target_distance / h * self.pan_speed;
        let dy = 2.0 * delta.y * target_distance / h * self.pan_speed;
        self.pan_offset += -camera.right() * dx + camera.camera_up() * dy;
    }

    pub fn dolly(&mut self, steps: f32) {
        let zoom_scale = 0.95f32.powf(self.zoom_speed);
        if steps > 0.0 {
            self.scale *= zoom_scale;
        } else if steps < 0.0 {
            self.scale /= zoom_scale;
        }
    }

    /// Apply pending motion to the camera. Returns `true` if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, 0.0)
        };

        let pan = if self.enable_damping {
            theta += self.spherical_delta.x * self.damping_factor;
            phi += self.spherical_delta.y * self.damping_factor;
            self.pan_offset * self.damping_factor
        } else {
            theta += self.spherical_delta.x;
            phi += self.spherical_delta.y;
            self.pan_offset
        };

        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += pan;

        let sin_phi_radius = phi.sin() * radius;
        let new_offset = Vec3::new(
            sin_phi_radius * theta.sin(),
            phi.cos() * radius,
            sin_phi_radius * theta.cos(),
        );
        let previous = camera.position;
        camera.position = self.target + new_offset;
        camera.target = self.target;

        if self.enable_damping {
            self.spherical_delta *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = Vec2::ZERO;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        let moved = previous.distance_squared(camera.position) > EPS;
        if moved {
            tracing::trace!(position = ?camera.position, "orbit camera moved");
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (OrbitControls, PerspectiveCamera) {
        let mut cam = PerspectiveCamera::new(85.0, 2.0, 0.1, 100.0);
        cam.position = Vec3::new(0.0, 10.0, 20.0);
        let controls = OrbitControls::new(Vec3::new(0.0, 5.0, 0.0)).with_damping(0.05);
        (controls, cam)
    }

    #[test]
    fn idle_update_looks_at_target() {
        let (mut controls, mut cam) = setup();
        let before = cam.position;
        controls.update(&mut cam);
        assert!(cam.position.abs_diff_eq(before, 1e-4));
        assert_eq!(cam.target, Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn damping_spreads_rotation_over_frames() {
        let (mut controls, mut cam) = setup();
        controls.rotate(Vec2::new(100.0, 0.0), 600.0);
        controls.update(&mut cam);
        let first = cam.position;
        controls.update(&mut cam);
        let second = cam.position;
        // still moving on the second frame, by less than the first
        let d1 = first.distance(Vec3::new(0.0, 10.0, 20.0));
        let d2 = second.distance(first);
        assert!(d2 > 0.0 && d2 < d1);
        // orbit preserves distance to target
        let r0 = Vec3::new(0.0, 10.0, 20.0).distance(controls.target);
        assert!((second.distance(controls.target) - r0).abs() < 1e-3);
    }

    #[test]
    fn undamped_rotation_applies_at_once() {
        let (mut controls, mut cam) = setup();
        controls.enable_damping = false;
        // a full viewport-height drag is a full turn
        controls.rotate(Vec2::new(600.0, 0.0), 600.0);
        controls.update(&mut cam);
        assert!(cam.position.abs_diff_eq(Vec3::new(0.0, 10.0, 20.0), 1e-3));
        assert!(!controls.update(&mut cam));
    }

    #[test]
    fn polar_angle_is_clamped() {
        let (mut controls, mut cam) = setup();
        controls.enable_damping = false;
        controls.rotate(Vec2::new(0.0, -10_000.0), 600.0);
        controls.update(&mut cam);
        let offset = cam.position - controls.target;
        assert!(offset.x.is_finite() && offset.z.is_finite());
        assert!(offset.y < offset.length());
    }

    #[test]
    fn dolly_moves_closer() {
        let (mut controls, mut cam) = setup();
        controls.enable_damping = false;
        let r0 = cam.position.distance(controls.target);
        controls.apply(Action::Dolly(1.0), &cam.clone(), 600.0);
        controls.update(&mut cam);
        let r1 = cam.position.distance(controls.target);
        assert!((r1 - r0 * 0.95).abs() < 1e-3);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let (mut controls, mut cam) = setup();
        controls.enable_damping = false;
        let offset0 = cam.position - controls.target;
        controls.pan(Vec2::new(50.0, 0.0), &cam.clone(), 600.0);
        controls.update(&mut cam);
        assert!(controls.target.x < 0.0);
        assert!((cam.position - controls.target).abs_diff_eq(offset0, 1e-3));
    }

    #[test]
    fn disabled_controls_ignore_input() {
        let (mut controls, mut cam) = setup();
        controls.enabled = false;
        controls.apply(Action::Rotate(Vec2::splat(100.0)), &cam.clone(), 600.0);
        assert!(!controls.update(&mut cam));
    }
}
