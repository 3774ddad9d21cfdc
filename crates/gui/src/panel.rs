use crate::bindings::{ColorBinding, MinMaxBinding};
use stagecraft_common::{Color, NodeId};
use stagecraft_scene::{Light, PerspectiveCamera, Scene};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A property a control reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTarget {
    CameraFov,
    CameraNear,
    CameraFar,
    LightIntensity(NodeId),
    LightColor(NodeId),
    LightTarget(NodeId, Axis),
    SpotAngle(NodeId),
    SpotPenumbra(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Slider {
        label: String,
        range: RangeInclusive<f32>,
        step: Option<f32>,
        target: ControlTarget,
    },
    Color {
        label: String,
        target: ControlTarget,
    },
}

impl Control {
    pub fn label(&self) -> &str {
        match self {
            Self::Slider { label, .. } | Self::Color { label, .. } => label,
        }
    }

    pub fn target(&self) -> ControlTarget {
        match self {
            Self::Slider { target, .. } | Self::Color { target, .. } => *target,
        }
    }
}

/// An ordered list of controls bound to scene and camera properties.
#[derive(Debug, Clone)]
pub struct ControlPanel {
    pub title: String,
    /// Minimum gap kept between camera near and far.
    pub near_far_gap: f32,
    controls: Vec<Control>,
}

impl ControlPanel {
    pub fn new(title: impl Into<String>, near_far_gap: f32) -> Self {
        Self {
            title: title.into(),
            near_far_gap,
            controls: Vec::new(),
        }
    }

    pub fn add_slider(
        &mut self,
        label: impl Into<String>,
        target: ControlTarget,
        range: RangeInclusive<f32>,
        step: Option<f32>,
    ) -> &mut Self {
        self.controls.push(Control::Slider {
            label: label.into(),
            range,
            step,
            target,
        });
        self
    }

    pub fn add_color(&mut self, label: impl Into<String>, target: ControlTarget) -> &mut Self {
        self.controls.push(Control::Color {
            label: label.into(),
            target,
        });
        self
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn find(&self, label: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.label() == label)
    }

    /// Current numeric value of a target, `None` if it no longer resolves.
    pub fn read(&self, target: ControlTarget, scene: &Scene, camera: &PerspectiveCamera) -> Option<f32> {
        let light = |id: NodeId| scene.get(id).and_then(|n| n.as_light());
        match target {
            ControlTarget::CameraFov => Some(camera.fov),
            ControlTarget::CameraNear => Some(camera.near),
            ControlTarget::CameraFar => Some(camera.far),
            ControlTarget::LightIntensity(id) => light(id).map(Light::intensity),
            ControlTarget::LightTarget(id, axis) => {
                let t = light(id)?.target()?;
                Some(match axis {
                    Axis::X => t.x,
                    Axis::Y => t.y,
                    Axis::Z => t.z,
                })
            }
            ControlTarget::SpotAngle(id) => match light(id)? {
                Light::Spot { angle, .. } => Some(*angle),
                _ => None,
            },
            ControlTarget::SpotPenumbra(id) => match light(id)? {
                Light::Spot { penumbra, .. } => Some(*penumbra),
                _ => None,
            },
            ControlTarget::LightColor(_) => None,
        }
    }

    /// Store a numeric value. Returns `false` if the target does not resolve.
    pub fn write(
        &self,
        target: ControlTarget,
        value: f32,
        scene: &mut Scene,
        camera: &mut PerspectiveCamera,
    ) -> bool {
        match target {
            ControlTarget::CameraFov => camera.fov = value,
            ControlTarget::CameraNear => {
                MinMaxBinding::new(&mut camera.near, &mut camera.far, self.near_far_gap).set_min(value)
            }
            ControlTarget::CameraFar => {
                MinMaxBinding::new(&mut camera.near, &mut camera.far, self.near_far_gap).set_max(value)
            }
            ControlTarget::LightIntensity(id) => match scene.light_mut(id) {
                Some(light) => *light.intensity_mut() = value,
                None => return false,
            },
            ControlTarget::LightTarget(id, axis) => {
                let Some(t) = scene.light_mut(id).and_then(Light::target_mut) else {
                    return false;
                };
                match axis {
                    Axis::X => t.x = value,
                    Axis::Y => t.y = value,
                    Axis::Z => t.z = value,
                }
            }
            ControlTarget::SpotAngle(id) => match scene.light_mut(id) {
                Some(Light::Spot { angle, .. }) => *angle = value,
                _ => return false,
            },
            ControlTarget::SpotPenumbra(id) => match scene.light_mut(id) {
                Some(Light::Spot { penumbra, .. }) => *penumbra = value,
                _ => return false,
            },
            ControlTarget::LightColor(_) => return false,
        }
        true
    }

    /// Color of a target as `#rrggbb`.
    pub fn read_color(&self, target: ControlTarget, scene: &mut Scene) -> Option<String> {
        let ControlTarget::LightColor(id) = target else {
            return None;
        };
        let light = scene.light_mut(id)?;
        Some(ColorBinding::new(light.color_mut()).value())
    }

    pub fn write_color(&self, target: ControlTarget, value: &str, scene: &mut Scene) -> bool {
        let ControlTarget::LightColor(id) = target else {
            return false;
        };
        let Some(light) = scene.light_mut(id) else {
            return false;
        };
        match ColorBinding::new(light.color_mut()).set_value(value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "rejected color value");
                false
            }
        }
    }

    /// Draw the panel. Returns `true` if any value changed this frame.
    pub fn show(&self, ctx: &egui::Context, scene: &mut Scene, camera: &mut PerspectiveCamera) -> bool {
        let mut changed = false;
        egui::Window::new(self.title.as_str())
            .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("controls").num_columns(2).show(ui, |ui| {
                    for control in &self.controls {
                        ui.label(control.label());
                        changed |= self.show_control(ui, control, scene, camera);
                        ui.end_row();
                    }
                });
            });
        changed
    }

    fn show_control(
        &self,
        ui: &mut egui::Ui,
        control: &Control,
        scene: &mut Scene,
        camera: &mut PerspectiveCamera,
    ) -> bool {
        match control {
            Control::Slider {
                range,
                step,
                target,
                ..
            } => {
                let Some(mut value) = self.read(*target, scene, camera) else {
                    ui.weak("n/a");
                    return false;
                };
                // out-of-range values are shown, not rewritten
                let mut slider = egui::Slider::new(&mut value, range.clone())
                    .clamping(egui::SliderClamping::Edits);
                if let Some(step) = step {
                    slider = slider.step_by(*step as f64);
                }
                if ui.add(slider).changed() {
                    return self.write(*target, value, scene, camera);
                }
                false
            }
            Control::Color { target, .. } => {
                let Some(hex) = self.read_color(*target, scene) else {
                    ui.weak("n/a");
                    return false;
                };
                let mut rgb = Color::parse(&hex).map(|c| c.to_srgb8()).unwrap_or([255; 3]);
                if ui.color_edit_button_srgb(&mut rgb).changed() {
                    let [r, g, b] = rgb;
                    return self.write_color(*target, &format!("#{r:02x}{g:02x}{b:02x}"), scene);
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use stagecraft_scene::Node;

    fn fixture() -> (ControlPanel, Scene, PerspectiveCamera, NodeId, NodeId) {
        let mut scene = Scene::new();
        let sun = scene.add(Node::light("sun", Light::directional(Color::WHITE, 1.0)));
        let spot = scene.add(Node::light("spot", Light::spot(Color::WHITE, 150.0)));
        let mut panel = ControlPanel::new("Controls", 0.1);
        panel
            .add_slider("fov", ControlTarget::CameraFov, 1.0..=180.0, None)
            .add_slider("near", ControlTarget::CameraNear, 0.1..=50.0, Some(0.1))
            .add_slider("far", ControlTarget::CameraFar, 0.1..=50.0, Some(0.1))
            .add_slider(
                "Directional Target Y",
                ControlTarget::LightTarget(sun, Axis::Y),
                0.0..=10.0,
                None,
            )
            .add_slider("Spot Angle", ControlTarget::SpotAngle(spot), 0.0..=1.57, Some(0.01))
            .add_color("Spot Color", ControlTarget::LightColor(spot));
        let camera = PerspectiveCamera::new(85.0, 2.0, 0.1, 100.0);
        (panel, scene, camera, sun, spot)
    }

    #[test]
    fn reads_camera_and_lights() {
        let (panel, scene, camera, _, spot) = fixture();
        assert_eq!(panel.read(ControlTarget::CameraFar, &scene, &camera), Some(100.0));
        assert_eq!(
            panel.read(ControlTarget::SpotAngle(spot), &scene, &camera),
            Some(std::f32::consts::FRAC_PI_3)
        );
        assert_eq!(panel.controls().len(), 6);
        assert!(panel.find("far").is_some());
    }

    #[test]
    fn near_edit_respects_gap() {
        let (panel, mut scene, mut camera, _, _) = fixture();
        panel.write(ControlTarget::CameraFar, 10.0, &mut scene, &mut camera);
        panel.write(ControlTarget::CameraNear, 20.0, &mut scene, &mut camera);
        assert_eq!(camera.near, 20.0);
        assert!((camera.far - 20.1).abs() < 1e-5);
    }

    #[test]
    fn light_target_axis_write() {
        let (panel, mut scene, mut camera, sun, _) = fixture();
        assert!(panel.write(ControlTarget::LightTarget(sun, Axis::Y), 4.0, &mut scene, &mut camera));
        let light = scene.get(sun).unwrap().as_light().unwrap();
        assert_eq!(light.target(), Some(Vec3::new(0.0, 4.0, 0.0)));
    }

    #[test]
    fn spot_only_targets_reject_other_lights() {
        let (panel, mut scene, mut camera, sun, _) = fixture();
        assert!(!panel.write(ControlTarget::SpotAngle(sun), 0.3, &mut scene, &mut camera));
        assert_eq!(panel.read(ControlTarget::SpotPenumbra(sun), &scene, &camera), None);
    }

    #[test]
    fn missing_node_does_not_resolve() {
        let (panel, mut scene, mut camera, _, _) = fixture();
        let ghost = NodeId::new();
        assert!(!panel.write(ControlTarget::LightIntensity(ghost), 1.0, &mut scene, &mut camera));
        assert_eq!(panel.read(ControlTarget::LightIntensity(ghost), &scene, &camera), None);
    }

    #[test]
    fn color_through_hex() {
        let (panel, mut scene, _, _, spot) = fixture();
        let target = ControlTarget::LightColor(spot);
        assert_eq!(panel.read_color(target, &mut scene).as_deref(), Some("#ffffff"));
        assert!(panel.write_color(target, "#00ff00", &mut scene));
        assert_eq!(panel.read_color(target, &mut scene).as_deref(), Some("#00ff00"));
        assert!(!panel.write_color(target, "bogus!", &mut scene));
    }

    #[test]
    fn panel_draws_headless_without_changes() {
        let (panel, mut scene, mut camera, _, _) = fixture();
        let ctx = egui::Context::default();
        let mut changed = true;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            changed = panel.show(ctx, &mut scene, &mut camera);
        });
        assert!(!changed);
        // far stays outside the slider range until the user touches it
        assert_eq!(camera.far, 100.0);
    }
}
