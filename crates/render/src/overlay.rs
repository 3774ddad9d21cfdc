use glam::Vec2;
use stagecraft_common::{Color, NodeId};
use stagecraft_scene::{MeasureText, PerspectiveCamera, Scene};

/// A label sprite resolved to screen space for this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub node: NodeId,
    pub text: String,
    /// Sprite center in pixels, origin top-left.
    pub center: Vec2,
    /// Sprite size in pixels.
    pub size: Vec2,
    /// Font size in pixels after perspective scaling.
    pub font_px: f32,
    /// Horizontal squeeze for text wider than the label.
    pub text_scale: f32,
    pub depth: f32,
    /// Fog blend weight at the label's depth.
    pub fog: f32,
    pub background: Color,
    pub text_color: Color,
}

/// Project every label in front of the camera, sorted far to near so nearer
/// labels paint over farther ones.
pub fn place_labels(
    scene: &Scene,
    camera: &PerspectiveCamera,
    viewport: Vec2,
    measure: &dyn MeasureText,
) -> Vec<LabelPlacement> {
    let mut placed: Vec<LabelPlacement> = scene
        .labels()
        .into_iter()
        .filter_map(|(node, position, scale, label)| {
            let (center, depth) = camera.project(position, viewport)?;
            if depth > camera.far {
                return None;
            }
            let ppu = camera.pixels_per_unit(depth, viewport.y);
            let size = scale * ppu;
            let canvas = label.canvas(measure);
            Some(LabelPlacement {
                node,
                text: label.text.clone(),
                center,
                size,
                font_px: label.font_size * size.y / canvas.height,
                text_scale: canvas.scale_factor,
                depth,
                fog: scene.fog.map_or(0.0, |f| f.factor(depth)),
                background: label.background,
                text_color: label.text_color,
            })
        })
        .collect();
    placed.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use stagecraft_scene::{FixedAdvance, Fog, Label, Node};

    fn camera() -> PerspectiveCamera {
        let mut cam = PerspectiveCamera::new(85.0, 2.0, 0.1, 100.0);
        cam.position = Vec3::new(0.0, 10.0, 20.0);
        cam.target = Vec3::new(0.0, 5.0, 0.0);
        cam
    }

    #[test]
    fn labels_sorted_far_to_near() {
        let mut scene = Scene::new();
        scene.add(Node::label("near", Label::new("Near", 150.0, 32.0)).at(Vec3::new(0.0, 8.0, 10.0)));
        scene.add(Node::label("far", Label::new("Far", 150.0, 32.0)).at(Vec3::new(0.0, 5.0, -10.0)));
        let placed = place_labels(&scene, &camera(), Vec2::new(800.0, 400.0), &FixedAdvance::default());
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0].text, "Far");
        assert!(placed[0].size.y < placed[1].size.y);
    }

    #[test]
    fn labels_behind_camera_are_dropped() {
        let mut scene = Scene::new();
        scene.add(Node::label("behind", Label::new("Behind", 150.0, 32.0)).at(Vec3::new(0.0, 10.0, 30.0)));
        assert!(place_labels(&scene, &camera(), Vec2::splat(400.0), &FixedAdvance::default()).is_empty());
    }

    #[test]
    fn font_scales_with_sprite() {
        let mut scene = Scene::new();
        scene.fog = Some(Fog::new(Color::WHITE, 15.0, 40.0));
        scene.add(Node::label("cube", Label::new("MegaCube", 150.0, 32.0)).at(Vec3::new(0.0, 5.0, 0.0)));
        let placed = place_labels(&scene, &camera(), Vec2::new(800.0, 400.0), &FixedAdvance::default());
        let p = &placed[0];
        assert!((p.font_px / p.size.y - 32.0 / 36.0).abs() < 1e-4);
        assert!((p.size.x / p.size.y - 154.0 / 36.0).abs() < 1e-4);
        assert!(p.fog > 0.0 && p.fog < 1.0);
        assert_eq!(p.text_scale, 1.0);
    }
}
