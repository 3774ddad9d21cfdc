use stagecraft_scene::{Background, NodeKind, PerspectiveCamera, Scene};
use std::fmt::Write;

/// Renderer-agnostic interface.
///
/// A renderer reads the scene and a camera and produces output. It never
/// mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&self, scene: &Scene, camera: &PerspectiveCamera) -> Self::Output;
}

/// Produces a human-readable dump of the scene. Used by the CLI and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene (nodes={}, geometries={}, materials={}) ===",
            scene.node_count(),
            scene.geometries().len(),
            scene.materials().len()
        );
        let (p, t) = (camera.position, camera.target);
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0} near={} far={}",
            p.x, p.y, p.z, t.x, t.y, t.z, camera.fov, camera.near, camera.far
        );
        match scene.background() {
            Background::Color(c) => {
                let _ = writeln!(out, "Background: {c}");
            }
            Background::Equirect(h) => {
                let _ = writeln!(out, "Background: equirect texture #{}", h.0);
            }
        }
        if let Some(fog) = scene.fog {
            let _ = writeln!(out, "Fog: {} near={} far={}", fog.color, fog.near, fog.far);
        }

        for (id, node) in scene.nodes() {
            let kind = match &node.kind {
                NodeKind::Group => "group".to_string(),
                NodeKind::Mesh { geometry, materials } => {
                    format!("mesh(geometry={}, materials={})", geometry.0, materials.len())
                }
                NodeKind::Light(light) => format!("light({}, {:.2})", light.kind(), light.intensity()),
                NodeKind::Label(label) => format!("label({:?})", label.text),
            };
            let pos = scene.world_position(*id).unwrap_or(node.transform.position);
            let shadows = match (node.cast_shadow, node.receive_shadow) {
                (true, true) => " shadows=cast+receive",
                (true, false) => " shadows=cast",
                (false, true) => " shadows=receive",
                (false, false) => "",
            };
            let _ = writeln!(
                out,
                "  [{}] {} {} pos=({:.2}, {:.2}, {:.2}){}",
                id.short(),
                node.name,
                kind,
                pos.x,
                pos.y,
                pos.z,
                shadows
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use stagecraft_common::Color;
    use stagecraft_scene::{Fog, Light, Node};

    #[test]
    fn debug_renderer_empty_scene() {
        let output = DebugTextRenderer::new().render(&Scene::new(), &PerspectiveCamera::default());
        assert!(output.contains("nodes=0"));
        assert!(output.contains("Background: #000000"));
        assert!(!output.contains("Fog:"));
    }

    #[test]
    fn debug_renderer_lists_nodes() {
        let mut scene = Scene::new();
        scene.fog = Some(Fog::new(Color::WHITE, 15.0, 40.0));
        scene.add(
            Node::light("sun", Light::directional(Color::WHITE, 1.0))
                .at(Vec3::new(5.0, 18.0, 2.0))
                .with_shadows(true, false),
        );
        let output = DebugTextRenderer::new().render(&scene, &PerspectiveCamera::default());
        assert!(output.contains("nodes=1"));
        assert!(output.contains("Fog: #ffffff near=15 far=40"));
        assert!(output.contains("sun light(directional, 1.00) pos=(5.00, 18.00, 2.00) shadows=cast"));
    }
}
