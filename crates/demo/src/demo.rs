use crate::config::SceneConfig;
use glam::Vec3;
use stagecraft_assets::{AssetLoader, LoadEvent, ModelData, ModelHandle};
use stagecraft_common::{Color, NodeId, Transform};
use stagecraft_gui::{Axis, ControlPanel, ControlTarget};
use stagecraft_input::OrbitControls;
use stagecraft_scene::geometry::{box_geometry, cylinder_geometry, plane_geometry, sphere_geometry};
use stagecraft_scene::{
    Background, Fog, Label, Light, MaterialId, Node, PerspectiveCamera, PhongMaterial, Scene,
    TextureHandle,
};
use std::f32::consts::PI;

/// Rotation added to the spinning cube on each axis per frame.
pub const SPIN_STEP: f32 = 0.01;

const LABEL_BASE_WIDTH: f32 = 150.0;
const LABEL_FONT_SIZE: f32 = 32.0;

/// Minimum gap the GUI keeps between camera near and far.
pub const NEAR_FAR_GAP: f32 = 0.1;

/// The assembled demo: scene, camera, controls, GUI panel and the handles
/// the frame loop needs.
#[derive(Debug)]
pub struct DemoScene {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub panel: ControlPanel,
    pub spinning_cube: NodeId,
    pub ambient: NodeId,
    pub directional: NodeId,
    pub spot: NodeId,
    pub labels: Vec<NodeId>,
    /// Equirectangular background, swapped in once decoded.
    pub background: TextureHandle,
    pub statue: ModelHandle,
    pub statue_root: Option<NodeId>,
    statue_transform: Transform,
}

/// Build the demo scene and queue its asset loads.
pub fn build(config: &SceneConfig, loader: &mut AssetLoader) -> DemoScene {
    let c = &config.camera;
    let mut camera = PerspectiveCamera::new(c.fov, c.aspect, c.near, c.far);
    camera.position = c.position;
    camera.target = config.controls.target;

    let mut controls = OrbitControls::new(config.controls.target);
    controls.enable_damping = config.controls.enable_damping;
    controls.damping_factor = config.controls.damping_factor;
    controls.update(&mut camera);

    let mut scene = Scene::new();
    scene.fog = Some(Fog::new(config.fog.color, config.fog.near, config.fog.far));
    scene.set_background(Background::Color(config.background));

    let mut panel = ControlPanel::new("Controls", NEAR_FAR_GAP);
    panel
        .add_slider("fov", ControlTarget::CameraFov, 1.0..=180.0, None)
        .add_slider("near", ControlTarget::CameraNear, 0.1..=50.0, Some(0.1))
        .add_slider("far", ControlTarget::CameraFar, 0.1..=50.0, Some(0.1));

    let background = add_ground_and_background(&mut scene, config, loader);
    let ambient = add_ambient_light(&mut scene, &mut panel, config);
    let directional = add_directional_light(&mut scene, &mut panel, config);
    let spot = add_spot_light(&mut scene, &mut panel, config);
    let (spinning_cube, labels) = add_geometries(&mut scene, config, loader);

    let statue = loader.request_model(&config.assets.statue_obj, &config.assets.statue_mtl);

    tracing::info!(
        nodes = scene.node_count(),
        geometries = scene.geometries().len(),
        materials = scene.materials().len(),
        textures = loader.texture_count(),
        "demo scene built"
    );

    DemoScene {
        scene,
        camera,
        controls,
        panel,
        spinning_cube,
        ambient,
        directional,
        spot,
        labels,
        background,
        statue,
        statue_root: None,
        statue_transform: Transform::from_position(config.statue.position)
            .with_scale(Vec3::splat(config.statue.scale)),
    }
}

fn add_ground_and_background(
    scene: &mut Scene,
    config: &SceneConfig,
    loader: &AssetLoader,
) -> TextureHandle {
    let size = config.ground.size;
    let geometry = scene.add_geometry(plane_geometry(size, size, 1, 1));
    let material = scene.add_material(PhongMaterial::colored("ground", config.ground.color).double_sided());
    scene.add(
        Node::mesh("ground", geometry, vec![material])
            .with_transform(Transform::default().with_rotation(Vec3::new(-PI * 0.5, 0.0, 0.0)))
            .with_shadows(false, true),
    );
    loader.request_texture(&config.assets.background)
}

fn add_ambient_light(scene: &mut Scene, panel: &mut ControlPanel, config: &SceneConfig) -> NodeId {
    let a = &config.ambient;
    let id = scene.add(Node::light("ambient", Light::ambient(a.color, a.intensity)));
    panel
        .add_slider("Ambient Intensity", ControlTarget::LightIntensity(id), 0.0..=2.0, Some(0.01))
        .add_color("Ambient Color", ControlTarget::LightColor(id));
    id
}

fn add_directional_light(scene: &mut Scene, panel: &mut ControlPanel, config: &SceneConfig) -> NodeId {
    let d = &config.directional;
    let light = Light::Directional {
        color: d.color,
        intensity: d.intensity,
        target: d.target,
    };
    let id = scene.add(
        Node::light("directional", light)
            .at(d.position)
            .with_shadows(d.cast_shadow, false),
    );
    panel
        .add_slider("Directional Intensity", ControlTarget::LightIntensity(id), 0.0..=5.0, Some(0.01))
        .add_slider("Directional Target X", ControlTarget::LightTarget(id, Axis::X), -10.0..=10.0, None)
        .add_slider("Directional Target Z", ControlTarget::LightTarget(id, Axis::Z), -10.0..=10.0, None)
        .add_slider("Directional Target Y", ControlTarget::LightTarget(id, Axis::Y), 0.0..=10.0, None);
    id
}

fn add_spot_light(scene: &mut Scene, panel: &mut ControlPanel, config: &SceneConfig) -> NodeId {
    let s = &config.spot;
    let light = Light::Spot {
        color: s.color,
        intensity: s.intensity,
        target: Vec3::ZERO,
        angle: s.angle,
        penumbra: s.penumbra,
        decay: s.decay,
        distance: s.distance,
    };
    let id = scene.add(
        Node::light("spot", light)
            .at(s.position)
            .with_shadows(s.cast_shadow, false),
    );
    panel
        .add_slider("Spot Intensity", ControlTarget::LightIntensity(id), 0.0..=350.0, Some(0.01))
        .add_color("Spot Color", ControlTarget::LightColor(id))
        .add_slider("Spot Angle", ControlTarget::SpotAngle(id), 0.0..=PI / 2.0, Some(0.01))
        .add_slider("Spot Penumbra", ControlTarget::SpotPenumbra(id), 0.0..=1.0, Some(0.01));
    id
}

/// Spinning cube, cube stack, sphere, cylinder pyramid and the two labels.
/// Returns the spinning cube and the label nodes.
fn add_geometries(scene: &mut Scene, config: &SceneConfig, loader: &AssetLoader) -> (NodeId, Vec<NodeId>) {
    let paths = &config.assets;
    let faces: Vec<TextureHandle> = paths.cube_faces.iter().map(|p| loader.request_texture(p)).collect();
    let face_name = |i: usize| {
        paths.cube_faces[i]
            .file_stem()
            .map_or_else(|| format!("face{i}"), |s| s.to_string_lossy().into_owned())
    };

    let cube_geometry = scene.add_geometry(box_geometry(2.0, 2.0, 2.0));
    let box_materials: Vec<MaterialId> = faces
        .iter()
        .enumerate()
        .map(|(i, tex)| scene.add_material(PhongMaterial::textured(face_name(i), *tex)))
        .collect();
    let spinning_cube = scene.add(
        Node::mesh("spinning cube", cube_geometry, box_materials)
            .at(Vec3::new(-6.0, 13.75, 1.0))
            .with_shadows(true, true),
    );

    let mut labels = Vec::with_capacity(2);
    let cube_position = scene.world_position(spinning_cube).unwrap_or_default();
    labels.push(scene.add(
        Node::label("MegaCube label", Label::new("MegaCube", LABEL_BASE_WIDTH, LABEL_FONT_SIZE))
            .at(cube_position + Vec3::new(0.0, 2.5, 0.0)),
    ));

    for (i, tex) in faces.iter().enumerate() {
        let material = scene.add_material(PhongMaterial::textured(face_name(i), *tex));
        scene.add(
            Node::mesh(format!("stacked cube {i}"), cube_geometry, vec![material])
                .at(Vec3::new(-6.0, 1.0 + i as f32 * 2.0, 1.0))
                .with_shadows(true, true),
        );
    }

    let sphere_geometry = scene.add_geometry(sphere_geometry(1.0, 32, 32));
    let ball = scene.add_material(PhongMaterial::textured("bowlingBall", loader.request_texture(&paths.bowling_ball)));
    let sphere_transform = Transform::from_position(Vec3::new(9.0, 1.0, 4.0))
        .with_rotation(Vec3::new(0.0, -PI / 3.0, PI / 3.0));
    scene.add(
        Node::mesh("sphere", sphere_geometry, vec![ball])
            .with_transform(sphere_transform)
            .with_shadows(true, true),
    );
    labels.push(scene.add(
        Node::label("Bowling label", Label::new("Bowling", LABEL_BASE_WIDTH, LABEL_FONT_SIZE))
            .at(sphere_transform.position + Vec3::new(0.0, 1.5, 0.0)),
    ));

    let cylinder_geometry = scene.add_geometry(cylinder_geometry(0.75, 0.75, 2.0, 32));
    let pin = loader.request_texture(&paths.bowling_pin);
    let cylinder_materials = vec![
        scene.add_material(PhongMaterial::textured("bowlingPin", pin)),
        scene.add_material(PhongMaterial::colored("pin top", Color::WHITE)),
        scene.add_material(PhongMaterial::colored("pin bottom", Color::WHITE)),
    ];
    for (position, row, i) in pyramid_positions(&config.pyramid_rows) {
        scene.add(
            Node::mesh(format!("cylinder {row}.{i}"), cylinder_geometry, cylinder_materials.clone()).at(position),
        );
    }

    (spinning_cube, labels)
}

/// Cylinder centers for a pyramid with the given row counts, bottom row first.
/// Yields `(position, row, index_in_row)`.
pub fn pyramid_positions(rows: &[u32]) -> Vec<(Vec3, usize, u32)> {
    const BASE_Y: f32 = 1.5;
    const Y_SPACING: f32 = 2.0;
    const X_SPACING: f32 = 2.0;
    const X_OFFSET: f32 = 10.0;

    let mut out = Vec::with_capacity(rows.iter().sum::<u32>() as usize);
    for (row, &count) in rows.iter().enumerate() {
        let total_width = count.saturating_sub(1) as f32 * X_SPACING;
        let y = BASE_Y + row as f32 * Y_SPACING;
        for i in 0..count {
            let x = i as f32 * X_SPACING - total_width / 2.0 + X_OFFSET;
            out.push((Vec3::new(x, y, 0.0), row, i));
        }
    }
    out
}

/// Grow the drawing buffer to match the display. Returns `true` if it changed.
pub fn resize_to_display_size(buffer: &mut (u32, u32), display: (u32, u32)) -> bool {
    let needs_resize = *buffer != display;
    if needs_resize {
        *buffer = display;
    }
    needs_resize
}

impl DemoScene {
    /// Per-frame update: resize check, cube spin and control damping.
    /// Returns `true` when the drawing buffer was resized.
    pub fn tick(&mut self, buffer: &mut (u32, u32), display: (u32, u32)) -> bool {
        let resized = resize_to_display_size(buffer, display);
        if resized && display.1 > 0 {
            self.camera.aspect = display.0 as f32 / display.1 as f32;
        }
        self.spin();
        self.controls.update(&mut self.camera);
        resized
    }

    pub fn spin(&mut self) {
        if let Some(node) = self.scene.get_mut(self.spinning_cube) {
            node.transform.rotation.x += SPIN_STEP;
            node.transform.rotation.y += SPIN_STEP;
        }
    }

    /// React to a finished load. Returns `true` if the scene changed.
    ///
    /// Texture uploads are the renderer's business; the scene only cares
    /// about the background swap and the statue.
    pub fn on_load_event(&mut self, event: LoadEvent) -> bool {
        match event {
            LoadEvent::TextureLoaded { handle, path, .. } if handle == self.background => {
                tracing::info!(path = %path.display(), "background texture ready");
                self.scene.set_background(Background::Equirect(handle));
                true
            }
            LoadEvent::TextureLoaded { .. } => false,
            LoadEvent::ModelLoaded { handle, model } if handle == self.statue => {
                self.insert_statue(model);
                true
            }
            LoadEvent::ModelLoaded { handle, .. } => {
                tracing::debug!(handle = handle.0, "ignoring unrequested model");
                false
            }
            LoadEvent::Failed { path, .. } => {
                tracing::debug!(path = %path.display(), "asset unavailable, keeping placeholder");
                false
            }
        }
    }

    fn insert_statue(&mut self, model: ModelData) {
        if let Some(old) = self.statue_root.take() {
            self.scene.remove(old);
        }
        // shadow flags stay on the root, its meshes keep the defaults
        let root = self.scene.add(
            Node::group(model.name.clone())
                .with_transform(self.statue_transform)
                .with_shadows(true, true),
        );

        let materials: Vec<MaterialId> = model
            .materials
            .iter()
            .map(|m| {
                self.scene.add_material(PhongMaterial {
                    name: m.name.clone(),
                    color: m.diffuse,
                    map: m.map,
                    ..PhongMaterial::default()
                })
            })
            .collect();
        let mut fallback = None;

        let triangles = model.triangle_count();
        for mesh in model.meshes {
            let material = match mesh.material.and_then(|i| materials.get(i)) {
                Some(id) => *id,
                None => *fallback.get_or_insert_with(|| self.scene.add_material(PhongMaterial::default())),
            };
            let geometry = self.scene.add_geometry(mesh.mesh);
            self.scene.add_child(root, Node::mesh(mesh.name, geometry, vec![material]));
        }

        tracing::info!(name = %model.name, triangles, "statue added");
        self.statue_root = Some(root);
    }
}
