use glam::{Mat4, Vec3};
use stagecraft_common::NodeId;
use stagecraft_scene::{
    Background, Fog, GeometryGroup, GeometryId, Light, MaterialId, NodeKind, PerspectiveCamera,
    Scene,
};

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_SPOT_LIGHTS: usize = 4;

const SHADOW_NEAR: f32 = 0.5;
const SHADOW_FAR: f32 = 500.0;

/// Shadow map parameters shared by all shadow-casting lights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub enabled: bool,
    pub map_size: u32,
    /// Half-size of the directional light's orthographic frustum.
    pub directional_extent: f32,
    pub bias: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            map_size: 2048,
            directional_extent: 30.0,
            bias: 0.0005,
        }
    }
}

/// View-projection of an orthographic shadow camera at `position` facing `target`.
pub fn directional_shadow_matrix(position: Vec3, target: Vec3, extent: f32) -> Mat4 {
    let view = Mat4::look_at_rh(position, target, shadow_up(target - position));
    let proj = Mat4::orthographic_rh(-extent, extent, -extent, extent, SHADOW_NEAR, SHADOW_FAR);
    proj * view
}

/// View-projection of a perspective shadow camera covering the spot cone.
///
/// A `distance` of zero means unlimited range and falls back to a fixed far plane.
pub fn spot_shadow_matrix(position: Vec3, target: Vec3, angle: f32, distance: f32) -> Mat4 {
    let view = Mat4::look_at_rh(position, target, shadow_up(target - position));
    let fov = (2.0 * angle).clamp(0.01, std::f32::consts::PI - 0.01);
    let far = if distance > 0.0 { distance } else { SHADOW_FAR };
    let proj = Mat4::perspective_rh(fov, 1.0, SHADOW_NEAR, far.max(SHADOW_NEAR + 0.01));
    proj * view
}

// straight-down lights need a different up vector
fn shadow_up(direction: Vec3) -> Vec3 {
    if direction.normalize_or_zero().cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLightData {
    /// Unit vector from the light towards its target.
    pub direction: Vec3,
    /// Linear color premultiplied by intensity.
    pub radiance: [f32; 3],
    pub shadow: Option<Mat4>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLightData {
    pub position: Vec3,
    pub direction: Vec3,
    pub radiance: [f32; 3],
    pub cone_cos: f32,
    pub penumbra_cos: f32,
    pub decay: f32,
    pub distance: f32,
    pub shadow: Option<Mat4>,
}

/// Lights packed for shading. Only the first shadow-casting light of each
/// kind gets a shadow map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightSet {
    pub ambient: [f32; 3],
    pub directional: Vec<DirectionalLightData>,
    pub spot: Vec<SpotLightData>,
}

impl LightSet {
    pub fn directional_shadow(&self) -> Option<Mat4> {
        self.directional.iter().find_map(|l| l.shadow)
    }

    pub fn spot_shadow(&self) -> Option<Mat4> {
        self.spot.iter().find_map(|l| l.shadow)
    }
}

/// One mesh node ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub geometry: GeometryId,
    pub model: Mat4,
    /// Each geometry group with the material bound to its slot, if any.
    pub groups: Vec<(GeometryGroup, Option<MaterialId>)>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone)]
pub struct FrameData {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub background: Background,
    pub fog: Option<Fog>,
    pub lights: LightSet,
    pub draws: Vec<DrawItem>,
}

impl FrameData {
    pub fn extract(scene: &Scene, camera: &PerspectiveCamera, shadows: &ShadowSettings) -> Self {
        let mut lights = LightSet::default();
        let mut has_dir_shadow = false;
        let mut has_spot_shadow = false;
        for (id, position, light) in scene.lights() {
            let casts = shadows.enabled && scene.get(id).is_some_and(|n| n.cast_shadow);
            let radiance = light.color().scaled_linear(light.intensity());
            match *light {
                Light::Ambient { .. } => {
                    for (acc, c) in lights.ambient.iter_mut().zip(radiance) {
                        *acc += c;
                    }
                }
                Light::Directional { target, .. } => {
                    if lights.directional.len() == MAX_DIRECTIONAL_LIGHTS {
                        tracing::debug!("directional light limit reached, skipping");
                        continue;
                    }
                    let shadow = (casts && !has_dir_shadow).then(|| {
                        directional_shadow_matrix(position, target, shadows.directional_extent)
                    });
                    has_dir_shadow |= shadow.is_some();
                    lights.directional.push(DirectionalLightData {
                        direction: (target - position).normalize_or(Vec3::NEG_Y),
                        radiance,
                        shadow,
                    });
                }
                Light::Spot {
                    target,
                    angle,
                    penumbra,
                    decay,
                    distance,
                    ..
                } => {
                    if lights.spot.len() == MAX_SPOT_LIGHTS {
                        tracing::debug!("spot light limit reached, skipping");
                        continue;
                    }
                    let shadow = (casts && !has_spot_shadow)
                        .then(|| spot_shadow_matrix(position, target, angle, distance));
                    has_spot_shadow |= shadow.is_some();
                    lights.spot.push(SpotLightData {
                        position,
                        direction: (target - position).normalize_or(Vec3::NEG_Y),
                        radiance,
                        cone_cos: angle.cos(),
                        penumbra_cos: (angle * (1.0 - penumbra)).cos(),
                        decay,
                        distance,
                        shadow,
                    });
                }
            }
        }

        let draws = scene
            .meshes()
            .into_iter()
            .filter_map(|(node, model, n)| {
                let NodeKind::Mesh {
                    geometry,
                    materials,
                } = &n.kind
                else {
                    return None;
                };
                let mesh = scene.geometry(*geometry)?;
                // a lone material shades every group
                let single = match materials.as_slice() {
                    [only] => Some(*only),
                    _ => None,
                };
                let groups = mesh
                    .draw_groups()
                    .into_iter()
                    .map(|g| (g, single.or_else(|| materials.get(g.material_index).copied())))
                    .collect();
                Some(DrawItem {
                    node,
                    geometry: *geometry,
                    model,
                    groups,
                    cast_shadow: n.cast_shadow,
                    receive_shadow: n.receive_shadow,
                })
            })
            .collect();

        Self {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
            camera_position: camera.position,
            background: scene.background(),
            fog: scene.fog,
            lights,
            draws,
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn shadow_casters(&self) -> impl Iterator<Item = &DrawItem> {
        self.draws.iter().filter(|d| d.cast_shadow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4Swizzles;
    use stagecraft_common::Color;
    use stagecraft_scene::geometry::{box_geometry, cylinder_geometry};
    use stagecraft_scene::{Node, PhongMaterial};

    fn lit_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add(Node::light("ambient", Light::ambient(Color::from_hex(0x404040), 0.5)));
        let mut sun = Light::directional(Color::WHITE, 1.0);
        *sun.target_mut().unwrap() = Vec3::ZERO;
        scene.add(Node::light("sun", sun).at(Vec3::new(5.0, 18.0, 2.0)).with_shadows(true, false));
        let mut spot = Light::spot(Color::WHITE, 150.0);
        if let Light::Spot { angle, penumbra, distance, .. } = &mut spot {
            *angle = std::f32::consts::FRAC_PI_6;
            *penumbra = 0.1;
            *distance = 200.0;
        }
        scene.add(Node::light("spot", spot).at(Vec3::new(0.0, 18.0, 0.0)).with_shadows(true, false));
        scene
    }

    #[test]
    fn lights_are_packed() {
        let scene = lit_scene();
        let frame = FrameData::extract(&scene, &PerspectiveCamera::default(), &ShadowSettings::default());
        let ambient = Color::from_hex(0x404040).scaled_linear(0.5);
        assert_eq!(frame.lights.ambient, ambient);
        assert_eq!(frame.lights.directional.len(), 1);
        assert_eq!(frame.lights.spot.len(), 1);
        let spot = frame.lights.spot[0];
        assert!((spot.direction - Vec3::NEG_Y).length() < 1e-6);
        assert!((spot.cone_cos - (std::f32::consts::FRAC_PI_6).cos()).abs() < 1e-6);
        assert!(spot.penumbra_cos > spot.cone_cos);
        assert!(frame.lights.directional_shadow().is_some());
        assert!(frame.lights.spot_shadow().is_some());
    }

    #[test]
    fn disabled_shadows_produce_no_matrices() {
        let scene = lit_scene();
        let settings = ShadowSettings {
            enabled: false,
            ..ShadowSettings::default()
        };
        let frame = FrameData::extract(&scene, &PerspectiveCamera::default(), &settings);
        assert!(frame.lights.directional_shadow().is_none());
        assert!(frame.lights.spot_shadow().is_none());
    }

    #[test]
    fn draws_resolve_material_slots() {
        let mut scene = Scene::new();
        let g = scene.add_geometry(cylinder_geometry(0.75, 0.75, 2.0, 32));
        let pin = scene.add_material(PhongMaterial::default());
        let white = scene.add_material(PhongMaterial::colored("white", Color::WHITE));
        scene.add(Node::mesh("pin", g, vec![pin, white, white]));
        let b = scene.add_geometry(box_geometry(1.0, 1.0, 1.0));
        scene.add(Node::mesh("short", b, vec![pin, white]).with_shadows(true, true));
        scene.add(Node::mesh("single", b, vec![white]));

        let frame = FrameData::extract(&scene, &PerspectiveCamera::default(), &ShadowSettings::default());
        assert_eq!(frame.draws.len(), 3);
        let pin_draw = frame.draws.iter().find(|d| d.geometry == g).unwrap();
        let slots: Vec<_> = pin_draw.groups.iter().map(|(_, m)| *m).collect();
        assert_eq!(slots, vec![Some(pin), Some(white), Some(white)]);
        // box groups beyond a material list stay unbound
        let short = frame.draws.iter().find(|d| d.geometry == b && d.cast_shadow).unwrap();
        assert_eq!(short.groups.iter().filter(|(_, m)| m.is_none()).count(), 4);
        // one material covers all six faces
        let single = frame.draws.iter().find(|d| d.geometry == b && !d.cast_shadow).unwrap();
        assert!(single.groups.iter().all(|(_, m)| *m == Some(white)));
        assert_eq!(frame.shadow_casters().count(), 1);
    }

    #[test]
    fn shadow_matrices_map_target_inside_clip() {
        let m = directional_shadow_matrix(Vec3::new(5.0, 18.0, 2.0), Vec3::ZERO, 30.0);
        let clip = m * Vec3::ZERO.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);

        // straight down still yields a finite matrix
        let s = spot_shadow_matrix(Vec3::new(0.0, 18.0, 0.0), Vec3::ZERO, 0.5, 200.0);
        assert!(s.is_finite());
        let clip = s * Vec3::ZERO.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
