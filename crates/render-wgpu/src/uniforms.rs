//! GPU-side data layouts. Every struct is built from `vec4`-sized fields so the
//! Rust layout matches WGSL uniform alignment without padding tricks.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};
use stagecraft_render::{FrameData, MAX_DIRECTIONAL_LIGHTS, MAX_SPOT_LIGHTS, ShadowSettings};
use stagecraft_scene::{MeshData, PhongMaterial, Side};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn from_mesh(mesh: &MeshData) -> Vec<Vertex> {
        (0..mesh.vertex_count())
            .map(|i| Vertex {
                position: mesh.positions[i],
                normal: mesh.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uv: mesh.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect()
    }
}

/// Per-draw data: model matrix, normal matrix and flags.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct InstanceData {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    /// x: receives shadows.
    pub params: [f32; 4],
}

impl InstanceData {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x4,
        10 => Float32x4,
    ];

    pub fn new(model: Mat4, receive_shadow: bool) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        let n = |c: glam::Vec3| [c.x, c.y, c.z, 0.0];
        Self {
            model: model.to_cols_array_2d(),
            normal: [n(normal.x_axis), n(normal.y_axis), n(normal.z_axis)],
            params: [if receive_shadow { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub(crate) struct DirLightGpu {
    /// xyz: direction towards the target; w: 1 if shadowed.
    pub direction: [f32; 4],
    pub radiance: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub(crate) struct SpotLightGpu {
    /// w: cutoff distance.
    pub position: [f32; 4],
    /// w: decay exponent.
    pub direction: [f32; 4],
    /// w: 1 if shadowed.
    pub radiance: [f32; 4],
    /// x: cos(angle), y: cos(angle * (1 - penumbra)).
    pub cone: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub dir_shadow: [[f32; 4]; 4],
    pub spot_shadow: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub fog_color: [f32; 4],
    /// x: near, y: far, z: enabled.
    pub fog: [f32; 4],
    /// x: directional count, y: spot count.
    pub counts: [u32; 4],
    /// x: depth bias, y: texel size.
    pub shadow: [f32; 4],
    pub dir_lights: [DirLightGpu; MAX_DIRECTIONAL_LIGHTS],
    pub spot_lights: [SpotLightGpu; MAX_SPOT_LIGHTS],
}

impl FrameUniforms {
    pub fn from_frame(frame: &FrameData, shadows: &ShadowSettings) -> Self {
        let vp = frame.view_projection();
        let rgb = |c: [f32; 3], w: f32| [c[0], c[1], c[2], w];
        let flag = |b: bool| if b { 1.0 } else { 0.0 };

        let mut dir_lights = [DirLightGpu::default(); MAX_DIRECTIONAL_LIGHTS];
        for (slot, light) in dir_lights.iter_mut().zip(&frame.lights.directional) {
            *slot = DirLightGpu {
                direction: light.direction.extend(flag(light.shadow.is_some())).to_array(),
                radiance: rgb(light.radiance, 0.0),
            };
        }
        let mut spot_lights = [SpotLightGpu::default(); MAX_SPOT_LIGHTS];
        for (slot, light) in spot_lights.iter_mut().zip(&frame.lights.spot) {
            *slot = SpotLightGpu {
                position: light.position.extend(light.distance).to_array(),
                direction: light.direction.extend(light.decay).to_array(),
                radiance: rgb(light.radiance, flag(light.shadow.is_some())),
                cone: [light.cone_cos, light.penumbra_cos, 0.0, 0.0],
            };
        }

        let (fog_color, fog) = match frame.fog {
            Some(f) => (rgb(f.color.to_linear(), 1.0), [f.near, f.far, 1.0, 0.0]),
            None => ([0.0; 4], [0.0; 4]),
        };

        Self {
            view_proj: vp.to_cols_array_2d(),
            inv_view_proj: vp.inverse().to_cols_array_2d(),
            view: frame.view.to_cols_array_2d(),
            dir_shadow: frame
                .lights
                .directional_shadow()
                .unwrap_or(Mat4::IDENTITY)
                .to_cols_array_2d(),
            spot_shadow: frame
                .lights
                .spot_shadow()
                .unwrap_or(Mat4::IDENTITY)
                .to_cols_array_2d(),
            camera_pos: frame.camera_position.extend(1.0).to_array(),
            ambient: rgb(frame.lights.ambient, 0.0),
            fog_color,
            fog,
            counts: [
                frame.lights.directional.len() as u32,
                frame.lights.spot.len() as u32,
                0,
                0,
            ],
            shadow: [shadows.bias, 1.0 / shadows.map_size.max(1) as f32, 0.0, 0.0],
            dir_lights,
            spot_lights,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct MaterialUniforms {
    pub color: [f32; 4],
    /// w: shininess.
    pub specular: [f32; 4],
    /// x: double sided.
    pub flags: [f32; 4],
}

impl MaterialUniforms {
    pub fn from_material(material: &PhongMaterial) -> Self {
        let [r, g, b] = material.color.to_linear();
        let [sr, sg, sb] = material.specular.to_linear();
        Self {
            color: [r, g, b, 1.0],
            specular: [sr, sg, sb, material.shininess.max(1e-4)],
            flags: [
                if material.side == Side::Double { 1.0 } else { 0.0 },
                0.0,
                0.0,
                0.0,
            ],
        }
    }
}

/// Light view-projection used by the shadow depth pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct ShadowUniforms {
    pub light_view_proj: [[f32; 4]; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use stagecraft_common::Color;
    use stagecraft_scene::{Fog, Light, Node, PerspectiveCamera, Scene};

    #[test]
    fn layouts_are_vec4_aligned() {
        assert_eq!(std::mem::size_of::<DirLightGpu>(), 32);
        assert_eq!(std::mem::size_of::<SpotLightGpu>(), 64);
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 48);
        assert_eq!(std::mem::size_of::<InstanceData>(), 8 * 16);
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn frame_uniforms_pack_lights_and_fog() {
        let mut scene = Scene::new();
        scene.fog = Some(Fog::new(Color::WHITE, 15.0, 40.0));
        scene.add(Node::light("sun", Light::directional(Color::WHITE, 1.0)).at(Vec3::new(0.0, 10.0, 0.0)));
        scene.add(
            Node::light("spot", Light::spot(Color::WHITE, 150.0))
                .at(Vec3::new(0.0, 18.0, 0.0))
                .with_shadows(true, false),
        );
        let settings = ShadowSettings::default();
        let frame = FrameData::extract(&scene, &PerspectiveCamera::default(), &settings);
        let u = FrameUniforms::from_frame(&frame, &settings);

        assert_eq!(u.counts[0], 1);
        assert_eq!(u.counts[1], 1);
        assert_eq!(u.fog, [15.0, 40.0, 1.0, 0.0]);
        assert_eq!(u.dir_lights[0].direction, [0.0, -1.0, 0.0, 0.0]);
        assert_eq!(u.spot_lights[0].radiance[3], 1.0);
        assert_eq!(u.spot_lights[0].direction[3], 2.0);
        assert!((u.shadow[1] - 1.0 / 2048.0).abs() < 1e-9);
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let inst = InstanceData::new(model, true);
        assert_eq!(inst.normal[0][0], 0.5);
        assert_eq!(inst.params[0], 1.0);
    }

    #[test]
    fn material_flags() {
        let m = MaterialUniforms::from_material(&PhongMaterial::default().double_sided());
        assert_eq!(m.flags[0], 1.0);
        assert_eq!(m.specular[3], 30.0);
    }
}
