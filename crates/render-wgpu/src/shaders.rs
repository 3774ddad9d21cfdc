/// Frame and material bindings shared by the mesh and background shaders.
const COMMON: &str = r#"
const PI: f32 = 3.141592653589793;
const RECIPROCAL_PI: f32 = 0.3183098861837907;

struct DirLight {
    direction: vec4<f32>,
    radiance: vec4<f32>,
};

struct SpotLight {
    position: vec4<f32>,
    direction: vec4<f32>,
    radiance: vec4<f32>,
    cone: vec4<f32>,
};

struct Frame {
    view_proj: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    dir_shadow: mat4x4<f32>,
    spot_shadow: mat4x4<f32>,
    camera_pos: vec4<f32>,
    ambient: vec4<f32>,
    fog_color: vec4<f32>,
    fog: vec4<f32>,
    counts: vec4<u32>,
    shadow: vec4<f32>,
    dir_lights: array<DirLight, 4>,
    spot_lights: array<SpotLight, 4>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;
@group(0) @binding(1)
var dir_shadow_map: texture_depth_2d;
@group(0) @binding(2)
var spot_shadow_map: texture_depth_2d;
@group(0) @binding(3)
var shadow_sampler: sampler_comparison;

struct Material {
    color: vec4<f32>,
    specular: vec4<f32>,
    flags: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> material: Material;
@group(1) @binding(1)
var base_map: texture_2d<f32>;
@group(1) @binding(2)
var base_sampler: sampler;
"#;

/// Blinn-Phong meshes with shadow maps and fog.
const MESH: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) normal_0: vec4<f32>,
    @location(8) normal_1: vec4<f32>,
    @location(9) normal_2: vec4<f32>,
    @location(10) params: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) view_depth: f32,
    @location(4) receive_shadow: f32,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(instance.model_0, instance.model_1, instance.model_2, instance.model_3);
    let normal_matrix = mat3x3<f32>(instance.normal_0.xyz, instance.normal_1.xyz, instance.normal_2.xyz);
    let world = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = normalize(normal_matrix * vertex.normal);
    // image rows run top to bottom, mesh v runs bottom to top
    out.uv = vec2<f32>(vertex.uv.x, 1.0 - vertex.uv.y);
    out.view_depth = -(frame.view * world).z;
    out.receive_shadow = instance.params.x;
    return out;
}

fn smooth_step(edge0: f32, edge1: f32, x: f32) -> f32 {
    if (edge0 == edge1) {
        return select(1.0, 0.0, x < edge0);
    }
    let t = clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
    return t * t * (3.0 - 2.0 * t);
}

fn distance_attenuation(d: f32, cutoff: f32, decay: f32) -> f32 {
    var falloff = 1.0 / max(pow(d, decay), 0.01);
    if (cutoff > 0.0) {
        let r = clamp(1.0 - pow(d / cutoff, 4.0), 0.0, 1.0);
        falloff = falloff * r * r;
    }
    return falloff;
}

fn blinn_phong(l: vec3<f32>, n: vec3<f32>, v: vec3<f32>, specular: vec3<f32>, shininess: f32) -> vec3<f32> {
    let h = normalize(l + v);
    let dot_nh = clamp(dot(n, h), 0.0, 1.0);
    let dot_vh = clamp(dot(v, h), 0.0, 1.0);
    let fresnel = specular + (vec3<f32>(1.0) - specular) * pow(1.0 - dot_vh, 5.0);
    let d = RECIPROCAL_PI * (shininess * 0.5 + 1.0) * pow(dot_nh, shininess);
    return fresnel * 0.25 * d;
}

fn shadow_factor(map: texture_depth_2d, light_view_proj: mat4x4<f32>, world_pos: vec3<f32>) -> f32 {
    let clip = light_view_proj * vec4<f32>(world_pos, 1.0);
    if (clip.w <= 0.0) {
        return 1.0;
    }
    let ndc = clip.xyz / clip.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
    if (uv.x < 0.0 || uv.x > 1.0 || uv.y < 0.0 || uv.y > 1.0 || ndc.z < 0.0 || ndc.z > 1.0) {
        return 1.0;
    }
    let texel = frame.shadow.y;
    let reference = ndc.z - frame.shadow.x;
    var lit = 0.0;
    for (var y = -1; y <= 1; y = y + 1) {
        for (var x = -1; x <= 1; x = x + 1) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel;
            lit = lit + textureSampleCompareLevel(map, shadow_sampler, uv + offset, reference);
        }
    }
    return lit / 9.0;
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front_facing: bool) -> @location(0) vec4<f32> {
    let texel = textureSample(base_map, base_sampler, in.uv);
    let albedo = material.color.rgb * texel.rgb;

    var n = normalize(in.normal);
    if (material.flags.x > 0.5 && !front_facing) {
        n = -n;
    }
    let v = normalize(frame.camera_pos.xyz - in.world_pos);
    let receive = in.receive_shadow > 0.5;

    var diffuse = frame.ambient.rgb * RECIPROCAL_PI * albedo;
    var specular = vec3<f32>(0.0);

    for (var i = 0u; i < frame.counts.x; i = i + 1u) {
        let light = frame.dir_lights[i];
        let l = -light.direction.xyz;
        var radiance = light.radiance.rgb;
        if (receive && light.direction.w > 0.5) {
            radiance = radiance * shadow_factor(dir_shadow_map, frame.dir_shadow, in.world_pos);
        }
        let irradiance = clamp(dot(n, l), 0.0, 1.0) * radiance;
        diffuse = diffuse + irradiance * RECIPROCAL_PI * albedo;
        specular = specular + irradiance * blinn_phong(l, n, v, material.specular.rgb, material.specular.w);
    }

    for (var i = 0u; i < frame.counts.y; i = i + 1u) {
        let light = frame.spot_lights[i];
        let to_light = light.position.xyz - in.world_pos;
        let d = length(to_light);
        let l = to_light / max(d, 1e-5);
        let cone = smooth_step(light.cone.x, light.cone.y, dot(l, -light.direction.xyz));
        if (cone <= 0.0) {
            continue;
        }
        var radiance = light.radiance.rgb * cone * distance_attenuation(d, light.position.w, light.direction.w);
        if (receive && light.radiance.w > 0.5) {
            radiance = radiance * shadow_factor(spot_shadow_map, frame.spot_shadow, in.world_pos);
        }
        let irradiance = clamp(dot(n, l), 0.0, 1.0) * radiance;
        diffuse = diffuse + irradiance * RECIPROCAL_PI * albedo;
        specular = specular + irradiance * blinn_phong(l, n, v, material.specular.rgb, material.specular.w);
    }

    var color = diffuse + specular;
    if (frame.fog.z > 0.5) {
        let f = smooth_step(frame.fog.x, frame.fog.y, in.view_depth);
        color = mix(color, frame.fog_color.rgb, f);
    }
    return vec4<f32>(color, 1.0);
}
"#;

/// Full-screen equirectangular panorama looked up by view direction.
const BACKGROUND: &str = r#"
struct BackgroundOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

@vertex
fn vs_background(@builtin(vertex_index) index: u32) -> BackgroundOutput {
    let x = f32((index << 1u) & 2u) * 2.0 - 1.0;
    let y = f32(index & 2u) * 2.0 - 1.0;
    var out: BackgroundOutput;
    out.clip_position = vec4<f32>(x, y, 1.0, 1.0);
    out.ndc = vec2<f32>(x, y);
    return out;
}

@fragment
fn fs_background(in: BackgroundOutput) -> @location(0) vec4<f32> {
    let far = frame.inv_view_proj * vec4<f32>(in.ndc, 1.0, 1.0);
    let dir = normalize(far.xyz / far.w - frame.camera_pos.xyz);
    let u = atan2(dir.z, dir.x) * 0.5 * RECIPROCAL_PI + 0.5;
    let v = 0.5 - asin(clamp(dir.y, -1.0, 1.0)) * RECIPROCAL_PI;
    let color = textureSampleLevel(base_map, base_sampler, vec2<f32>(u, v), 0.0);
    return vec4<f32>(color.rgb, 1.0);
}
"#;

/// Depth-only pass rendering shadow casters from a light.
pub const SHADOW_SHADER: &str = r#"
struct Shadow {
    light_view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> shadow: Shadow;

@vertex
fn vs_shadow(
    @location(0) position: vec3<f32>,
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
) -> @builtin(position) vec4<f32> {
    let model = mat4x4<f32>(model_0, model_1, model_2, model_3);
    return shadow.light_view_proj * model * vec4<f32>(position, 1.0);
}
"#;

pub fn mesh_shader() -> String {
    [COMMON, MESH].concat()
}

pub fn background_shader() -> String {
    [COMMON, BACKGROUND].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaders_declare_entry_points() {
        let mesh = mesh_shader();
        assert!(mesh.contains("fn vs_main") && mesh.contains("fn fs_main"));
        assert!(mesh.contains("struct Frame"));
        let bg = background_shader();
        assert!(bg.contains("fn vs_background") && bg.contains("fn fs_background"));
        assert!(SHADOW_SHADER.contains("fn vs_shadow"));
    }
}
