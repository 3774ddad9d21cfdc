use crate::shaders;
use crate::textures::{DEPTH_FORMAT, TextureCache, create_depth_view, create_msaa_view};
use crate::uniforms::{FrameUniforms, InstanceData, MaterialUniforms, ShadowUniforms, Vertex};
use bytemuck::Zeroable;
use glam::Mat4;
use stagecraft_assets::TextureData;
use stagecraft_render::{FrameData, ShadowSettings};
use stagecraft_scene::{
    Background, GeometryId, MaterialId, MeshData, PerspectiveCamera, PhongMaterial, Scene, Side,
    TextureHandle,
};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

/// Renderer options fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// 1 disables multisampling.
    pub msaa_samples: u32,
    pub shadows: ShadowSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            msaa_samples: 4,
            shadows: ShadowSettings::default(),
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn new(device: &wgpu::Device, id: GeometryId, mesh: &MeshData) -> Self {
        let vertices = Vertex::from_mesh(mesh);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("geometry_{}_vertices", id.0)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("geometry_{}_indices", id.0)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

/// Material uniforms plus the texture currently bound; `bound` is `None`
/// while the placeholder stands in.
struct GpuMaterial {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    bound: Option<TextureHandle>,
}

struct ShadowMap {
    view: wgpu::TextureView,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// wgpu scene renderer: shadow passes, lit meshes and the background.
pub struct WgpuRenderer {
    settings: RenderSettings,
    surface_format: wgpu::TextureFormat,
    front_pipeline: wgpu::RenderPipeline,
    double_pipeline: wgpu::RenderPipeline,
    background_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    material_sampler: wgpu::Sampler,
    background_sampler: wgpu::Sampler,
    background: Option<(TextureHandle, GpuMaterial)>,
    dir_shadow: ShadowMap,
    spot_shadow: ShadowMap,
    meshes: HashMap<GeometryId, GpuMesh>,
    materials: HashMap<MaterialId, GpuMaterial>,
    textures: TextureCache,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        settings: RenderSettings,
    ) -> Self {
        let samples = settings.msaa_samples.max(1);

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                depth_texture_entry(1),
                depth_texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let map_size = settings.shadows.map_size.max(1);
        let dir_shadow = ShadowMap::new(device, &shadow_layout, "directional_shadow", map_size);
        let spot_shadow = ShadowMap::new(device, &shadow_layout, "spot_shadow", map_size);

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let material_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let background_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("background_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&dir_shadow.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&spot_shadow.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                },
            ],
        });

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let shadow_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow_pipeline_layout"),
            bind_group_layouts: &[&shadow_layout],
            push_constant_ranges: &[],
        });

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::mesh_shader().into()),
        });
        let background_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("background_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::background_shader().into()),
        });
        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SHADOW_SHADER.into()),
        });

        let front_pipeline = mesh_pipeline(
            device,
            &scene_layout,
            &mesh_shader,
            surface_format,
            samples,
            Some(wgpu::Face::Back),
            "mesh_front_pipeline",
        );
        let double_pipeline = mesh_pipeline(
            device,
            &scene_layout,
            &mesh_shader,
            surface_format,
            samples,
            None,
            "mesh_double_pipeline",
        );

        let background_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("background_pipeline"),
            layout: Some(&scene_layout),
            vertex: wgpu::VertexState {
                module: &background_shader,
                entry_point: Some("vs_background"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &background_shader,
                entry_point: Some("fs_background"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: samples,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        });

        let shadow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow_pipeline"),
            layout: Some(&shadow_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shadow_shader,
                entry_point: Some("vs_shadow"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let instance_capacity = 256;
        let instance_buffer = create_instance_buffer(device, instance_capacity);
        let depth_view = create_depth_view(
            device,
            "depth_texture",
            width,
            height,
            samples,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let msaa_view = create_msaa_view(device, surface_format, width, height, samples);

        tracing::info!(
            msaa = samples,
            shadow_map = map_size,
            "wgpu renderer initialized"
        );

        Self {
            settings,
            surface_format,
            front_pipeline,
            double_pipeline,
            background_pipeline,
            shadow_pipeline,
            frame_buffer,
            frame_bind_group,
            material_layout,
            material_sampler,
            background_sampler,
            background: None,
            dir_shadow,
            spot_shadow,
            meshes: HashMap::new(),
            materials: HashMap::new(),
            textures: TextureCache::new(device, queue),
            instance_buffer,
            instance_capacity,
            depth_view,
            msaa_view,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let samples = self.settings.msaa_samples.max(1);
        self.depth_view = create_depth_view(
            device,
            "depth_texture",
            width,
            height,
            samples,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        self.msaa_view = create_msaa_view(device, self.surface_format, width, height, samples);
        tracing::debug!(width, height, "render targets resized");
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Make a decoded texture available to materials and the background.
    pub fn upload_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        handle: TextureHandle,
        data: &TextureData,
    ) {
        self.textures.insert(device, queue, handle, data);
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Render one frame into `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) {
        self.sync_geometry(device, scene);
        let frame = FrameData::extract(scene, camera, &self.settings.shadows);
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::from_frame(&frame, &self.settings.shadows)),
        );

        let instances: Vec<InstanceData> = frame
            .draws
            .iter()
            .map(|d| InstanceData::new(d.model, d.receive_shadow))
            .collect();
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(device, self.instance_capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        for draw in &frame.draws {
            for id in draw.groups.iter().filter_map(|(_, m)| *m) {
                if let Some(material) = scene.material(id) {
                    self.prepare_material(device, queue, id, material);
                }
            }
        }
        let clear = self.prepare_background(device, frame.background);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        for (matrix, map) in [
            (frame.lights.directional_shadow(), &self.dir_shadow),
            (frame.lights.spot_shadow(), &self.spot_shadow),
        ] {
            if let Some(matrix) = matrix {
                self.shadow_pass(&mut encoder, queue, map, matrix, &frame, scene);
            }
        }

        {
            let (view, resolve_target) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(target)),
                None => (target, None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            if let (Background::Equirect(_), Some((_, bg))) = (frame.background, &self.background) {
                pass.set_pipeline(&self.background_pipeline);
                pass.set_bind_group(1, &bg.bind_group, &[]);
                pass.draw(0..3, 0..1);
            }

            let mut draw_calls = 0u32;
            for (index, draw) in frame.draws.iter().enumerate() {
                let Some(mesh) = self.meshes.get(&draw.geometry) else {
                    continue;
                };
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                let instance = index as u32..index as u32 + 1;
                for (group, material_id) in &draw.groups {
                    let (Some(material_id), Some(range)) = (material_id, group_range(group, mesh)) else {
                        continue;
                    };
                    let (Some(material), Some(gpu)) =
                        (scene.material(*material_id), self.materials.get(material_id))
                    else {
                        continue;
                    };
                    let pipeline = match material.side {
                        Side::Front => &self.front_pipeline,
                        Side::Double => &self.double_pipeline,
                    };
                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(1, &gpu.bind_group, &[]);
                    pass.draw_indexed(range, 0, instance.clone());
                    draw_calls += 1;
                }
            }
            tracing::trace!(draw_calls, "scene pass recorded");
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn shadow_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        map: &ShadowMap,
        light_view_proj: Mat4,
        frame: &FrameData,
        scene: &Scene,
    ) {
        queue.write_buffer(
            &map.uniform_buffer,
            0,
            bytemuck::bytes_of(&ShadowUniforms {
                light_view_proj: light_view_proj.to_cols_array_2d(),
            }),
        );
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shadow_pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        pass.set_pipeline(&self.shadow_pipeline);
        pass.set_bind_group(0, &map.bind_group, &[]);
        for (index, draw) in frame.draws.iter().enumerate() {
            if !draw.cast_shadow {
                continue;
            }
            let Some(mesh) = self.meshes.get(&draw.geometry) else {
                continue;
            };
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            for (group, material_id) in &draw.groups {
                let bound = (*material_id).and_then(|m| scene.material(m)).is_some();
                if let (true, Some(range)) = (bound, group_range(group, mesh)) {
                    pass.draw_indexed(range, 0, index as u32..index as u32 + 1);
                }
            }
        }
    }

    /// Upload geometry the renderer has not seen. The geometry table is
    /// append-only, so anything past the cached ids is new.
    fn sync_geometry(&mut self, device: &wgpu::Device, scene: &Scene) {
        for (index, mesh) in scene.geometries().iter().enumerate() {
            let id = GeometryId(index);
            if !self.meshes.contains_key(&id) && !mesh.indices.is_empty() {
                tracing::debug!(geometry = index, triangles = mesh.triangle_count(), "geometry uploaded");
                self.meshes.insert(id, GpuMesh::new(device, id, mesh));
            }
        }
    }

    fn prepare_material(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: MaterialId,
        material: &PhongMaterial,
    ) {
        let wanted = material.map.filter(|h| self.textures.contains(*h));
        let uniforms = MaterialUniforms::from_material(material);
        let current = self.materials.get(&id).is_some_and(|gpu| gpu.bound == wanted);
        if current {
            if let Some(gpu) = self.materials.get(&id) {
                queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
            }
            return;
        }
        let gpu = self.create_material(device, &format!("material_{}", id.0), &uniforms, wanted, false);
        self.materials.insert(id, gpu);
    }

    /// Returns the clear color for the scene pass.
    fn prepare_background(&mut self, device: &wgpu::Device, background: Background) -> wgpu::Color {
        match background {
            Background::Color(color) => {
                let [r, g, b] = color.to_linear();
                wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: 1.0,
                }
            }
            Background::Equirect(handle) => {
                let ready = self.textures.contains(handle);
                let bound = self.background.as_ref().map(|(h, _)| *h);
                if ready && bound != Some(handle) {
                    let uniforms = MaterialUniforms::from_material(&PhongMaterial::default());
                    let gpu = self.create_material(device, "background", &uniforms, Some(handle), true);
                    self.background = Some((handle, gpu));
                } else if !ready {
                    self.background = None;
                }
                wgpu::Color::BLACK
            }
        }
    }

    fn create_material(
        &self,
        device: &wgpu::Device,
        label: &str,
        uniforms: &MaterialUniforms,
        texture: Option<TextureHandle>,
        background: bool,
    ) -> GpuMaterial {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sampler = if background {
            &self.background_sampler
        } else {
            &self.material_sampler
        };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(self.textures.view(texture)),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        GpuMaterial {
            uniform_buffer,
            bind_group,
            bound: texture,
        }
    }
}

impl ShadowMap {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str, size: u32) -> Self {
        let view = create_depth_view(
            device,
            label,
            size,
            size,
            1,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&ShadowUniforms {
                light_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        Self {
            view,
            uniform_buffer,
            bind_group,
        }
    }
}

fn depth_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Depth,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn mesh_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    samples: u32,
    cull_mode: Option<wgpu::Face>,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &Vertex::ATTRIBUTES,
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<InstanceData>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &InstanceData::ATTRIBUTES,
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: samples,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_buffer"),
        size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Index range of a group, clipped to the mesh's index buffer.
fn group_range(group: &stagecraft_scene::GeometryGroup, mesh: &GpuMesh) -> Option<std::ops::Range<u32>> {
    let start = group.start.min(mesh.index_count);
    let end = group.start.saturating_add(group.count).min(mesh.index_count);
    (start < end).then_some(start..end)
}
