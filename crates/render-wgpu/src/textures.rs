use stagecraft_assets::TextureData;
use stagecraft_scene::TextureHandle;
use std::collections::HashMap;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A sampled color texture living on the GPU.
pub(crate) struct GpuTexture {
    pub view: wgpu::TextureView,
    pub size: (u32, u32),
}

impl GpuTexture {
    /// Upload RGBA8 pixels as an sRGB texture.
    pub fn from_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        data: &TextureData,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: data.width.max(1),
            height: data.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.rgba8,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: Some(size.height),
            },
            size,
        );
        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            size: (size.width, size.height),
        }
    }
}

/// Uploaded textures by handle, plus the white placeholder used for
/// untextured materials and maps that have not arrived.
pub(crate) struct TextureCache {
    placeholder: GpuTexture,
    textures: HashMap<TextureHandle, GpuTexture>,
}

impl TextureCache {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            placeholder: GpuTexture::from_data(device, queue, "placeholder_texture", &TextureData::white()),
            textures: HashMap::new(),
        }
    }

    pub fn insert(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, handle: TextureHandle, data: &TextureData) {
        if data.rgba8.len() < (data.width as usize) * (data.height as usize) * 4 {
            tracing::warn!(handle = handle.0, "texture data shorter than its dimensions, skipping");
            return;
        }
        let label = format!("texture_{}", handle.0);
        let texture = GpuTexture::from_data(device, queue, &label, data);
        tracing::debug!(handle = handle.0, width = texture.size.0, height = texture.size.1, "texture uploaded");
        self.textures.insert(handle, texture);
    }

    pub fn contains(&self, handle: TextureHandle) -> bool {
        self.textures.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// The texture for `handle`, or the placeholder.
    pub fn view(&self, handle: Option<TextureHandle>) -> &wgpu::TextureView {
        handle
            .and_then(|h| self.textures.get(&h))
            .map(|t| &t.view)
            .unwrap_or(&self.placeholder.view)
    }
}

pub(crate) fn create_depth_view(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    sample_count: u32,
    usage: wgpu::TextureUsages,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

pub(crate) fn create_msaa_view(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("msaa_color"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&Default::default()))
}
