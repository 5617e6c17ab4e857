use wgpu::{
    AddressMode, Device, Extent3d, FilterMode, Queue, Sampler, SamplerDescriptor,
    TexelCopyBufferLayout, TexelCopyTextureInfo, TextureAspect, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsages, TextureView, TextureViewDescriptor,
};

/// A sampled RGBA8 image drawn on every point quad.
///
/// Decoding image files is up to the caller; this only uploads pixels.
pub struct Sprite {
    view: TextureView,
    sampler: Sampler,
}

impl Sprite {
    /// Upload tightly packed RGBA8 rows. Sampling is bilinear and clamps at
    /// the edges.
    pub fn from_rgba8(
        device: &Device,
        queue: &Queue,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Self {
        debug_assert_eq!(rgba.len(), (width * height * 4) as usize);
        let size = Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&TextureDescriptor {
            label: Some("point sprite"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            rgba,
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("point sprite sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..Default::default()
        });
        Self {
            view: texture.create_view(&TextureViewDescriptor::default()),
            sampler,
        }
    }

    /// A white disc with a soft rim, the sprite points get by default.
    pub fn disc(device: &Device, queue: &Queue, size: u32) -> Self {
        let size = size.max(2);
        Self::from_rgba8(device, queue, size, size, &disc_rgba8(size))
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }
}

/// `size * size` RGBA8 pixels: opaque white inside the inscribed circle,
/// alpha falling to zero over the last pixel of radius.
pub fn disc_rgba8(size: u32) -> Vec<u8> {
    let radius = size as f32 * 0.5;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - radius;
            let dy = y as f32 + 0.5 - radius;
            let coverage = (radius - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
            rgba.extend_from_slice(&[255, 255, 255, (coverage * 255.0).round() as u8]);
        }
    }
    rgba
}
