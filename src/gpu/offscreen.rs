use wgpu::wgt::BufferDescriptor;
use wgpu::{
    BufferUsages, Device, Extent3d, Queue, Texture, TextureDescriptor, TextureDimension,
    TextureFormat, TextureUsages, TextureView, TextureViewDescriptor,
};

use crate::gpu::readback::map_blocking;

pub const OFFSCREEN_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

/// A color target that can be read back to the host.
pub struct OffscreenTarget {
    texture: Texture,
    view: TextureView,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texture = device.create_texture(&TextureDescriptor {
            label: Some("offscreen color target"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
        }
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn format(&self) -> TextureFormat {
        OFFSCREEN_FORMAT
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Tightly packed RGBA8 rows, top to bottom.
    pub fn read_rgba8(&self, device: &Device, queue: &Queue) -> anyhow::Result<Vec<u8>> {
        let bytes_per_pixel = 4u32;
        let unpadded_bytes_per_row = self.width * bytes_per_pixel;
        let padded_bytes_per_row =
            unpadded_bytes_per_row.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let readback_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("offscreen readback buffer"),
            size: (padded_bytes_per_row * self.height) as u64,
            usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&Default::default());
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit([encoder.finish()]);

        map_blocking(device, &readback_buffer)?;
        let data = readback_buffer.slice(..).get_mapped_range();
        let mut rgba = vec![0u8; (unpadded_bytes_per_row * self.height) as usize];
        for (src, dst) in data
            .chunks_exact(padded_bytes_per_row as usize)
            .zip(rgba.chunks_exact_mut(unpadded_bytes_per_row as usize))
        {
            dst.copy_from_slice(&src[..unpadded_bytes_per_row as usize]);
        }
        drop(data);
        readback_buffer.unmap();
        Ok(rgba)
    }
}
