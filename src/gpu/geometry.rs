use bytemuck::Pod;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, Buffer, Device, RenderPass,
};

use crate::gpu::buffer::DeviceBuffer;
use crate::gpu::program::{ATTRIBUTE_GROUP, AttribSlot, PrimitiveKind};

/// Per-primitive storage arrays bound by attribute slot, plus the index
/// buffer that sets draw order.
///
/// Every index becomes one instance: the index buffer feeds the vertex stage
/// one `u32` per instance, and the shader reads its attributes at that index.
pub struct GeometryBinding {
    attributes: Vec<Option<Buffer>>,
    index: DeviceBuffer<u32>,
}

impl GeometryBinding {
    pub fn new(index: DeviceBuffer<u32>) -> Self {
        Self {
            attributes: Vec::new(),
            index,
        }
    }

    /// Bind `data` to `slot`, replacing whatever was there. An unresolved
    /// slot binds nothing.
    pub fn set_attribute<T: Pod>(&mut self, slot: AttribSlot, data: DeviceBuffer<T>) {
        let Some(binding) = slot.index() else {
            log::warn!("skipping `{}`: attribute slot is unresolved", data.label());
            return;
        };
        let binding = binding as usize;
        if self.attributes.len() <= binding {
            self.attributes.resize_with(binding + 1, || None);
        }
        self.attributes[binding] = Some(data.into_buffer());
    }

    /// The attribute group for `layout`, or `None` when nothing is bound.
    pub fn attribute_bind_group(
        &self,
        device: &Device,
        layout: &BindGroupLayout,
        label: &str,
    ) -> Option<BindGroup> {
        let entries: Vec<BindGroupEntry> = self
            .attributes
            .iter()
            .enumerate()
            .filter_map(|(binding, buffer)| {
                Some(BindGroupEntry {
                    binding: binding as u32,
                    resource: buffer.as_ref()?.as_entire_binding(),
                })
            })
            .collect();
        if entries.is_empty() {
            return None;
        }
        Some(device.create_bind_group(&BindGroupDescriptor {
            label: Some(&format!("{label} attributes")),
            layout,
            entries: &entries,
        }))
    }

    pub fn index_buffer(&self) -> &DeviceBuffer<u32> {
        &self.index
    }

    pub fn index_count(&self) -> u32 {
        self.index.len() as u32
    }

    /// One instanced draw over the whole index buffer, each index expanded to
    /// a complete `kind` primitive. An empty draw records nothing.
    pub fn draw_indexed(
        &self,
        pass: &mut RenderPass<'_>,
        kind: PrimitiveKind,
        attributes: Option<&BindGroup>,
    ) {
        let count = self.index_count();
        if count == 0 {
            return;
        }
        if let Some(attributes) = attributes {
            pass.set_bind_group(ATTRIBUTE_GROUP, attributes, &[]);
        }
        pass.set_vertex_buffer(0, self.index.buffer().slice(..));
        pass.draw(0..kind.vertices_per_primitive(), 0..count);
    }
}
