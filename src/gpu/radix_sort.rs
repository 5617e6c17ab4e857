use std::path::Path;

use bytemuck::{Pod, Zeroable};
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::wgt::BufferDescriptor;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingType, Buffer, BufferBindingType, BufferUsages, CommandEncoder,
    ComputePassDescriptor, ComputePipeline, ComputePipelineDescriptor, Device,
    PipelineLayoutDescriptor, Queue, ShaderStages,
};

use crate::error::{LoadError, SortError};
use crate::gpu::dispatch::split_dispatch_3d;
use crate::gpu::shader_loader::{RADIX_SORT, load_shader};

const BLOCK_SIZE: u32 = 256;
const RADIX: u32 = 256;
const RADIX_BITS: u32 = 8;
const PASSES: usize = (u32::BITS / RADIX_BITS) as usize;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SortParams {
    count: u32,
    num_blocks: u32,
    _pad: [u32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct PassParams {
    shift: u32,
    _pad: [u32; 3],
}

fn num_blocks(count: u32) -> u32 {
    count.div_ceil(BLOCK_SIZE)
}

/// Bind groups for one caller-owned (keys, values) pair.
///
/// Passes alternate caller -> scratch -> caller, so after an even number of
/// passes the sorted data is back in the caller's buffers.
pub struct SortTarget {
    passes: [BindGroup; PASSES],
    len: u32,
}

impl SortTarget {
    /// Elements the bound buffers can hold.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Stable ascending sort of u32 keys carrying u32 values, in place on the
/// device, for up to `capacity` elements.
pub struct RadixSorter {
    capacity: u32,
    max_dim: u32,
    layout: BindGroupLayout,
    histogram_pipeline: ComputePipeline,
    scan_pipeline: ComputePipeline,
    scatter_pipeline: ComputePipeline,
    params_buffer: Buffer,
    pass_buffers: [Buffer; PASSES],
    scratch_keys: Buffer,
    scratch_values: Buffer,
    histogram: Buffer,
}

fn uniform_entry(binding: u32) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::COMPUTE,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32, read_only: bool) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::COMPUTE,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl RadixSorter {
    pub fn new(
        device: &Device,
        capacity: u32,
        shader_dir: Option<&Path>,
    ) -> Result<Self, LoadError> {
        let limits = device.limits();
        let max_binding = limits.max_storage_buffer_binding_size as u64;
        let element_bytes = capacity.max(1) as u64 * size_of::<u32>() as u64;
        let histogram_bytes =
            RADIX as u64 * num_blocks(capacity).max(1) as u64 * size_of::<u32>() as u64;
        if element_bytes.max(histogram_bytes) > max_binding {
            return Err(LoadError::SorterTooLarge {
                capacity,
                max_binding,
            });
        }

        let (module, _) = load_shader(device, "radix sort", &RADIX_SORT, shader_dir)?;
        let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("radix sort bind group layout"),
            entries: &[
                uniform_entry(0),
                uniform_entry(1),
                storage_entry(2, true),
                storage_entry(3, true),
                storage_entry(4, false),
                storage_entry(5, false),
                storage_entry(6, false),
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("radix sort pipeline layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });
        let pipeline = |entry_point: &str| {
            device.create_compute_pipeline(&ComputePipelineDescriptor {
                label: Some(entry_point),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        };
        let histogram_pipeline = pipeline("histogram_pass");
        let scan_pipeline = pipeline("scan_pass");
        let scatter_pipeline = pipeline("scatter_pass");

        let params_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("radix sort params"),
            contents: bytemuck::bytes_of(&SortParams::zeroed()),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let pass_buffers = std::array::from_fn(|pass| {
            device.create_buffer_init(&BufferInitDescriptor {
                label: Some("radix sort pass params"),
                contents: bytemuck::bytes_of(&PassParams {
                    shift: pass as u32 * RADIX_BITS,
                    _pad: [0; 3],
                }),
                usage: BufferUsages::UNIFORM,
            })
        });
        let storage = |label: &str, size: u64| {
            device.create_buffer(&BufferDescriptor {
                label: Some(label),
                size,
                usage: BufferUsages::STORAGE,
                mapped_at_creation: false,
            })
        };

        log::debug!("radix sorter capacity {capacity}");
        Ok(Self {
            capacity,
            max_dim: limits.max_compute_workgroups_per_dimension,
            histogram_pipeline,
            scan_pipeline,
            scatter_pipeline,
            params_buffer,
            pass_buffers,
            scratch_keys: storage("radix sort scratch keys", element_bytes),
            scratch_values: storage("radix sort scratch values", element_bytes),
            histogram: storage("radix sort histogram", histogram_bytes),
            layout,
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Prepare bind groups for sorting `keys`/`values` in place. Both need
    /// `STORAGE` usage.
    pub fn bind(&self, device: &Device, keys: &Buffer, values: &Buffer) -> SortTarget {
        let len = (keys.size().min(values.size()) / size_of::<u32>() as u64) as u32;
        let passes = std::array::from_fn(|pass| {
            let (src, dst) = if pass % 2 == 0 {
                ((keys, values), (&self.scratch_keys, &self.scratch_values))
            } else {
                ((&self.scratch_keys, &self.scratch_values), (keys, values))
            };
            device.create_bind_group(&BindGroupDescriptor {
                label: Some("radix sort pass bind group"),
                layout: &self.layout,
                entries: &[
                    BindGroupEntry {
                        binding: 0,
                        resource: self.params_buffer.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 1,
                        resource: self.pass_buffers[pass].as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 2,
                        resource: src.0.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 3,
                        resource: src.1.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 4,
                        resource: dst.0.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 5,
                        resource: dst.1.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 6,
                        resource: self.histogram.as_entire_binding(),
                    },
                ],
            })
        });
        SortTarget { passes, len }
    }

    /// Record a sort of the first `count` pairs of `target`.
    ///
    /// The element count goes through `queue.write_buffer`, so one sorter
    /// encodes at most one sort per submission.
    pub fn encode(
        &self,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        target: &SortTarget,
        count: u32,
    ) -> Result<(), SortError> {
        let capacity = self.capacity.min(target.len);
        if count > capacity {
            return Err(SortError::CapacityExceeded { count, capacity });
        }
        if count == 0 {
            return Ok(());
        }

        let blocks = num_blocks(count);
        queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::bytes_of(&SortParams {
                count,
                num_blocks: blocks,
                _pad: [0; 2],
            }),
        );
        let [x, y, z] = split_dispatch_3d(blocks, self.max_dim);

        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("radix sort pass"),
            timestamp_writes: None,
        });
        for bind_group in &target.passes {
            pass.set_bind_group(0, bind_group, &[]);
            pass.set_pipeline(&self.histogram_pipeline);
            pass.dispatch_workgroups(x, y, z);
            pass.set_pipeline(&self.scan_pipeline);
            pass.dispatch_workgroups(1, 1, 1);
            pass.set_pipeline(&self.scatter_pipeline);
            pass.dispatch_workgroups(x, y, z);
        }
        log::trace!("encoded radix sort of {count} pairs in {blocks} blocks");
        Ok(())
    }

    /// Bind, encode and submit in one go.
    pub fn sort(
        &self,
        device: &Device,
        queue: &Queue,
        keys: &Buffer,
        values: &Buffer,
        count: u32,
    ) -> Result<(), SortError> {
        let target = self.bind(device, keys, values);
        let mut encoder = device.create_command_encoder(&Default::default());
        self.encode(queue, &mut encoder, &target, count)?;
        queue.submit([encoder.finish()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_passes_cover_a_u32_key() {
        assert_eq!(PASSES, 4);
        assert_eq!(PASSES % 2, 0);
    }

    #[test]
    fn blocks_round_up() {
        assert_eq!(num_blocks(0), 0);
        assert_eq!(num_blocks(1), 1);
        assert_eq!(num_blocks(256), 1);
        assert_eq!(num_blocks(257), 2);
    }

    #[test]
    fn uniform_structs_are_sixteen_bytes() {
        assert_eq!(size_of::<SortParams>(), 16);
        assert_eq!(size_of::<PassParams>(), 16);
    }
}
