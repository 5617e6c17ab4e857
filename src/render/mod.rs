mod point;
mod splat;

pub use point::PointRenderer;
pub use splat::SplatRenderer;

use std::path::PathBuf;

use bytemuck::Pod;
use glam::Vec4;
use wgpu::{
    Buffer, BufferUsages, Color, CommandEncoder, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDescriptor, StoreOp, TextureView,
};

use crate::camera::Camera;
use crate::error::{LoadError, RenderError};
use crate::gpu::GpuContext;
use crate::gpu::buffer::{BufferUsageHint, DeviceBuffer, identity_indices};
use crate::gpu::depth_keys::{DepthKeyProducer, KeyTargets, producer_for};
use crate::gpu::geometry::GeometryBinding;
use crate::gpu::program::{ATTRIBUTE_GROUP, PrimitiveKind, Program, TextureResource};
use crate::gpu::radix_sort::{RadixSorter, SortTarget};
use crate::gpu::readback::read_buffer;
use crate::settings::{KeyStrategy, RenderSettings};

/// Where a renderer is inside its per-frame sequence.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameStage {
    Idle,
    ComputeKeys,
    Sort,
    PermuteIndices,
    Draw,
}

impl FrameStage {
    pub fn next(self) -> Self {
        match self {
            FrameStage::Idle => FrameStage::ComputeKeys,
            FrameStage::ComputeKeys => FrameStage::Sort,
            FrameStage::Sort => FrameStage::PermuteIndices,
            FrameStage::PermuteIndices => FrameStage::Draw,
            FrameStage::Draw => FrameStage::Idle,
        }
    }
}

/// Per-cloud device state, rebuilt as a whole on reload.
struct CloudBuffers {
    count: u32,
    positions: Buffer,
    geometry: GeometryBinding,
    keys: DeviceBuffer<u32>,
    values: DeviceBuffer<u32>,
    sorter: RadixSorter,
    sort_target: SortTarget,
}

impl CloudBuffers {
    fn new(
        gpu: &GpuContext,
        label: &str,
        program: &Program,
        positions: &[Vec4],
        shader_dir: Option<&std::path::Path>,
    ) -> Result<Self, LoadError> {
        let count = u32::try_from(positions.len()).map_err(|_| LoadError::TooManyPrimitives {
            count: positions.len(),
        })?;
        let device = &gpu.device;

        let identity = identity_indices(positions.len());
        let index = DeviceBuffer::new(
            device,
            &format!("{label} index buffer"),
            BufferUsageHint::Dynamic,
            BufferUsages::VERTEX | BufferUsages::COPY_SRC,
            &identity,
        );
        let mut geometry = GeometryBinding::new(index);

        let position_buffer = DeviceBuffer::new(
            device,
            &format!("{label} positions"),
            BufferUsageHint::Static,
            BufferUsages::STORAGE,
            positions,
        );
        let positions = position_buffer.buffer().clone();
        bind_attribute(program, &mut geometry, "position", position_buffer)?;

        let key_usage = BufferUsages::STORAGE | BufferUsages::COPY_SRC;
        let keys = DeviceBuffer::new(
            device,
            &format!("{label} depth keys"),
            BufferUsageHint::Dynamic,
            key_usage,
            &vec![0u32; identity.len()],
        );
        let values = DeviceBuffer::new(
            device,
            &format!("{label} sort values"),
            BufferUsageHint::Dynamic,
            key_usage,
            &identity,
        );
        let sorter = RadixSorter::new(device, count, shader_dir)?;
        let sort_target = sorter.bind(device, keys.buffer(), values.buffer());

        Ok(Self {
            count,
            positions,
            geometry,
            keys,
            values,
            sorter,
            sort_target,
        })
    }
}

/// Bind `data` to the program's storage array `name`, checking that its
/// elements match the array stride.
fn bind_attribute<T: Pod>(
    program: &Program,
    geometry: &mut GeometryBinding,
    name: &str,
    data: DeviceBuffer<T>,
) -> Result<(), LoadError> {
    let slot = program.require_attribute(name)?;
    let actual = size_of::<T>() as u64;
    match program.reflection().attribute_stride(slot) {
        Some(expected) if expected != actual => {
            return Err(LoadError::AttributeStride {
                label: program.label().to_owned(),
                name: name.to_owned(),
                expected,
                actual,
            });
        }
        _ => {}
    }
    geometry.set_attribute(slot, data);
    Ok(())
}

/// Shared per-frame pipeline: depth keys, sort, index permutation, one
/// instanced draw in sorted order.
pub struct SortedDraw {
    gpu: GpuContext,
    label: String,
    program: Program,
    primitive: PrimitiveKind,
    cloud: CloudBuffers,
    producer: Box<dyn DepthKeyProducer>,
    clear_color: Option<Color>,
    shader_dir: Option<PathBuf>,
    stage: FrameStage,
}

impl SortedDraw {
    pub(crate) fn new(
        gpu: &GpuContext,
        label: &str,
        program: Program,
        positions: &[Vec4],
        strategy: KeyStrategy,
        settings: &RenderSettings,
    ) -> Result<Self, LoadError> {
        let shader_dir = settings.shader_dir.as_deref();
        let primitive = program.primitive().ok_or_else(|| LoadError::ShaderCompile {
            label: program.label().to_owned(),
            messages: "expected a render program".to_owned(),
        })?;
        let cloud = CloudBuffers::new(gpu, label, &program, positions, shader_dir)?;
        let producer = producer_for(strategy, gpu, positions, settings.depth_scale, shader_dir)?;
        log::info!(
            "{label}: {} primitives, {:?} depth keys",
            cloud.count,
            producer.strategy()
        );
        Ok(Self {
            gpu: gpu.clone(),
            label: label.to_owned(),
            program,
            primitive,
            cloud,
            producer,
            clear_color: settings.clear_color(),
            shader_dir: settings.shader_dir.clone(),
            stage: FrameStage::Idle,
        })
    }

    /// Replace every per-cloud buffer and the sorter. The caller rebinds any
    /// attributes beyond `position`.
    pub(crate) fn reload(&mut self, positions: &[Vec4]) -> Result<(), LoadError> {
        debug_assert_eq!(self.stage, FrameStage::Idle);
        self.cloud = CloudBuffers::new(
            &self.gpu,
            &self.label,
            &self.program,
            positions,
            self.shader_dir.as_deref(),
        )?;
        self.producer.reload(positions);
        log::info!("{}: reloaded with {} primitives", self.label, self.cloud.count);
        Ok(())
    }

    pub fn len(&self) -> u32 {
        self.cloud.count
    }

    pub fn is_empty(&self) -> bool {
        self.cloud.count == 0
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        self.producer.strategy()
    }

    pub fn sort_capacity(&self) -> u32 {
        self.cloud.sorter.capacity()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    /// Upload one element per primitive into the storage array `name`.
    pub fn set_attribute<T: Pod>(&mut self, name: &str, data: &[T]) -> Result<(), LoadError> {
        let buffer = DeviceBuffer::new(
            &self.gpu.device,
            &format!("{} {name}", self.label),
            BufferUsageHint::Static,
            BufferUsages::STORAGE,
            data,
        );
        bind_attribute(&self.program, &mut self.cloud.geometry, name, buffer)
    }

    pub fn set_textures(&mut self, resources: &[(&str, TextureResource<'_>)]) {
        self.program.set_textures(&self.gpu.device, resources);
    }

    fn advance(&mut self, to: FrameStage) {
        debug_assert_eq!(
            self.stage.next(),
            to,
            "{}: frame stage {:?} cannot go to {:?}",
            self.label,
            self.stage,
            to
        );
        self.stage = to;
    }

    /// Encode and submit one frame into `target`.
    pub fn render(&mut self, target: &TextureView, camera: &Camera) -> Result<(), RenderError> {
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(&format!("{} frame", self.label)),
            });
        let encoded = self.encode_frame(&mut encoder, target, camera);
        self.stage = FrameStage::Idle;
        encoded?;
        self.gpu.queue.submit([encoder.finish()]);
        log::trace!("{}: submitted frame of {} primitives", self.label, self.cloud.count);
        Ok(())
    }

    fn encode_frame(
        &mut self,
        encoder: &mut CommandEncoder,
        target: &TextureView,
        camera: &Camera,
    ) -> Result<(), RenderError> {
        let count = self.cloud.count;

        self.advance(FrameStage::ComputeKeys);
        self.producer.encode(
            &self.gpu,
            encoder,
            camera,
            &KeyTargets {
                positions: &self.cloud.positions,
                keys: &self.cloud.keys,
                values: &self.cloud.values,
                count,
            },
        )?;

        self.advance(FrameStage::Sort);
        self.cloud
            .sorter
            .encode(&self.gpu.queue, encoder, &self.cloud.sort_target, count)?;

        self.advance(FrameStage::PermuteIndices);
        if count > 0 {
            encoder.copy_buffer_to_buffer(
                self.cloud.values.buffer(),
                0,
                self.cloud.geometry.index_buffer().buffer(),
                0,
                self.cloud.values.byte_len(),
            );
        }

        self.advance(FrameStage::Draw);
        self.program.set_uniform("view_mat", camera.view_matrix());
        self.program.set_uniform("proj_mat", camera.projection_matrix());
        let attributes = self.cloud.geometry.attribute_bind_group(
            &self.gpu.device,
            &self.program.bind_group_layout(ATTRIBUTE_GROUP),
            &self.label,
        );
        let load = match self.clear_color {
            Some(color) => LoadOp::Clear(color),
            None => LoadOp::Load,
        };
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some(&format!("{} draw pass", self.label)),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: Operations {
                    load,
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        let viewport = camera.viewport;
        pass.set_viewport(viewport.x, viewport.y, viewport.z, viewport.w, 0.0, 1.0);
        self.program.bind_render(&self.gpu.queue, &mut pass);
        self.cloud
            .geometry
            .draw_indexed(&mut pass, self.primitive, attributes.as_ref());
        drop(pass);

        self.advance(FrameStage::Idle);
        Ok(())
    }

    /// Index buffer contents after the last submitted frame.
    pub fn draw_order(&self) -> anyhow::Result<Vec<u32>> {
        read_buffer(
            &self.gpu.device,
            &self.gpu.queue,
            self.cloud.geometry.index_buffer().buffer(),
            self.cloud.count as usize,
        )
    }
}
