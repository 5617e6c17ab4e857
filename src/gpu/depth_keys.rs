use std::path::Path;

use glam::{Vec3, Vec4};
use wgpu::{BindGroupDescriptor, BindGroupEntry, Buffer, CommandEncoder, ComputePassDescriptor};

use crate::camera::Camera;
use crate::depth_key::fill_depth_keys;
use crate::error::{BufferError, LoadError};
use crate::gpu::GpuContext;
use crate::gpu::buffer::DeviceBuffer;
use crate::gpu::dispatch::dispatch_for_items;
use crate::gpu::program::{Program, ProgramDescriptor, ProgramStage};
use crate::gpu::shader_loader::DEPTH_KEYS;
use crate::settings::KeyStrategy;

const WG_SIZE: u32 = 256;

/// Buffers a key pass writes: one key and one index for each of the first
/// `count` positions. Slots past `count` are left alone.
pub struct KeyTargets<'a> {
    pub positions: &'a Buffer,
    pub keys: &'a DeviceBuffer<u32>,
    pub values: &'a DeviceBuffer<u32>,
    pub count: u32,
}

impl KeyTargets<'_> {
    fn check_capacity(&self) -> Result<(), BufferError> {
        for buffer in [self.keys, self.values] {
            if buffer.len() < self.count as usize {
                return Err(BufferError::LengthMismatch {
                    label: buffer.label().to_owned(),
                    expected: self.count as usize,
                    actual: buffer.len(),
                });
            }
        }
        Ok(())
    }
}

/// Fills `keys` with depth keys for `camera` and `values` with `0..N`.
pub trait DepthKeyProducer {
    fn strategy(&self) -> KeyStrategy;

    /// Called when the cloud is replaced.
    fn reload(&mut self, _positions: &[Vec4]) {}

    fn encode(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut CommandEncoder,
        camera: &Camera,
        targets: &KeyTargets<'_>,
    ) -> Result<(), BufferError>;
}

pub fn producer_for(
    strategy: KeyStrategy,
    gpu: &GpuContext,
    positions: &[Vec4],
    scale: f32,
    shader_dir: Option<&Path>,
) -> Result<Box<dyn DepthKeyProducer>, LoadError> {
    Ok(match strategy {
        KeyStrategy::Device => Box::new(DeviceDepthKeys::new(gpu, scale, shader_dir)?),
        KeyStrategy::Host => Box::new(HostDepthKeys::new(positions.to_vec(), scale)),
    })
}

/// One compute invocation per primitive over the device-resident positions.
pub struct DeviceDepthKeys {
    program: Program,
    scale: f32,
    max_dim: u32,
}

impl DeviceDepthKeys {
    pub fn new(
        gpu: &GpuContext,
        scale: f32,
        shader_dir: Option<&Path>,
    ) -> Result<Self, LoadError> {
        let program = Program::new(
            &gpu.device,
            &ProgramDescriptor {
                label: "depth keys",
                shader: DEPTH_KEYS,
                stage: ProgramStage::Compute,
            },
            shader_dir,
        )?;
        Ok(Self {
            program,
            scale,
            max_dim: gpu.device.limits().max_compute_workgroups_per_dimension,
        })
    }
}

impl DepthKeyProducer for DeviceDepthKeys {
    fn strategy(&self) -> KeyStrategy {
        KeyStrategy::Device
    }

    fn encode(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut CommandEncoder,
        camera: &Camera,
        targets: &KeyTargets<'_>,
    ) -> Result<(), BufferError> {
        targets.check_capacity()?;
        let count = targets.count;
        if count == 0 {
            return Ok(());
        }

        self.program.set_uniform("forward", camera.forward());
        self.program.set_uniform("count", count);
        self.program.set_uniform("eye", camera.eye());
        self.program.set_uniform("scale", self.scale);

        let bind_group = gpu.device.create_bind_group(&BindGroupDescriptor {
            label: Some("depth key targets"),
            layout: &self.program.bind_group_layout(1),
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: targets.positions.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: targets.keys.buffer().as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: targets.values.buffer().as_entire_binding(),
                },
            ],
        });

        let [x, y, z] = dispatch_for_items(count, WG_SIZE, self.max_dim);
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("depth key pass"),
            timestamp_writes: None,
        });
        self.program.bind_compute(&gpu.queue, &mut pass);
        pass.set_bind_group(1, &bind_group, &[]);
        pass.dispatch_workgroups(x, y, z);
        Ok(())
    }
}

/// Sequential host loop over a CPU copy of the positions, then an upload of
/// both arrays.
pub struct HostDepthKeys {
    positions: Vec<Vec4>,
    keys: Vec<u32>,
    values: Vec<u32>,
    scale: f32,
}

impl HostDepthKeys {
    pub fn new(positions: Vec<Vec4>, scale: f32) -> Self {
        log::debug!(
            "host depth keys: {} positions computed on the CPU every frame",
            positions.len()
        );
        let len = positions.len();
        Self {
            positions,
            keys: vec![0; len],
            values: vec![0; len],
            scale,
        }
    }

    /// Keys and indices from the last `compute` call.
    pub fn compute(&mut self, eye: Vec3, forward: Vec3) -> (&[u32], &[u32]) {
        fill_depth_keys(
            &self.positions,
            eye,
            forward,
            self.scale,
            &mut self.keys,
            &mut self.values,
        );
        (&self.keys, &self.values)
    }
}

impl DepthKeyProducer for HostDepthKeys {
    fn strategy(&self) -> KeyStrategy {
        KeyStrategy::Host
    }

    fn reload(&mut self, positions: &[Vec4]) {
        *self = HostDepthKeys::new(positions.to_vec(), self.scale);
    }

    fn encode(
        &mut self,
        gpu: &GpuContext,
        _encoder: &mut CommandEncoder,
        camera: &Camera,
        targets: &KeyTargets<'_>,
    ) -> Result<(), BufferError> {
        targets.check_capacity()?;
        let (keys, values) = self.compute(camera.eye(), camera.forward());
        targets.keys.update(&gpu.queue, keys)?;
        targets.values.update(&gpu.queue, values)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth_key::DEFAULT_DEPTH_SCALE;

    #[test]
    fn host_keys_sort_far_to_near() {
        let positions = (1..=4)
            .map(|z| Vec4::new(0.0, 0.0, -(z as f32), 1.0))
            .collect();
        let mut producer = HostDepthKeys::new(positions, DEFAULT_DEPTH_SCALE);
        let (keys, values) = producer.compute(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(values, &[0, 1, 2, 3]);
        assert!(keys.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn host_keys_follow_the_camera() {
        let positions = vec![Vec4::new(0.0, 0.0, -1.0, 1.0), Vec4::new(0.0, 0.0, 1.0, 1.0)];
        let mut producer = HostDepthKeys::new(positions, DEFAULT_DEPTH_SCALE);
        let (front, _) = producer.compute(Vec3::ZERO, Vec3::NEG_Z);
        let front = front.to_vec();
        let (back, _) = producer.compute(Vec3::ZERO, Vec3::Z);
        // Behind the camera saturates to the largest key.
        assert!(front[0] < front[1]);
        assert!(back[0] > back[1]);
    }
}
