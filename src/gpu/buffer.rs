use std::marker::PhantomData;

use bytemuck::Pod;
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{Buffer, BufferUsages, Device, Queue};

use crate::error::BufferError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BufferUsageHint {
    /// Written once at creation.
    Static,
    /// Rewritten in place; gets `COPY_DST`.
    Dynamic,
}

/// A typed GPU buffer sized from the host slice it was created with.
///
/// An empty slice still allocates one zeroed element so the buffer can be
/// bound; `len()` reports the logical element count.
#[derive(Debug)]
pub struct DeviceBuffer<T> {
    buffer: Buffer,
    len: usize,
    hint: BufferUsageHint,
    label: String,
    _marker: PhantomData<T>,
}

impl<T: Pod> DeviceBuffer<T> {
    pub fn new(
        device: &Device,
        label: &str,
        hint: BufferUsageHint,
        usage: BufferUsages,
        data: &[T],
    ) -> Self {
        let usage = match hint {
            BufferUsageHint::Static => usage,
            BufferUsageHint::Dynamic => usage | BufferUsages::COPY_DST,
        };
        let dummy = [T::zeroed()];
        let contents = if data.is_empty() { &dummy[..] } else { data };
        let buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(contents),
            usage,
        });
        Self {
            buffer,
            len: data.len(),
            hint,
            label: label.to_owned(),
            _marker: PhantomData,
        }
    }

    /// Replace the whole content. The element count is fixed at creation.
    pub fn update(&self, queue: &Queue, data: &[T]) -> Result<(), BufferError> {
        if self.hint == BufferUsageHint::Static {
            return Err(BufferError::Immutable {
                label: self.label.clone(),
            });
        }
        if data.len() != self.len {
            return Err(BufferError::LengthMismatch {
                label: self.label.clone(),
                expected: self.len,
                actual: data.len(),
            });
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte length of the live elements, excluding the empty-buffer dummy.
    pub fn byte_len(&self) -> u64 {
        (self.len * size_of::<T>()) as u64
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn into_buffer(self) -> Buffer {
        self.buffer
    }
}

/// `0..len` as `u32`, the starting draw order of every renderer.
pub fn identity_indices(len: usize) -> Vec<u32> {
    (0..len as u32).collect()
}
