use bytemuck::AnyBitPattern;
use wgpu::wgt::BufferDescriptor;
use wgpu::{Buffer, BufferUsages, Device, MapMode, PollType, Queue};

/// Block until the buffer's mapped range is readable.
pub(crate) fn map_blocking(device: &Device, buffer: &Buffer) -> anyhow::Result<()> {
    let (tx, rx) = flume::bounded(1);
    buffer.slice(..).map_async(MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(PollType::wait_indefinitely())?;
    rx.recv()??;
    Ok(())
}

/// Copy the first `len` elements of `source` to the host. `source` needs
/// `COPY_SRC`.
pub fn read_buffer<T: AnyBitPattern>(
    device: &Device,
    queue: &Queue,
    source: &Buffer,
    len: usize,
) -> anyhow::Result<Vec<T>> {
    let size = (len * size_of::<T>()) as u64;
    if size == 0 {
        return Ok(Vec::new());
    }
    anyhow::ensure!(
        size <= source.size(),
        "readback of {size} bytes from a {} byte buffer",
        source.size()
    );
    let staging = device.create_buffer(&BufferDescriptor {
        label: Some("readback staging buffer"),
        size,
        usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&Default::default());
    encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
    queue.submit([encoder.finish()]);

    map_blocking(device, &staging)?;
    let bytes = staging.slice(..).get_mapped_range();
    let out: Vec<T> = bytemuck::cast_slice(&bytes).to_vec();
    drop(bytes);
    staging.unmap();
    Ok(out)
}
