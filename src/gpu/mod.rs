pub mod buffer;
pub mod depth_keys;
pub mod dispatch;
pub mod geometry;
pub mod init;
pub mod offscreen;
pub mod program;
pub mod radix_sort;
pub mod readback;
pub mod shader_loader;
pub mod texture;

pub use init::GpuContext;
