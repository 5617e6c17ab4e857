use sorted_splats::gpu::GpuContext;

/// A headless device, or `None` on machines without an adapter.
pub fn gpu() -> Option<GpuContext> {
    let _ = env_logger::builder().is_test(true).try_init();
    match GpuContext::headless() {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping: no GPU adapter ({err:#})");
            None
        }
    }
}
