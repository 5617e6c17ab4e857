use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context;

pub fn save_png_rgba8(path: &Path, w: u32, h: u32, rgba: &[u8]) -> anyhow::Result<()> {
    anyhow::ensure!(
        rgba.len() == (w * h * 4) as usize,
        "{}x{} image needs {} bytes, got {}",
        w,
        h,
        w * h * 4,
        rgba.len()
    );
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let wtr = BufWriter::new(file);

    let mut encoder = png::Encoder::new(wtr, w, h);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgba)?;
    writer.finish()?;
    Ok(())
}
