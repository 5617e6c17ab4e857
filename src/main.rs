use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sorted_splats::gpu::GpuContext;
use sorted_splats::gpu::offscreen::OffscreenTarget;
use sorted_splats::png_writer::save_png_rgba8;
use sorted_splats::{
    Camera, Gaussian, GaussianCloud, Point, PointCloud, PointRenderer, RenderSettings,
    SplatRenderer,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Points,
    Splats,
}

/// Render a generated cloud back to front into a PNG.
#[derive(Parser)]
#[command(name = "sorted-splats")]
struct Cli {
    #[arg(long, value_enum, default_value = "points")]
    mode: Mode,

    #[arg(short, long, default_value = "100000")]
    count: usize,

    #[arg(long, default_value = "800")]
    width: u32,

    #[arg(long, default_value = "600")]
    height: u32,

    #[arg(short, long, default_value = "out.png")]
    output: PathBuf,

    /// TOML render settings.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    #[arg(long, default_value = "42")]
    seed: u64,

    /// Camera distance from the cloud centre.
    #[arg(long, default_value = "4.0")]
    distance: f32,
}

fn random_position(rng: &mut StdRng) -> [f32; 3] {
    [
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    ]
}

fn point_cloud(count: usize, rng: &mut StdRng) -> PointCloud {
    let points = (0..count)
        .map(|_| {
            let position = random_position(rng);
            let color = position.map(|c| ((c * 0.5 + 0.5) * 255.0) as u8);
            Point { position, color }
        })
        .collect();
    PointCloud::new(points)
}

fn gaussian_cloud(count: usize, rng: &mut StdRng) -> GaussianCloud {
    let gaussians = (0..count)
        .map(|_| Gaussian {
            position: random_position(rng),
            f_dc: [
                rng.gen_range(-1.5..1.5),
                rng.gen_range(-1.5..1.5),
                rng.gen_range(-1.5..1.5),
            ],
            opacity: rng.gen_range(-2.0..4.0),
            scale: [
                rng.gen_range(-5.0..-3.0),
                rng.gen_range(-5.0..-3.0),
                rng.gen_range(-5.0..-3.0),
            ],
            rot: [
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            ],
        })
        .collect();
    GaussianCloud::new(gaussians)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => RenderSettings::load(path)?,
        None => RenderSettings::default(),
    };
    let gpu = GpuContext::headless()?;
    let target = OffscreenTarget::new(&gpu.device, cli.width, cli.height);
    let camera = Camera::looking_at(
        Vec3::new(0.0, 0.0, cli.distance),
        Vec3::ZERO,
        Vec3::Y,
        target.width(),
        target.height(),
    );
    let mut rng = StdRng::seed_from_u64(cli.seed);

    match cli.mode {
        Mode::Points => {
            let cloud = point_cloud(cli.count, &mut rng);
            let mut renderer = PointRenderer::init(&gpu, &cloud, target.format(), &settings)?;
            renderer.render(target.view(), &camera)?;
        }
        Mode::Splats => {
            let cloud = gaussian_cloud(cli.count, &mut rng);
            let mut renderer = SplatRenderer::init(&gpu, &cloud, target.format(), &settings)?;
            renderer.render(target.view(), &camera)?;
        }
    }

    let rgba = target
        .read_rgba8(&gpu.device, &gpu.queue)
        .context("failed to read back the frame")?;
    save_png_rgba8(&cli.output, target.width(), target.height(), &rgba)?;
    log::info!("wrote {}", cli.output.display());
    Ok(())
}
