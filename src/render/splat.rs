use glam::{Mat3, Vec4};
use wgpu::{BlendState, TextureFormat, TextureView};

use crate::camera::Camera;
use crate::cloud::GaussianCloud;
use crate::error::{LoadError, RenderError};
use crate::gpu::GpuContext;
use crate::gpu::program::{PrimitiveKind, Program, ProgramDescriptor, ProgramStage};
use crate::gpu::shader_loader::SPLAT;
use crate::render::SortedDraw;
use crate::settings::{KeyStrategy, RenderSettings};

const COVARIANCE_COLUMNS: [&str; 3] = ["cov3_col0", "cov3_col1", "cov3_col2"];

/// Back-to-front sorted Gaussian splats. Each splat becomes a quad spanning
/// three standard deviations of its projected covariance, shaded with the
/// Gaussian falloff.
pub struct SplatRenderer {
    draw: SortedDraw,
}

impl SplatRenderer {
    pub fn init(
        gpu: &GpuContext,
        cloud: &GaussianCloud,
        target_format: TextureFormat,
        settings: &RenderSettings,
    ) -> Result<Self, LoadError> {
        let program = Program::new(
            &gpu.device,
            &ProgramDescriptor {
                label: "splats",
                shader: SPLAT,
                stage: ProgramStage::Render {
                    primitive: PrimitiveKind::Quads,
                    target_format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                },
            },
            settings.shader_dir.as_deref(),
        )?;
        let draw = SortedDraw::new(
            gpu,
            "splats",
            program,
            &cloud.positions(),
            settings.splat_keys,
            settings,
        )?;
        let mut renderer = Self { draw };
        renderer.bind_attributes(cloud)?;
        Ok(renderer)
    }

    fn bind_attributes(&mut self, cloud: &GaussianCloud) -> Result<(), LoadError> {
        let colors: Vec<Vec4> = cloud.gaussians().iter().map(|g| g.color()).collect();
        self.draw.set_attribute("color", &colors)?;

        // Padded to vec4: the storage arrays have a 16-byte stride.
        let covariances: Vec<Mat3> = cloud.gaussians().iter().map(|g| g.covariance()).collect();
        for (column, name) in COVARIANCE_COLUMNS.iter().enumerate() {
            let data: Vec<Vec4> = covariances.iter().map(|c| c.col(column).extend(0.0)).collect();
            self.draw.set_attribute(name, &data)?;
        }
        Ok(())
    }

    /// Swap in a new cloud; every buffer and the sorter are rebuilt.
    pub fn reload(&mut self, cloud: &GaussianCloud) -> Result<(), LoadError> {
        self.draw.reload(&cloud.positions())?;
        self.bind_attributes(cloud)
    }

    pub fn render(&mut self, target: &TextureView, camera: &Camera) -> Result<(), RenderError> {
        let program = self.draw.program_mut();
        program.set_uniform("proj_params", camera.proj_params());
        program.set_uniform("viewport", camera.viewport);
        self.draw.render(target, camera)
    }

    pub fn len(&self) -> u32 {
        self.draw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draw.is_empty()
    }

    pub fn key_strategy(&self) -> KeyStrategy {
        self.draw.key_strategy()
    }

    /// Primitive indices in the order the last frame drew them.
    pub fn draw_order(&self) -> anyhow::Result<Vec<u32>> {
        self.draw.draw_order()
    }

    pub fn sorted_draw(&self) -> &SortedDraw {
        &self.draw
    }
}
