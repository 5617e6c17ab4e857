use wgpu::{BlendState, Sampler, TextureFormat, TextureView};

use crate::camera::Camera;
use crate::cloud::PointCloud;
use crate::error::{LoadError, RenderError};
use crate::gpu::GpuContext;
use crate::gpu::program::{
    PrimitiveKind, Program, ProgramDescriptor, ProgramStage, TextureResource,
};
use crate::gpu::shader_loader::POINT;
use crate::gpu::texture::Sprite;
use crate::render::SortedDraw;
use crate::settings::{KeyStrategy, RenderSettings};

const DEFAULT_SPRITE_SIZE: u32 = 32;

/// Back-to-front sorted point cloud, each point a textured screen-aligned
/// quad `point_size` NDC units across its half-width.
pub struct PointRenderer {
    draw: SortedDraw,
    point_size: f32,
}

impl PointRenderer {
    /// Points start out with a soft white disc sprite; see `set_sprite`.
    pub fn init(
        gpu: &GpuContext,
        cloud: &PointCloud,
        target_format: TextureFormat,
        settings: &RenderSettings,
    ) -> Result<Self, LoadError> {
        let program = Program::new(
            &gpu.device,
            &ProgramDescriptor {
                label: "points",
                shader: POINT,
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
            "points",
            program,
            &cloud.positions(),
            settings.point_keys,
            settings,
        )?;
        let mut renderer = Self {
            draw,
            point_size: settings.point_size,
        };
        renderer.draw.set_attribute("color", &cloud.colors())?;
        let sprite = Sprite::disc(&gpu.device, &gpu.queue, DEFAULT_SPRITE_SIZE);
        renderer.set_sprite(sprite.view(), sprite.sampler());
        Ok(renderer)
    }

    /// Texture every point quad with `view`; its colour is multiplied by the
    /// point colour.
    pub fn set_sprite(&mut self, view: &TextureView, sampler: &Sampler) {
        self.draw.set_textures(&[
            ("sprite", TextureResource::View(view)),
            ("sprite_sampler", TextureResource::Sampler(sampler)),
        ]);
    }

    /// Swap in a new cloud; every buffer and the sorter are rebuilt. The
    /// sprite is kept.
    pub fn reload(&mut self, cloud: &PointCloud) -> Result<(), LoadError> {
        self.draw.reload(&cloud.positions())?;
        self.draw.set_attribute("color", &cloud.colors())
    }

    pub fn render(&mut self, target: &TextureView, camera: &Camera) -> Result<(), RenderError> {
        let program = self.draw.program_mut();
        program.set_uniform("point_size", self.point_size);
        program.set_uniform("inv_aspect_ratio", 1.0 / camera.aspect_ratio());
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
