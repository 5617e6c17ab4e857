use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::depth_key::DEFAULT_DEPTH_SCALE;

pub const DEFAULT_POINT_SIZE: f32 = 0.02;

/// Where per-primitive depth keys are computed each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// Compute kernel over the device-resident positions.
    #[default]
    Device,
    /// Single-threaded host loop followed by an upload of keys and indices.
    Host,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub point_keys: KeyStrategy,
    pub splat_keys: KeyStrategy,
    /// Fixed-point scale applied to depth before it becomes a key.
    pub depth_scale: f32,
    /// Half-width of a point sprite in NDC, before aspect correction.
    pub point_size: f32,
    /// `None` keeps whatever is already in the target.
    pub clear_color: Option<[f64; 4]>,
    /// Directory whose `*.wgsl` files replace the embedded shaders of the
    /// same name.
    pub shader_dir: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            point_keys: KeyStrategy::Device,
            splat_keys: KeyStrategy::Host,
            depth_scale: DEFAULT_DEPTH_SCALE,
            point_size: DEFAULT_POINT_SIZE,
            clear_color: Some([0.0, 0.0, 0.0, 1.0]),
            shader_dir: None,
        }
    }
}

impl RenderSettings {
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        toml::from_str(source).context("invalid render settings")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&source)
    }

    pub(crate) fn clear_color(&self) -> Option<wgpu::Color> {
        self.clear_color.map(|[r, g, b, a]| wgpu::Color { r, g, b, a })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(RenderSettings::from_toml_str("").unwrap(), RenderSettings::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let settings = RenderSettings::from_toml_str(
            r#"
            splat_keys = "device"
            depth_scale = 1024.0
            point_size = 0.05
            shader_dir = "shaders"
            "#,
        )
        .unwrap();
        assert_eq!(settings.splat_keys, KeyStrategy::Device);
        assert_eq!(settings.point_keys, KeyStrategy::Device);
        assert_eq!(settings.depth_scale, 1024.0);
        assert_eq!(settings.point_size, 0.05);
        assert_eq!(settings.shader_dir, Some(PathBuf::from("shaders")));
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!(RenderSettings::from_toml_str(r#"point_keys = "gpu""#).is_err());
    }
}
