use std::borrow::Cow;
use std::path::Path;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::{Device, ShaderModule, ShaderModuleDescriptor, ShaderSource};

use crate::error::LoadError;

/// A WGSL source compiled into the binary, overridable from disk by file name.
#[derive(Debug, Clone, Copy)]
pub struct ShaderFile {
    pub file_name: &'static str,
    pub embedded: &'static str,
}

pub const POINT: ShaderFile = ShaderFile {
    file_name: "point.wgsl",
    embedded: include_str!("../shaders/point.wgsl"),
};
pub const SPLAT: ShaderFile = ShaderFile {
    file_name: "splat.wgsl",
    embedded: include_str!("../shaders/splat.wgsl"),
};
pub const DEPTH_KEYS: ShaderFile = ShaderFile {
    file_name: "depth_keys.wgsl",
    embedded: include_str!("../shaders/depth_keys.wgsl"),
};
pub const RADIX_SORT: ShaderFile = ShaderFile {
    file_name: "radix_sort.wgsl",
    embedded: include_str!("../shaders/radix_sort.wgsl"),
};

impl ShaderFile {
    /// Source text: `shader_dir/<file_name>` when a directory is given, the
    /// embedded copy otherwise. A configured directory without the file is a
    /// load failure, not a silent fallback.
    pub fn source(&self, shader_dir: Option<&Path>) -> Result<Cow<'static, str>, LoadError> {
        match shader_dir {
            None => Ok(Cow::Borrowed(self.embedded)),
            Some(dir) => {
                let path = dir.join(self.file_name);
                std::fs::read_to_string(&path)
                    .map(Cow::Owned)
                    .map_err(|source| LoadError::ShaderIo { path, source })
            }
        }
    }
}

/// Parse and validate WGSL on the host so a bad shader surfaces as a
/// `LoadError` instead of a device error. The module is what programs reflect
/// their bindings from.
pub fn validate_wgsl(label: &str, source: &str) -> Result<naga::Module, LoadError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| LoadError::ShaderCompile {
        label: label.to_owned(),
        messages: e.emit_to_string(source),
    })?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| LoadError::ShaderCompile {
            label: label.to_owned(),
            messages: e.emit_to_string(source),
        })?;
    Ok(module)
}

pub fn load_shader(
    device: &Device,
    label: &str,
    file: &ShaderFile,
    shader_dir: Option<&Path>,
) -> Result<(ShaderModule, naga::Module), LoadError> {
    let source = file.source(shader_dir)?;
    let module = validate_wgsl(label, &source)?;
    log::debug!("compiled shader {label} from {}", file.file_name);
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(label),
        source: ShaderSource::Wgsl(source),
    });
    Ok((shader, module))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_shaders_validate() {
        for file in [POINT, SPLAT, DEPTH_KEYS, RADIX_SORT] {
            let source = file.source(None).unwrap();
            let module = validate_wgsl(file.file_name, &source).unwrap();
            assert!(!module.entry_points.is_empty(), "{}", file.file_name);
        }
    }

    #[test]
    fn syntax_error_is_a_compile_failure() {
        let err = validate_wgsl("broken", "fn main( {").unwrap_err();
        assert!(matches!(err, LoadError::ShaderCompile { .. }));
    }

    #[test]
    fn missing_override_is_an_io_failure() {
        let dir = std::env::temp_dir().join("sorted-splats-no-such-shader-dir");
        let err = POINT.source(Some(&dir)).unwrap_err();
        assert!(matches!(err, LoadError::ShaderIo { .. }));
    }
}
