use std::path::Path;

use glam::{Mat4, Vec2, Vec3, Vec4};
use naga::{AddressSpace, Binding, Handle, Module, Scalar, ShaderStage, Type, TypeInner, VectorSize};
use wgpu::util::DeviceExt;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindingResource, BlendState,
    Buffer, BufferUsages, ColorTargetState, ColorWrites, ComputePass, ComputePipeline,
    ComputePipelineDescriptor, Device, FragmentState, MultisampleState, PrimitiveState,
    PrimitiveTopology, Queue, RenderPass, RenderPipeline, RenderPipelineDescriptor, Sampler,
    TextureFormat, TextureView, VertexAttribute, VertexBufferLayout, VertexFormat, VertexState,
    VertexStepMode,
};

use crate::error::LoadError;
use crate::gpu::shader_loader::{ShaderFile, load_shader};

/// Group of the program's uniform struct, always at binding 0.
pub const UNIFORM_GROUP: u32 = 0;
/// Group of the per-primitive `array<T>` storage buffers.
pub const ATTRIBUTE_GROUP: u32 = 1;
/// Group of textures and samplers.
pub const TEXTURE_GROUP: u32 = 2;
/// The only vertex input a render program may declare: a `u32` fed one
/// instance at a time from the draw-order buffer.
pub const ORDER_ATTRIBUTE: &str = "sorted_index";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UniformType {
    Float,
    Uint,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformType {
    fn of(module: &Module, ty: Handle<Type>) -> Option<Self> {
        match &module.types[ty].inner {
            TypeInner::Scalar(s) if *s == Scalar::F32 => Some(UniformType::Float),
            TypeInner::Scalar(s) if *s == Scalar::U32 => Some(UniformType::Uint),
            TypeInner::Vector { size, scalar } if *scalar == Scalar::F32 => Some(match size {
                VectorSize::Bi => UniformType::Vec2,
                VectorSize::Tri => UniformType::Vec3,
                VectorSize::Quad => UniformType::Vec4,
            }),
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if *scalar == Scalar::F32 => Some(UniformType::Mat4),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Uint(u32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        match self {
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Uint(_) => UniformType::Uint,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::Mat4(_) => UniformType::Mat4,
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Uint(v) => bytemuck::bytes_of(v),
            UniformValue::Vec2(v) => bytemuck::bytes_of(v),
            UniformValue::Vec3(v) => bytemuck::bytes_of(v),
            UniformValue::Vec4(v) => bytemuck::bytes_of(v),
            UniformValue::Mat4(v) => bytemuck::bytes_of(v),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        UniformValue::Uint(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub ty: UniformType,
    pub offset: u64,
}

/// Byte layout of the program's uniform struct as the shader compiler laid
/// it out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    size: u64,
}

impl UniformLayout {
    fn from_struct(label: &str, module: &Module, ty: Handle<Type>) -> Result<Self, LoadError> {
        let TypeInner::Struct { members, span } = &module.types[ty].inner else {
            let name = module.types[ty].name.as_deref().unwrap_or("uniforms");
            return Err(unsupported(label, name));
        };
        let fields = members
            .iter()
            .map(|member| {
                let name = member.name.clone().unwrap_or_default();
                let ty = UniformType::of(module, member.ty)
                    .ok_or_else(|| unsupported(label, &name))?;
                Ok(UniformField {
                    name,
                    ty,
                    offset: u64::from(member.offset),
                })
            })
            .collect::<Result<Vec<_>, LoadError>>()?;
        Ok(Self {
            fields,
            size: u64::from(*span),
        })
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn unsupported(label: &str, name: &str) -> LoadError {
    LoadError::UnsupportedDeclaration {
        label: label.to_owned(),
        name: name.to_owned(),
    }
}

/// Binding of a named per-primitive array in the attribute group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttribSlot(u32);

impl AttribSlot {
    /// Returned for names the program does not declare; binding to it is a
    /// no-op.
    pub const UNRESOLVED: AttribSlot = AttribSlot(u32::MAX);

    pub fn index(self) -> Option<u32> {
        (self != Self::UNRESOLVED).then_some(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeField {
    name: String,
    binding: u32,
    /// Array stride in bytes.
    stride: u64,
}

/// How the vertex stage expands one sorted entry. Each entry is one instance
/// and the shader picks its corner from `vertex_index`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrimitiveKind {
    Points,
    Lines,
    Triangles,
    /// Two triangles per entry, for sprites and splat footprints.
    Quads,
}

impl PrimitiveKind {
    pub fn topology(self) -> PrimitiveTopology {
        match self {
            PrimitiveKind::Points => PrimitiveTopology::PointList,
            PrimitiveKind::Lines => PrimitiveTopology::LineList,
            PrimitiveKind::Triangles | PrimitiveKind::Quads => PrimitiveTopology::TriangleList,
        }
    }

    pub fn vertices_per_primitive(self) -> u32 {
        match self {
            PrimitiveKind::Points => 1,
            PrimitiveKind::Lines => 2,
            PrimitiveKind::Triangles => 3,
            PrimitiveKind::Quads => 6,
        }
    }
}

/// Names a compiled shader exposes: the group 0 uniform struct, the group 1
/// storage arrays, the group 2 textures and the order input.
#[derive(Debug, Clone, Default)]
pub struct Reflection {
    label: String,
    uniforms: UniformLayout,
    attributes: Vec<AttributeField>,
    textures: Vec<(String, u32)>,
    order_location: Option<u32>,
}

impl Reflection {
    pub fn from_module(label: &str, module: &Module) -> Result<Self, LoadError> {
        let mut reflection = Self {
            label: label.to_owned(),
            ..Default::default()
        };
        for (_, var) in module.global_variables.iter() {
            let (Some(binding), Some(name)) = (&var.binding, &var.name) else {
                continue;
            };
            match (binding.group, var.space) {
                (UNIFORM_GROUP, AddressSpace::Uniform) if binding.binding == 0 => {
                    reflection.uniforms = UniformLayout::from_struct(label, module, var.ty)?;
                }
                (ATTRIBUTE_GROUP, AddressSpace::Storage { .. }) => {
                    let TypeInner::Array { stride, .. } = &module.types[var.ty].inner else {
                        return Err(unsupported(label, name));
                    };
                    reflection.attributes.push(AttributeField {
                        name: name.clone(),
                        binding: binding.binding,
                        stride: u64::from(*stride),
                    });
                }
                (TEXTURE_GROUP, AddressSpace::Handle) => {
                    reflection.textures.push((name.clone(), binding.binding));
                }
                _ => {}
            }
        }
        reflection.attributes.sort_by_key(|a| a.binding);

        let vertex = module
            .entry_points
            .iter()
            .find(|entry| entry.stage == ShaderStage::Vertex);
        if let Some(entry) = vertex {
            for arg in &entry.function.arguments {
                reflection.vertex_input(module, arg.name.as_deref(), arg.ty, arg.binding.as_ref())?;
            }
        }
        Ok(reflection)
    }

    fn vertex_input(
        &mut self,
        module: &Module,
        name: Option<&str>,
        ty: Handle<Type>,
        binding: Option<&Binding>,
    ) -> Result<(), LoadError> {
        let inner = &module.types[ty].inner;
        match binding {
            Some(Binding::BuiltIn(_)) => Ok(()),
            Some(Binding::Location { location, .. }) => {
                let is_u32 = matches!(inner, TypeInner::Scalar(s) if *s == Scalar::U32);
                if name == Some(ORDER_ATTRIBUTE) && is_u32 {
                    self.order_location = Some(*location);
                    Ok(())
                } else {
                    Err(unsupported(&self.label, name.unwrap_or("<unnamed input>")))
                }
            }
            None => match inner {
                TypeInner::Struct { members, .. } => members.iter().try_for_each(|member| {
                    self.vertex_input(
                        module,
                        member.name.as_deref(),
                        member.ty,
                        member.binding.as_ref(),
                    )
                }),
                _ => Ok(()),
            },
        }
    }

    pub fn find_attribute(&self, name: &str) -> Option<AttribSlot> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| AttribSlot(a.binding))
    }

    pub fn resolve_attribute(&self, name: &str) -> AttribSlot {
        match self.find_attribute(name) {
            Some(slot) => slot,
            None => {
                debug_assert!(false, "{}: unresolved attribute `{name}`", self.label);
                log::warn!("{}: unresolved attribute `{name}`", self.label);
                AttribSlot::UNRESOLVED
            }
        }
    }

    pub fn attribute_stride(&self, slot: AttribSlot) -> Option<u64> {
        let binding = slot.index()?;
        self.attributes
            .iter()
            .find(|a| a.binding == binding)
            .map(|a| a.stride)
    }

    pub fn resolve_texture(&self, name: &str) -> Option<u32> {
        let found = self.textures.iter().find(|(n, _)| n == name).map(|(_, b)| *b);
        if found.is_none() {
            debug_assert!(false, "{}: unresolved texture `{name}`", self.label);
            log::warn!("{}: unresolved texture `{name}`", self.label);
        }
        found
    }

    /// `@location` of the `sorted_index` input, if the vertex stage has one.
    pub fn order_location(&self) -> Option<u32> {
        self.order_location
    }

    pub fn uniforms(&self) -> &UniformLayout {
        &self.uniforms
    }

    /// Copy `value` into `staging` at the uniform's offset. Unknown names and
    /// type mismatches leave `staging` untouched.
    pub fn write_uniform(&self, staging: &mut [u8], name: &str, value: UniformValue) -> bool {
        let Some(field) = self.uniforms.field(name) else {
            debug_assert!(false, "{}: unresolved uniform `{name}`", self.label);
            log::warn!("{}: unresolved uniform `{name}`", self.label);
            return false;
        };
        if field.ty != value.ty() {
            debug_assert!(
                false,
                "{}: uniform `{name}` is {:?}, got {:?}",
                self.label,
                field.ty,
                value.ty()
            );
            log::warn!("{}: uniform `{name}` type mismatch", self.label);
            return false;
        }
        let bytes = value.bytes();
        let start = field.offset as usize;
        staging[start..start + bytes.len()].copy_from_slice(bytes);
        true
    }
}

pub enum ProgramStage {
    /// Entry points `vs_main` / `fs_main`, drawn one instance per sorted
    /// entry.
    Render {
        primitive: PrimitiveKind,
        target_format: TextureFormat,
        blend: Option<BlendState>,
    },
    /// Entry point `main`.
    Compute,
}

pub struct ProgramDescriptor<'a> {
    pub label: &'a str,
    pub shader: ShaderFile,
    pub stage: ProgramStage,
}

/// One entry of the texture group.
#[derive(Clone, Copy)]
pub enum TextureResource<'a> {
    View(&'a TextureView),
    Sampler(&'a Sampler),
}

enum Pipeline {
    Render {
        pipeline: RenderPipeline,
        primitive: PrimitiveKind,
    },
    Compute(ComputePipeline),
}

struct UniformBlock {
    buffer: Buffer,
    bind_group: BindGroup,
    staging: Vec<u8>,
}

/// A compiled pipeline plus name-based access to its uniforms, attributes
/// and textures.
pub struct Program {
    label: String,
    pipeline: Pipeline,
    reflection: Reflection,
    uniforms: Option<UniformBlock>,
    textures: Option<BindGroup>,
}

impl Program {
    pub fn new(
        device: &Device,
        desc: &ProgramDescriptor<'_>,
        shader_dir: Option<&Path>,
    ) -> Result<Self, LoadError> {
        let (module, naga_module) = load_shader(device, desc.label, &desc.shader, shader_dir)?;
        let reflection = Reflection::from_module(desc.label, &naga_module)?;

        let pipeline = match &desc.stage {
            ProgramStage::Render {
                primitive,
                target_format,
                blend,
            } => {
                let order_location =
                    reflection
                        .order_location()
                        .ok_or_else(|| LoadError::MissingAttribute {
                            label: desc.label.to_owned(),
                            name: ORDER_ATTRIBUTE.to_owned(),
                        })?;
                let order_attribute = [VertexAttribute {
                    format: VertexFormat::Uint32,
                    offset: 0,
                    shader_location: order_location,
                }];
                let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
                    label: Some(desc.label),
                    layout: None,
                    vertex: VertexState {
                        module: &module,
                        entry_point: Some("vs_main"),
                        compilation_options: Default::default(),
                        buffers: &[VertexBufferLayout {
                            array_stride: size_of::<u32>() as u64,
                            step_mode: VertexStepMode::Instance,
                            attributes: &order_attribute,
                        }],
                    },
                    primitive: PrimitiveState {
                        topology: primitive.topology(),
                        ..Default::default()
                    },
                    depth_stencil: None,
                    multisample: MultisampleState::default(),
                    fragment: Some(FragmentState {
                        module: &module,
                        entry_point: Some("fs_main"),
                        compilation_options: Default::default(),
                        targets: &[Some(ColorTargetState {
                            format: *target_format,
                            blend: *blend,
                            write_mask: ColorWrites::ALL,
                        })],
                    }),
                    multiview_mask: None,
                    cache: None,
                });
                Pipeline::Render {
                    pipeline,
                    primitive: *primitive,
                }
            }
            ProgramStage::Compute => {
                Pipeline::Compute(device.create_compute_pipeline(&ComputePipelineDescriptor {
                    label: Some(desc.label),
                    layout: None,
                    module: &module,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    cache: None,
                }))
            }
        };

        let uniforms = if reflection.uniforms().is_empty() {
            None
        } else {
            let staging = vec![0u8; reflection.uniforms().size() as usize];
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} uniforms", desc.label)),
                contents: &staging,
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            });
            let layout = match &pipeline {
                Pipeline::Render { pipeline, .. } => pipeline.get_bind_group_layout(UNIFORM_GROUP),
                Pipeline::Compute(pipeline) => pipeline.get_bind_group_layout(UNIFORM_GROUP),
            };
            let bind_group = device.create_bind_group(&BindGroupDescriptor {
                label: Some(&format!("{} uniform bind group", desc.label)),
                layout: &layout,
                entries: &[BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            Some(UniformBlock {
                buffer,
                bind_group,
                staging,
            })
        };

        log::debug!(
            "built program {} ({} uniform bytes, {} attributes, {} textures)",
            desc.label,
            reflection.uniforms().size(),
            reflection.attributes.len(),
            reflection.textures.len()
        );
        Ok(Self {
            label: desc.label.to_owned(),
            pipeline,
            reflection,
            uniforms,
            textures: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn reflection(&self) -> &Reflection {
        &self.reflection
    }

    pub fn resolve_attribute(&self, name: &str) -> AttribSlot {
        self.reflection.resolve_attribute(name)
    }

    /// Like `resolve_attribute`, for callers that cannot continue without it.
    pub fn require_attribute(&self, name: &str) -> Result<AttribSlot, LoadError> {
        self.reflection
            .find_attribute(name)
            .ok_or_else(|| LoadError::MissingAttribute {
                label: self.label.clone(),
                name: name.to_owned(),
            })
    }

    /// Stage a uniform value; it reaches the device on the next `bind_*`.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        match self.uniforms.as_mut() {
            Some(block) => {
                self.reflection
                    .write_uniform(&mut block.staging, name, value.into());
            }
            None => {
                debug_assert!(false, "{}: program has no uniforms", self.label);
                log::warn!("{}: ignoring uniform `{name}`", self.label);
            }
        }
    }

    /// Bind the texture group by name. Every texture and sampler the shader
    /// declares must be supplied; otherwise the previous group is kept.
    pub fn set_textures(&mut self, device: &Device, resources: &[(&str, TextureResource<'_>)]) {
        let entries: Vec<BindGroupEntry> = resources
            .iter()
            .filter_map(|(name, resource)| {
                let binding = self.reflection.resolve_texture(name)?;
                let resource = match *resource {
                    TextureResource::View(view) => BindingResource::TextureView(view),
                    TextureResource::Sampler(sampler) => BindingResource::Sampler(sampler),
                };
                Some(BindGroupEntry { binding, resource })
            })
            .collect();
        if entries.len() != self.reflection.textures.len() {
            log::warn!(
                "{}: {} of {} texture bindings supplied, keeping the previous set",
                self.label,
                entries.len(),
                self.reflection.textures.len()
            );
            return;
        }
        self.textures = Some(device.create_bind_group(&BindGroupDescriptor {
            label: Some(&format!("{} texture bind group", self.label)),
            layout: &self.bind_group_layout(TEXTURE_GROUP),
            entries: &entries,
        }));
    }

    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match &self.pipeline {
            Pipeline::Render { primitive, .. } => Some(*primitive),
            Pipeline::Compute(_) => None,
        }
    }

    /// Layout of a bind group the caller fills in. Group 0 is the program's
    /// uniforms.
    pub fn bind_group_layout(&self, index: u32) -> BindGroupLayout {
        match &self.pipeline {
            Pipeline::Render { pipeline, .. } => pipeline.get_bind_group_layout(index),
            Pipeline::Compute(pipeline) => pipeline.get_bind_group_layout(index),
        }
    }

    fn upload_uniforms(&self, queue: &Queue) -> Option<&BindGroup> {
        let block = self.uniforms.as_ref()?;
        queue.write_buffer(&block.buffer, 0, &block.staging);
        Some(&block.bind_group)
    }

    pub fn bind_render(&self, queue: &Queue, pass: &mut RenderPass<'_>) {
        let Pipeline::Render { pipeline, .. } = &self.pipeline else {
            debug_assert!(false, "{} is not a render program", self.label);
            log::error!("{} bound to a render pass", self.label);
            return;
        };
        pass.set_pipeline(pipeline);
        if let Some(bind_group) = self.upload_uniforms(queue) {
            pass.set_bind_group(UNIFORM_GROUP, bind_group, &[]);
        }
        if let Some(textures) = &self.textures {
            pass.set_bind_group(TEXTURE_GROUP, textures, &[]);
        }
    }

    pub fn bind_compute(&self, queue: &Queue, pass: &mut ComputePass<'_>) {
        let Pipeline::Compute(pipeline) = &self.pipeline else {
            debug_assert!(false, "{} is not a compute program", self.label);
            log::error!("{} bound to a compute pass", self.label);
            return;
        };
        pass.set_pipeline(pipeline);
        if let Some(bind_group) = self.upload_uniforms(queue) {
            pass.set_bind_group(UNIFORM_GROUP, bind_group, &[]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::shader_loader::{DEPTH_KEYS, POINT, SPLAT, validate_wgsl};

    fn reflect(label: &str, source: &str) -> Result<Reflection, LoadError> {
        Reflection::from_module(label, &validate_wgsl(label, source)?)
    }

    fn offsets(reflection: &Reflection, names: &[&str]) -> Vec<u64> {
        names
            .iter()
            .map(|n| reflection.uniforms().field(n).unwrap().offset)
            .collect()
    }

    #[test]
    fn depth_key_uniforms_follow_wgsl_alignment() {
        let reflection = reflect("keys", DEPTH_KEYS.embedded).unwrap();
        let names = ["forward", "count", "eye", "scale"];
        assert_eq!(offsets(&reflection, &names), [0, 12, 16, 28]);
        assert_eq!(reflection.uniforms().size(), 32);
        assert_eq!(reflection.order_location(), None);
    }

    #[test]
    fn trailing_scalars_round_struct_to_sixteen() {
        let reflection = reflect("point", POINT.embedded).unwrap();
        let names = ["view_mat", "proj_mat", "point_size", "inv_aspect_ratio"];
        assert_eq!(offsets(&reflection, &names), [0, 64, 128, 132]);
        assert_eq!(reflection.uniforms().size(), 144);
    }

    #[test]
    fn vec2_aligns_to_eight() {
        let reflection = reflect(
            "t",
            "struct U { a: f32, b: vec2<f32> }
             @group(0) @binding(0) var<uniform> u: U;",
        )
        .unwrap();
        assert_eq!(offsets(&reflection, &["a", "b"]), [0, 8]);
        assert_eq!(reflection.uniforms().field("b").unwrap().ty, UniformType::Vec2);
    }

    #[test]
    fn reordered_struct_moves_the_write() {
        let reflection = reflect(
            "keys override",
            "struct KeyParams { scale: f32, eye: vec3<f32>, count: u32, forward: vec3<f32> }
             @group(0) @binding(0) var<uniform> params: KeyParams;",
        )
        .unwrap();
        let names = ["scale", "eye", "count", "forward"];
        assert_eq!(offsets(&reflection, &names), [0, 16, 28, 32]);

        let mut staging = vec![0u8; reflection.uniforms().size() as usize];
        assert!(reflection.write_uniform(&mut staging, "eye", Vec3::new(1.0, 2.0, 3.0).into()));
        let written: &[f32] = bytemuck::cast_slice(&staging[16..28]);
        assert_eq!(written, &[1.0, 2.0, 3.0]);
        assert!(staging[..16].iter().all(|&b| b == 0));
    }

    #[test]
    fn uniform_write_lands_at_offset() {
        let reflection = reflect("splat", SPLAT.embedded).unwrap();
        let mut staging = vec![0u8; reflection.uniforms().size() as usize];
        let viewport = Vec4::new(1.0, 2.0, 3.0, 4.0);
        assert!(reflection.write_uniform(&mut staging, "viewport", viewport.into()));
        let written: &[f32] = bytemuck::cast_slice(&staging[144..160]);
        assert_eq!(written, &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn attributes_resolve_to_storage_bindings() {
        let reflection = reflect("splat", SPLAT.embedded).unwrap();
        assert_eq!(reflection.resolve_attribute("position").index(), Some(0));
        assert_eq!(reflection.resolve_attribute("color").index(), Some(1));
        let slot = reflection.resolve_attribute("cov3_col2");
        assert_eq!(slot.index(), Some(4));
        assert_eq!(reflection.attribute_stride(slot), Some(16));
        assert_eq!(reflection.order_location(), Some(0));
    }

    #[test]
    fn sprite_bindings_are_reflected() {
        let reflection = reflect("point", POINT.embedded).unwrap();
        assert_eq!(reflection.resolve_texture("sprite"), Some(0));
        assert_eq!(reflection.resolve_texture("sprite_sampler"), Some(1));
    }

    #[test]
    fn per_vertex_inputs_are_rejected() {
        let err = reflect(
            "t",
            "@vertex
             fn vs_main(@location(0) position: vec4<f32>) -> @builtin(position) vec4<f32> {
                 return position;
             }",
        )
        .unwrap_err();
        assert!(
            matches!(err, LoadError::UnsupportedDeclaration { name, .. } if name == "position")
        );
    }

    #[test]
    fn unwritable_uniform_type_is_rejected() {
        let err = reflect(
            "t",
            "struct U { basis: mat3x3<f32> }
             @group(0) @binding(0) var<uniform> u: U;",
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedDeclaration { name, .. } if name == "basis"));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "unresolved attribute"))]
    fn unresolved_attribute_asserts_or_returns_sentinel() {
        let slot = reflect("splat", SPLAT.embedded)
            .unwrap()
            .resolve_attribute("normal");
        assert_eq!(slot, AttribSlot::UNRESOLVED);
        assert_eq!(slot.index(), None);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "unresolved uniform"))]
    fn unresolved_uniform_asserts_or_is_ignored() {
        let reflection = reflect("splat", SPLAT.embedded).unwrap();
        let mut staging = vec![0u8; reflection.uniforms().size() as usize];
        assert!(!reflection.write_uniform(&mut staging, "point_size", 2.0f32.into()));
        assert!(staging.iter().all(|&b| b == 0));
    }

    #[test]
    fn each_entry_expands_to_whole_primitives() {
        assert_eq!(PrimitiveKind::Points.vertices_per_primitive(), 1);
        assert_eq!(PrimitiveKind::Lines.vertices_per_primitive(), 2);
        assert_eq!(PrimitiveKind::Triangles.vertices_per_primitive(), 3);
        assert_eq!(PrimitiveKind::Quads.vertices_per_primitive(), 6);
        assert_eq!(PrimitiveKind::Quads.topology(), PrimitiveTopology::TriangleList);
    }
}
