//! WGSL compilation, linking and reflection.
//!
//! Both devices share this front end, so a shader that fails here fails the
//! same way on screen and in tests. Compilation parses and validates one stage
//! with naga and extracts its interface. Linking checks that every fragment
//! input is fed by a vertex output of the same type and merges the two stages'
//! uniform declarations into one name-keyed table.
//!
//! # Uniform naming
//!
//! Every `var<uniform>` contributes names: a struct-typed variable contributes
//! each member by member name; any other variable contributes its own name.
//! Only `f32`, `vec2<f32>` and `mat4x4<f32>` are bindable through the name
//! table; members of other types are laid out but not addressable by name.

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::device::{ShaderStage, UniformKind, UniformValue};

/// A vertex input or a stage output/input with a `@location`.
#[derive(Clone, Debug)]
pub(crate) struct InterfaceVar {
    pub name: Option<String>,
    pub location: u32,
    pub ty: naga::TypeInner,
}

/// A named uniform inside a uniform buffer binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: String,
    pub kind: UniformKind,
    pub group: u32,
    pub binding: u32,
    /// Byte offset inside the binding's buffer.
    pub offset: u32,
}

/// A `var<uniform>` binding and the size of its buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformBlock {
    pub group: u32,
    pub binding: u32,
    pub size: u32,
}

/// A vertex attribute the linked program consumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeSlot {
    pub name: String,
    pub location: u32,
    /// Floats per vertex (1 to 4).
    pub components: u32,
}

/// A stage that parsed and validated.
#[derive(Clone, Debug)]
pub(crate) struct CompiledShader {
    pub stage: ShaderStage,
    pub source: String,
    pub entry_point: String,
    pub inputs: Vec<InterfaceVar>,
    pub outputs: Vec<InterfaceVar>,
    pub uniforms: Vec<UniformSlot>,
    pub blocks: Vec<UniformBlock>,
}

/// Two stages that agree on their interface.
#[derive(Clone, Debug)]
pub(crate) struct LinkedProgram {
    pub vertex: CompiledShader,
    pub fragment: CompiledShader,
    pub attributes: Vec<AttributeSlot>,
    pub uniforms: Vec<UniformSlot>,
    pub blocks: Vec<UniformBlock>,
}

impl LinkedProgram {
    pub fn attribute(&self, name: &str) -> Option<&AttributeSlot> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Index into [`uniforms`](Self::uniforms) for `name`.
    pub fn uniform_index(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|u| u.name == name)
    }
}

/// CPU copy of a program's uniform buffers, laid out as the shader expects.
#[derive(Clone, Debug)]
pub(crate) struct UniformShadow {
    blocks: Vec<(UniformBlock, Vec<u8>)>,
}

impl UniformShadow {
    pub fn new(program: &LinkedProgram) -> Self {
        Self {
            blocks: program
                .blocks
                .iter()
                .map(|b| (b.clone(), vec![0; b.size as usize]))
                .collect(),
        }
    }

    /// Store `value` for `slot`. Returns the index of the block written.
    pub fn write(&mut self, slot: &UniformSlot, value: &UniformValue) -> Option<usize> {
        let index = self.block_index(slot)?;
        let start = slot.offset as usize;
        let bytes = value.as_bytes();
        self.blocks[index].1.get_mut(start..start + bytes.len())?.copy_from_slice(bytes);
        Some(index)
    }

    pub fn read(&self, slot: &UniformSlot) -> Option<UniformValue> {
        let index = self.block_index(slot)?;
        let bytes = self.blocks[index].1.get(slot.offset as usize..)?;
        UniformValue::from_bytes(slot.kind, bytes)
    }

    pub fn blocks(&self) -> impl Iterator<Item = (&UniformBlock, &[u8])> {
        self.blocks.iter().map(|(b, bytes)| (b, bytes.as_slice()))
    }

    fn block_index(&self, slot: &UniformSlot) -> Option<usize> {
        self.blocks
            .iter()
            .position(|(b, _)| b.group == slot.group && b.binding == slot.binding)
    }
}

/// Parse and validate `source` as a single `stage`.
///
/// Returns naga's rendered diagnostic on failure.
pub(crate) fn compile(stage: ShaderStage, source: &str) -> Result<CompiledShader, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let wanted = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let mut entry_points = module.entry_points.iter().filter(|ep| ep.stage == wanted);
    let entry = entry_points
        .next()
        .ok_or_else(|| format!("no @{stage} entry point found"))?;
    if entry_points.next().is_some() {
        log::debug!("several @{stage} entry points; using `{}`", entry.name);
    }

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_locations(&module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut inputs);
    }
    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_locations(&module, None, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let (uniforms, blocks) = reflect_uniforms(&module);

    Ok(CompiledShader {
        stage,
        source: source.to_owned(),
        entry_point: entry.name.clone(),
        inputs,
        outputs,
        uniforms,
        blocks,
    })
}

/// Check the vertex/fragment interface and merge uniform tables.
///
/// Returns a linker-style message on failure.
pub(crate) fn link(
    vertex: &CompiledShader,
    fragment: &CompiledShader,
) -> Result<LinkedProgram, String> {
    if vertex.stage != ShaderStage::Vertex {
        return Err(format!("expected a vertex shader, got a {} shader", vertex.stage));
    }
    if fragment.stage != ShaderStage::Fragment {
        return Err(format!("expected a fragment shader, got a {} shader", fragment.stage));
    }

    let mut errors = Vec::new();

    for input in &fragment.inputs {
        let label = input.name.as_deref().unwrap_or("<unnamed>");
        match vertex.outputs.iter().find(|o| o.location == input.location) {
            None => errors.push(format!(
                "fragment input `{label}` at @location({}) is not written by the vertex stage",
                input.location
            )),
            Some(output) if output.ty != input.ty => errors.push(format!(
                "fragment input `{label}` at @location({}) does not match the vertex output type",
                input.location
            )),
            Some(_) => {}
        }
    }

    let mut attributes = Vec::new();
    for input in &vertex.inputs {
        let Some(name) = &input.name else {
            continue;
        };
        match float_components(&input.ty) {
            Some(components) => attributes.push(AttributeSlot {
                name: name.clone(),
                location: input.location,
                components,
            }),
            None => errors.push(format!(
                "vertex input `{name}` at @location({}) must be f32 or a vecN<f32>",
                input.location
            )),
        }
    }

    let mut blocks = vertex.blocks.clone();
    for block in &fragment.blocks {
        match blocks
            .iter()
            .find(|b| b.group == block.group && b.binding == block.binding)
        {
            None => blocks.push(block.clone()),
            Some(existing) if existing.size != block.size => errors.push(format!(
                "uniform binding @group({}) @binding({}) has a different size in each stage",
                block.group, block.binding
            )),
            Some(_) => {}
        }
    }
    blocks.sort_by_key(|b| (b.group, b.binding));

    for stage in [vertex, fragment] {
        for (i, slot) in stage.uniforms.iter().enumerate() {
            if stage.uniforms[..i].iter().any(|u| u.name == slot.name) {
                errors.push(format!(
                    "uniform `{}` is declared more than once in the {} shader",
                    slot.name, stage.stage
                ));
            }
        }
    }

    let mut uniforms = vertex.uniforms.clone();
    for slot in &fragment.uniforms {
        match uniforms.iter().find(|u| u.name == slot.name) {
            None => uniforms.push(slot.clone()),
            Some(existing) if existing != slot => errors.push(format!(
                "uniform `{}` is declared differently in each stage",
                slot.name
            )),
            Some(_) => {}
        }
    }

    if !errors.is_empty() {
        return Err(errors.join("\n"));
    }

    Ok(LinkedProgram {
        vertex: vertex.clone(),
        fragment: fragment.clone(),
        attributes,
        uniforms,
        blocks,
    })
}

fn collect_locations(
    module: &naga::Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<InterfaceVar>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(InterfaceVar {
            name: name.map(str::to_owned),
            location: *location,
            ty: module.types[ty].inner.clone(),
        }),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(
                        module,
                        member.name.as_deref(),
                        member.ty,
                        member.binding.as_ref(),
                        out,
                    );
                }
            }
        }
    }
}

fn reflect_uniforms(module: &naga::Module) -> (Vec<UniformSlot>, Vec<UniformBlock>) {
    let mut slots = Vec::new();
    let mut blocks = Vec::new();

    for (_, global) in module.global_variables.iter() {
        if global.space != naga::AddressSpace::Uniform {
            continue;
        }
        let Some(binding) = &global.binding else {
            continue;
        };
        let inner = &module.types[global.ty].inner;
        blocks.push(UniformBlock {
            group: binding.group,
            binding: binding.binding,
            size: inner.size(module.to_ctx()),
        });

        let mut push = |name: Option<&String>, ty: naga::Handle<naga::Type>, offset: u32| {
            let Some(name) = name else {
                return;
            };
            match uniform_kind(&module.types[ty].inner) {
                Some(kind) => slots.push(UniformSlot {
                    name: name.clone(),
                    kind,
                    group: binding.group,
                    binding: binding.binding,
                    offset,
                }),
                None => log::debug!("uniform `{name}` has an unbindable type; skipping"),
            }
        };

        match inner {
            naga::TypeInner::Struct { members, .. } => {
                for member in members {
                    push(member.name.as_ref(), member.ty, member.offset);
                }
            }
            _ => push(global.name.as_ref(), global.ty, 0),
        }
    }

    (slots, blocks)
}

fn uniform_kind(inner: &naga::TypeInner) -> Option<UniformKind> {
    match *inner {
        naga::TypeInner::Scalar(scalar) if scalar == naga::Scalar::F32 => Some(UniformKind::Float),
        naga::TypeInner::Vector {
            size: naga::VectorSize::Bi,
            scalar,
        } if scalar == naga::Scalar::F32 => Some(UniformKind::Vec2),
        naga::TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } if scalar == naga::Scalar::F32 => Some(UniformKind::Mat4),
        _ => None,
    }
}

fn float_components(inner: &naga::TypeInner) -> Option<u32> {
    match *inner {
        naga::TypeInner::Scalar(scalar) if scalar == naga::Scalar::F32 => Some(1),
        naga::TypeInner::Vector { size, scalar } if scalar == naga::Scalar::F32 => Some(match size {
            naga::VectorSize::Bi => 2,
            naga::VectorSize::Tri => 3,
            naga::VectorSize::Quad => 4,
        }),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const VERTEX: &str = r#"
        struct Uniforms {
            model_matrix: mat4x4<f32>,
            center: vec2<f32>,
            time: f32,
        }
        @group(0) @binding(0) var<uniform> u: Uniforms;

        struct VertexOutput {
            @builtin(position) clip_position: vec4<f32>,
            @location(0) normal: vec3<f32>,
        }

        @vertex
        fn vs_main(
            @location(0) position: vec3<f32>,
            @location(1) normal: vec3<f32>,
        ) -> VertexOutput {
            var out: VertexOutput;
            let lift = sin(u.time + distance(position.xz, u.center));
            out.clip_position = u.model_matrix * vec4<f32>(position.x, lift, position.z, 1.0);
            out.normal = normal;
            return out;
        }
    "#;

    pub(crate) const FRAGMENT: &str = r#"
        @group(0) @binding(1) var<uniform> brightness: f32;

        @fragment
        fn fs_main(@location(0) normal: vec3<f32>) -> @location(0) vec4<f32> {
            return vec4<f32>(normalize(normal) * brightness, 1.0);
        }
    "#;

    #[test]
    fn compile_reflects_inputs_and_uniforms() {
        let vs = compile(ShaderStage::Vertex, VERTEX).unwrap();
        assert_eq!(vs.entry_point, "vs_main");
        assert_eq!(vs.inputs.len(), 2);
        assert_eq!(vs.outputs.len(), 1);

        let names: Vec<_> = vs
            .uniforms
            .iter()
            .map(|u| (u.name.as_str(), u.kind, u.offset))
            .collect();
        assert_eq!(
            names,
            [
                ("model_matrix", UniformKind::Mat4, 0),
                ("center", UniformKind::Vec2, 64),
                ("time", UniformKind::Float, 72),
            ]
        );
        assert_eq!(vs.blocks, [UniformBlock { group: 0, binding: 0, size: 80 }]);
    }

    #[test]
    fn syntax_errors_carry_the_diagnostic() {
        let err = compile(ShaderStage::Vertex, "fn vs_main( {").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let err = compile(ShaderStage::Fragment, VERTEX).unwrap_err();
        assert!(err.contains("@fragment"), "{err}");
    }

    #[test]
    fn link_merges_stages() {
        let vs = compile(ShaderStage::Vertex, VERTEX).unwrap();
        let fs = compile(ShaderStage::Fragment, FRAGMENT).unwrap();
        let program = link(&vs, &fs).unwrap();

        assert_eq!(
            program.attribute("position"),
            Some(&AttributeSlot { name: "position".into(), location: 0, components: 3 })
        );
        assert_eq!(program.attribute("normal").map(|a| a.location), Some(1));
        assert!(program.uniform_index("brightness").is_some());
        assert!(program.uniform_index("time").is_some());
        assert_eq!(program.blocks.len(), 2);
        assert_eq!(program.blocks[1], UniformBlock { group: 0, binding: 1, size: 4 });
    }

    #[test]
    fn link_rejects_unfed_fragment_inputs() {
        let vs = compile(ShaderStage::Vertex, VERTEX).unwrap();
        let fs = compile(
            ShaderStage::Fragment,
            r#"
            @fragment
            fn fs_main(@location(3) tint: vec4<f32>) -> @location(0) vec4<f32> {
                return tint;
            }
            "#,
        )
        .unwrap();
        let err = link(&vs, &fs).unwrap_err();
        assert!(err.contains("tint"), "{err}");
    }

    #[test]
    fn shadow_writes_at_member_offsets() {
        let vs = compile(ShaderStage::Vertex, VERTEX).unwrap();
        let fs = compile(ShaderStage::Fragment, FRAGMENT).unwrap();
        let program = link(&vs, &fs).unwrap();
        let mut shadow = UniformShadow::new(&program);

        let time = &program.uniforms[program.uniform_index("time").unwrap()];
        assert_eq!(shadow.write(time, &UniformValue::Float(3.0)), Some(0));
        assert_eq!(shadow.read(time), Some(UniformValue::Float(3.0)));

        let (_, bytes) = shadow.blocks().next().unwrap();
        assert_eq!(&bytes[72..76], 3.0f32.to_ne_bytes());
    }

    #[test]
    fn link_rejects_a_name_shared_by_two_bindings_of_one_stage() {
        let vs = compile(
            ShaderStage::Vertex,
            r#"
            struct Motion { time: f32 }
            struct Wave { time: f32 }
            @group(0) @binding(0) var<uniform> motion: Motion;
            @group(0) @binding(1) var<uniform> wave: Wave;

            @vertex
            fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(position, motion.time + wave.time);
            }
            "#,
        )
        .unwrap();
        assert_eq!(vs.uniforms.len(), 2);

        let fs = compile(
            ShaderStage::Fragment,
            r#"
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(1.0);
            }
            "#,
        )
        .unwrap();
        let err = link(&vs, &fs).unwrap_err();
        assert!(err.contains("`time` is declared more than once"), "{err}");
    }

    #[test]
    fn link_rejects_swapped_stages() {
        let vs = compile(ShaderStage::Vertex, VERTEX).unwrap();
        let fs = compile(ShaderStage::Fragment, FRAGMENT).unwrap();
        assert!(link(&fs, &vs).is_err());
    }
}
