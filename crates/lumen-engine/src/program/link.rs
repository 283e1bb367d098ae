use std::collections::HashMap;

use naga::{Binding, Handle, Module, Scalar, Type, TypeInner};

use crate::error::{HarnessError, Result, ShaderStage};

use super::shader::Shader;
use super::uniform::{UniformKind, UniformSlot};

/// A named per-vertex input of the vertex stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name: String,
    pub location: u32,
    /// 1..=4 `f32` components.
    pub components: u32,
}

/// One `var<uniform>` resource of the program.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBindingInfo {
    /// Name of the WGSL global.
    pub name: String,
    pub group: u32,
    pub binding: u32,
    /// Buffer size in bytes as laid out by WGSL.
    pub size: u32,
    pub visibility: wgpu::ShaderStages,
}

/// Linked, reflected interface of a vertex + fragment pair.
#[derive(Debug, Clone)]
pub struct ProgramInterface {
    vertex: Shader,
    fragment: Shader,
    attributes: Vec<AttributeInfo>,
    bindings: Vec<UniformBindingInfo>,
    uniforms: Vec<UniformSlot>,
    uniform_index: HashMap<String, usize>,
}

impl ProgramInterface {
    #[inline]
    pub fn vertex(&self) -> &Shader {
        &self.vertex
    }

    #[inline]
    pub fn fragment(&self) -> &Shader {
        &self.fragment
    }

    #[inline]
    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|a| a.name == name)
    }

    #[inline]
    pub fn bindings(&self) -> &[UniformBindingInfo] {
        &self.bindings
    }

    /// Settable uniforms in declaration order.
    #[inline]
    pub fn uniforms(&self) -> &[UniformSlot] {
        &self.uniforms
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformSlot> {
        self.uniform_index.get(name).map(|&i| &self.uniforms[i])
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct IoType {
    components: u32,
    scalar: Scalar,
}

impl IoType {
    fn describe(self) -> String {
        let scalar = match (self.scalar.kind, self.scalar.width) {
            (naga::ScalarKind::Float, 4) => "f32",
            (naga::ScalarKind::Sint, 4) => "i32",
            (naga::ScalarKind::Uint, 4) => "u32",
            _ => "scalar",
        };
        if self.components == 1 {
            scalar.to_string()
        } else {
            format!("vec{}<{scalar}>", self.components)
        }
    }
}

#[derive(Debug, Clone)]
struct IoVar {
    name: String,
    location: u32,
    ty: Option<IoType>,
}

fn io_type(inner: &TypeInner) -> Option<IoType> {
    match *inner {
        TypeInner::Scalar(scalar) => Some(IoType {
            components: 1,
            scalar,
        }),
        TypeInner::Vector { size, scalar } => Some(IoType {
            components: size as u32,
            scalar,
        }),
        _ => None,
    }
}

/// Flattens `@location` bindings, descending into IO structs.
fn collect_locations(
    module: &Module,
    name: Option<&str>,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<IoVar>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(IoVar {
            name: name.unwrap_or("<unnamed>").to_string(),
            location: *location,
            ty: io_type(&module.types[ty].inner),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_locations(module, m.name.as_deref(), m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

fn entry_inputs(shader: &Shader) -> Vec<IoVar> {
    let mut out = Vec::new();
    if let Some(ep) = shader.entry() {
        for arg in &ep.function.arguments {
            collect_locations(
                shader.module(),
                arg.name.as_deref(),
                arg.ty,
                arg.binding.as_ref(),
                &mut out,
            );
        }
    }
    out
}

fn entry_outputs(shader: &Shader) -> Vec<IoVar> {
    let mut out = Vec::new();
    if let Some(result) = shader.entry().and_then(|ep| ep.function.result.as_ref()) {
        collect_locations(
            shader.module(),
            None,
            result.ty,
            result.binding.as_ref(),
            &mut out,
        );
    }
    out
}

fn stage_bits(stage: ShaderStage) -> wgpu::ShaderStages {
    match stage {
        ShaderStage::Vertex => wgpu::ShaderStages::VERTEX,
        ShaderStage::Fragment => wgpu::ShaderStages::FRAGMENT,
    }
}

/// Collects the uniform resources of one stage into `bindings` / `uniforms`.
fn reflect_uniforms(
    shader: &Shader,
    bindings: &mut Vec<UniformBindingInfo>,
    uniforms: &mut Vec<UniformSlot>,
    problems: &mut Vec<String>,
) {
    let module = shader.module();
    let stage = shader.stage();

    for (_, var) in module.global_variables.iter() {
        let name = var.name.clone().unwrap_or_else(|| "<unnamed>".to_string());

        match var.space {
            naga::AddressSpace::Uniform => {}
            naga::AddressSpace::Private
            | naga::AddressSpace::WorkGroup
            | naga::AddressSpace::Function => continue,
            _ => {
                problems.push(format!(
                    "{stage} stage: resource `{name}` is not a uniform buffer; only var<uniform> is supported"
                ));
                continue;
            }
        }

        let Some(rb) = var.binding.as_ref() else {
            continue;
        };
        let size = module.types[var.ty].inner.size(module.to_ctx());

        let index = match bindings
            .iter()
            .position(|b| b.group == rb.group && b.binding == rb.binding)
        {
            Some(i) => {
                let existing = &mut bindings[i];
                if existing.size != size {
                    problems.push(format!(
                        "uniform @group({}) @binding({}) is {} bytes in the {} stage but {size} bytes in the {stage} stage",
                        rb.group, rb.binding, existing.size, describe_stages(existing.visibility),
                    ));
                    continue;
                }
                existing.visibility |= stage_bits(stage);
                // Slots were already reflected from the first stage.
                continue;
            }
            None => {
                bindings.push(UniformBindingInfo {
                    name: name.clone(),
                    group: rb.group,
                    binding: rb.binding,
                    size,
                    visibility: stage_bits(stage),
                });
                bindings.len() - 1
            }
        };

        let mut add_slot = |slot_name: String, offset: u32, ty: Handle<Type>| {
            let Some(kind) = UniformKind::from_naga(&module.types[ty].inner) else {
                log::debug!("uniform `{slot_name}` has a type that cannot be set; skipped");
                return;
            };
            if uniforms.iter().any(|u| u.name == slot_name) {
                problems.push(format!(
                    "uniform name `{slot_name}` is declared by more than one binding"
                ));
                return;
            }
            uniforms.push(UniformSlot {
                name: slot_name,
                binding: index,
                offset,
                kind,
            });
        };

        match &module.types[var.ty].inner {
            TypeInner::Struct { members, .. } => {
                for m in members {
                    let Some(member_name) = m.name.clone() else { continue };
                    add_slot(member_name, m.offset, m.ty);
                }
            }
            _ => add_slot(name, 0, var.ty),
        }
    }
}

fn describe_stages(stages: wgpu::ShaderStages) -> &'static str {
    if stages.contains(wgpu::ShaderStages::VERTEX) {
        "vertex"
    } else {
        "fragment"
    }
}

/// Links a vertex and a fragment stage.
///
/// Checks that every fragment input is written by the vertex stage with the
/// same type and that shared uniform bindings agree, then reflects vertex
/// attributes and settable uniforms. All problems are reported together.
pub fn link(shaders: &[&Shader]) -> Result<ProgramInterface> {
    let mut problems = Vec::new();

    let vertex: Vec<&Shader> = shaders
        .iter()
        .copied()
        .filter(|s| s.stage() == ShaderStage::Vertex)
        .collect();
    let fragment: Vec<&Shader> = shaders
        .iter()
        .copied()
        .filter(|s| s.stage() == ShaderStage::Fragment)
        .collect();

    let (vertex, fragment) = match (vertex.as_slice(), fragment.as_slice()) {
        ([v], [f]) => (*v, *f),
        (v, f) => {
            return Err(HarnessError::ProgramLink {
                log: format!(
                    "expected exactly one vertex and one fragment stage, got {} vertex and {} fragment",
                    v.len(),
                    f.len()
                ),
            });
        }
    };

    // Vertex attributes.
    let mut attributes = Vec::new();
    for input in entry_inputs(vertex) {
        match input.ty {
            Some(ty) if ty.scalar == Scalar::F32 => attributes.push(AttributeInfo {
                name: input.name,
                location: input.location,
                components: ty.components,
            }),
            Some(ty) => problems.push(format!(
                "vertex input `{}` is {}; only f32 attributes are supported",
                input.name,
                ty.describe()
            )),
            None => problems.push(format!(
                "vertex input `{}` has an unsupported type",
                input.name
            )),
        }
    }
    attributes.sort_by_key(|a| a.location);

    // Varyings.
    let outputs = entry_outputs(vertex);
    for input in entry_inputs(fragment) {
        match outputs.iter().find(|o| o.location == input.location) {
            None => problems.push(format!(
                "fragment input `{}` at location {} is not written by the vertex stage",
                input.name, input.location
            )),
            Some(out) if out.ty != input.ty => problems.push(format!(
                "fragment input `{}` at location {} is {} but the vertex stage writes {}",
                input.name,
                input.location,
                input.ty.map_or_else(|| "unsupported".to_string(), IoType::describe),
                out.ty.map_or_else(|| "unsupported".to_string(), IoType::describe),
            )),
            Some(_) => {}
        }
    }

    // Uniforms.
    let mut bindings = Vec::new();
    let mut uniforms = Vec::new();
    reflect_uniforms(vertex, &mut bindings, &mut uniforms, &mut problems);
    reflect_uniforms(fragment, &mut bindings, &mut uniforms, &mut problems);

    if !problems.is_empty() {
        return Err(HarnessError::ProgramLink {
            log: problems.join("\n"),
        });
    }

    let uniform_index = uniforms
        .iter()
        .enumerate()
        .map(|(i, u)| (u.name.clone(), i))
        .collect();

    log::debug!(
        "linked program: {} attributes, {} uniform bindings, {} uniforms",
        attributes.len(),
        bindings.len(),
        uniforms.len()
    );

    Ok(ProgramInterface {
        vertex: vertex.clone(),
        fragment: fragment.clone(),
        attributes,
        bindings,
        uniforms,
        uniform_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::compile_shader;

    const TRIANGLE_VS: &str = r#"
        struct Globals {
            transform: mat4x4<f32>,
        };
        @group(0) @binding(0) var<uniform> globals: Globals;

        struct VsOut {
            @builtin(position) position: vec4<f32>,
            @location(0) color: vec3<f32>,
        };

        @vertex
        fn vs_main(@location(0) in_position: vec2<f32>, @location(1) in_color: vec3<f32>) -> VsOut {
            var out: VsOut;
            out.position = globals.transform * vec4<f32>(in_position, 0.0, 1.0);
            out.color = in_color;
            return out;
        }
    "#;

    const TRIANGLE_FS: &str = r#"
        @group(0) @binding(1) var<uniform> tint: vec4<f32>;

        @fragment
        fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
            return vec4<f32>(color, 1.0) * tint;
        }
    "#;

    fn vs(src: &str) -> Shader {
        compile_shader(ShaderStage::Vertex, src).unwrap()
    }

    fn fs(src: &str) -> Shader {
        compile_shader(ShaderStage::Fragment, src).unwrap()
    }

    fn link_log(shaders: &[&Shader]) -> String {
        match link(shaders) {
            Err(HarnessError::ProgramLink { log }) => log,
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn reflects_attributes_and_uniforms() {
        let (v, f) = (vs(TRIANGLE_VS), fs(TRIANGLE_FS));
        // Stage order in the list does not matter.
        let program = link(&[&f, &v]).unwrap();

        let names: Vec<_> = program.attributes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["in_position", "in_color"]);
        assert_eq!(program.attribute("in_color").unwrap().components, 3);

        let transform = program.uniform("transform").unwrap();
        assert_eq!(transform.kind, UniformKind::Mat4);
        assert_eq!(transform.offset, 0);

        let tint = program.uniform("tint").unwrap();
        assert_eq!(tint.kind, UniformKind::Vec4);
        assert_ne!(tint.binding, transform.binding);

        assert_eq!(program.bindings().len(), 2);
        assert_eq!(program.bindings()[0].size, 64);
        assert_eq!(program.bindings()[0].visibility, wgpu::ShaderStages::VERTEX);
        assert!(program.uniform("missing").is_none());
    }

    #[test]
    fn struct_members_get_wgsl_offsets() {
        let f = fs(r#"
            struct Params {
                offset: vec2<f32>,
                scale: f32,
                iterations: i32,
                tint: vec3<f32>,
            };
            @group(0) @binding(0) var<uniform> params: Params;

            @fragment
            fn fs_main(@builtin(position) p: vec4<f32>) -> @location(0) vec4<f32> {
                let v = p.xy * params.scale + params.offset;
                return vec4<f32>(params.tint * f32(params.iterations) + vec3<f32>(v, 0.0), 1.0);
            }
        "#);
        let v = vs(r#"
            @vertex
            fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(pos, 0.0, 1.0);
            }
        "#);
        let program = link(&[&v, &f]).unwrap();

        assert_eq!(program.uniform("offset").unwrap().offset, 0);
        assert_eq!(program.uniform("scale").unwrap().offset, 8);
        assert_eq!(program.uniform("iterations").unwrap().kind, UniformKind::Int);
        assert_eq!(program.uniform("iterations").unwrap().offset, 12);
        assert_eq!(program.uniform("tint").unwrap().offset, 16);
        assert_eq!(program.bindings()[0].size, 32);
    }

    #[test]
    fn shared_binding_merges_visibility() {
        let v = vs(r#"
            @group(0) @binding(0) var<uniform> time: f32;
            @vertex
            fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(pos * time, 0.0, 1.0);
            }
        "#);
        let f = fs(r#"
            @group(0) @binding(0) var<uniform> time: f32;
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(time);
            }
        "#);
        let program = link(&[&v, &f]).unwrap();
        assert_eq!(program.bindings().len(), 1);
        assert_eq!(
            program.bindings()[0].visibility,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT
        );
        assert_eq!(program.uniforms().len(), 1);
    }

    #[test]
    fn unmatched_varying_fails_to_link() {
        let v = vs(r#"
            @vertex
            fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(pos, 0.0, 1.0);
            }
        "#);
        let log = link_log(&[&v, &fs(TRIANGLE_FS)]);
        assert!(log.contains("fragment input `color` at location 0"));
    }

    #[test]
    fn varying_type_mismatch_fails_to_link() {
        let f = fs(r#"
            @fragment
            fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
                return color;
            }
        "#);
        let log = link_log(&[&vs(TRIANGLE_VS), &f]);
        assert!(log.contains("is vec4<f32> but the vertex stage writes vec3<f32>"));
    }

    #[test]
    fn stage_count_is_checked() {
        let v = vs(TRIANGLE_VS);
        let log = link_log(&[&v]);
        assert!(log.contains("got 1 vertex and 0 fragment"));
    }

    #[test]
    fn conflicting_binding_sizes_fail_to_link() {
        let v = vs(r#"
            @group(0) @binding(0) var<uniform> a: f32;
            @vertex
            fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(pos * a, 0.0, 1.0);
            }
        "#);
        let f = fs(r#"
            @group(0) @binding(0) var<uniform> b: vec4<f32>;
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return b;
            }
        "#);
        let log = link_log(&[&v, &f]);
        assert!(log.contains("@group(0) @binding(0)"));
    }
}
