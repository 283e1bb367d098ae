use std::collections::{HashMap, HashSet};

use wgpu::util::DeviceExt;

use crate::error::{HarnessError, Result};
use crate::surface::UniformPolicy;

use super::link::{AttributeInfo, ProgramInterface, UniformBindingInfo};
use super::uniform::{UniformShadow, UniformSlot, UniformValue};
use super::vertex::{check_draw, DrawParams, PrimitiveMode, VertexState};

/// Attribute layout (location, components) in location order, plus topology.
type PipelineKey = (Vec<(u32, u32)>, PrimitiveMode);

/// Writes `value` into the shadow backing the uniform `name`.
///
/// Unknown names are ignored (logged once) under `Lenient` and rejected under
/// `Strict`. A kind mismatch is always an error and leaves the shadow as is.
pub(crate) fn write_uniform(
    interface: &ProgramInterface,
    shadows: &mut [UniformShadow],
    warned_missing: &mut HashSet<String>,
    name: &str,
    value: UniformValue,
    policy: UniformPolicy,
) -> Result<()> {
    let Some(slot) = interface.uniform(name) else {
        return match policy {
            UniformPolicy::Lenient => {
                if warned_missing.insert(name.to_string()) {
                    log::debug!("uniform `{name}` not found in program; ignored");
                }
                Ok(())
            }
            UniformPolicy::Strict => Err(HarnessError::UniformNotFound {
                name: name.to_string(),
            }),
        };
    };

    if slot.kind != value.kind() {
        return Err(HarnessError::UniformTypeMismatch {
            name: name.to_string(),
            expected: slot.kind.name(),
            actual: value.kind().name(),
        });
    }

    shadows[slot.binding].write(slot.offset, &value);
    Ok(())
}

/// A linked program bound to GPU objects.
///
/// Shader modules, bind groups and uniform buffers are created once by
/// `Program::new`. Render pipelines are built on first use for each
/// (vertex layout, primitive mode) pair and cached.
pub struct Program {
    interface: ProgramInterface,
    target_format: wgpu::TextureFormat,

    vs_module: wgpu::ShaderModule,
    fs_module: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    bind_groups: Vec<wgpu::BindGroup>,

    uniform_buffers: Vec<wgpu::Buffer>,
    shadows: Vec<UniformShadow>,

    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    warned_missing: HashSet<String>,
}

impl Program {
    pub(crate) fn new(
        device: &wgpu::Device,
        interface: ProgramInterface,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lumen program vs"),
            source: wgpu::ShaderSource::Wgsl(interface.vertex().source().to_owned().into()),
        });
        let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lumen program fs"),
            source: wgpu::ShaderSource::Wgsl(interface.fragment().source().to_owned().into()),
        });

        let shadows: Vec<UniformShadow> = interface
            .bindings()
            .iter()
            .map(|b| UniformShadow::new(b.size))
            .collect();

        let uniform_buffers: Vec<wgpu::Buffer> = interface
            .bindings()
            .iter()
            .zip(&shadows)
            .map(|(b, shadow)| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("lumen uniform `{}`", b.name)),
                    size: shadow.bytes().len() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        // Groups must be contiguous in the pipeline layout; gaps get empty layouts.
        let group_count = interface
            .bindings()
            .iter()
            .map(|b| b.group + 1)
            .max()
            .unwrap_or(0);

        let mut group_layouts = Vec::with_capacity(group_count as usize);
        let mut bind_groups = Vec::with_capacity(group_count as usize);

        for group in 0..group_count {
            let members: Vec<(usize, &UniformBindingInfo)> = interface
                .bindings()
                .iter()
                .enumerate()
                .filter(|(_, b)| b.group == group)
                .collect();

            let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = members
                .iter()
                .map(|(_, b)| wgpu::BindGroupLayoutEntry {
                    binding: b.binding,
                    visibility: b.visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(b.size as u64),
                    },
                    count: None,
                })
                .collect();

            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("lumen program bgl"),
                entries: &layout_entries,
            });

            let entries: Vec<wgpu::BindGroupEntry> = members
                .iter()
                .map(|(i, b)| wgpu::BindGroupEntry {
                    binding: b.binding,
                    resource: uniform_buffers[*i].as_entire_binding(),
                })
                .collect();

            bind_groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("lumen program bind group"),
                layout: &layout,
                entries: &entries,
            }));
            group_layouts.push(layout);
        }

        let layout_refs: Vec<&wgpu::BindGroupLayout> = group_layouts.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen program pipeline layout"),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        Self {
            interface,
            target_format,
            vs_module,
            fs_module,
            pipeline_layout,
            bind_groups,
            uniform_buffers,
            shadows,
            pipelines: HashMap::new(),
            warned_missing: HashSet::new(),
        }
    }

    #[inline]
    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    /// Reflected uniforms, in declaration order.
    #[inline]
    pub fn uniforms(&self) -> &[UniformSlot] {
        self.interface.uniforms()
    }

    /// Reflected vertex attributes, in location order.
    #[inline]
    pub fn attributes(&self) -> &[AttributeInfo] {
        self.interface.attributes()
    }

    /// Writes a uniform into the CPU shadow; uploaded by the next draw.
    pub(crate) fn set_uniform(
        &mut self,
        name: &str,
        value: UniformValue,
        policy: UniformPolicy,
    ) -> Result<()> {
        write_uniform(
            &self.interface,
            &mut self.shadows,
            &mut self.warned_missing,
            name,
            value,
            policy,
        )
    }

    /// Records one draw into `encoder` targeting `view`.
    pub(crate) fn record_draw(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        state: &VertexState,
        params: &DrawParams,
    ) -> Result<()> {
        let Some(plan) = check_draw(&self.interface, state.bindings(), params)? else {
            return Ok(());
        };

        self.flush_uniforms(device, encoder);

        let key: PipelineKey = (
            self.interface
                .attributes()
                .iter()
                .map(|a| (a.location, a.components))
                .collect(),
            params.mode,
        );
        self.ensure_pipeline(device, &key);
        let Some(pipeline) = self.pipelines.get(&key) else {
            return Ok(());
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen draw pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        for (group, bind_group) in self.bind_groups.iter().enumerate() {
            rpass.set_bind_group(group as u32, bind_group, &[]);
        }
        for (slot, &index) in plan.slots.iter().enumerate() {
            rpass.set_vertex_buffer(slot as u32, state.buffer(index).slice(..));
        }
        rpass.draw(plan.range, 0..1);

        Ok(())
    }

    /// Copies dirty shadows to the GPU through the encoder, so that each draw
    /// sees the values current when it was recorded.
    fn flush_uniforms(&mut self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder) {
        for (shadow, buffer) in self.shadows.iter_mut().zip(&self.uniform_buffers) {
            if !shadow.is_dirty() {
                continue;
            }
            // Copies execute at submit in record order; a shared staging
            // buffer would hand every draw the last value written.
            let staging = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen uniform staging"),
                contents: shadow.bytes(),
                usage: wgpu::BufferUsages::COPY_SRC,
            });
            encoder.copy_buffer_to_buffer(&staging, 0, buffer, 0, shadow.bytes().len() as u64);
            shadow.mark_clean();
        }
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, key: &PipelineKey) {
        if self.pipelines.contains_key(key) {
            return;
        }

        let (layout, mode) = key;
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = layout
            .iter()
            .map(|&(location, components)| {
                [wgpu::VertexAttribute {
                    format: float_format(components),
                    offset: 0,
                    shader_location: location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = layout
            .iter()
            .zip(&attributes)
            .map(|(&(_, components), attrs)| wgpu::VertexBufferLayout {
                array_stride: (components as u64) * std::mem::size_of::<f32>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lumen program pipeline"),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.vs_module,
                entry_point: Some(self.interface.vertex().entry_point()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.fs_module,
                entry_point: Some(self.interface.fragment().entry_point()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: mode.topology(),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("built pipeline for {} attributes, {mode:?}", layout.len());
        self.pipelines.insert(key.clone(), pipeline);
    }
}

fn float_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShaderStage;
    use crate::program::{compile_shader, link, UniformKind};

    const VS: &str = r#"
        struct Globals {
            transform: mat4x4<f32>,
        };
        @group(0) @binding(0) var<uniform> globals: Globals;

        @vertex
        fn vs_main(@location(0) in_position: vec2<f32>) -> @builtin(position) vec4<f32> {
            return globals.transform * vec4<f32>(in_position, 0.0, 1.0);
        }
    "#;

    const FS: &str = r#"
        @group(0) @binding(1) var<uniform> tint: vec4<f32>;

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return tint;
        }
    "#;

    fn clean_shadows() -> (ProgramInterface, Vec<UniformShadow>) {
        let v = compile_shader(ShaderStage::Vertex, VS).unwrap();
        let f = compile_shader(ShaderStage::Fragment, FS).unwrap();
        let interface = link(&[&v, &f]).unwrap();
        let mut shadows: Vec<UniformShadow> = interface
            .bindings()
            .iter()
            .map(|b| UniformShadow::new(b.size))
            .collect();
        shadows.iter_mut().for_each(UniformShadow::mark_clean);
        (interface, shadows)
    }

    #[test]
    fn lenient_ignores_unknown_names() {
        let (interface, mut shadows) = clean_shadows();
        let before: Vec<Vec<u8>> = shadows.iter().map(|s| s.bytes().to_vec()).collect();
        let mut warned = HashSet::new();

        for _ in 0..2 {
            write_uniform(
                &interface,
                &mut shadows,
                &mut warned,
                "missing",
                UniformValue::Float(1.0),
                UniformPolicy::Lenient,
            )
            .unwrap();
        }

        assert_eq!(warned.len(), 1);
        assert!(shadows.iter().all(|s| !s.is_dirty()));
        let after: Vec<Vec<u8>> = shadows.iter().map(|s| s.bytes().to_vec()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn strict_rejects_unknown_names() {
        let (interface, mut shadows) = clean_shadows();
        let err = write_uniform(
            &interface,
            &mut shadows,
            &mut HashSet::new(),
            "missing",
            UniformValue::Float(1.0),
            UniformPolicy::Strict,
        )
        .unwrap_err();

        assert!(matches!(err, HarnessError::UniformNotFound { ref name } if name == "missing"));
        assert!(shadows.iter().all(|s| !s.is_dirty()));
    }

    #[test]
    fn kind_mismatch_leaves_shadow_untouched() {
        let (interface, mut shadows) = clean_shadows();
        let before: Vec<Vec<u8>> = shadows.iter().map(|s| s.bytes().to_vec()).collect();

        for policy in [UniformPolicy::Lenient, UniformPolicy::Strict] {
            let err = write_uniform(
                &interface,
                &mut shadows,
                &mut HashSet::new(),
                "transform",
                UniformValue::Float(2.0),
                policy,
            )
            .unwrap_err();
            match err {
                HarnessError::UniformTypeMismatch {
                    name,
                    expected,
                    actual,
                } => {
                    assert_eq!(name, "transform");
                    assert_eq!(expected, UniformKind::Mat4.name());
                    assert_eq!(actual, UniformKind::Float.name());
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        assert!(shadows.iter().all(|s| !s.is_dirty()));
        let after: Vec<Vec<u8>> = shadows.iter().map(|s| s.bytes().to_vec()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn matching_write_lands_in_its_binding() {
        let (interface, mut shadows) = clean_shadows();
        let slot = interface.uniform("tint").unwrap().clone();

        write_uniform(
            &interface,
            &mut shadows,
            &mut HashSet::new(),
            "tint",
            UniformValue::Vec4([0.25, 0.5, 0.75, 1.0]),
            UniformPolicy::Strict,
        )
        .unwrap();

        assert!(shadows[slot.binding].is_dirty());
        assert!(shadows
            .iter()
            .enumerate()
            .all(|(i, s)| i == slot.binding || !s.is_dirty()));

        let at = slot.offset as usize;
        let written: Vec<f32> = shadows[slot.binding].bytes()[at..at + 16]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(written, vec![0.25, 0.5, 0.75, 1.0]);
    }
}
