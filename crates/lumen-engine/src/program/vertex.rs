use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::error::{HarnessError, Result};
use crate::surface::UniformPolicy;

use super::link::{AttributeInfo, ProgramInterface};

/// Primitive assembly for a draw call.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
}

impl PrimitiveMode {
    pub(crate) fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            PrimitiveMode::Points => wgpu::PrimitiveTopology::PointList,
            PrimitiveMode::Lines => wgpu::PrimitiveTopology::LineList,
            PrimitiveMode::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            PrimitiveMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
            PrimitiveMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

/// Arguments of one non-indexed draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawParams {
    pub vertex_count: u32,
    pub start: u32,
    pub mode: PrimitiveMode,
}

impl DrawParams {
    /// `vertex_count` triangles-list vertices starting at 0.
    pub fn new(vertex_count: u32) -> Self {
        Self {
            vertex_count,
            start: 0,
            mode: PrimitiveMode::Triangles,
        }
    }

    pub fn start(mut self, start: u32) -> Self {
        self.start = start;
        self
    }

    pub fn mode(mut self, mode: PrimitiveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Vertex range, or `None` if it overflows `u32`.
    pub fn range(&self) -> Option<Range<u32>> {
        let end = self.start.checked_add(self.vertex_count)?;
        Some(self.start..end)
    }
}

/// Layout of one attribute buffer held by a `VertexState`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct AttributeBinding {
    pub location: u32,
    pub components: u32,
    /// Number of whole vertices in the buffer.
    pub count: u32,
}

/// Attribute buffers uploaded once by `declare_vertex_state`.
///
/// One tightly packed `f32` buffer per attribute location.
#[derive(Debug)]
pub struct VertexState {
    bindings: Vec<AttributeBinding>,
    buffers: Vec<wgpu::Buffer>,
}

impl VertexState {
    /// Number of vertices every bound attribute can supply.
    pub fn vertex_count(&self) -> u32 {
        self.bindings.iter().map(|b| b.count).min().unwrap_or(0)
    }

    #[inline]
    pub fn attribute_count(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub(crate) fn bindings(&self) -> &[AttributeBinding] {
        &self.bindings
    }

    #[inline]
    pub(crate) fn buffer(&self, index: usize) -> &wgpu::Buffer {
        &self.buffers[index]
    }
}

/// Scoped upload context passed to the `declare_vertex_state` closure.
pub struct VertexBinder<'a> {
    device: &'a wgpu::Device,
    interface: &'a ProgramInterface,
    policy: UniformPolicy,
    bindings: Vec<AttributeBinding>,
    buffers: Vec<wgpu::Buffer>,
}

impl<'a> VertexBinder<'a> {
    pub(crate) fn new(
        device: &'a wgpu::Device,
        interface: &'a ProgramInterface,
        policy: UniformPolicy,
    ) -> Self {
        Self {
            device,
            interface,
            policy,
            bindings: Vec::new(),
            buffers: Vec::new(),
        }
    }

    /// Uploads `data` for the attribute `name`, `components` floats per vertex.
    ///
    /// Binding the same attribute twice replaces the earlier buffer.
    pub fn buffer(&mut self, name: &str, components: u32, data: &[f32]) -> Result<()> {
        let Some(attr) = resolve_attribute(self.interface, name, components, self.policy)? else {
            return Ok(());
        };

        let count = (data.len() / components as usize) as u32;
        if data.len() % components as usize != 0 {
            log::warn!(
                "attribute `{name}`: {} trailing floats do not form a vertex; ignored",
                data.len() % components as usize
            );
        }

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("lumen vertex `{name}`")),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let binding = AttributeBinding {
            location: attr.location,
            components,
            count,
        };

        match self.bindings.iter().position(|b| b.location == attr.location) {
            Some(i) => {
                self.bindings[i] = binding;
                self.buffers[i] = buffer;
            }
            None => {
                self.bindings.push(binding);
                self.buffers.push(buffer);
            }
        }

        log::trace!("bound `{name}` at location {} ({count} vertices)", attr.location);
        Ok(())
    }

    pub(crate) fn finish(self) -> VertexState {
        VertexState {
            bindings: self.bindings,
            buffers: self.buffers,
        }
    }
}

/// Looks up `name` and checks its component count.
///
/// `Ok(None)` means the name is unknown and the policy says to skip it.
pub(crate) fn resolve_attribute<'p>(
    interface: &'p ProgramInterface,
    name: &str,
    components: u32,
    policy: UniformPolicy,
) -> Result<Option<&'p AttributeInfo>> {
    let Some(attr) = interface.attribute(name) else {
        return match policy {
            UniformPolicy::Lenient => {
                log::warn!("vertex attribute `{name}` is not used by the program; skipped");
                Ok(None)
            }
            UniformPolicy::Strict => Err(HarnessError::AttributeNotFound {
                name: name.to_string(),
            }),
        };
    };

    if attr.components != components {
        return Err(HarnessError::AttributeMismatch {
            name: name.to_string(),
            expected: attr.components,
            actual: components,
        });
    }

    Ok(Some(attr))
}

/// A validated, non-empty draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DrawPlan {
    /// For each program attribute in location order, the index of the
    /// binding that feeds it.
    pub slots: Vec<usize>,
    pub range: Range<u32>,
}

/// Matches the program's inputs against `bindings` and bounds-checks the range.
///
/// `Ok(None)` is a valid zero-vertex draw, which records nothing.
pub(crate) fn check_draw(
    interface: &ProgramInterface,
    bindings: &[AttributeBinding],
    params: &DrawParams,
) -> Result<Option<DrawPlan>> {
    let mut slots = Vec::with_capacity(interface.attributes().len());
    let mut missing = Vec::new();
    let mut available = u32::MAX;

    for attr in interface.attributes() {
        match bindings.iter().position(|b| b.location == attr.location) {
            Some(i) => {
                let b = &bindings[i];
                if b.components != attr.components {
                    return Err(HarnessError::AttributeMismatch {
                        name: attr.name.clone(),
                        expected: attr.components,
                        actual: b.components,
                    });
                }
                available = available.min(b.count);
                slots.push(i);
            }
            None => missing.push(attr.location),
        }
    }

    if !missing.is_empty() {
        return Err(HarnessError::VertexStateIncomplete { missing });
    }

    let out_of_range = || HarnessError::DrawOutOfRange {
        start: params.start,
        end: params.start.saturating_add(params.vertex_count),
        available,
    };
    let range = params.range().ok_or_else(out_of_range)?;
    if range.end > available {
        return Err(out_of_range());
    }

    if range.is_empty() {
        return Ok(None);
    }
    Ok(Some(DrawPlan { slots, range }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShaderStage;
    use crate::program::{compile_shader, link};

    fn interface() -> ProgramInterface {
        let v = compile_shader(
            ShaderStage::Vertex,
            r#"
            struct VsOut {
                @builtin(position) position: vec4<f32>,
                @location(0) color: vec3<f32>,
            };
            @vertex
            fn vs_main(@location(0) position: vec2<f32>, @location(1) color: vec3<f32>) -> VsOut {
                var out: VsOut;
                out.position = vec4<f32>(position, 0.0, 1.0);
                out.color = color;
                return out;
            }
        "#,
        )
        .unwrap();
        let f = compile_shader(
            ShaderStage::Fragment,
            r#"
            @fragment
            fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(color, 1.0);
            }
        "#,
        )
        .unwrap();
        link(&[&v, &f]).unwrap()
    }

    fn binding(location: u32, components: u32, count: u32) -> AttributeBinding {
        AttributeBinding {
            location,
            components,
            count,
        }
    }

    #[test]
    fn draw_params_builder() {
        let p = DrawParams::new(3).start(2).mode(PrimitiveMode::LineStrip);
        assert_eq!(p.range(), Some(2..5));
        assert_eq!(p.mode.topology(), wgpu::PrimitiveTopology::LineStrip);
        assert_eq!(DrawParams::new(1).start(u32::MAX).range(), None);
        assert_eq!(DrawParams::new(3).mode, PrimitiveMode::Triangles);
    }

    #[test]
    fn attribute_lookup_follows_policy() {
        let program = interface();

        let attr = resolve_attribute(&program, "color", 3, UniformPolicy::Lenient)
            .unwrap()
            .unwrap();
        assert_eq!(attr.location, 1);

        assert!(
            resolve_attribute(&program, "normal", 3, UniformPolicy::Lenient)
                .unwrap()
                .is_none()
        );
        assert!(matches!(
            resolve_attribute(&program, "normal", 3, UniformPolicy::Strict),
            Err(HarnessError::AttributeNotFound { .. })
        ));
    }

    #[test]
    fn component_mismatch_is_rejected() {
        let program = interface();
        let err = resolve_attribute(&program, "position", 3, UniformPolicy::Lenient).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::AttributeMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn draw_maps_attributes_to_bindings() {
        let program = interface();
        // Declared out of location order.
        let bindings = [binding(1, 3, 3), binding(0, 2, 4)];
        let plan = check_draw(&program, &bindings, &DrawParams::new(3))
            .unwrap()
            .unwrap();
        assert_eq!(plan.slots, vec![1, 0]);
        assert_eq!(plan.range, 0..3);
    }

    #[test]
    fn missing_input_is_incomplete() {
        let program = interface();
        let err = check_draw(&program, &[binding(0, 2, 3)], &DrawParams::new(3)).unwrap_err();
        match err {
            HarnessError::VertexStateIncomplete { missing } => assert_eq!(missing, vec![1]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn range_is_bounded_by_shortest_buffer() {
        let program = interface();
        let bindings = [binding(0, 2, 6), binding(1, 3, 4)];

        assert!(check_draw(&program, &bindings, &DrawParams::new(4)).is_ok());
        assert!(check_draw(&program, &bindings, &DrawParams::new(2).start(2)).is_ok());

        match check_draw(&program, &bindings, &DrawParams::new(3).start(2)) {
            Err(HarnessError::DrawOutOfRange {
                start,
                end,
                available,
            }) => assert_eq!((start, end, available), (2, 5, 4)),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn zero_vertex_draw_records_nothing() {
        let program = interface();

        // Empty buffers are legal; drawing nothing from them is a no-op.
        let empty = [binding(0, 2, 0), binding(1, 3, 0)];
        assert!(matches!(
            check_draw(&program, &empty, &DrawParams::new(0)),
            Ok(None)
        ));

        let bindings = [binding(0, 2, 3), binding(1, 3, 3)];
        assert!(matches!(
            check_draw(&program, &bindings, &DrawParams::new(0).start(3)),
            Ok(None)
        ));

        // Still validated: a start past the buffers is out of range.
        assert!(matches!(
            check_draw(&program, &bindings, &DrawParams::new(0).start(4)),
            Err(HarnessError::DrawOutOfRange { .. })
        ));

        // And a missing input is still reported.
        assert!(matches!(
            check_draw(&program, &empty[..1], &DrawParams::new(0)),
            Err(HarnessError::VertexStateIncomplete { .. })
        ));
    }
}
