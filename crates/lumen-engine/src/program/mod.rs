//! Shader programs: WGSL compilation, linking, reflection and draw state.
//!
//! Everything up to `ProgramInterface` is pure and runs without a GPU; the
//! `Program` wraps an interface with the wgpu objects needed to draw.

mod gpu;
mod link;
mod shader;
mod uniform;
mod vertex;

pub use gpu::Program;
pub use link::{link, AttributeInfo, ProgramInterface, UniformBindingInfo};
pub use shader::{compile_shader, Shader};
pub use uniform::{UniformKind, UniformSlot, UniformValue};
pub use vertex::{DrawParams, PrimitiveMode, VertexBinder, VertexState};
