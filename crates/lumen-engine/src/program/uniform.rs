use std::fmt;

/// Value passed to `set_uniform`.
///
/// Matrices are column-major, matching WGSL `mat4x4<f32>` layout.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
    Int(i32),
}

/// Shader-side type of a settable uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Int,
}

impl UniformKind {
    /// Maps a reflected WGSL type onto a settable kind.
    pub(crate) fn from_naga(inner: &naga::TypeInner) -> Option<Self> {
        use naga::{Scalar, TypeInner, VectorSize};

        match *inner {
            TypeInner::Scalar(s) if s == Scalar::F32 => Some(UniformKind::Float),
            TypeInner::Scalar(s) if s == Scalar::I32 => Some(UniformKind::Int),
            TypeInner::Vector { size, scalar } if scalar == Scalar::F32 => Some(match size {
                VectorSize::Bi => UniformKind::Vec2,
                VectorSize::Tri => UniformKind::Vec3,
                VectorSize::Quad => UniformKind::Vec4,
            }),
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if scalar == Scalar::F32 => Some(UniformKind::Mat4),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UniformKind::Float => "f32",
            UniformKind::Vec2 => "vec2<f32>",
            UniformKind::Vec3 => "vec3<f32>",
            UniformKind::Vec4 => "vec4<f32>",
            UniformKind::Mat4 => "mat4x4<f32>",
            UniformKind::Int => "i32",
        }
    }

    /// Bytes written for a value of this kind.
    pub fn byte_len(self) -> usize {
        match self {
            UniformKind::Float | UniformKind::Int => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
            UniformValue::Int(_) => UniformKind::Int,
        }
    }

    /// Raw little-endian bytes in WGSL uniform layout.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Vec2(v) => bytemuck::cast_slice(v),
            UniformValue::Vec3(v) => bytemuck::cast_slice(v),
            UniformValue::Vec4(v) => bytemuck::cast_slice(v),
            UniformValue::Mat4(m) => bytemuck::cast_slice(m),
            UniformValue::Int(v) => bytemuck::bytes_of(v),
        }
    }
}

/// Location of a named uniform inside a program's uniform buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSlot {
    pub name: String,
    /// Index into the program's uniform bindings.
    pub binding: usize,
    /// Byte offset inside that binding's buffer.
    pub offset: u32,
    pub kind: UniformKind,
}

/// CPU copy of one uniform buffer.
///
/// Writes land here first; the program copies dirty shadows to the GPU
/// before each draw so that draws recorded in one frame see the values that
/// were current when they were issued.
#[derive(Debug, Clone)]
pub(crate) struct UniformShadow {
    bytes: Vec<u8>,
    dirty: bool,
}

impl UniformShadow {
    /// Allocates a zeroed shadow, padded to 16 bytes.
    pub(crate) fn new(size: u32) -> Self {
        let padded = (size.max(4) as usize).next_multiple_of(16);
        Self {
            bytes: vec![0; padded],
            dirty: true,
        }
    }

    pub(crate) fn write(&mut self, offset: u32, value: &UniformValue) {
        let data = value.as_bytes();
        let start = offset as usize;
        let end = start + data.len();
        if end > self.bytes.len() {
            self.bytes.resize(end.next_multiple_of(16), 0);
        }
        if self.bytes[start..end] != *data {
            self.bytes[start..end].copy_from_slice(data);
            self.dirty = true;
        }
    }

    #[inline]
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
