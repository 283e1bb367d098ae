use std::fmt;

use thiserror::Error;

/// Shader stage kind.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Errors surfaced by the harness.
///
/// Setup errors (context, compile, link) abort before the frame loop starts.
/// Every error returned from a tick terminates the loop; nothing is retried.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to acquire GPU context: {0:#}")]
    ContextAcquisition(anyhow::Error),

    #[error("invalid surface size {width}x{height} at scale {scale}")]
    InvalidSurfaceSize { width: f32, height: f32, scale: f32 },

    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("program failed to link:\n{log}")]
    ProgramLink { log: String },

    #[error("uniform `{name}` not found in program")]
    UniformNotFound { name: String },

    #[error("uniform `{name}` is declared as {expected}, got {actual}")]
    UniformTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("vertex attribute `{name}` not found in program")]
    AttributeNotFound { name: String },

    #[error("vertex attribute `{name}` expects {expected} components, got {actual}")]
    AttributeMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("vertex state does not provide inputs at locations {missing:?}")]
    VertexStateIncomplete { missing: Vec<u32> },

    #[error("draw range {start}..{end} exceeds {available} available vertices")]
    DrawOutOfRange { start: u32, end: u32, available: u32 },

    #[error("surface lost: {0}")]
    SurfaceLost(String),

    #[error("frame callback failed: {0:#}")]
    Callback(anyhow::Error),

    #[error("frame loop was aborted by an earlier error")]
    LoopAborted,
}

pub type Result<T> = std::result::Result<T, HarnessError>;
