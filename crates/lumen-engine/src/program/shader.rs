use std::fmt::Write as _;

use crate::error::{HarnessError, Result, ShaderStage};

/// A parsed and validated shader stage.
///
/// Holds the WGSL source (handed to wgpu when the program is created) and the
/// naga module used for linking and reflection.
#[derive(Debug, Clone)]
pub struct Shader {
    stage: ShaderStage,
    source: String,
    module: naga::Module,
    entry_point: String,
}

impl Shader {
    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    #[inline]
    pub(crate) fn module(&self) -> &naga::Module {
        &self.module
    }

    pub(crate) fn entry(&self) -> Option<&naga::EntryPoint> {
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.name == self.entry_point)
    }
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

/// Parses and validates one WGSL stage.
///
/// The module must contain exactly one entry point for `stage`; other entry
/// points are ignored.
pub fn compile_shader(stage: ShaderStage, source: &str) -> Result<Shader> {
    let fail = |log: String| HarnessError::ShaderCompile { stage, log };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| fail(e.emit_to_string(source)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    );
    validator
        .validate(&module)
        .map_err(|e| fail(validation_log(&e, source)))?;

    let wanted = naga_stage(stage);
    let mut entries = module.entry_points.iter().filter(|ep| ep.stage == wanted);
    let entry_point = match (entries.next(), entries.next()) {
        (Some(ep), None) => ep.name.clone(),
        (None, _) => return Err(fail(format!("no @{stage} entry point"))),
        (Some(_), Some(_)) => return Err(fail(format!("more than one @{stage} entry point"))),
    };

    log::debug!("compiled {stage} shader (entry `{entry_point}`)");

    Ok(Shader {
        stage,
        source: source.to_string(),
        module,
        entry_point,
    })
}

fn validation_log(err: &naga::WithSpan<naga::valid::ValidationError>, source: &str) -> String {
    let mut log = err.as_inner().to_string();

    let mut cause = std::error::Error::source(err.as_inner());
    while let Some(e) = cause {
        let _ = write!(log, "\n  caused by: {e}");
        cause = std::error::Error::source(e);
    }

    for (span, label) in err.spans() {
        let loc = span.location(source);
        let _ = write!(log, "\n  at {}:{}: {label}", loc.line_number, loc.line_position);
    }

    log
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
        @vertex
        fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
            return vec4<f32>(pos, 0.0, 1.0);
        }
    "#;

    #[test]
    fn compiles_valid_vertex_stage() {
        let shader = compile_shader(ShaderStage::Vertex, VS).unwrap();
        assert_eq!(shader.stage(), ShaderStage::Vertex);
        assert_eq!(shader.entry_point(), "vs_main");
        assert!(shader.entry().is_some());
    }

    #[test]
    fn syntax_error_carries_diagnostics() {
        let err = compile_shader(ShaderStage::Fragment, "@fragment fn fs_main( {").unwrap_err();
        match err {
            HarnessError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn type_error_is_reported() {
        let src = r#"
            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                let x: f32 = vec2<f32>(1.0, 2.0);
                return vec4<f32>(x);
            }
        "#;
        assert!(matches!(
            compile_shader(ShaderStage::Fragment, src),
            Err(HarnessError::ShaderCompile { .. })
        ));
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let err = compile_shader(ShaderStage::Fragment, VS).unwrap_err();
        let HarnessError::ShaderCompile { log, .. } = err else {
            panic!("expected compile error");
        };
        assert!(log.contains("no @fragment entry point"));
    }
}
