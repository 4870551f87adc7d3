use std::fmt;

/// Programmable pipeline stage handled by the builder.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }

    fn attribute(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "@vertex",
            ShaderStage::Fragment => "@fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// A parsed and validated single-stage module.
pub(super) struct CompiledStage {
    pub module: naga::Module,
    entry_index: usize,
}

impl CompiledStage {
    pub fn entry(&self) -> &naga::EntryPoint {
        &self.module.entry_points[self.entry_index]
    }
}

/// Compiles `source` for `stage`.
///
/// On failure returns the diagnostic text (rendered against the source, with
/// line/column markers where the compiler provides them).
pub(super) fn compile(stage: ShaderStage, source: &str) -> Result<CompiledStage, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    // Baseline capabilities only; anything beyond needs device features that
    // are never requested.
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    validator
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let candidates: Vec<usize> = module
        .entry_points
        .iter()
        .enumerate()
        .filter(|(_, ep)| ep.stage == stage.to_naga())
        .map(|(i, _)| i)
        .collect();

    let Some(&entry_index) = candidates.first() else {
        return Err(format!("error: no {} entry point found in {stage} shader", stage.attribute()));
    };

    if candidates.len() > 1 {
        log::debug!(
            "{stage} shader declares {} entry points; using `{}`",
            candidates.len(),
            module.entry_points[entry_index].name
        );
    }

    Ok(CompiledStage { module, entry_index })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_minimal_vertex_stage() {
        let src = "@vertex fn main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";
        let stage = compile(ShaderStage::Vertex, src).expect("valid vertex shader");
        assert_eq!(stage.entry().name, "main");
    }

    #[test]
    fn syntax_error_reports_diagnostic() {
        let log = compile(ShaderStage::Vertex, "@vertex fn main( {")
            .err()
            .expect("parse must fail");
        assert!(!log.is_empty());
    }

    #[test]
    fn type_error_reports_diagnostic() {
        let src = "@fragment fn main() -> @location(0) vec4<f32> { return 1.0; }";
        let log = compile(ShaderStage::Fragment, src).err().expect("validation must fail");
        assert!(!log.trim().is_empty());
    }

    #[test]
    fn optional_capabilities_are_rejected() {
        let src = r#"
@fragment
fn main() -> @location(0) vec4<f32> {
    let x: f64 = 1.0lf;
    return vec4<f32>(f32(x));
}
"#;
        let log = compile(ShaderStage::Fragment, src).err().expect("f64 needs a device feature");
        assert!(!log.trim().is_empty());
    }

    #[test]
    fn wrong_stage_is_rejected() {
        let src = "@vertex fn main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";
        let log = compile(ShaderStage::Fragment, src).err().expect("no fragment entry point");
        assert!(log.contains("@fragment"));
    }

    #[test]
    fn empty_source_has_no_entry_point() {
        let log = compile(ShaderStage::Vertex, "").err().expect("empty source");
        assert!(log.contains("@vertex"));
    }
}
