use std::path::Path;

use crate::geometry::{POSITION_ATTRIBUTE, TEX_COORD_ATTRIBUTE};

use super::stage::{self, CompiledStage, ShaderStage};

/// Vertex inputs the quad geometry can feed.
const QUAD_ATTRIBUTES: [&str; 2] = [POSITION_ATTRIBUTE, TEX_COORD_ATTRIBUTE];

/// Bind group slot of a named shader resource.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BindingSlot {
    pub group: u32,
    pub binding: u32,
}

/// Per-stage build state.
#[derive(Debug, Default)]
struct StageState {
    source: String,
    entry_point: Option<String>,
    log: Option<String>,
}

/// A vertex/fragment pair built into one program.
///
/// Always constructed, even when a stage fails to compile or the pair fails to
/// link; check [`is_linked`](Self::is_linked) before creating a pipeline.
#[derive(Debug)]
pub struct ShaderProgram {
    vertex: StageState,
    fragment: StageState,
    link_log: Option<String>,
    linked: bool,

    /// Vertex inputs by name.
    attributes: Vec<(String, u32)>,
    /// Resource bindings of both stages by name.
    bindings: Vec<(String, BindingSlot)>,
}

impl ShaderProgram {
    /// Reads both stage sources and builds the program.
    ///
    /// An unreadable file is logged and treated as empty source, which then
    /// fails to compile like any other broken shader.
    pub fn from_files(vertex_path: impl AsRef<Path>, fragment_path: impl AsRef<Path>) -> Self {
        let vertex_src = read_source(ShaderStage::Vertex, vertex_path.as_ref());
        let fragment_src = read_source(ShaderStage::Fragment, fragment_path.as_ref());
        Self::from_sources(vertex_src, fragment_src)
    }

    /// Compiles both stages and links them.
    pub fn from_sources(vertex_src: impl Into<String>, fragment_src: impl Into<String>) -> Self {
        let mut program = Self {
            vertex: StageState { source: vertex_src.into(), ..StageState::default() },
            fragment: StageState { source: fragment_src.into(), ..StageState::default() },
            link_log: None,
            linked: false,
            attributes: Vec::new(),
            bindings: Vec::new(),
        };

        log::info!("compiling vertex shader");
        let vertex = compile_into(ShaderStage::Vertex, &mut program.vertex);

        log::info!("compiling fragment shader");
        let fragment = compile_into(ShaderStage::Fragment, &mut program.fragment);

        log::info!("linking shader program");
        match link(vertex.as_ref(), fragment.as_ref()) {
            Ok(()) => {
                program.linked = true;
                if let Some(vs) = &vertex {
                    program.attributes = vertex_inputs(vs);
                    collect_bindings(&vs.module, &mut program.bindings);
                }
                if let Some(fs) = &fragment {
                    collect_bindings(&fs.module, &mut program.bindings);
                }
            }
            Err(log) => {
                log::error!("shader program failed to link:\n{log}");
                program.link_log = Some(log);
            }
        }

        program
    }

    /// Returns `true` when both stages compiled and their interfaces match.
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// Compiler diagnostic of the vertex stage, if it failed.
    pub fn vertex_log(&self) -> Option<&str> {
        self.vertex.log.as_deref()
    }

    /// Compiler diagnostic of the fragment stage, if it failed.
    pub fn fragment_log(&self) -> Option<&str> {
        self.fragment.log.as_deref()
    }

    /// Linker diagnostic, if linking failed.
    pub fn link_log(&self) -> Option<&str> {
        self.link_log.as_deref()
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex.source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment.source
    }

    pub fn vertex_entry_point(&self) -> Option<&str> {
        self.vertex.entry_point.as_deref()
    }

    pub fn fragment_entry_point(&self) -> Option<&str> {
        self.fragment.entry_point.as_deref()
    }

    /// Location of the named vertex input, or `None` if the program does not
    /// declare it (or did not link).
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, location)| location)
    }

    /// Bind group slot of the named global resource (texture, sampler, buffer).
    pub fn resource_binding(&self, name: &str) -> Option<BindingSlot> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, slot)| slot)
    }

    /// Every named resource of both stages with its slot.
    pub fn resources(&self) -> impl Iterator<Item = (&str, BindingSlot)> + '_ {
        self.bindings.iter().map(|(name, slot)| (name.as_str(), *slot))
    }
}

fn read_source(stage: ShaderStage, path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(src) => src,
        Err(e) => {
            log::error!("failed to read {stage} shader `{}`: {e}", path.display());
            String::new()
        }
    }
}

fn compile_into(stage: ShaderStage, state: &mut StageState) -> Option<CompiledStage> {
    match stage::compile(stage, &state.source) {
        Ok(compiled) => {
            state.entry_point = Some(compiled.entry().name.clone());
            Some(compiled)
        }
        Err(log) => {
            log::error!("{stage} shader failed to compile:\n{log}");
            state.log = Some(log);
            None
        }
    }
}

/// Numeric type of a location-bound value: scalar or vector.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct NumericShape {
    kind: naga::ScalarKind,
    width: u8,
    components: u8,
}

impl NumericShape {
    fn of(module: &naga::Module, ty: naga::Handle<naga::Type>) -> Option<Self> {
        match module.types[ty].inner {
            naga::TypeInner::Scalar(scalar) => Some(Self {
                kind: scalar.kind,
                width: scalar.width,
                components: 1,
            }),
            naga::TypeInner::Vector { size, scalar } => Some(Self {
                kind: scalar.kind,
                width: scalar.width,
                components: size as u8,
            }),
            _ => None,
        }
    }

    /// `true` when a value of this shape can be read from one of `provided`.
    fn fits_in(self, provided: NumericShape) -> bool {
        self.kind == provided.kind
            && self.width <= provided.width
            && self.components <= provided.components
    }

    fn is_float_vec4(self) -> bool {
        self.kind == naga::ScalarKind::Float && self.width == 4 && self.components == 4
    }
}

impl std::fmt::Display for NumericShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits = u32::from(self.width) * 8;
        let scalar = match self.kind {
            naga::ScalarKind::Float => format!("f{bits}"),
            naga::ScalarKind::Sint => format!("i{bits}"),
            naga::ScalarKind::Uint => format!("u{bits}"),
            naga::ScalarKind::Bool => "bool".to_string(),
            other => format!("{other:?}"),
        };
        if self.components == 1 {
            f.write_str(&scalar)
        } else {
            write!(f, "vec{}<{scalar}>", self.components)
        }
    }
}

/// One `@location` value of an entry point's interface.
#[derive(Debug, Clone)]
struct Varying {
    name: Option<String>,
    location: u32,
    shape: Option<NumericShape>,
    interpolation: Option<naga::Interpolation>,
    sampling: Option<naga::Sampling>,
}

impl Varying {
    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

/// Checks the inter-stage interface.
///
/// - every vertex input is one of the quad's attributes and is floating point
/// - every fragment input is written by the vertex stage with a compatible
///   type, interpolation and sampling
/// - the fragment stage writes a `vec4<f32>` color to location 0
fn link(vertex: Option<&CompiledStage>, fragment: Option<&CompiledStage>) -> Result<(), String> {
    let (vs, fs) = match (vertex, fragment) {
        (Some(vs), Some(fs)) => (vs, fs),
        (None, Some(_)) => return Err("error: vertex shader is not compiled".into()),
        (Some(_), None) => return Err("error: fragment shader is not compiled".into()),
        (None, None) => {
            return Err("error: vertex and fragment shaders are not compiled".into());
        }
    };

    let mut errors = Vec::new();

    for input in entry_inputs(vs) {
        let name = input.display_name();
        if !QUAD_ATTRIBUTES.contains(&name) {
            errors.push(format!(
                "error: vertex input `{name}` at location {} is not fed by any vertex buffer \
                 (expected one of {QUAD_ATTRIBUTES:?})",
                input.location
            ));
        } else if input.shape.is_none_or(|shape| shape.kind != naga::ScalarKind::Float) {
            errors.push(format!(
                "error: vertex input `{name}` at location {} must be floating point",
                input.location
            ));
        }
    }

    let produced = entry_outputs(vs);
    for input in entry_inputs(fs) {
        let name = input.display_name();
        let location = input.location;
        let Some(output) = produced.iter().find(|o| o.location == location) else {
            errors.push(format!(
                "error: fragment input `{name}` at location {location} is not written by the vertex shader"
            ));
            continue;
        };

        match (input.shape, output.shape) {
            (Some(wanted), Some(written)) if wanted.fits_in(written) => {}
            (Some(wanted), Some(written)) => errors.push(format!(
                "error: fragment input `{name}` at location {location} is {wanted} \
                 but the vertex shader writes {written}"
            )),
            _ => errors.push(format!(
                "error: fragment input `{name}` at location {location} has an unsupported type"
            )),
        }

        if input.interpolation != output.interpolation || input.sampling != output.sampling {
            errors.push(format!(
                "error: fragment input `{name}` at location {location} is interpolated \
                 differently than the vertex output"
            ));
        }
    }

    let color = entry_outputs(fs).into_iter().find(|o| o.location == 0);
    match color {
        None => errors.push("error: fragment shader does not write a color to location 0".into()),
        Some(out) if !out.shape.is_some_and(NumericShape::is_float_vec4) => {
            errors.push(format!(
                "error: fragment output at location 0 must be vec4<f32>, found {}",
                out.shape.map_or_else(|| "an unsupported type".to_string(), |s| s.to_string())
            ));
        }
        Some(_) => {}
    }

    if errors.is_empty() { Ok(()) } else { Err(errors.join("\n")) }
}

fn entry_inputs(stage: &CompiledStage) -> Vec<Varying> {
    let mut out = Vec::new();
    for arg in &stage.entry().function.arguments {
        collect_locations(&stage.module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut out);
    }
    out
}

fn entry_outputs(stage: &CompiledStage) -> Vec<Varying> {
    let mut out = Vec::new();
    if let Some(result) = &stage.entry().function.result {
        collect_locations(&stage.module, None, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

/// Collects `@location` bindings reachable from a value of type `ty`.
///
/// A value is either bound directly or is a struct whose members carry the
/// bindings; builtins are skipped.
fn collect_locations(
    module: &naga::Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(naga::Binding::Location {
            location,
            interpolation,
            sampling,
            ..
        }) => {
            out.push(Varying {
                name: name.map(str::to_owned),
                location: *location,
                shape: NumericShape::of(module, ty),
                interpolation: *interpolation,
                sampling: *sampling,
            });
        }
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

fn vertex_inputs(vs: &CompiledStage) -> Vec<(String, u32)> {
    entry_inputs(vs)
        .into_iter()
        .filter_map(|v| v.name.map(|n| (n, v.location)))
        .collect()
}

fn collect_bindings(module: &naga::Module, out: &mut Vec<(String, BindingSlot)>) {
    for (_, var) in module.global_variables.iter() {
        let (Some(name), Some(rb)) = (&var.name, &var.binding) else { continue };
        if out.iter().any(|(n, _)| n == name) {
            continue;
        }
        out.push((
            name.clone(),
            BindingSlot {
                group: rb.group,
                binding: rb.binding,
            },
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coord: vec2<f32>,
}

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) tex_coord: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, 0.0, 1.0);
    out.tex_coord = tex_coord;
    return out;
}
"#;

    const FRAGMENT: &str = r#"
@group(0) @binding(0) var quad_texture: texture_2d<f32>;
@group(0) @binding(1) var quad_sampler: sampler;

@fragment
fn fs_main(@location(0) tex_coord: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(quad_texture, quad_sampler, tex_coord);
}
"#;

    #[test]
    fn valid_pair_links() {
        let program = ShaderProgram::from_sources(VERTEX, FRAGMENT);
        assert!(program.is_linked());
        assert_eq!(program.vertex_log(), None);
        assert_eq!(program.fragment_log(), None);
        assert_eq!(program.link_log(), None);
        assert_eq!(program.vertex_entry_point(), Some("vs_main"));
        assert_eq!(program.fragment_entry_point(), Some("fs_main"));
    }

    #[test]
    fn attributes_resolve_by_name() {
        let program = ShaderProgram::from_sources(VERTEX, FRAGMENT);
        assert_eq!(program.attribute_location("position"), Some(0));
        assert_eq!(program.attribute_location("tex_coord"), Some(1));
        assert_eq!(program.attribute_location("normal"), None);
    }

    #[test]
    fn resources_resolve_by_name() {
        let program = ShaderProgram::from_sources(VERTEX, FRAGMENT);
        assert_eq!(
            program.resource_binding("quad_texture"),
            Some(BindingSlot { group: 0, binding: 0 })
        );
        assert_eq!(
            program.resource_binding("quad_sampler"),
            Some(BindingSlot { group: 0, binding: 1 })
        );
        assert_eq!(program.resource_binding("missing"), None);
    }

    #[test]
    fn malformed_fragment_still_returns_program() {
        let program = ShaderProgram::from_sources(VERTEX, "@fragment fn fs_main( -> {");
        assert!(!program.is_linked());
        assert_eq!(program.vertex_log(), None);
        assert!(program.fragment_log().is_some_and(|log| !log.is_empty()));
        assert!(program.link_log().is_some_and(|log| log.contains("fragment")));
        assert_eq!(program.attribute_location("position"), None);
    }

    #[test]
    fn malformed_vertex_produces_log() {
        let program = ShaderProgram::from_sources("this is not wgsl", FRAGMENT);
        assert!(!program.is_linked());
        assert!(program.vertex_log().is_some_and(|log| !log.is_empty()));
        assert_eq!(program.fragment_log(), None);
    }

    #[test]
    fn unmatched_fragment_input_fails_to_link() {
        let fragment = r#"
@fragment
fn fs_main(@location(3) shade: f32) -> @location(0) vec4<f32> {
    return vec4<f32>(shade);
}
"#;
        let program = ShaderProgram::from_sources(VERTEX, fragment);
        assert!(!program.is_linked());
        let log = program.link_log().unwrap_or_default();
        assert!(log.contains("location 3"), "{log}");
    }

    #[test]
    fn fragment_without_color_output_fails_to_link() {
        let fragment = r#"
@fragment
fn fs_main(@location(0) tex_coord: vec2<f32>) -> @location(1) vec4<f32> {
    return vec4<f32>(tex_coord, 0.0, 1.0);
}
"#;
        let program = ShaderProgram::from_sources(VERTEX, fragment);
        assert!(!program.is_linked());
        assert!(program.link_log().is_some_and(|log| log.contains("location 0")));
    }

    #[test]
    fn vertex_input_without_buffer_fails_to_link() {
        let vertex = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coord: vec2<f32>,
}

@vertex
fn vs_main(
    @location(0) position: vec2<f32>,
    @location(1) tex_coord: vec2<f32>,
    @location(2) normal: vec3<f32>,
) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, normal.z, 1.0);
    out.tex_coord = tex_coord;
    return out;
}
"#;
        let program = ShaderProgram::from_sources(vertex, FRAGMENT);
        assert!(!program.is_linked());
        let log = program.link_log().unwrap_or_default();
        assert!(log.contains("`normal`") && log.contains("location 2"), "{log}");
    }

    #[test]
    fn integer_vertex_input_fails_to_link() {
        let vertex = r#"
@vertex
fn vs_main(@location(0) position: vec2<i32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(vec2<f32>(position), 0.0, 1.0);
}
"#;
        let fragment = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let program = ShaderProgram::from_sources(vertex, fragment);
        assert!(!program.is_linked());
        assert!(program.link_log().is_some_and(|log| log.contains("floating point")));
    }

    #[test]
    fn interstage_type_mismatch_fails_to_link() {
        let vertex = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) shade: f32,
}

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, 0.0, 1.0);
    out.shade = position.x;
    return out;
}
"#;
        let program = ShaderProgram::from_sources(vertex, FRAGMENT);
        assert!(!program.is_linked());
        let log = program.link_log().unwrap_or_default();
        assert!(log.contains("vec2<f32>") && log.contains("writes f32"), "{log}");
    }

    #[test]
    fn narrower_fragment_input_links() {
        let fragment = r#"
@fragment
fn fs_main(@location(0) u: f32) -> @location(0) vec4<f32> {
    return vec4<f32>(u);
}
"#;
        let program = ShaderProgram::from_sources(VERTEX, fragment);
        assert!(program.is_linked(), "{:?}", program.link_log());
    }

    #[test]
    fn non_vec4_color_output_fails_to_link() {
        let fragment = r#"
@fragment
fn fs_main(@location(0) tex_coord: vec2<f32>) -> @location(0) vec2<f32> {
    return tex_coord;
}
"#;
        let program = ShaderProgram::from_sources(VERTEX, fragment);
        assert!(!program.is_linked());
        assert!(program.link_log().is_some_and(|log| log.contains("must be vec4<f32>")));
    }

    #[test]
    fn resources_of_both_stages_are_listed() {
        let program = ShaderProgram::from_sources(VERTEX, FRAGMENT);
        let mut names: Vec<&str> = program.resources().map(|(name, _)| name).collect();
        names.sort_unstable();
        assert_eq!(names, ["quad_sampler", "quad_texture"]);
    }

    #[test]
    fn missing_files_are_treated_as_empty_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let program = ShaderProgram::from_files(
            dir.path().join("missing.vert.wgsl"),
            dir.path().join("missing.frag.wgsl"),
        );
        assert!(!program.is_linked());
        assert_eq!(program.vertex_source(), "");
        assert!(program.vertex_log().is_some());
        assert!(program.fragment_log().is_some());
    }

    #[test]
    fn files_are_read_whole() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vs = dir.path().join("quad.vert.wgsl");
        let fs = dir.path().join("quad.frag.wgsl");
        std::fs::write(&vs, VERTEX).expect("write vertex");
        std::fs::write(&fs, FRAGMENT).expect("write fragment");

        let program = ShaderProgram::from_files(&vs, &fs);
        assert!(program.is_linked());
        assert_eq!(program.fragment_source(), FRAGMENT);
    }
}
