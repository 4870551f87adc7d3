use wgpu::util::DeviceExt;

use crate::shader::ShaderProgram;

/// Clip-space positions, `x, y` per vertex, in triangle-strip order.
#[rustfmt::skip]
pub const QUAD_POSITIONS: [f32; 8] = [
     1.0,  1.0,
    -1.0,  1.0,
     1.0, -1.0,
    -1.0, -1.0,
];

/// Texture coordinates, `u, v` per vertex; `v = 0` is the first image row.
#[rustfmt::skip]
pub const QUAD_TEX_COORDS: [f32; 8] = [
    1.0, 0.0,
    0.0, 0.0,
    1.0, 1.0,
    0.0, 1.0,
];

pub const QUAD_VERTEX_COUNT: u32 = 4;
pub const QUAD_TOPOLOGY: wgpu::PrimitiveTopology = wgpu::PrimitiveTopology::TriangleStrip;

/// Vertex input names looked up on the program.
pub const POSITION_ATTRIBUTE: &str = "position";
pub const TEX_COORD_ATTRIBUTE: &str = "tex_coord";

const COMPONENTS: usize = 2;
const STRIDE: u64 = (COMPONENTS * std::mem::size_of::<f32>()) as u64;

/// Attribute bindings of the two buffer slots, resolved against a program.
///
/// A slot whose name the program does not declare carries no attribute; the
/// buffer is still bound so slot indices stay fixed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadAttributes {
    pub position: Option<wgpu::VertexAttribute>,
    pub tex_coord: Option<wgpu::VertexAttribute>,
}

impl QuadAttributes {
    pub fn resolve(program: &ShaderProgram) -> Self {
        Self {
            position: resolve_attribute(program, POSITION_ATTRIBUTE),
            tex_coord: resolve_attribute(program, TEX_COORD_ATTRIBUTE),
        }
    }

    /// Layouts for slot 0 (position) and slot 1 (texture coordinate).
    pub fn layouts(&self) -> [wgpu::VertexBufferLayout<'_>; 2] {
        [
            slot_layout(self.position.as_slice()),
            slot_layout(self.tex_coord.as_slice()),
        ]
    }
}

fn resolve_attribute(program: &ShaderProgram, name: &str) -> Option<wgpu::VertexAttribute> {
    let Some(shader_location) = program.attribute_location(name) else {
        log::warn!("vertex attribute `{name}` is not used by the shader program");
        return None;
    };
    Some(wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 0,
        shader_location,
    })
}

fn slot_layout(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'_> {
    wgpu::VertexBufferLayout {
        array_stride: STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// GPU-side quad: one buffer per attribute, immutable after upload.
pub struct QuadGeometry {
    attributes: QuadAttributes,
    positions: wgpu::Buffer,
    tex_coords: wgpu::Buffer,
}

impl QuadGeometry {
    /// Uploads both attribute buffers and resolves their locations on `program`.
    pub fn new(device: &wgpu::Device, program: &ShaderProgram) -> Self {
        let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("texquad position vbo"),
            contents: bytemuck::cast_slice(&QUAD_POSITIONS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let tex_coords = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("texquad texcoord vbo"),
            contents: bytemuck::cast_slice(&QUAD_TEX_COORDS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            attributes: QuadAttributes::resolve(program),
            positions,
            tex_coords,
        }
    }

    pub fn attributes(&self) -> &QuadAttributes {
        &self.attributes
    }

    /// Binds both buffers to slots 0 and 1.
    pub fn bind(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.positions.slice(..));
        rpass.set_vertex_buffer(1, self.tex_coords.slice(..));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(2) tex_coord: vec2<f32>, @location(5) position: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, 0.0, 1.0);
    out.uv = tex_coord;
    return out;
}
"#;

    const FRAGMENT: &str = r#"
@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, 0.0, 1.0);
}
"#;

    #[test]
    fn buffers_hold_four_two_component_vertices() {
        assert_eq!(QUAD_POSITIONS.len(), QUAD_VERTEX_COUNT as usize * COMPONENTS);
        assert_eq!(QUAD_TEX_COORDS.len(), QUAD_VERTEX_COUNT as usize * COMPONENTS);
        assert_eq!(STRIDE, 8);
    }

    #[test]
    fn strip_covers_clip_space_corners() {
        let corners: Vec<(f32, f32)> = QUAD_POSITIONS.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        for corner in [(1.0, 1.0), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
            assert!(corners.contains(&corner));
        }
    }

    #[test]
    fn top_of_screen_samples_first_image_row() {
        for (pos, uv) in QUAD_POSITIONS.chunks_exact(2).zip(QUAD_TEX_COORDS.chunks_exact(2)) {
            let expected_v = if pos[1] > 0.0 { 0.0 } else { 1.0 };
            assert_eq!(uv[1], expected_v);
        }
    }

    #[test]
    fn locations_come_from_the_program() {
        let program = ShaderProgram::from_sources(VERTEX, FRAGMENT);
        assert!(program.is_linked());

        let attrs = QuadAttributes::resolve(&program);
        assert_eq!(attrs.position.map(|a| a.shader_location), Some(5));
        assert_eq!(attrs.tex_coord.map(|a| a.shader_location), Some(2));

        let [pos, uv] = attrs.layouts();
        assert_eq!(pos.array_stride, 8);
        assert_eq!(pos.attributes.len(), 1);
        assert_eq!(uv.attributes[0].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn buffers_are_uploaded_for_the_program() {
        let (device, _queue) = wgpu::Device::noop(&wgpu::DeviceDescriptor::default());
        let program = ShaderProgram::from_sources(VERTEX, FRAGMENT);

        let geometry = QuadGeometry::new(&device, &program);
        assert_eq!(geometry.positions.size(), STRIDE * QUAD_VERTEX_COUNT as u64);
        assert_eq!(geometry.tex_coords.size(), STRIDE * QUAD_VERTEX_COUNT as u64);
        assert!(geometry.positions.usage().contains(wgpu::BufferUsages::VERTEX));
        assert_eq!(geometry.attributes(), &QuadAttributes::resolve(&program));
    }

    #[test]
    fn unknown_attribute_leaves_slot_empty() {
        let vertex = "@vertex fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> { return vec4<f32>(position, 0.0, 1.0); }";
        let fragment = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let program = ShaderProgram::from_sources(vertex, fragment);

        let attrs = QuadAttributes::resolve(&program);
        assert!(attrs.position.is_some());
        assert!(attrs.tex_coord.is_none());
        assert!(attrs.layouts()[1].attributes.is_empty());
    }
}
