/// Represents a single acquired frame.
///
/// This object is short-lived and must be finalized promptly. Holding the surface
/// texture prevents acquisition of subsequent frames.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    /// Multisampled color target, present when the surface runs with MSAA.
    ///
    /// When set, rendering goes here and resolves into `view`.
    pub msaa_view: Option<wgpu::TextureView>,
    pub encoder: wgpu::CommandEncoder,
}
