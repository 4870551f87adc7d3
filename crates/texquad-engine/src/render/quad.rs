use crate::geometry::{QuadGeometry, QUAD_TOPOLOGY, QUAD_VERTEX_COUNT};
use crate::render::{RenderCtx, RenderTarget};
use crate::shader::{BindingSlot, ShaderProgram};
use crate::texture::{texture_format_for, QuadTexture, RawRgbImage};

/// Resource names looked up on the program for the image and its sampler.
pub const TEXTURE_BINDING_NAME: &str = "quad_texture";
pub const SAMPLER_BINDING_NAME: &str = "quad_sampler";

const DEFAULT_TEXTURE_BINDING: u32 = 0;
const DEFAULT_SAMPLER_BINDING: u32 = 1;

/// Draws one textured quad with a caller-built shader program.
///
/// GPU resources are created on the first `render` call:
/// - vertex buffers from the program's attribute locations
/// - the texture from the image handed to `new`, in the surface's encoding
/// - the pipeline, rebuilt when surface format or sample count change
///
/// The renderer disables itself, and frames show only the clear color, when
/// the program failed to link, declares resources other than the image and
/// its sampler in group 0, or the device rejects any of the objects built
/// from it.
pub struct QuadRenderer {
    program: ShaderProgram,
    image: RawRgbImage,
    texture_binding: u32,
    sampler_binding: u32,

    pipeline_key: Option<(wgpu::TextureFormat, u32)>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,

    geometry: Option<QuadGeometry>,
    texture: Option<QuadTexture>,

    disabled: bool,
}

impl QuadRenderer {
    pub fn new(program: ShaderProgram, image: RawRgbImage) -> Self {
        let (texture_binding, sampler_binding) = texture_bindings(&program);

        let mut disabled = false;
        if !program.is_linked() {
            log::warn!("QuadRenderer: shader program is not linked; nothing will be drawn");
            disabled = true;
        } else if let Err(err) = check_resources(&program) {
            log::error!("QuadRenderer: {err}; nothing will be drawn");
            disabled = true;
        }

        Self {
            program,
            image,
            texture_binding,
            sampler_binding,
            pipeline_key: None,
            pipeline: None,
            bind_group_layout: None,
            bind_group: None,
            geometry: None,
            texture: None,
            disabled,
        }
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    /// Returns `true` once the renderer has given up drawing.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Issues the quad draw call into `target`.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        if self.disabled {
            return;
        }

        if !self.is_prepared(ctx) {
            if let Err(err) = self.prepare(ctx) {
                log::error!("QuadRenderer: device rejected quad resources; nothing will be drawn:\n{err}");
                self.disabled = true;
                return;
            }
        }

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(geometry) = self.geometry.as_ref() else { return };

        let attachment = target.load_attachment();
        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("texquad quad pass"),
            color_attachments: &[Some(attachment)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        geometry.bind(&mut rpass);
        rpass.draw(0..QUAD_VERTEX_COUNT, 0..1);
    }

    fn is_prepared(&self, ctx: &RenderCtx<'_>) -> bool {
        let texture_format = texture_format_for(ctx.surface_format);
        self.geometry.is_some()
            && self.texture.as_ref().is_some_and(|t| t.format() == texture_format)
            && self.pipeline_key == Some((ctx.surface_format, ctx.sample_count))
            && self.pipeline.is_some()
            && self.bind_group.is_some()
    }

    /// Builds whatever is missing inside a validation error scope.
    fn prepare(&mut self, ctx: &RenderCtx<'_>) -> Result<(), wgpu::Error> {
        let scope = ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        self.ensure_geometry(ctx);
        self.ensure_texture(ctx);
        self.ensure_pipeline(ctx);
        self.ensure_bindings(ctx);

        match pollster::block_on(scope.pop()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn ensure_geometry(&mut self, ctx: &RenderCtx<'_>) {
        if self.geometry.is_some() {
            return;
        }
        self.geometry = Some(QuadGeometry::new(ctx.device, &self.program));
    }

    fn ensure_texture(&mut self, ctx: &RenderCtx<'_>) {
        let format = texture_format_for(ctx.surface_format);
        if self.texture.as_ref().is_some_and(|t| t.format() == format) {
            return;
        }
        self.texture = Some(QuadTexture::upload(ctx.device, ctx.queue, &self.image, format));
        self.bind_group = None;
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        let key = (ctx.surface_format, ctx.sample_count);
        if self.pipeline_key == Some(key) && self.pipeline.is_some() {
            return;
        }
        let Some(geometry) = self.geometry.as_ref() else { return };
        let (Some(vs_entry), Some(fs_entry)) = (
            self.program.vertex_entry_point(),
            self.program.fragment_entry_point(),
        ) else {
            return;
        };

        let vertex_module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("texquad vertex shader"),
            source: wgpu::ShaderSource::Wgsl(self.program.vertex_source().into()),
        });
        let fragment_module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("texquad fragment shader"),
            source: wgpu::ShaderSource::Wgsl(self.program.fragment_source().into()),
        });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("texquad quad bgl"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: self.texture_binding,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: self.sampler_binding,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("texquad quad pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("texquad quad pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(vs_entry),
                compilation_options: Default::default(),
                buffers: &geometry.attributes().layouts(),
            },

            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(fs_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: QUAD_TOPOLOGY,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: ctx.sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },

            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "quad pipeline built for {:?} with {}x MSAA",
            ctx.surface_format,
            ctx.sample_count
        );

        self.pipeline_key = Some(key);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };
        let Some(texture) = self.texture.as_ref() else { return };

        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texquad quad bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: self.texture_binding,
                    resource: wgpu::BindingResource::TextureView(texture.view()),
                },
                wgpu::BindGroupEntry {
                    binding: self.sampler_binding,
                    resource: wgpu::BindingResource::Sampler(texture.sampler()),
                },
            ],
        }));
    }
}

/// Rejects programs whose resources do not fit the fixed bind group layout:
/// only the image and its sampler, both in group 0.
fn check_resources(program: &ShaderProgram) -> Result<(), String> {
    let unsupported: Vec<String> = program
        .resources()
        .filter(|&(name, slot)| {
            slot.group != 0 || (name != TEXTURE_BINDING_NAME && name != SAMPLER_BINDING_NAME)
        })
        .map(|(name, slot)| format!("`{name}` (group {}, binding {})", slot.group, slot.binding))
        .collect();

    if unsupported.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "unsupported shader resources {}; only `{TEXTURE_BINDING_NAME}` and \
             `{SAMPLER_BINDING_NAME}` in group 0 are bound",
            unsupported.join(", ")
        ))
    }
}

/// Resolves the texture and sampler binding indices in group 0.
///
/// Missing names fall back to bindings 0 and 1.
fn texture_bindings(program: &ShaderProgram) -> (u32, u32) {
    let lookup = |name: &str, default: u32| match program.resource_binding(name) {
        Some(BindingSlot { group: 0, binding }) => binding,
        Some(_) => default,
        None => {
            if program.is_linked() {
                log::warn!("`{name}` is not declared by the shader program; using binding {default}");
            }
            default
        }
    };

    let texture = lookup(TEXTURE_BINDING_NAME, DEFAULT_TEXTURE_BINDING);
    let mut sampler = lookup(SAMPLER_BINDING_NAME, DEFAULT_SAMPLER_BINDING);
    if sampler == texture {
        sampler = if texture == DEFAULT_SAMPLER_BINDING {
            DEFAULT_TEXTURE_BINDING
        } else {
            DEFAULT_SAMPLER_BINDING
        };
        log::warn!("texture and sampler share a binding; moving sampler to binding {sampler}");
    }
    (texture, sampler)
}
