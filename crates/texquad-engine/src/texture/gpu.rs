use super::RawRgbImage;

/// Texture format for images shown on a surface of `surface_format`.
///
/// wgpu has no 3-channel 8-bit format, so pixels are expanded to RGBA. The
/// texture matches the surface's sRGB-ness so the raw bytes reach the screen
/// unchanged in both cases.
pub fn texture_format_for(surface_format: wgpu::TextureFormat) -> wgpu::TextureFormat {
    if surface_format.is_srgb() {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    }
}

/// A 2D texture plus the sampler it is read through.
pub struct QuadTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl QuadTexture {
    /// Uploads `image` verbatim as a single-level texture of `format`
    /// (see [`texture_format_for`]).
    ///
    /// Filtering is linear for both minification and magnification, addressing
    /// repeats. No mipmaps are generated. An empty image uploads as one black
    /// pixel since wgpu rejects zero-sized textures.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RawRgbImage,
        format: wgpu::TextureFormat,
    ) -> Self {
        let fallback;
        let image = if image.is_empty() {
            log::warn!(
                "image has zero size ({}x{}); uploading a 1x1 black texture",
                image.width(),
                image.height()
            );
            fallback = RawRgbImage::blank(1, 1);
            &fallback
        } else {
            image
        };

        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("texquad image"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.to_rgba8(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texquad image sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        log::debug!("uploaded {}x{} {format:?} texture", image.width(), image.height());

        Self {
            texture,
            view,
            sampler,
        }
    }

    pub fn size(&self) -> wgpu::Extent3d {
        self.texture.size()
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}
