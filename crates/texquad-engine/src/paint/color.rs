/// Straight-alpha RGBA color in display (sRGB-encoded) space.
///
/// Values are what a non-sRGB framebuffer would store verbatim, so
/// `Color::rgba(0.5, 0.5, 0.5, 0.0)` is the mid gray a plain `glClearColor`
/// would produce. Convert with [`Color::to_wgpu`] for the target surface.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Returns a copy with every channel clamped to `[0, 1]`.
    #[inline]
    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
            a: self.a.clamp(0.0, 1.0),
        }
    }

    /// Converts to a wgpu clear value.
    ///
    /// sRGB surfaces encode on write, so RGB is decoded to linear first;
    /// alpha is never encoded.
    pub fn to_wgpu(self, srgb_target: bool) -> wgpu::Color {
        let c = self.clamped();
        let channel = |v: f32| {
            if srgb_target { srgb_to_linear(v) as f64 } else { v as f64 }
        };
        wgpu::Color {
            r: channel(c.r),
            g: channel(c.g),
            b: channel(c.b),
            a: c.a as f64,
        }
    }
}

/// sRGB transfer function, decoding direction.
#[inline]
pub fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_target_passes_values_through() {
        let c = Color::rgba(0.5, 0.25, 1.0, 0.0).to_wgpu(false);
        assert_eq!((c.r, c.g, c.b, c.a), (0.5, 0.25, 1.0, 0.0));
    }

    #[test]
    fn srgb_target_decodes_rgb_only() {
        let c = Color::rgba(0.5, 0.5, 0.5, 0.5).to_wgpu(true);
        assert!((c.r - 0.2140).abs() < 1e-3);
        assert_eq!(c.r, c.g);
        assert_eq!(c.a, 0.5);
    }

    #[test]
    fn endpoints_are_fixed_points() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_channels_are_clamped() {
        let c = Color::rgba(-1.0, 2.0, 0.5, 3.0).clamped();
        assert_eq!(c, Color::rgba(0.0, 1.0, 0.5, 1.0));
    }
}
