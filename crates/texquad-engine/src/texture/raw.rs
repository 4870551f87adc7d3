use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const RGB_CHANNELS: usize = 3;

/// Tightly packed 8-bit RGB pixels of known dimensions.
///
/// Invariant: `pixels.len() == width * height * 3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRgbImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    bytes_read: usize,
}

impl RawRgbImage {
    /// An all-black image.
    ///
    /// Dimensions whose byte size does not fit in memory give an empty image.
    pub fn blank(width: u32, height: u32) -> Self {
        let Some(len) = expected_len(width, height) else {
            log::error!("image size {width}x{height} is too large; using an empty image");
            return Self::empty();
        };
        Self {
            width,
            height,
            pixels: vec![0; len],
            bytes_read: 0,
        }
    }

    fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
            bytes_read: 0,
        }
    }

    /// Reads `width * height * 3` bytes from `path`.
    ///
    /// Never fails: a missing file yields a black image, a short file a
    /// zero-filled tail, and trailing bytes past the expected size are ignored.
    /// Each case is logged.
    pub fn load(path: impl AsRef<Path>, width: u32, height: u32) -> Self {
        let path = path.as_ref();
        let Some(expected) = expected_len(width, height) else {
            log::error!(
                "image `{}` is declared as {width}x{height}, which is too large; using an empty image",
                path.display()
            );
            return Self::empty();
        };

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                log::error!("failed to open image `{}`: {e}", path.display());
                return Self::blank(width, height);
            }
        };

        let mut pixels = Vec::with_capacity(expected);
        if let Err(e) = file.take(expected as u64).read_to_end(&mut pixels) {
            log::error!("failed to read image `{}`: {e}", path.display());
        }

        let bytes_read = pixels.len();
        if bytes_read < expected {
            log::warn!(
                "image `{}` is short: read {bytes_read} of {expected} bytes ({width}x{height} RGB); \
                 remaining pixels are black",
                path.display()
            );
            pixels.resize(expected, 0);
        }

        log::debug!("loaded {width}x{height} RGB image `{}`", path.display());

        Self {
            width,
            height,
            pixels,
            bytes_read,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// How many bytes came from the file; the rest are zero fill.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Returns `true` when the file supplied every pixel.
    pub fn is_complete(&self) -> bool {
        self.bytes_read == self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Expands to RGBA with opaque alpha.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() / RGB_CHANNELS * 4);
        for px in self.pixels.chunks_exact(RGB_CHANNELS) {
            out.extend_from_slice(&[px[0], px[1], px[2], u8::MAX]);
        }
        out
    }
}

fn expected_len(width: u32, height: u32) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)?
        .checked_mul(RGB_CHANNELS)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    fn write_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(bytes).expect("write image");
        file
    }

    #[test]
    fn exact_length_file_loads_untruncated() {
        let bytes: Vec<u8> = (0..4 * 2 * 3).map(|i| i as u8).collect();
        let file = write_file(&bytes);

        let image = RawRgbImage::load(file.path(), 4, 2);
        assert_eq!(image.pixels(), bytes.as_slice());
        assert_eq!(image.bytes_read(), bytes.len());
        assert!(image.is_complete());
    }

    #[test]
    fn short_file_is_zero_filled() {
        let file = write_file(&[9, 9, 9, 7]);

        let image = RawRgbImage::load(file.path(), 2, 2);
        assert_eq!(image.pixels().len(), 12);
        assert_eq!(&image.pixels()[..4], &[9, 9, 9, 7]);
        assert!(image.pixels()[4..].iter().all(|&b| b == 0));
        assert_eq!(image.bytes_read(), 4);
        assert!(!image.is_complete());
    }

    #[test]
    fn long_file_reads_only_expected_bytes() {
        let file = write_file(&[1; 20]);

        let image = RawRgbImage::load(file.path(), 2, 1);
        assert_eq!(image.pixels(), &[1; 6]);
        assert!(image.is_complete());
    }

    #[test]
    fn missing_file_yields_black_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = RawRgbImage::load(dir.path().join("nope.rgb"), 3, 3);
        assert_eq!(image, RawRgbImage::blank(3, 3));
        assert_eq!(image.bytes_read(), 0);
    }

    #[test]
    fn zero_dimensions_give_empty_image() {
        let file = write_file(&[1, 2, 3]);
        let image = RawRgbImage::load(file.path(), 0, 5);
        assert!(image.is_empty());
    }

    #[test]
    fn oversized_dimensions_give_empty_image() {
        let file = write_file(&[1, 2, 3]);
        let image = RawRgbImage::load(file.path(), u32::MAX, u32::MAX);
        assert!(image.is_empty());
        assert_eq!((image.width(), image.height()), (0, 0));

        assert!(RawRgbImage::blank(u32::MAX, u32::MAX).is_empty());
        assert_eq!(expected_len(u32::MAX, u32::MAX), None);
        assert_eq!(expected_len(512, 512), Some(512 * 512 * 3));
    }

    #[test]
    fn rgba_expansion_adds_opaque_alpha() {
        let file = write_file(&[10, 20, 30, 40, 50, 60]);
        let image = RawRgbImage::load(file.path(), 2, 1);
        assert_eq!(image.to_rgba8(), vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }
}
