//! Raw RGB texture loading.
//!
//! The image file carries no header: the caller supplies the dimensions and
//! exactly `width * height * 3` bytes are read, row-major, top row first.

mod gpu;
mod raw;

pub use gpu::{texture_format_for, QuadTexture};
pub use raw::{RawRgbImage, RGB_CHANNELS};
