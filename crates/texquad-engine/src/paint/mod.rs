//! Color values handed to the GPU (clear color).

pub mod color;

pub use color::Color;
