//! texquad engine crate.
//!
//! Owns the platform + GPU runtime pieces and the three setup steps of the
//! textured quad: shader program, quad geometry and raw RGB texture.

pub mod core;
pub mod device;
pub mod window;

pub mod geometry;
pub mod logging;
pub mod paint;
pub mod render;
pub mod shader;
pub mod texture;
