//! GPU rendering subsystem.
//!
//! Renderers own their GPU resources (pipelines, buffers, textures) and create
//! them lazily on first use, rebuilding the pipeline when the surface format or
//! sample count changes.

mod ctx;
pub mod quad;

pub use ctx::{RenderCtx, RenderTarget};
pub use quad::QuadRenderer;
