//! Static quad geometry.
//!
//! Two non-interleaved vertex buffers (position, texture coordinate) describe a
//! unit quad drawn as a 4-vertex triangle strip.

mod quad;

pub use quad::{
    QuadAttributes, QuadGeometry, POSITION_ATTRIBUTE, QUAD_POSITIONS, QUAD_TEX_COORDS,
    QUAD_TOPOLOGY, QUAD_VERTEX_COUNT, TEX_COORD_ATTRIBUTE,
};
