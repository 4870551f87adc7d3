//! Shader program builder.
//!
//! Compiles a vertex/fragment WGSL pair with `naga`, checks that the two
//! stages agree on their interface ("linking"), and reflects attribute
//! locations and resource bindings by name.
//!
//! Failures never abort the build: diagnostics are logged and kept on the
//! returned [`ShaderProgram`], which then reports `is_linked() == false`.

mod program;
mod stage;

pub use program::{BindingSlot, ShaderProgram};
pub use stage::ShaderStage;
