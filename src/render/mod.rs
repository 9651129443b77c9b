pub mod context;
pub mod frame;
pub mod mesh;
pub mod shaders;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{ContextInfo, GlContext, GraphicsContext};
pub use frame::{FpsCounter, RenderContext};
pub use mesh::{Mesh, MeshData};
pub use shaders::{build_program, load_program, ProgramReport, ShaderProgram};
pub use source::{FileSource, ShaderSource, ShaderStage, TextSource};
