pub mod config;
pub mod render;
pub mod utils;

// Re-export commonly used types
pub use config::core::AppConfig;
pub use render::context::{GlContext, GraphicsContext};
pub use render::frame::RenderContext;
pub use render::shaders::{build_program, load_program, ShaderProgram};
pub use render::source::{FileSource, ShaderSource, ShaderStage};
pub use utils::error::{AppError, ShaderError};
