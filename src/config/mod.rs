pub mod core;
pub mod rendering;

pub use self::core::{AppConfig, LogConfig, ShaderConfig, WindowConfig};
pub use rendering::RenderConfig;
