use crate::config::rendering::RenderConfig;
use crate::utils::error::AppError;
use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "shaderkit.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub shaders: ShaderConfig,
    pub rendering: RenderConfig,
    pub logging: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub gl_major: u8,
    pub gl_minor: u8,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "shaderkit".to_string(),
            width: 1600,
            height: 1200,
            fullscreen: false,
            gl_major: 3,
            gl_minor: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub root: String,
    pub vertex: String,
    pub fragment: String,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            root: "assets/shaders".to_string(),
            vertex: "triangle.vert".to_string(),
            fragment: "triangle.frag".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "gl.log".to_string(),
        }
    }
}

impl LogConfig {
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}

impl AppConfig {
    /// Reads `path` when it exists, otherwise falls back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, AppError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(AppError::Config(format!(
                "window size {}x{} is not usable",
                self.window.width, self.window.height
            )));
        }
        if self.window.gl_major < 3 || (self.window.gl_major == 3 && self.window.gl_minor < 2) {
            return Err(AppError::Config(format!(
                "OpenGL {}.{} has no core profile, need 3.2 or newer",
                self.window.gl_major, self.window.gl_minor
            )));
        }
        if self.shaders.vertex.is_empty() || self.shaders.fragment.is_empty() {
            return Err(AppError::Config("shader paths must not be empty".to_string()));
        }
        Ok(())
    }
}
