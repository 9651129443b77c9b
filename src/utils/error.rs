use crate::render::source::ShaderStage;
use std::ffi::NulError;
use thiserror::Error;

/// Placeholder used when the driver reports a failure without any log text.
pub const EMPTY_LOG: &str = "(driver returned no diagnostic log)";

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{stage} shader compilation failed: {log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("Program linking failed: {log}")]
    Link { log: String },

    #[error("Program validation failed: {log}")]
    Validation { log: String },

    #[error("{0} shader source is empty")]
    EmptySource(ShaderStage),

    #[error("Failed to read shader source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Null byte error: {0}")]
    Nul(#[from] NulError),

    #[error("Graphics context could not create a {0} object")]
    Create(&'static str),
}

impl ShaderError {
    /// Builds a compile error, substituting a placeholder for an empty log.
    pub fn compile(stage: ShaderStage, log: String) -> Self {
        ShaderError::Compile {
            stage,
            log: non_empty(log),
        }
    }

    pub fn link(log: String) -> Self {
        ShaderError::Link {
            log: non_empty(log),
        }
    }

    pub fn validation(log: String) -> Self {
        ShaderError::Validation {
            log: non_empty(log),
        }
    }

    /// Driver diagnostic text carried by this error, if any.
    pub fn log(&self) -> Option<&str> {
        match self {
            ShaderError::Compile { log, .. }
            | ShaderError::Link { log }
            | ShaderError::Validation { log } => Some(log),
            _ => None,
        }
    }
}

fn non_empty(log: String) -> String {
    let trimmed = log.trim_end_matches(['\0', '\n', ' ']);
    if trimmed.trim().is_empty() {
        EMPTY_LOG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Errors that end the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Could not open window: {0}")]
    Window(String),

    #[error("Could not initialize OpenGL context: {0}")]
    Context(String),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Window(_) => "WINDOW",
            AppError::Context(_) => "CONTEXT",
            AppError::Shader(ShaderError::Compile { .. }) => "COMPILE",
            AppError::Shader(ShaderError::Link { .. }) => "LINK",
            AppError::Shader(_) => "SHADER",
            AppError::Config(_) => "CONFIG",
            AppError::Io(_) => "IO",
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
