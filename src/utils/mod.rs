pub mod error;
pub mod logging;

pub use error::{AppError, ShaderError};
pub use logging::{init_logging, DiagnosticLog};
