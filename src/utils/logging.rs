use crate::config::LogConfig;
use anyhow::Result;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Installs the console logger at the configured level.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    SimpleLogger::new()
        .with_level(config.level_filter())
        .with_module_level("winit", LevelFilter::Warn)
        .with_module_level("glutin", LevelFilter::Warn)
        .init()?;
    Ok(())
}

/// Append-only diagnostics file, truncated once per run.
pub struct DiagnosticLog {
    path: PathBuf,
    file: File,
}

impl DiagnosticLog {
    /// Truncates `path` and writes the run header.
    pub fn restart<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::create(&path)?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        writeln!(file, "{} log. unix time {}", env!("CARGO_PKG_NAME"), now)?;
        writeln!(file, "build version: {}", env!("CARGO_PKG_VERSION"))?;
        drop(file);

        let file = OpenOptions::new().append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.file, "{}", line)
    }

    pub fn write_lines<I, S>(&mut self, lines: I) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.write_line(line.as_ref())?;
        }
        self.file.flush()
    }

    pub fn error(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.file, "ERROR: {}", line)?;
        self.file.flush()
    }
}
