//! File logging for applications embedding the annotator

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use simplelog::{Config, LevelFilter, WriteLogger};

/// Route `log` output to a file, truncating it.
///
/// Fails if a global logger is already installed.
pub fn init_file_logger(path: &Path, level: LevelFilter) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create log file {path:?}"))?;
    WriteLogger::init(level, Config::default(), file).context("Failed to install logger")?;
    log::info!("Logging to {path:?} at {level}");
    Ok(())
}
