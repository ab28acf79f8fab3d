//! Configuration for Chartcast.
//!
//! Settings come from an optional TOML file in the platform config directory,
//! overridden by `CHARTCAST__<SECTION>__<KEY>` environment variables.

mod settings;

pub use settings::{Config, DistributionConfig, OutputConfig, ProviderConfig, RenderConfig};

use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Prefix for environment overrides (`CHARTCAST__RENDER__TIMEOUT_SECS=60`).
pub const ENV_PREFIX: &str = "CHARTCAST";

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "chartcast", "chartcast")
        .ok_or_else(|| Error::config("no home directory to derive chartcast paths from"))
}

/// Directory holding `config.toml`.
pub fn config_dir() -> Result<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Directory for persistent data, including default artifact output.
pub fn data_dir() -> Result<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Directory for the rolling log file.
pub fn log_dir() -> Result<PathBuf> {
    data_dir().map(|dir| dir.join("logs"))
}
