//! Storage Layer
//!
//! Locates the per-user directories the scanner reads settings from and
//! writes debug crops to.

use anyhow::Result;
use std::path::PathBuf;

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "docscan", "DocScan")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Get the directory debug crops are written to
pub fn get_crops_dir() -> Result<PathBuf> {
    let crops_dir = project_dirs()?.data_dir().join("crops");
    std::fs::create_dir_all(&crops_dir)?;

    Ok(crops_dir)
}
