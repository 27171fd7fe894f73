use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub fn spendlens_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".spendlens"))
}

pub fn ensure_spendlens_home() -> Result<PathBuf> {
    let dir = spendlens_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Where uploaded statements are staged while the server processes them.
pub fn default_upload_dir() -> PathBuf {
    std::env::temp_dir().join("spendlens-uploads")
}
