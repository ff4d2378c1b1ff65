use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    pub root: PathBuf,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Extraction worker pool size.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Upserts per commit during the write phase; bounds lock duration while
    /// preserving partial progress across a mid-pass crash.
    #[serde(default = "default_commit_batch")]
    pub commit_batch: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            commit_batch: default_commit_batch(),
        }
    }
}

fn default_workers() -> usize {
    4
}
fn default_commit_batch() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Characters of content (after the title) searched for scripture tags.
    #[serde(default = "default_window_chars")]
    pub window_chars: usize,
    /// Fixed page size for paginated search results.
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            window_chars: default_window_chars(),
            per_page: default_per_page(),
        }
    }
}

fn default_window_chars() -> usize {
    150
}
fn default_per_page() -> usize {
    30
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.sync.workers == 0 {
        anyhow::bail!("sync.workers must be > 0");
    }
    if config.sync.commit_batch == 0 {
        anyhow::bail!("sync.commit_batch must be > 0");
    }
    if config.search.window_chars == 0 {
        anyhow::bail!("search.window_chars must be > 0");
    }
    if config.search.per_page == 0 {
        anyhow::bail!("search.per_page must be > 0");
    }

    Ok(config)
}
