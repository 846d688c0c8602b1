//! Effective settings: runtime defaults < wind.toml < command-line flags

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use wind_config::{Config, ConfigLoader};
use wind_runtime::session::DEFAULT_LIBRARY;
use wind_runtime::SessionOptions;

/// `wind play` flags
#[derive(Debug, Default)]
pub struct PlayFlags {
    pub library: Option<PathBuf>,
    pub sound: Option<PathBuf>,
    pub delay_ms: Option<u64>,
}

/// `wind write` flags
#[derive(Debug, Default)]
pub struct WriteFlags {
    pub library: Option<PathBuf>,
    /// `Some` when `--cursor-persist` or `--no-cursor-persist` was given
    pub cursor_persist: Option<bool>,
}

/// Load wind.toml from the working directory or its ancestors
pub fn load_project_config() -> Result<Config> {
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let config = ConfigLoader::new()
        .load_from_directory(&cwd)
        .context("Failed to load wind.toml")?;
    if let Some(root) = &config.config_root {
        log::debug!("using configuration from {}", root.display());
    }
    Ok(config)
}

pub fn session_options(config: &Config, flags: PlayFlags) -> SessionOptions {
    let defaults = SessionOptions::default();
    SessionOptions {
        library_path: flags
            .library
            .or_else(|| config.library_path())
            .unwrap_or(defaults.library_path),
        sound_file: flags
            .sound
            .or_else(|| config.sound_file())
            .unwrap_or(defaults.sound_file),
        stop_delay: flags
            .delay_ms
            .or_else(|| config.stop_delay_ms())
            .map(Duration::from_millis)
            .unwrap_or(defaults.stop_delay),
    }
}

/// Module path for the console commands
pub fn library_path(config: &Config, flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| config.library_path())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY))
}

/// Library path and cursor mode for `wind write`
pub fn write_options(config: &Config, flags: WriteFlags) -> (PathBuf, bool) {
    let library = library_path(config, flags.library);
    let cursor_persist = flags
        .cursor_persist
        .or_else(|| config.cursor_persist())
        .unwrap_or(false);
    (library, cursor_persist)
}
