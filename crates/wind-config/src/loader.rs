//! Configuration Loader
//!
//! Finds `wind.toml` by walking up from a starting directory. A missing file
//! is not an error: the result simply carries no overrides.

use crate::project::WindConfig;
use crate::{ConfigResult, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};

/// Configuration loader
#[derive(Debug, Default)]
pub struct ConfigLoader;

/// Loaded configuration plus where it came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Parsed file contents (empty when no file was found)
    pub file: WindConfig,

    /// Directory containing the wind.toml that was loaded
    pub config_root: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration starting from the given directory
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        match self.find_config_file(start_dir) {
            Some(path) => self.load_from_file(&path),
            None => Ok(Config::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let file = WindConfig::load_from_file(config_path)?;
        Ok(Config {
            file,
            config_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    /// Nearest wind.toml at or above `start_dir`
    fn find_config_file(&self, start_dir: &Path) -> Option<PathBuf> {
        start_dir
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }
}

impl Config {
    /// Configured module path, relative entries anchored at the config root
    pub fn library_path(&self) -> Option<PathBuf> {
        let path = self.file.library_path()?;
        match &self.config_root {
            Some(root) if path.is_relative() => Some(root.join(path)),
            _ => Some(path.to_path_buf()),
        }
    }

    /// Configured sound file, passed to the module untouched
    pub fn sound_file(&self) -> Option<PathBuf> {
        self.file.sound_file().map(Path::to_path_buf)
    }

    pub fn stop_delay_ms(&self) -> Option<u64> {
        self.file.stop_delay_ms()
    }

    pub fn cursor_persist(&self) -> Option<bool> {
        self.file.cursor_persist()
    }

    /// Whether a wind.toml was found
    pub fn is_project(&self) -> bool {
        self.config_root.is_some()
    }
}
