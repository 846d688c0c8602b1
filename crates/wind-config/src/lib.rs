//! WinD Configuration System
//!
//! Loads the optional `wind.toml` that overrides the built-in session
//! defaults (library path, sound file, stop delay, console cursor mode).
//!
//! # Configuration Hierarchy
//!
//! Later sources override earlier ones:
//! 1. Built-in defaults (owned by the runtime)
//! 2. Project config (`wind.toml`, found by walking up from a directory)
//! 3. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use wind_config::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::new().load_from_directory(Path::new(".")).unwrap();
//! println!("{:?}", config.library_path());
//! ```

pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "wind.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {}: {error}", .file.display())]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use loader::{Config, ConfigLoader};
pub use project::WindConfig;
