//! Project Configuration (wind.toml)
//!
//! Every key is optional; anything left out falls back to the runtime default.
//!
//! ```toml
//! [library]
//! path = "bin/winD.dll"
//!
//! [playback]
//! sound_file = 'C:\Windows\Media\chord.wav'
//! stop_delay_ms = 750
//!
//! [console]
//! cursor_persist = true
//! ```

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest accepted wait between play and stop
pub const MAX_STOP_DELAY_MS: u64 = 60_000;

/// Project configuration from wind.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct WindConfig {
    /// Native module settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryConfig>,

    /// Play/stop session settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback: Option<PlaybackConfig>,

    /// `write_text` settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    /// Path to the module, relative paths resolve against the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Sound file handed to `play_audio`, passed through verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_file: Option<PathBuf>,

    /// Wait between `play_audio` and `stop_audio`, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Keep the cursor where `write_text` leaves it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_persist: Option<bool>,
}

impl WindConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(path) = self.library.as_ref().and_then(|l| l.path.as_ref()) {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "library.path".to_string(),
                    reason: "path cannot be empty".to_string(),
                });
            }
        }

        if let Some(playback) = &self.playback {
            if let Some(sound_file) = &playback.sound_file {
                if sound_file.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "playback.sound_file".to_string(),
                        reason: "path cannot be empty".to_string(),
                    });
                }
            }
            if let Some(delay) = playback.stop_delay_ms {
                if delay > MAX_STOP_DELAY_MS {
                    return Err(ConfigError::InvalidValue {
                        field: "playback.stop_delay_ms".to_string(),
                        reason: format!("{} exceeds the {} ms limit", delay, MAX_STOP_DELAY_MS),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn library_path(&self) -> Option<&Path> {
        self.library.as_ref()?.path.as_deref()
    }

    pub fn sound_file(&self) -> Option<&Path> {
        self.playback.as_ref()?.sound_file.as_deref()
    }

    pub fn stop_delay_ms(&self) -> Option<u64> {
        self.playback.as_ref()?.stop_delay_ms
    }

    pub fn cursor_persist(&self) -> Option<bool> {
        self.console.as_ref()?.cursor_persist
    }
}
