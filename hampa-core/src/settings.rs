//! Player settings and engine configuration.

use crate::persist::{FileStorage, MemoryStorage, StorageProvider};
use crate::state::{clamp_typing_speed, DEFAULT_TYPING_SPEED};
use crate::story::{StoryError, StoryGraph};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding the save directory.
pub const ENV_SAVE_DIR: &str = "HAMPA_SAVE_DIR";
/// Environment variable pointing at a story JSON file.
pub const ENV_STORY_PATH: &str = "HAMPA_STORY_PATH";
/// Environment variable pointing at the image asset directory.
pub const ENV_ASSET_DIR: &str = "HAMPA_ASSET_DIR";

/// Errors from turning configuration into engine collaborators.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Story error: {0}")]
    Story(#[from] StoryError),

    #[error("No save directory configured and no platform data directory available")]
    NoSaveDir,
}

/// The lightweight settings record, stored apart from progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Milliseconds per revealed character, in [1, 100]. Higher is slower.
    pub typing_speed: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            typing_speed: DEFAULT_TYPING_SPEED,
        }
    }
}

impl Settings {
    pub fn new(typing_speed: i64) -> Self {
        Self {
            typing_speed: clamp_typing_speed(typing_speed),
        }
    }

    /// Delay between revealed characters.
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.typing_speed.into())
    }

    /// Copy with the typing speed forced into range.
    pub fn clamped(self) -> Self {
        Self::new(self.typing_speed.into())
    }
}

/// Where the engine reads its story and writes its records.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Save directory. `None` means the platform data directory.
    pub save_dir: Option<PathBuf>,
    /// Story JSON file. `None` means the bundled story.
    pub story_path: Option<PathBuf>,
    /// Image asset directory.
    pub asset_dir: Option<PathBuf>,
    /// Keep records in memory only.
    pub memory_storage: bool,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from `HAMPA_*` environment variables.
    pub fn from_env() -> Self {
        let path = |name: &str| {
            std::env::var_os(name)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        };

        Self {
            save_dir: path(ENV_SAVE_DIR),
            story_path: path(ENV_STORY_PATH),
            asset_dir: path(ENV_ASSET_DIR),
            memory_storage: false,
        }
    }

    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    pub fn with_story_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.story_path = Some(path.into());
        self
    }

    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = Some(dir.into());
        self
    }

    pub fn with_memory_storage(mut self, memory: bool) -> Self {
        self.memory_storage = memory;
        self
    }

    /// Build the storage backend this configuration describes.
    pub fn storage(&self) -> Result<Arc<dyn StorageProvider>, ConfigError> {
        if self.memory_storage {
            return Ok(Arc::new(MemoryStorage::new()));
        }

        let dir = self
            .save_dir
            .clone()
            .or_else(FileStorage::default_dir)
            .ok_or(ConfigError::NoSaveDir)?;
        tracing::debug!(dir = %dir.display(), "Using file storage");
        Ok(Arc::new(FileStorage::new(dir)))
    }

    /// Load the configured story, or the bundled one.
    pub fn story(&self) -> Result<StoryGraph, ConfigError> {
        let graph = match &self.story_path {
            Some(path) => StoryGraph::load(path)?,
            None => StoryGraph::builtin()?,
        };
        Ok(graph)
    }

    /// Asset directory, defaulting to `assets` in the working directory.
    pub fn asset_dir(&self) -> PathBuf {
        self.asset_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("assets"))
    }
}
