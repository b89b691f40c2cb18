use crate::debounce::DEFAULT_DEBOUNCE;
use crate::error::{MathNotesError, Result};
use crate::store::fs_backend::DEFAULT_PAGE_FILE_EXT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_DEBOUNCE_MS: u64 = DEFAULT_DEBOUNCE.as_millis() as u64;

/// Configuration for mathnotes, stored in <data dir>/config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MathNotesConfig {
    /// Quiet period after the last edit before changes are flushed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Collections a fresh (or unreadable) notebook starts with
    #[serde(default = "default_collections")]
    pub default_collections: Vec<String>,

    /// Extension appended to page blob files (e.g. ".drawing")
    #[serde(default = "default_page_file_ext")]
    pub page_file_ext: String,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_collections() -> Vec<String> {
    vec!["Math".to_string(), "Physics".to_string()]
}

fn default_page_file_ext() -> String {
    DEFAULT_PAGE_FILE_EXT.to_string()
}

impl Default for MathNotesConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            default_collections: default_collections(),
            page_file_ext: DEFAULT_PAGE_FILE_EXT.to_string(),
        }
    }
}

impl MathNotesConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(MathNotesError::Io)?;
        let config: MathNotesConfig =
            serde_json::from_str(&content).map_err(MathNotesError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        // Ensure directory exists
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(MathNotesError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(MathNotesError::Serialization)?;
        fs::write(config_path, content).map_err(MathNotesError::Io)?;
        Ok(())
    }

    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Get the page file extension (always starts with a dot)
    pub fn get_page_file_ext(&self) -> &str {
        &self.page_file_ext
    }

    /// Set the page file extension (normalizes to start with a dot)
    pub fn set_page_file_ext(&mut self, ext: &str) {
        if ext.starts_with('.') {
            self.page_file_ext = ext.to_string();
        } else {
            self.page_file_ext = format!(".{}", ext);
        }
    }
}
