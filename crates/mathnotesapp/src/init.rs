//! Composition root: resolve the data directory, load config, open the coordinator.

use crate::config::MathNotesConfig;
use crate::coordinator::PersistenceCoordinator;
use crate::debounce::SystemClock;
use crate::drawing::InkDrawing;
use crate::error::{MathNotesError, Result};
use crate::store::fs_backend::FsBackend;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Environment variable overriding the data directory.
pub const HOME_ENV_VAR: &str = "MATHNOTES_HOME";

pub type FsCoordinator = PersistenceCoordinator<FsBackend, InkDrawing, SystemClock>;

pub struct MathNotesContext {
    pub coordinator: FsCoordinator,
    pub config: MathNotesConfig,
    pub data_dir: PathBuf,
}

impl MathNotesContext {
    /// Change the page file extension and save it to the config.
    ///
    /// Existing page files are renamed first. If the config then fails to save, the
    /// files are renamed back so the two never disagree. Returns how many files were
    /// renamed.
    pub fn set_page_file_ext(&mut self, ext: &str) -> Result<usize> {
        let mut config = self.config.clone();
        config.set_page_file_ext(ext);
        let renamed = self
            .coordinator
            .change_page_file_ext(config.get_page_file_ext())?;

        if let Err(e) = config.save(&self.data_dir) {
            error!(error = %e, "config save failed, restoring page file extension");
            if let Err(undo) = self
                .coordinator
                .change_page_file_ext(self.config.get_page_file_ext())
            {
                error!(error = %undo, "could not restore page file extension");
            }
            return Err(e);
        }

        self.config = config;
        Ok(renamed)
    }
}

/// `$MATHNOTES_HOME` if set, else the platform data dir.
pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV_VAR) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "mathnotes", "mathnotes")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| MathNotesError::Store("Could not determine data dir".to_string()))
}

pub fn initialize(data_dir: &Path) -> Result<MathNotesContext> {
    let config = MathNotesConfig::load(data_dir)?;
    debug!(data_dir = %data_dir.display(), ?config, "initializing");

    let backend = FsBackend::new(data_dir.to_path_buf()).with_file_ext(config.get_page_file_ext());
    let coordinator = PersistenceCoordinator::open(backend, &config, SystemClock)?;

    Ok(MathNotesContext {
        coordinator,
        config,
        data_dir: data_dir.to_path_buf(),
    })
}
