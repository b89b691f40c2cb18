use super::backend::{StorageBackend, INDEX_BLOB_NAME};
use super::page_store::PAGE_MARKER;
use crate::error::{MathNotesError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_PAGE_FILE_EXT: &str = ".drawing";

/// One file per blob, all in a single flat directory.
///
/// Page blobs get the configured extension appended, so a page stored as
/// `{key}_page_3` lands on disk as `{key}_page_3.drawing`. The index is
/// always `index.json`.
pub struct FsBackend {
    root: PathBuf,
    file_ext: String,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            file_ext: DEFAULT_PAGE_FILE_EXT.to_string(),
        }
    }

    pub fn with_file_ext(mut self, ext: &str) -> Self {
        self.file_ext = normalize_ext(ext);
        self
    }

    /// Switch to a new page extension, renaming every page file already on disk.
    ///
    /// Refuses before touching anything if a renamed file would clobber an existing
    /// one. A rename failing midway puts the earlier ones back. Returns the number of
    /// files renamed.
    pub fn migrate_file_ext(&mut self, ext: &str) -> Result<usize> {
        let target = normalize_ext(ext);
        let stem = &target[1..];
        if stem.is_empty() || stem.contains(&['/', '\\'][..]) {
            return Err(MathNotesError::Api(format!(
                "Invalid page file extension '{}'",
                ext
            )));
        }
        if target == self.file_ext {
            return Ok(0);
        }

        let moves: Vec<(PathBuf, PathBuf)> = self
            .list_blobs("")?
            .into_iter()
            .filter(|name| name.contains(PAGE_MARKER))
            .map(|name| {
                let to = self.root.join(format!("{}{}", name, target));
                (self.blob_path(&name), to)
            })
            .collect();

        if let Some((_, to)) = moves.iter().find(|(_, to)| to.exists()) {
            return Err(MathNotesError::Store(format!(
                "Cannot change page extension: {} already exists",
                to.display()
            )));
        }

        for (done, (from, to)) in moves.iter().enumerate() {
            if let Err(e) = fs::rename(from, to) {
                for (from, to) in &moves[..done] {
                    if let Err(undo) = fs::rename(to, from) {
                        warn!(path = %to.display(), error = %undo, "could not restore page file");
                    }
                }
                return Err(MathNotesError::Io(e));
            }
        }

        info!(from = %self.file_ext, to = %target, files = moves.len(), "page file extension changed");
        self.file_ext = target;
        Ok(moves.len())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_ext(&self) -> &str {
        &self.file_ext
    }

    fn blob_filename(&self, name: &str) -> String {
        format!("{}{}", name, self.file_ext)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(MathNotesError::Io)?;
        }
        Ok(())
    }

    fn atomic_write(&self, target: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir()?;
        let tmp_path = self.root.join(format!(".blob-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, bytes).map_err(MathNotesError::Io)?;
        fs::rename(&tmp_path, target).map_err(MathNotesError::Io)?;
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load_index(&self) -> Result<Option<Vec<u8>>> {
        let path = self.root.join(INDEX_BLOB_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path).map_err(MathNotesError::Io)?;
        Ok(Some(bytes))
    }

    fn save_index(&self, bytes: &[u8]) -> Result<()> {
        self.atomic_write(&self.root.join(INDEX_BLOB_NAME), bytes)
    }

    fn read_blob(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path).map_err(MathNotesError::Io)?;
        Ok(Some(bytes))
    }

    fn write_blob(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.atomic_write(&self.blob_path(name), bytes)
    }

    fn delete_blob(&self, name: &str) -> Result<()> {
        let path = self.blob_path(name);
        if path.exists() {
            fs::remove_file(path).map_err(MathNotesError::Io)?;
        }
        Ok(())
    }

    fn blob_exists(&self, name: &str) -> Result<bool> {
        Ok(self.blob_path(name).is_file())
    }

    fn list_blobs(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let entries = fs::read_dir(&self.root).map_err(MathNotesError::Io)?;

        for entry in entries {
            let entry = entry.map_err(MathNotesError::Io)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|s| s.to_str()) {
                if let Some(name) = file_name.strip_suffix(self.file_ext.as_str()) {
                    if name.starts_with(prefix) {
                        names.push(name.to_string());
                    }
                }
            }
        }
        Ok(names)
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        self.root.join(self.blob_filename(name))
    }
}

fn normalize_ext(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}
