use super::backend::StorageBackend;
use crate::error::{MathNotesError, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the persistence core is
/// single-threaded. This avoids the overhead of `RwLock` while still allowing
/// the `StorageBackend` trait to use `&self` for all methods.
#[derive(Default)]
pub struct MemBackend {
    index: RefCell<Option<Vec<u8>>>,
    blobs: RefCell<BTreeMap<String, Vec<u8>>>,
    simulate_write_error: RefCell<bool>,
    failing_blobs: RefCell<HashSet<String>>,
    failing_reads: RefCell<HashSet<String>>,
    writes: RefCell<usize>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Make writes to one specific blob fail, leaving every other write intact.
    pub fn fail_writes_to(&self, name: &str) {
        self.failing_blobs.borrow_mut().insert(name.to_string());
    }

    /// Make reads of one blob fail with an I/O error. Existence checks still succeed.
    pub fn fail_reads_of(&self, name: &str) {
        self.failing_reads.borrow_mut().insert(name.to_string());
    }

    /// Total successful blob and index writes so far.
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }

    /// Full copy of all stored blobs, for comparing storage state across calls.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.blobs.borrow().clone()
    }

    fn check_write(&self, name: &str) -> Result<()> {
        if *self.simulate_write_error.borrow() || self.failing_blobs.borrow().contains(name) {
            return Err(MathNotesError::Store(format!(
                "Simulated write error: {}",
                name
            )));
        }
        Ok(())
    }

    fn check_read(&self, name: &str) -> Result<()> {
        if self.failing_reads.borrow().contains(name) {
            return Err(MathNotesError::Store(format!(
                "Simulated read error: {}",
                name
            )));
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn load_index(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.index.borrow().clone())
    }

    fn save_index(&self, bytes: &[u8]) -> Result<()> {
        self.check_write(super::backend::INDEX_BLOB_NAME)?;
        *self.index.borrow_mut() = Some(bytes.to_vec());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn read_blob(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.check_read(name)?;
        Ok(self.blobs.borrow().get(name).cloned())
    }

    fn write_blob(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.check_write(name)?;
        self.blobs
            .borrow_mut()
            .insert(name.to_string(), bytes.to_vec());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn delete_blob(&self, name: &str) -> Result<()> {
        self.blobs.borrow_mut().remove(name);
        Ok(())
    }

    fn blob_exists(&self, name: &str) -> Result<bool> {
        Ok(self.blobs.borrow().contains_key(name))
    }

    fn list_blobs(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .blobs
            .borrow()
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("memory://{}", name))
    }
}
