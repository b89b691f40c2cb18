use crate::error::Result;
use std::path::PathBuf;

/// Well-known name of the slot holding the serialized collection index.
pub const INDEX_BLOB_NAME: &str = "index.json";

/// Abstract interface for raw storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while PageStore handles the "what" (page naming, scans, rewrite policy).
///
/// The namespace is flat: blobs are addressed by name only, and the only
/// enumeration needed is by prefix.
pub trait StorageBackend {
    // --- Index Slot ---

    /// Read the serialized index. Ok(None) on first run.
    fn load_index(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the serialized index.
    fn save_index(&self, bytes: &[u8]) -> Result<()>;

    // --- Blob Operations ---

    /// Returns Ok(None) if the blob does not exist.
    /// Returns Err only on actual I/O errors (permissions, disk failure).
    fn read_blob(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Write a blob.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn write_blob(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Delete a blob. Deleting a missing blob is not an error.
    fn delete_blob(&self, name: &str) -> Result<()>;

    fn blob_exists(&self, name: &str) -> Result<bool>;

    /// Names of all blobs starting with `prefix`, in no particular order.
    fn list_blobs(&self, prefix: &str) -> Result<Vec<String>>;

    // --- Paths ---

    /// The "file path" of a blob.
    /// For FsBackend, this is the real path. For MemBackend, a virtual path.
    fn blob_path(&self, name: &str) -> PathBuf;
}
