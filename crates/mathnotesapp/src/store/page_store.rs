use super::backend::StorageBackend;
use crate::error::{MathNotesError, Result};
use crate::model::{PagePayload, StorageKey};
use tracing::{debug, warn};

/// Blob name of page `index` of the document stored under `key`.
pub fn page_blob_name(key: &StorageKey, index: usize) -> String {
    format!("{}{}", page_prefix(key), index)
}

/// Separates a storage key from the page number in a page blob name.
pub const PAGE_MARKER: &str = "_page_";

fn page_prefix(key: &StorageKey) -> String {
    format!("{}{}", key, PAGE_MARKER)
}

/// Outcome of a [`PageStore::replace_all_pages`] call.
///
/// A rewrite is best-effort: failures are collected per page and never stop
/// the remaining pages from being written.
#[derive(Debug, Default)]
pub struct ReplaceReport {
    pub deleted: usize,
    pub written: Vec<usize>,
    pub failed: Vec<(usize, MathNotesError)>,
    pub delete_failures: Vec<(String, MathNotesError)>,
}

impl ReplaceReport {
    /// True only when every page was written and every stale blob removed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.delete_failures.is_empty()
    }
}

/// Page-level view over a [`StorageBackend`].
///
/// Knows the `{key}_page_{n}` naming scheme and the rewrite policy, nothing
/// about folders or files above it.
pub struct PageStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
}

impl<B: StorageBackend> PageStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Page indices present for `key`, probing 0, 1, 2, ... until the first gap.
    ///
    /// A missing middle page hides every page after it.
    pub fn list_pages(&self, key: &StorageKey) -> Result<Vec<usize>> {
        let mut pages = Vec::new();
        let mut index = 0;
        while self.backend.blob_exists(&page_blob_name(key, index))? {
            pages.push(index);
            index += 1;
        }
        Ok(pages)
    }

    pub fn load_page<P: PagePayload>(&self, key: &StorageKey, index: usize) -> Result<P> {
        let bytes = self
            .backend
            .read_blob(&page_blob_name(key, index))?
            .ok_or_else(|| MathNotesError::PageNotFound {
                key: key.to_string(),
                index,
            })?;
        P::from_bytes(&bytes)
    }

    /// Delete every stored page of `key`, then write `pages` as pages `0..n`.
    pub fn replace_all_pages<P: PagePayload>(&self, key: &StorageKey, pages: &[P]) -> ReplaceReport {
        let mut report = ReplaceReport::default();

        // 1. Clear out every existing page blob, including ones past a gap
        match self.backend.list_blobs(&page_prefix(key)) {
            Ok(existing) => {
                for name in existing {
                    match self.backend.delete_blob(&name) {
                        Ok(()) => report.deleted += 1,
                        Err(e) => {
                            warn!(blob = %name, error = %e, "failed to remove stale page");
                            report.delete_failures.push((name, e));
                        }
                    }
                }
            }
            Err(e) => {
                warn!(key = %key, error = %e, "failed to enumerate existing pages");
                report.delete_failures.push((page_prefix(key), e));
            }
        }

        // 2. Write the current pages in order
        for (index, page) in pages.iter().enumerate() {
            let name = page_blob_name(key, index);
            match self.backend.write_blob(&name, &page.to_bytes()) {
                Ok(()) => report.written.push(index),
                Err(e) => {
                    warn!(key = %key, page = index, error = %e, "failed to write page");
                    report.failed.push((index, e));
                }
            }
        }

        debug!(
            key = %key,
            deleted = report.deleted,
            written = report.written.len(),
            failed = report.failed.len(),
            "replaced pages"
        );
        report
    }

    pub fn load_index(&self) -> Result<Option<Vec<u8>>> {
        self.backend.load_index()
    }

    pub fn save_index(&self, bytes: &[u8]) -> Result<()> {
        self.backend.save_index(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::RawPage;
    use crate::store::mem_backend::MemBackend;

    fn key() -> StorageKey {
        StorageKey::from("doc.drawing".to_string())
    }

    fn make_store() -> PageStore<MemBackend> {
        PageStore::with_backend(MemBackend::new())
    }

    fn raw(bytes: &[u8]) -> RawPage {
        RawPage(bytes.to_vec())
    }

    #[test]
    fn test_blob_naming() {
        assert_eq!(page_blob_name(&key(), 4), "doc.drawing_page_4");
    }

    #[test]
    fn test_list_pages_empty() {
        let store = make_store();
        assert!(store.list_pages(&key()).unwrap().is_empty());
    }

    #[test]
    fn test_list_pages_stops_at_first_gap() {
        let store = make_store();
        for i in [0, 1, 3] {
            store
                .backend
                .write_blob(&page_blob_name(&key(), i), b"x")
                .unwrap();
        }
        assert_eq!(store.list_pages(&key()).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_load_missing_page_is_not_found() {
        let store = make_store();
        let err = store.load_page::<RawPage>(&key(), 0).unwrap_err();
        assert!(matches!(err, MathNotesError::PageNotFound { index: 0, .. }));
    }

    #[test]
    fn test_load_corrupt_page() {
        let store = make_store();
        store
            .backend
            .write_blob(&page_blob_name(&key(), 0), b"{{{")
            .unwrap();
        let err = store
            .load_page::<crate::drawing::InkDrawing>(&key(), 0)
            .unwrap_err();
        assert!(matches!(err, MathNotesError::Corrupt(_)));
    }

    #[test]
    fn test_replace_shrinks_page_set() {
        let store = make_store();
        store.replace_all_pages(&key(), &[raw(b"a"), raw(b"b"), raw(b"c")]);
        let report = store.replace_all_pages(&key(), &[raw(b"z")]);

        assert_eq!(report.deleted, 3);
        assert_eq!(report.written, vec![0]);
        assert_eq!(store.list_pages(&key()).unwrap(), vec![0]);
        assert!(!store
            .backend
            .blob_exists(&page_blob_name(&key(), 1))
            .unwrap());
    }

    #[test]
    fn test_replace_removes_pages_past_a_gap() {
        let store = make_store();
        store
            .backend
            .write_blob(&page_blob_name(&key(), 7), b"orphan")
            .unwrap();
        store.replace_all_pages(&key(), &[raw(b"a")]);
        assert!(!store
            .backend
            .blob_exists(&page_blob_name(&key(), 7))
            .unwrap());
    }

    #[test]
    fn test_replace_leaves_other_documents_alone() {
        let store = make_store();
        let other = StorageKey::from("other.drawing".to_string());
        store.replace_all_pages(&other, &[raw(b"keep")]);
        store.replace_all_pages(&key(), &[raw(b"a")]);

        let kept: RawPage = store.load_page(&other, 0).unwrap();
        assert_eq!(kept, raw(b"keep"));
    }

    #[test]
    fn test_replace_continues_after_single_page_failure() {
        let store = make_store();
        store.backend.fail_writes_to(&page_blob_name(&key(), 1));

        let report = store.replace_all_pages(&key(), &[raw(b"a"), raw(b"b"), raw(b"c")]);

        assert!(!report.is_complete());
        assert_eq!(report.written, vec![0, 2]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, 1);
        // Page 2 is on disk but hidden behind the gap at 1
        assert_eq!(store.list_pages(&key()).unwrap(), vec![0]);
    }
}
