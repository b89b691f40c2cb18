//! # Documents: Ordered Pages With a Trailing Blank
//!
//! A [`Document`] is one file in the notebook: metadata plus an ordered list of pages.
//!
//! ## Page List Policy
//!
//! - A document is created with exactly one blank page.
//! - Whenever the **last** page receives non-blank content, one blank page is appended
//!   in the same mutation. The document therefore always ends with a page ready for
//!   new ink ("infinite scroll").
//! - Pages are never removed automatically. Clearing a page leaves it in place.
//! - The page list is never empty. Every constructor and loader upholds this.
//!
//! ## Loading
//!
//! [`Document::load`] walks the pages found by the page store's gap-terminated scan.
//! A page that turns out to be missing or corrupt ends the walk there: the pages before
//! it are kept, the rest are dropped with a warning.
//!
//! A storage I/O failure is different. Nothing is known about the pages, and a
//! truncated document would overwrite them on its next flush, so the load fails.

use crate::error::{ErrorKind, MathNotesError, Result};
use crate::model::{DocumentMeta, PagePayload};
use crate::store::backend::StorageBackend;
use crate::store::page_store::{PageStore, ReplaceReport};
use tracing::warn;

/// What an [`Document::on_page_mutated`] call did to the page list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMutation {
    pub index: usize,
    pub appended_page: bool,
}

#[derive(Debug, Clone)]
pub struct Document<P: PagePayload> {
    meta: DocumentMeta,
    pages: Vec<P>,
}

impl<P: PagePayload> Document<P> {
    pub fn new(name: String) -> Self {
        Self::from_meta(DocumentMeta::new(name))
    }

    /// A document with known metadata and a single blank page, pending page load.
    pub fn from_meta(meta: DocumentMeta) -> Self {
        Self {
            meta,
            pages: vec![P::default()],
        }
    }

    /// Populate a document's pages from storage.
    ///
    /// Missing or corrupt pages truncate the document. I/O errors are returned.
    pub fn load<B: StorageBackend>(meta: DocumentMeta, store: &PageStore<B>) -> Result<Self> {
        let key = &meta.storage_key;
        let indices = store.list_pages(key)?;

        let mut pages = Vec::with_capacity(indices.len());
        for index in indices {
            match store.load_page::<P>(key, index) {
                Ok(page) => pages.push(page),
                Err(e) if e.kind() == ErrorKind::IoFailure => return Err(e),
                Err(e) => {
                    warn!(key = %key, page = index, error = %e, "truncating document at unreadable page");
                    break;
                }
            }
        }

        if pages.is_empty() {
            pages.push(P::default());
        }

        Ok(Self { meta, pages })
    }

    /// Write every page through, replacing whatever was stored before.
    pub fn flush<B: StorageBackend>(&self, store: &PageStore<B>) -> ReplaceReport {
        store.replace_all_pages(&self.meta.storage_key, &self.pages)
    }

    pub fn append_page(&mut self) {
        self.pages.push(P::default());
        self.meta.touch();
    }

    pub fn on_page_mutated(&mut self, index: usize, payload: P) -> Result<PageMutation> {
        let last = self.pages.len() - 1;
        let slot = self
            .pages
            .get_mut(index)
            .ok_or_else(|| MathNotesError::PageNotFound {
                key: self.meta.storage_key.to_string(),
                index,
            })?;

        let grows = index == last && !payload.is_blank();
        *slot = payload;
        if grows {
            self.pages.push(P::default());
        }
        self.meta.touch();

        Ok(PageMutation {
            index,
            appended_page: grows,
        })
    }

    pub fn rename(&mut self, name: String) {
        self.meta.name = name;
        self.meta.touch();
    }

    /// Index of the page a recognizer should look at: the most recently drawn one.
    ///
    /// The last page is the trailing blank, so this is the one before it.
    pub fn recognition_index(&self) -> usize {
        self.pages.len().saturating_sub(2)
    }

    pub fn recognition_page(&self) -> &P {
        &self.pages[self.recognition_index()]
    }

    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    pub fn id(&self) -> uuid::Uuid {
        self.meta.id
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn pages(&self) -> &[P] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&P> {
        self.pages.get(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of blank pages at the end of the document.
    pub fn trailing_blank_pages(&self) -> usize {
        self.pages.iter().rev().take_while(|p| p.is_blank()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{InkDrawing, Point, RawPage, Stroke};
    use crate::store::mem_backend::MemBackend;
    use crate::store::page_store::page_blob_name;

    fn ink() -> InkDrawing {
        InkDrawing::default().with_stroke(Stroke::new(vec![
            Point { x: 1.0, y: 1.0 },
            Point { x: 2.0, y: 3.0 },
        ]))
    }

    fn make_store() -> PageStore<MemBackend> {
        PageStore::with_backend(MemBackend::new())
    }

    #[test]
    fn test_new_document_has_one_blank_page() {
        let doc: Document<InkDrawing> = Document::new("Limits".to_string());
        assert_eq!(doc.page_count(), 1);
        assert!(doc.pages()[0].is_blank());
    }

    #[test]
    fn test_drawing_on_last_page_appends_exactly_one() {
        let mut doc: Document<InkDrawing> = Document::new("Limits".to_string());
        let mutation = doc.on_page_mutated(0, ink()).unwrap();

        assert!(mutation.appended_page);
        assert_eq!(doc.page_count(), 2);
        assert!(doc.pages()[1].is_blank());
    }

    #[test]
    fn test_redrawing_last_page_after_append_appends_again() {
        let mut doc: Document<InkDrawing> = Document::new("Limits".to_string());
        doc.on_page_mutated(0, ink()).unwrap();
        doc.on_page_mutated(1, ink()).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.trailing_blank_pages(), 1);
    }

    #[test]
    fn test_editing_middle_page_does_not_grow() {
        let mut doc: Document<InkDrawing> = Document::new("Limits".to_string());
        doc.on_page_mutated(0, ink()).unwrap();
        let mutation = doc.on_page_mutated(0, ink()).unwrap();

        assert!(!mutation.appended_page);
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_blank_payload_on_last_page_does_not_grow() {
        let mut doc: Document<InkDrawing> = Document::new("Limits".to_string());
        doc.on_page_mutated(0, InkDrawing::default()).unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_clearing_a_page_never_removes_it() {
        let mut doc: Document<InkDrawing> = Document::new("Limits".to_string());
        doc.on_page_mutated(0, ink()).unwrap();
        doc.on_page_mutated(0, InkDrawing::default()).unwrap();
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_out_of_range_mutation_fails() {
        let mut doc: Document<InkDrawing> = Document::new("Limits".to_string());
        let err = doc.on_page_mutated(5, ink()).unwrap_err();
        assert!(matches!(err, MathNotesError::PageNotFound { index: 5, .. }));
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_mutation_bumps_updated_at() {
        let mut doc: Document<InkDrawing> = Document::new("Limits".to_string());
        let before = doc.meta().updated_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        doc.on_page_mutated(0, ink()).unwrap();
        assert!(doc.meta().updated_at > before);
    }

    #[test]
    fn test_flush_then_load_preserves_order() {
        let store = make_store();
        let mut doc: Document<RawPage> = Document::new("Series".to_string());
        doc.on_page_mutated(0, RawPage(b"p0".to_vec())).unwrap();
        doc.on_page_mutated(1, RawPage(b"p1".to_vec())).unwrap();
        assert!(doc.flush(&store).is_complete());

        let loaded: Document<RawPage> = Document::load(doc.meta().clone(), &store).unwrap();
        assert_eq!(
            loaded.pages(),
            &[
                RawPage(b"p0".to_vec()),
                RawPage(b"p1".to_vec()),
                RawPage::default()
            ]
        );
    }

    #[test]
    fn test_flush_is_idempotent() {
        let store = make_store();
        let mut doc: Document<InkDrawing> = Document::new("Series".to_string());
        doc.on_page_mutated(0, ink()).unwrap();

        doc.flush(&store);
        let first = store.backend().snapshot();
        doc.flush(&store);
        let second = store.backend().snapshot();
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_with_no_pages_yields_one_blank() {
        let store = make_store();
        let meta = DocumentMeta::new("Empty".to_string());
        let doc: Document<InkDrawing> = Document::load(meta, &store).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert!(doc.pages()[0].is_blank());
    }

    #[test]
    fn test_load_truncates_at_gap() {
        let store = make_store();
        let meta = DocumentMeta::new("Holes".to_string());
        for i in [0, 1, 3] {
            store
                .backend()
                .write_blob(
                    &page_blob_name(&meta.storage_key, i),
                    format!("page{}", i).as_bytes(),
                )
                .unwrap();
        }

        let doc: Document<RawPage> = Document::load(meta, &store).unwrap();
        assert_eq!(
            doc.pages(),
            &[RawPage(b"page0".to_vec()), RawPage(b"page1".to_vec())]
        );
    }

    #[test]
    fn test_load_truncates_at_corrupt_page() {
        let store = make_store();
        let meta = DocumentMeta::new("Smudged".to_string());
        let key = meta.storage_key.clone();
        store
            .backend()
            .write_blob(&page_blob_name(&key, 0), &ink().to_bytes())
            .unwrap();
        store
            .backend()
            .write_blob(&page_blob_name(&key, 1), b"not a drawing")
            .unwrap();
        store
            .backend()
            .write_blob(&page_blob_name(&key, 2), &ink().to_bytes())
            .unwrap();

        let doc: Document<InkDrawing> = Document::load(meta, &store).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages()[0], ink());
    }

    #[test]
    fn test_load_with_only_corrupt_first_page_yields_one_blank() {
        let store = make_store();
        let meta = DocumentMeta::new("Smudged".to_string());
        store
            .backend()
            .write_blob(&page_blob_name(&meta.storage_key, 0), b"???")
            .unwrap();

        let doc: Document<InkDrawing> = Document::load(meta, &store).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert!(doc.pages()[0].is_blank());
    }

    #[test]
    fn test_load_fails_on_read_error_and_leaves_pages_alone() {
        let store = make_store();
        let meta = DocumentMeta::new("Flaky".to_string());
        let key = meta.storage_key.clone();
        for i in 0..3 {
            store
                .backend()
                .write_blob(&page_blob_name(&key, i), &ink().to_bytes())
                .unwrap();
        }
        store.backend().fail_reads_of(&page_blob_name(&key, 1));
        let before = store.backend().snapshot();

        let err = Document::<InkDrawing>::load(meta, &store).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert_eq!(store.backend().snapshot(), before);
    }

    #[test]
    fn test_recognition_page_is_last_drawn() {
        let mut doc: Document<InkDrawing> = Document::new("OCR".to_string());
        assert_eq!(doc.recognition_index(), 0);

        doc.on_page_mutated(0, ink()).unwrap();
        doc.on_page_mutated(1, ink()).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.recognition_index(), 1);
        assert!(!doc.recognition_page().is_blank());
    }

    #[test]
    fn test_append_page() {
        let mut doc: Document<InkDrawing> = Document::new("Blank".to_string());
        doc.append_page();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.trailing_blank_pages(), 2);
    }
}
