//! # Persistence Coordinator
//!
//! The [`PersistenceCoordinator`] owns the collection tree, the page store and the
//! debounce timer, and is the only way the rest of the app mutates notebook state.
//!
//! ## Lifetime
//!
//! Exactly one coordinator exists per data directory. It is constructed by the
//! application's composition root ([`crate::init::initialize`]) and handed by `&mut`
//! to whatever needs it. There is no global instance.
//!
//! ## Mutation → Flush
//!
//! Each mutating method applies the change in memory, records which document (if any)
//! it touched, and re-arms the debouncer. Nothing hits storage until either:
//!
//! - [`PersistenceCoordinator::poll`] finds the debounce deadline has passed, or
//! - [`PersistenceCoordinator::force_flush_now`] is called (lifecycle hook, shutdown).
//!
//! ## What a Flush Does
//!
//! 1. Serialize the collection index and save it to the index slot.
//! 2. Rewrite the pages of every document mutated since the last flush.
//! 3. Rewrite the pages of **every** document in the tree, as a safety net.
//!
//! Steps run in order and independently: a failed index save does not stop the page
//! writes, and a failed page does not stop other pages or documents. Nothing is retried
//! within a flush; the next flush is the retry.
//!
//! `&mut self` on every entry point means at most one flush is ever in flight.

use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::MathNotesConfig;
use crate::debounce::{Clock, Debouncer};
use crate::document::{Document, PageMutation};
use crate::error::{MathNotesError, Result};
use crate::index::CollectionIndex;
use crate::lifecycle::ForceFlush;
use crate::model::PagePayload;
use crate::store::backend::StorageBackend;
use crate::store::fs_backend::FsBackend;
use crate::store::page_store::{PageStore, ReplaceReport};

/// Everything one flush did, including every failure it swallowed.
#[derive(Debug, Default)]
pub struct FlushReport {
    pub index_error: Option<MathNotesError>,
    /// Documents mutated since the previous flush, written first.
    pub mutated: Vec<(Uuid, ReplaceReport)>,
    /// The whole-tree pass.
    pub all: Vec<(Uuid, ReplaceReport)>,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.index_error.is_none()
            && self
                .mutated
                .iter()
                .chain(self.all.iter())
                .all(|(_, r)| r.is_complete())
    }

    pub fn failed_pages(&self) -> usize {
        self.all.iter().map(|(_, r)| r.failed.len()).sum()
    }
}

pub struct PersistenceCoordinator<B: StorageBackend, P: PagePayload, C: Clock> {
    index: CollectionIndex<P>,
    store: PageStore<B>,
    debouncer: Debouncer<C>,
    mutated: Vec<Uuid>,
    flushes: u64,
}

impl<B: StorageBackend, P: PagePayload, C: Clock> PersistenceCoordinator<B, P, C> {
    pub fn new(index: CollectionIndex<P>, store: PageStore<B>, debouncer: Debouncer<C>) -> Self {
        Self {
            index,
            store,
            debouncer,
            mutated: Vec::new(),
            flushes: 0,
        }
    }

    /// Load the tree from `backend`, then load every document's pages.
    ///
    /// A corrupt or missing index yields the configured default collections, and a
    /// corrupt page truncates its document. I/O failures reading the index slot or any
    /// page are returned, so a transient read error never leads to a partial tree
    /// overwriting real data on the next flush.
    pub fn open(backend: B, config: &MathNotesConfig, clock: C) -> Result<Self> {
        let store = PageStore::with_backend(backend);
        let bytes = store.load_index()?;
        let mut index =
            CollectionIndex::<P>::deserialize(bytes.as_deref(), &config.default_collections);

        // Second pass: page content
        for id in index.document_ids() {
            let meta = index.document(id)?.meta().clone();
            index.replace_document(Document::load(meta, &store)?)?;
        }

        info!(
            collections = index.collection_count(),
            documents = index.document_count(),
            "notebook opened"
        );

        let debouncer = Debouncer::new(clock, config.debounce_interval());
        Ok(Self::new(index, store, debouncer))
    }

    // --- Mutations ---

    pub fn add_collection(&mut self, name: String) -> Uuid {
        let id = self.index.add_collection(name);
        self.note_mutation(None);
        id
    }

    pub fn add_document(&mut self, collection_id: Uuid, name: String) -> Result<Uuid> {
        let id = self.index.add_document(collection_id, name)?;
        self.note_mutation(Some(id));
        Ok(id)
    }

    pub fn rename_collection(&mut self, id: Uuid, name: String) -> Result<()> {
        self.index.rename_collection(id, name)?;
        self.note_mutation(None);
        Ok(())
    }

    pub fn rename_document(&mut self, id: Uuid, name: String) -> Result<()> {
        self.index.rename_document(id, name)?;
        self.note_mutation(Some(id));
        Ok(())
    }

    pub fn on_page_mutated(
        &mut self,
        document_id: Uuid,
        page: usize,
        payload: P,
    ) -> Result<PageMutation> {
        let mutation = self
            .index
            .document_mut(document_id)?
            .on_page_mutated(page, payload)?;
        self.note_mutation(Some(document_id));
        Ok(mutation)
    }

    pub fn append_page(&mut self, document_id: Uuid) -> Result<()> {
        self.index.document_mut(document_id)?.append_page();
        self.note_mutation(Some(document_id));
        Ok(())
    }

    fn note_mutation(&mut self, document: Option<Uuid>) {
        if let Some(id) = document {
            if !self.mutated.contains(&id) {
                self.mutated.push(id);
            }
        }
        let handle = self.debouncer.arm();
        debug!(generation = handle.generation, "flush scheduled");
    }

    // --- Flushing ---

    /// Run the flush if the debounce deadline has passed.
    pub fn poll(&mut self) -> Option<FlushReport> {
        if self.debouncer.poll() {
            Some(self.flush())
        } else {
            None
        }
    }

    /// Flush synchronously, cancelling any pending debounce.
    pub fn force_flush_now(&mut self) -> FlushReport {
        if self.debouncer.cancel().is_some() {
            debug!("pending flush cancelled, flushing now");
        }
        self.flush()
    }

    fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();

        // 1. Index metadata
        let saved = self
            .index
            .serialize()
            .and_then(|bytes| self.store.save_index(&bytes));
        if let Err(e) = saved {
            error!(error = %e, "failed to save collection index");
            report.index_error = Some(e);
        }

        // 2. Documents touched since the last flush
        for id in std::mem::take(&mut self.mutated) {
            if let Ok(document) = self.index.document(id) {
                report.mutated.push((id, document.flush(&self.store)));
            }
        }

        // 3. Everything else
        for document in self.index.all_documents() {
            report.all.push((document.id(), document.flush(&self.store)));
        }

        self.flushes += 1;
        if report.is_clean() {
            info!(
                documents = report.all.len(),
                flush = self.flushes,
                "notebook flushed"
            );
        } else {
            error!(
                failed_pages = report.failed_pages(),
                index_failed = report.index_error.is_some(),
                "notebook flushed with errors"
            );
        }
        report
    }

    // --- Accessors ---

    pub fn index(&self) -> &CollectionIndex<P> {
        &self.index
    }

    pub fn store(&self) -> &PageStore<B> {
        &self.store
    }

    pub fn document(&self, id: Uuid) -> Result<&Document<P>> {
        self.index.document(id)
    }

    pub fn is_flush_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn time_until_flush(&self) -> Option<Duration> {
        self.debouncer.time_until_due()
    }

    /// Number of flushes executed so far, debounced or forced.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }
}

impl<P: PagePayload, C: Clock> PersistenceCoordinator<FsBackend, P, C> {
    /// Rename every stored page file to the extension `ext`.
    ///
    /// Pages written after this call use the new extension. Returns how many files
    /// were renamed.
    pub fn change_page_file_ext(&mut self, ext: &str) -> Result<usize> {
        self.store.backend.migrate_file_ext(ext)
    }
}

impl<B: StorageBackend, P: PagePayload, C: Clock> ForceFlush for PersistenceCoordinator<B, P, C> {
    fn force_flush_now(&mut self) -> FlushReport {
        PersistenceCoordinator::force_flush_now(self)
    }
}
