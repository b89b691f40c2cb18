//! # Storage Layer
//!
//! This module defines how notebook data reaches durable storage. It is split in two:
//!
//! 1. [`backend::StorageBackend`]: raw, flat blob I/O (filesystem or memory).
//! 2. [`page_store::PageStore`]: page naming, the scan-until-gap discovery rule and the
//!    delete-then-rewrite policy, on top of any backend.
//!
//! ## Two Independent Channels
//!
//! Notebook state reaches storage through two channels:
//! 1. **Index**: one serialized collection tree (`index.json`) holding folder/file
//!    names, ids, storage keys and ordering.
//! 2. **Pages**: one blob per page, `{storage_key}_page_{n}`.
//!
//! The two are **not** transactionally coupled. A crash between the index write and a
//! page rewrite can leave them disagreeing. The next successful flush brings them back
//! in line; nothing else does.
//!
//! ## Page Discovery
//!
//! Pages are found by probing `_page_0`, `_page_1`, ... and stopping at the first
//! missing index. There is no directory scan on load, so a hole in the sequence
//! silently truncates everything after it.
//!
//! ## Rewrite Policy
//!
//! The only page mutation is [`page_store::PageStore::replace_all_pages`]:
//! - Delete every blob with prefix `{storage_key}_page_`
//! - Write the current pages as `_page_0 .. _page_{n-1}`
//!
//! Editing a single stroke rewrites the whole document. Page counts are small and
//! blobs are page-sized, so this stays cheap. Per-page failures are reported and the
//! remaining pages are still written.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: Production implementation, one file per blob.
//! - [`mem_backend::MemBackend`]: For testing logic without filesystem I/O.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//! ├── index.json                                   # Collection tree
//! ├── config.json                                  # Settings
//! └── {uuid}.drawing_page_{n}.drawing              # Page blobs
//! ```
//!
//! The trailing `.drawing` is the configurable page file extension. Changing it
//! renames the page files already on disk ([`fs_backend::FsBackend::migrate_file_ext`]).

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod page_store;
