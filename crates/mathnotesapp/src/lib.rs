//! # MathNotes Architecture
//!
//! MathNotes is a handwriting notebook: folders of files, each file an ordered stack of
//! drawing pages. This crate is its **UI-agnostic persistence core**. The drawing
//! surface, handwriting recognition and every screen live elsewhere and talk to this
//! crate through a handful of plain Rust calls.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Host (CLI, app shell)                                      │
//! │  - Delivers edits, polls for due flushes, reports lifecycle │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Coordinator (coordinator.rs, debounce.rs, lifecycle.rs)    │
//! │  - Single owner of the tree, the store and the timer        │
//! │  - Decides *when* to flush                                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Domain (index.rs, document.rs, model.rs, drawing.rs)       │
//! │  - Collection tree, page list policy, payload contract      │
//! │  - No I/O of its own                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - PageStore over an abstract StorageBackend                │
//! │  - FsBackend (production), MemBackend (testing)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Durability Contract
//!
//! - Edits are held in memory and written after a quiet period (debounce).
//! - A lifecycle transition to the background forces an immediate flush.
//! - Index metadata and page content are written through two independent channels,
//!   with no transaction spanning them; every write is best-effort and a failure is
//!   reported, not retried. The next flush is the only retry.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! Code in this crate:
//! - Takes regular Rust function arguments
//! - Returns regular Rust types (`Result<T>`, reports)
//! - **Never** writes to stdout/stderr (diagnostics go through `tracing`)
//! - **Never** calls `std::process::exit`
//!
//! ## Module Overview
//!
//! - [`coordinator`]: The persistence coordinator, the entry point for all mutations
//! - [`debounce`]: Two-state debounce timer and clocks
//! - [`lifecycle`]: Suspend hook that forces a synchronous flush
//! - [`index`]: Collection tree and its serialized form
//! - [`document`]: Document page list policy, load and flush
//! - [`model`]: Identity, storage keys and the page payload trait
//! - [`drawing`]: Payload types shipped with the crate
//! - [`store`]: Storage abstraction and implementations
//! - [`config`]: Configuration management
//! - [`init`]: Data directory resolution and wiring
//! - [`error`]: Error types

pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod document;
pub mod drawing;
pub mod error;
pub mod index;
pub mod init;
pub mod lifecycle;
pub mod model;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
