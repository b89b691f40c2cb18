//! # CLI Behavior
//!
//! This is **one possible host** for mathnotes. It is the only place that knows about
//! terminal I/O, exit codes and output formatting.
//!
//! ## Naked Execution (`mathnotes`)
//!
//! Running `mathnotes` with no arguments defaults to `mathnotes list`.
//!
//! ## Selectors
//!
//! - Folders: a uuid or the exact folder name.
//! - Files: a uuid or `Folder/File`.
//!
//! ## Module Structure
//!
//! - `commands`: Per-command handlers that call the coordinator and print results
//! - `render`: Output formatting (tree listing, page tables)
//! - `setup`: Argument parsing via clap, version string, logging

mod commands;
mod render;
pub mod setup;

pub use commands::run;
